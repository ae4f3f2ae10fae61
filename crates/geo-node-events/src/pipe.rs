// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Acquisition of the events FIFO.
//!
//! The node may not have created its FIFO yet when the handler starts, so opening is retried a
//! bounded number of times with a fixed backoff. Running out of attempts is fatal for the monitor.

use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::BufReader;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use crate::errors::PipeError;

const DEFAULT_MAX_OPEN_ATTEMPTS: u32 = 5;
const DEFAULT_OPEN_BACKOFF: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of open attempts, the first one included.
    pub max_attempts: u32,
    /// Pause between two consecutive attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_OPEN_ATTEMPTS,
            backoff: DEFAULT_OPEN_BACKOFF,
        }
    }
}

/// Runs `open` until it succeeds or `policy.max_attempts` attempts have failed.
/// There is no pause after the last failed attempt.
pub async fn open_with_retry<T, F, Fut>(
    path: &Path,
    policy: RetryPolicy,
    mut open: F,
) -> Result<T, PipeError>
where
    F: FnMut(PathBuf) -> Fut,
    Fut: Future<Output = std::io::Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    info!("Try open {}", path.display());

    let mut attempts = 0;
    loop {
        attempts += 1;
        match open(path.to_path_buf()).await {
            Ok(stream) => {
                info!("{} opened for reading", path.display());
                return Ok(stream);
            }
            Err(e) if attempts >= max_attempts => {
                error!("Max tries count expired for {}. Details: {e}", path.display());
                return Err(PipeError::RetriesExhausted {
                    path: path.to_path_buf(),
                    attempts,
                    source: e,
                });
            }
            Err(e) => {
                error!(
                    "Can't open {} for reading (attempt {attempts}/{max_attempts}). Details: {e}. Wait {:?} before repeat",
                    path.display(),
                    policy.backoff
                );
                sleep(policy.backoff).await;
            }
        }
    }
}

/// Opens the events FIFO for buffered reading.
pub async fn open_events_pipe(
    path: &Path,
    policy: RetryPolicy,
) -> Result<BufReader<File>, PipeError> {
    open_with_retry(path, policy, |path| async move {
        File::open(path).await.map(BufReader::new)
    })
    .await
}
