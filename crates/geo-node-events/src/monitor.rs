// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Events monitor: reads the node's events FIFO line by line and publishes every valid event.
//!
//! The monitor waits for the startup delay, opens the FIFO (see [`crate::pipe`]) and then loops
//! until its cancellation token fires. The token is checked once per loop iteration, never
//! during a read, so a stop request takes effect before the next line is read. A FIFO reports
//! end-of-stream whenever no writer has data buffered, so end-of-stream is polled on a short
//! interval instead of being treated as the end of the events.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::dispatcher::Dispatch;
use crate::errors::MonitorError;
use crate::event::decode;
use crate::pipe::{open_events_pipe, RetryPolicy};
use crate::router::route;

const RECORD_DELIMITER: u8 = b'\n';
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);
const DEFAULT_MAX_RECORD_LEN: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub pipe_path: PathBuf,
    /// Grace period for the node to start writing before the FIFO is opened.
    pub startup_delay: Duration,
    pub retry_policy: RetryPolicy,
    /// Pause before reading again after end-of-stream.
    pub poll_interval: Duration,
    /// Longest unterminated record kept across end-of-stream polls before it is dropped.
    pub max_record_len: usize,
}

impl MonitorConfig {
    pub fn new(config: &Config) -> Self {
        MonitorConfig {
            pipe_path: config.events_pipe_path(),
            startup_delay: config.startup_delay(),
            retry_policy: RetryPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_record_len: DEFAULT_MAX_RECORD_LEN,
        }
    }
}

pub struct EventMonitor {
    config: MonitorConfig,
    dispatcher: Arc<dyn Dispatch>,
    cancel_token: CancellationToken,
}

impl EventMonitor {
    pub fn new(
        config: MonitorConfig,
        dispatcher: Arc<dyn Dispatch>,
        cancel_token: CancellationToken,
    ) -> Self {
        EventMonitor {
            config,
            dispatcher,
            cancel_token,
        }
    }

    pub fn startup_delay(&self) -> Duration {
        self.config.startup_delay
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Opens the events FIFO and consumes it until cancelled.
    ///
    /// Returns an error only when the FIFO can't be opened; the read loop itself never fails.
    pub async fn run(self) -> Result<(), MonitorError> {
        sleep(self.config.startup_delay).await;

        let reader = match open_events_pipe(&self.config.pipe_path, self.config.retry_policy).await
        {
            Ok(reader) => reader,
            Err(e) => {
                error!("Events monitor failed to start: {e}");
                return Err(e.into());
            }
        };

        self.consume(reader).await;
        Ok(())
    }

    /// Reads records from `reader` until the cancellation token fires. The reader is dropped,
    /// closing the stream, on return.
    pub async fn consume<R: AsyncBufRead + Unpin>(&self, mut reader: R) {
        let mut line = Vec::new();
        loop {
            if self.cancel_token.is_cancelled() {
                info!("Events receiving was finished by the external signal");
                return;
            }

            match reader.read_until(RECORD_DELIMITER, &mut line).await {
                // end-of-stream, possibly in the middle of a record: keep what was read so far
                Ok(_) if line.last() != Some(&RECORD_DELIMITER) => {
                    if line.len() > self.config.max_record_len {
                        error!(
                            "Unterminated event of {} bytes exceeds the {} bytes limit. Dropped",
                            line.len(),
                            self.config.max_record_len
                        );
                        line.clear();
                    }
                    sleep(self.config.poll_interval).await;
                }
                Ok(_) => {
                    self.process_line(&line).await;
                    line.clear();
                }
                Err(e) => {
                    error!("Error occurred on event reading. Details: {e}");
                    sleep(self.config.poll_interval).await;
                }
            }
        }
    }

    async fn process_line(&self, line: &[u8]) {
        // the node sometimes writes a bare delimiter
        if *line == [RECORD_DELIMITER] {
            return;
        }

        let raw = String::from_utf8_lossy(line);
        let raw = raw.trim_end_matches('\n');
        debug!("Received event: {raw}");

        let event = match decode(line) {
            Ok(event) => event,
            Err(e) => {
                error!("Invalid event occurred: {e}. Details are: \"{raw}\". Dropped");
                return;
            }
        };

        match route(&event) {
            Ok(payload) => {
                info!("Publishing event {} to {}", event.opcode, payload.endpoint());
                self.dispatcher.send(&payload).await;
            }
            Err(e) => error!(
                "Malformed event with opcode {} and {} tokens: {e}. Details are: \"{raw}\". Dropped",
                event.opcode,
                event.tokens.len()
            ),
        }
    }
}
