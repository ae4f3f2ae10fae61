// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Startup handshake for the events monitor.
//!
//! The monitor is spawned in the background and the supervisor waits up to ten times the startup
//! delay for it to fail. If nothing is reported within that window the monitor is considered
//! running. Absence of an error is the only success signal: a monitor that is still retrying to
//! open the FIFO when the window closes is reported as running, and its later failure is only
//! visible in the logs and through [`MonitorHandle::join`].

use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::errors::{MonitorError, SupervisorError};
use crate::monitor::EventMonitor;

const STARTUP_WINDOW_FACTOR: u32 = 10;

/// Control over a running events monitor.
#[derive(Debug)]
pub struct MonitorHandle {
    cancel_token: CancellationToken,
    task: JoinHandle<Result<(), MonitorError>>,
}

impl MonitorHandle {
    /// Requests the monitor to stop. It finishes after the line being read, if any.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the monitor task to finish.
    pub async fn join(self) -> Result<(), SupervisorError> {
        self.task.await?.map_err(SupervisorError::StartupFailed)
    }
}

pub fn startup_window(startup_delay: Duration) -> Duration {
    startup_delay * STARTUP_WINDOW_FACTOR
}

/// Spawns the monitor and waits for the startup window to pass without a failure.
pub async fn attach(monitor: EventMonitor) -> Result<MonitorHandle, SupervisorError> {
    let window = startup_window(monitor.startup_delay());
    let cancel_token = monitor.cancel_token();
    let mut task = tokio::spawn(monitor.run());

    match timeout(window, &mut task).await {
        Ok(Ok(Err(e))) => {
            error!("Can't start events receiving from the node: {e}");
            Err(SupervisorError::StartupFailed(e))
        }
        Ok(Ok(Ok(()))) => Err(SupervisorError::ExitedEarly),
        Ok(Err(e)) => Err(SupervisorError::Join(e)),
        Err(_) => {
            info!("Events monitor attached");
            Ok(MonitorHandle { cancel_token, task })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::tests::RecordingDispatcher;
    use crate::monitor::MonitorConfig;
    use crate::pipe::RetryPolicy;
    use std::path::PathBuf;

    fn monitor(pipe_path: PathBuf, retry_policy: RetryPolicy) -> EventMonitor {
        let cancel_token = CancellationToken::new();
        let dispatcher = RecordingDispatcher::new(usize::MAX, cancel_token.clone());
        EventMonitor::new(
            MonitorConfig {
                pipe_path,
                startup_delay: Duration::from_millis(20),
                retry_policy,
                poll_interval: Duration::from_millis(1),
                max_record_len: 1024,
            },
            dispatcher,
            cancel_token,
        )
    }

    #[test]
    fn test_startup_window_is_ten_times_delay() {
        assert_eq!(startup_window(Duration::from_secs(1)), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_attach_reports_open_failure_within_window() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = monitor(
            dir.path().join("events.fifo"),
            RetryPolicy {
                max_attempts: 2,
                backoff: Duration::from_millis(1),
            },
        );

        let result = attach(monitor).await;
        assert!(matches!(result, Err(SupervisorError::StartupFailed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attach_treats_slow_failure_as_running() {
        let dir = tempfile::tempdir().unwrap();
        // retries outlast the 200ms startup window
        let monitor = monitor(
            dir.path().join("events.fifo"),
            RetryPolicy {
                max_attempts: 5,
                backoff: Duration::from_secs(1),
            },
        );

        let handle = attach(monitor).await.expect("attach should time out as success");
        assert!(matches!(
            handle.join().await,
            Err(SupervisorError::StartupFailed(MonitorError::Open(_)))
        ));
    }

    #[tokio::test]
    async fn test_attach_then_stop() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let monitor = monitor(file.path().to_path_buf(), RetryPolicy::default());

        let handle = attach(monitor).await.unwrap();
        assert!(!handle.is_finished());

        handle.stop();
        tokio::time::timeout(Duration::from_secs(5), handle.join())
            .await
            .expect("monitor didn't stop")
            .unwrap();
    }
}
