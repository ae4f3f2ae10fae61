// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Errors raised while turning a raw events line into a [`crate::event::RawEvent`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("event line is not valid UTF-8")]
    InvalidUtf8,
    #[error("can't parse event code '{0}'")]
    InvalidOpcode(String),
}

/// Structural problems found while building a payload out of a decoded event.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("unexpected event type {0}")]
    UnknownOpcode(i64),
    #[error("invalid tokens count on opcode {opcode}: got {got}, expected {expected}")]
    TokenCount {
        opcode: i64,
        got: usize,
        expected: &'static str,
    },
    #[error("invalid {field} '{value}' on opcode {opcode}")]
    InvalidNumber {
        opcode: i64,
        field: &'static str,
        value: String,
    },
    #[error("topology declares {declared} neighbors but {available} tokens follow")]
    NeighborCountMismatch { declared: usize, available: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum PipeError {
    #[error("can't open {} for reading after {attempts} attempts: {source}", .path.display())]
    RetriesExhausted {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error(transparent)]
    Open(#[from] PipeError),
}

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("can't start events receiving from the node: {0}")]
    StartupFailed(#[source] MonitorError),
    #[error("events monitor exited during startup")]
    ExitedEarly,
    #[error("events monitor task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("can't read configuration {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("can't parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("can't read log file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("can't send log file: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("wrong http response {0}")]
    UnexpectedStatus(reqwest::StatusCode),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_error_display_names_opcode_and_count() {
        let error = RouteError::TokenCount {
            opcode: 1,
            got: 2,
            expected: "exactly 3",
        };
        assert_eq!(
            error.to_string(),
            "invalid tokens count on opcode 1: got 2, expected exactly 3"
        );
    }

    #[test]
    fn test_pipe_error_display_names_path() {
        let error = PipeError::RetriesExhausted {
            path: PathBuf::from("/node/fifo/events.fifo"),
            attempts: 5,
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let message = error.to_string();
        assert!(message.contains("/node/fifo/events.fifo"));
        assert!(message.contains("after 5 attempts"));
    }
}
