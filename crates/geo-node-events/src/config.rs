// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ConfigError;

const CONFIG_PATH_ENV: &str = "GEO_HANDLER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "conf.json";
const DEFAULT_EVENTS_FILE: &str = "events.fifo";
const DEFAULT_STARTUP_DELAY_SECS: u64 = 1;
const FIFO_DIR: &str = "fifo";
const OPERATIONS_LOG_FILE: &str = "operations.log";

#[derive(Debug, Clone, Deserialize)]
pub struct HandlerSettings {
    #[serde(rename = "node_path")]
    pub node_dir_path: PathBuf,
    #[serde(default = "default_events_file")]
    pub events_file: String,
    /// grace period for the node to open the events FIFO for writing, in seconds
    #[serde(default = "default_startup_delay_secs")]
    pub startup_delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSettings {
    #[serde(rename = "allow_send_events", default)]
    pub send_events: bool,
    #[serde(rename = "allow_send_logs", default)]
    pub send_logs: bool,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    /// Overrides `http://{host}:{port}` when set.
    #[serde(default)]
    pub url: Option<String>,
}

/// Handler settings, read once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub handler: HandlerSettings,
    #[serde(rename = "collecting_data_service")]
    pub service: ServiceSettings,
}

fn default_events_file() -> String {
    DEFAULT_EVENTS_FILE.to_string()
}

fn default_startup_delay_secs() -> u64 {
    DEFAULT_STARTUP_DELAY_SECS
}

impl Config {
    /// Loads the settings file named by `GEO_HANDLER_CONFIG`, `conf.json` by default.
    pub fn new() -> Result<Config, ConfigError> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(path)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Config, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn collector_url(&self) -> String {
        match &self.service.url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.service.host, self.service.port),
        }
    }

    pub fn events_pipe_path(&self) -> PathBuf {
        self.handler
            .node_dir_path
            .join(FIFO_DIR)
            .join(&self.handler.events_file)
    }

    pub fn operations_log_path(&self) -> PathBuf {
        self.handler.node_dir_path.join(OPERATIONS_LOG_FILE)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.handler.startup_delay_secs)
    }
}
