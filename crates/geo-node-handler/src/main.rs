// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, process::ExitCode, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use geo_node_events::{
    config::Config,
    dispatcher::Dispatcher,
    log_uploader::LogUploader,
    monitor::{EventMonitor, MonitorConfig},
    supervisor::{self, MonitorHandle},
};

#[tokio::main]
pub async fn main() -> ExitCode {
    let log_level = env::var("GEO_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match Config::new() {
        Ok(c) => c,
        Err(e) => {
            error!("Settings can't be loaded: {e}");
            return ExitCode::FAILURE;
        }
    };

    let monitor_handle = if config.service.send_events {
        match start_events_monitor(&config).await {
            Some(handle) => Some(handle),
            None => return ExitCode::FAILURE,
        }
    } else {
        info!("events sending disabled");
        None
    };

    if config.service.send_logs {
        let uploader = LogUploader::new(&config);
        tokio::spawn(uploader.run());
    } else {
        info!("log uploading disabled");
    }

    info!("Handler started");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for shutdown signal: {e}");
    }
    info!("Shutting down handler");

    if let Some(handle) = monitor_handle {
        handle.stop();
        if let Err(e) = handle.join().await {
            error!("Events monitor finished with error: {e}");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

async fn start_events_monitor(config: &Config) -> Option<MonitorHandle> {
    let node_dir = &config.handler.node_dir_path;
    if let Err(e) = std::fs::metadata(node_dir) {
        error!(
            "Can't find node, there is no node folder {}: {e}",
            node_dir.display()
        );
        return None;
    }

    let monitor = EventMonitor::new(
        MonitorConfig::new(config),
        Arc::new(Dispatcher::new(config)),
        CancellationToken::new(),
    );

    match supervisor::attach(monitor).await {
        Ok(handle) => {
            info!("Attached to node at {}", node_dir.display());
            Some(handle)
        }
        Err(e) => {
            error!("Can't attach to the node: {e}");
            None
        }
    }
}
