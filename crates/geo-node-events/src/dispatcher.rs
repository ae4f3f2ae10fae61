// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Instant;
use tracing::{debug, error};

use crate::config::Config;
use crate::http_utils::{client_or_default, endpoint_url};
use crate::payload::Payload;

/// Publishes payloads to the collecting-data service.
///
/// Sending is fire-and-forget: failures are logged and the payload is dropped, so a slow or
/// unreachable collector never stalls the events pipeline.
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn send(&self, payload: &Payload);
}

#[derive(Clone)]
pub struct Dispatcher {
    base_url: String,
    client: reqwest::Client,
}

impl Dispatcher {
    pub fn new(config: &Config) -> Self {
        Self::with_base_url(config.collector_url())
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Dispatcher {
            base_url: base_url.into(),
            client: client_or_default(),
        }
    }
}

#[async_trait]
impl Dispatch for Dispatcher {
    async fn send(&self, payload: &Payload) {
        let url = endpoint_url(&self.base_url, payload.endpoint());
        let method = payload.method();
        debug!("Try send request: {method} {url}");

        let body = match serde_json::to_vec(payload) {
            Ok(body) => body,
            Err(e) => {
                error!("Can't marshal payload for {url}. Details: {e}");
                return;
            }
        };
        debug!("JSON: {}", String::from_utf8_lossy(&body));

        let time = Instant::now();
        let response = self
            .client
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await;
        let elapsed = time.elapsed();

        match response {
            Ok(r) => {
                let status = r.status();
                if status.is_success() {
                    debug!(
                        "Server response: {status} in {} ms for {method} {url}",
                        elapsed.as_millis()
                    );
                } else {
                    error!("Server response: {status} for {method} {url}");
                }
            }
            Err(e) => error!("Can't send request {method} {url}: {e}"),
        }
    }
}
