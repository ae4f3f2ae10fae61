// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use tracing::error;

const USER_AGENT: &str = concat!("geo-node-handler/", env!("CARGO_PKG_VERSION"));

/// Builds the reqwest client shared by the event dispatcher and the log uploader.
/// No request timeout is set: calls rely on the transport defaults.
pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().user_agent(USER_AGENT).build()
}

/// Like [`build_client`], falling back to a default client when the builder fails.
pub fn client_or_default() -> reqwest::Client {
    build_client().unwrap_or_else(|e| {
        error!("Unable to build HTTP client: {e}, using default client");
        reqwest::Client::new()
    })
}

/// Joins the collector base URL and an endpoint path without doubling the slash.
pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), endpoint)
}
