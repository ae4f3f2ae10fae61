// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Daily upload of the node's operations log to the collecting-data service.

use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::path::PathBuf;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use crate::config::Config;
use crate::errors::UploadError;
use crate::http_utils::{client_or_default, endpoint_url};

pub const LOG_ENDPOINT: &str = "/api/v1/log/";
const UPLOAD_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);
const FILE_FIELD: &str = "file";

pub struct LogUploader {
    log_path: PathBuf,
    url: String,
    client: reqwest::Client,
}

impl LogUploader {
    pub fn new(config: &Config) -> Self {
        Self::with_target(config.operations_log_path(), &config.collector_url())
    }

    pub fn with_target(log_path: PathBuf, base_url: &str) -> Self {
        LogUploader {
            log_path,
            url: endpoint_url(base_url, LOG_ENDPOINT),
            client: client_or_default(),
        }
    }

    /// Uploads the log once a day, at local midnight. Never returns.
    pub async fn run(self) {
        sleep(duration_until_next_midnight(Local::now())).await;
        loop {
            match self.upload().await {
                Ok(()) => info!("Uploading node log file was accepted by daily task"),
                Err(e) => error!("Can't upload node log file: {e}"),
            }
            sleep(UPLOAD_PERIOD).await;
        }
    }

    /// Sends the log file as a multipart form. Only `200 OK` counts as accepted.
    pub async fn upload(&self) -> Result<(), UploadError> {
        let contents = tokio::fs::read(&self.log_path)
            .await
            .map_err(|source| UploadError::Read {
                path: self.log_path.clone(),
                source,
            })?;
        let file_name = self
            .log_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let form = Form::new().part(FILE_FIELD, Part::bytes(contents).file_name(file_name));
        let response = self.client.post(&self.url).multipart(form).send().await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(UploadError::UnexpectedStatus(status)),
        }
    }
}

/// Time left until the next local midnight; a full day when `now` is exactly midnight.
pub fn duration_until_next_midnight<Tz: TimeZone>(now: DateTime<Tz>) -> Duration {
    let next_midnight = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .zip(NaiveTime::from_hms_opt(0, 0, 0))
        .map(|(day, time)| day.and_time(time))
        .and_then(|midnight| now.timezone().from_local_datetime(&midnight).earliest());

    match next_midnight {
        Some(midnight) => (midnight - now).to_std().unwrap_or(UPLOAD_PERIOD),
        None => UPLOAD_PERIOD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mockito::{Matcher, Server};
    use std::io::Write;

    #[test]
    fn test_duration_until_next_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 18, 30, 0).unwrap();
        assert_eq!(
            duration_until_next_midnight(now),
            Duration::from_secs(5 * 60 * 60 + 30 * 60)
        );
    }

    #[test]
    fn test_duration_at_midnight_is_full_day() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(duration_until_next_midnight(now), UPLOAD_PERIOD);
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_file() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/log/")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data; boundary=".to_string()),
            )
            .match_body(Matcher::Regex(
                "name=\"file\"; filename=\"operations.log\"[\\s\\S]*node started".to_string(),
            ))
            .with_status(200)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("operations.log");
        let mut file = std::fs::File::create(&log_path).unwrap();
        file.write_all(b"node started\n").unwrap();

        let uploader = LogUploader::with_target(log_path, &server.url());
        uploader.upload().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_rejected_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/log/")
            .with_status(202)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("operations.log");
        std::fs::write(&log_path, b"line\n").unwrap();

        let uploader = LogUploader::with_target(log_path, &server.url());
        assert!(matches!(
            uploader.upload().await,
            Err(UploadError::UnexpectedStatus(StatusCode::ACCEPTED))
        ));
    }

    #[tokio::test]
    async fn test_upload_missing_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let uploader =
            LogUploader::with_target(dir.path().join("operations.log"), "http://127.0.0.1:1");
        assert!(matches!(
            uploader.upload().await,
            Err(UploadError::Read { .. })
        ));
    }
}
