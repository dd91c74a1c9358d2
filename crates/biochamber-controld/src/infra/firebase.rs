//! Realtime-database REST store
//!
//! Readings are fetched with `GET {base}/{readings_path}.json`; directives
//! are written with `PATCH {base}/{directives_path}.json`, which only
//! replaces the fields present in the body.

use std::time::Duration;

use async_trait::async_trait;
use biochamber_common::{ControlCyclePayload, DecodedReading, SensorReading};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::store::{ControlStore, StoreError};
use crate::config::StoreSettings;

/// REST client for a Firebase-style realtime database
pub struct FirebaseStore {
    client: Client,
    readings_url: String,
    directives_url: String,
    auth: Option<String>,
    timeout: Duration,
}

impl FirebaseStore {
    pub fn new(settings: &StoreSettings) -> Result<Self, StoreError> {
        let timeout = Duration::from_millis(settings.request_timeout_ms);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            readings_url: node_url(&settings.base_url, &settings.readings_path),
            directives_url: node_url(&settings.base_url, &settings.directives_path),
            auth: settings.auth.clone(),
            timeout,
        })
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    fn map_error(&self, err: reqwest::Error) -> StoreError {
        if err.is_timeout() {
            StoreError::Timeout(self.timeout)
        } else {
            StoreError::Request(err.to_string())
        }
    }
}

/// `{base}/{path}.json` with exactly one slash between the parts
pub fn node_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}.json",
        base.trim_end_matches('/'),
        path.trim_matches('/').trim_end_matches(".json")
    )
}

/// Decode a response body; an unparseable body counts as malformed, not absent
pub fn decode_body(body: &[u8]) -> Option<DecodedReading> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => SensorReading::decode(&value),
        Err(e) => {
            warn!(error = %e, "Reading body is not JSON");
            Some(DecodedReading::unreadable())
        }
    }
}

#[async_trait]
impl ControlStore for FirebaseStore {
    #[instrument(skip(self), fields(url = %self.readings_url))]
    async fn fetch_reading(&self) -> Result<Option<DecodedReading>, StoreError> {
        let response = self
            .with_auth(self.client.get(&self.readings_url))
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                path: self.readings_url.clone(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.map_error(e))?;
        debug!(bytes = body.len(), "Fetched reading");
        Ok(decode_body(&body))
    }

    #[instrument(skip(self, payload), fields(url = %self.directives_url, cycle = payload.cycle))]
    async fn push_payload(&self, payload: &ControlCyclePayload) -> Result<(), StoreError> {
        let response = self
            .with_auth(self.client.patch(&self.directives_url))
            .json(&payload.store_document())
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                path: self.directives_url.clone(),
            });
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.readings_url.clone()
    }
}
