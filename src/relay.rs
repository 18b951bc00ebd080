//! Upstream dispatch for chat completion requests.
//!
//! Owns the HTTP client and the resolved upstream endpoint. A dispatch is a
//! single POST with bearer auth; the successful response is handed back live
//! so its body can be streamed to the caller without buffering.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::server::error::RelayError;

pub struct UpstreamClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig, connect_timeout: Duration) -> anyhow::Result<Self> {
        // Connect timeout only: relayed bodies are long-lived streams, so a
        // total request deadline would cut them off.
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// POST the payload upstream and return the live response for streaming.
    ///
    /// Transport failures map to [`RelayError::Internal`] (HTTP 500 at the
    /// edge); a non-2xx upstream status maps to [`RelayError::Upstream`]
    /// carrying that status and whatever body text could be read.
    pub async fn dispatch(&self, payload: &Value) -> Result<reqwest::Response, RelayError> {
        let response = self
            .http
            .post(&self.config.base_url)
            .bearer_auth(&self.config.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|err| RelayError::Internal(err.into()))?;

        let status = response.status();
        if !status.is_success() {
            // Best-effort body read; an unreadable or empty body falls back
            // to the status line's canonical reason.
            let text = response.text().await.unwrap_or_default();
            let status =
                StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
            let detail = if text.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("upstream failure")
                    .to_string()
            } else {
                text
            };
            return Err(RelayError::Upstream { status, detail });
        }

        debug!(status = status.as_u16(), "upstream accepted request");
        Ok(response)
    }
}
