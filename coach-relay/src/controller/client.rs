//! HTTP client for the relay

use super::Analyzer;
use crate::api::{AnalyzeResponse, ErrorResponse};
use crate::prompt::InteractionRequest;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Timeout for the liveness probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for an analysis call
pub const ANALYZE_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors talking to the relay
#[derive(Error, Debug)]
pub enum RelayClientError {
    /// Transport failure or timeout
    #[error("Relay unreachable: {0}")]
    Unreachable(String),

    /// The relay answered with an actionable error body
    #[error("Relay returned {status}: {}", .body.message)]
    Rejected { status: u16, body: ErrorResponse },

    /// Non-2xx without a usable body
    #[error("Relay returned unexpected status {0}")]
    UnexpectedStatus(u16),

    #[error("Relay response could not be decoded: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for RelayClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RelayClientError::InvalidResponse(e.to_string())
        } else {
            RelayClientError::Unreachable(e.to_string())
        }
    }
}

/// Client for a running relay
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: Client,
    base_url: String,
    probe_timeout: Duration,
    analyze_timeout: Duration,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            probe_timeout: PROBE_TIMEOUT,
            analyze_timeout: ANALYZE_TIMEOUT,
        }
    }

    /// Override the liveness-probe and analysis timeouts
    pub fn with_timeouts(mut self, probe: Duration, analyze: Duration) -> Self {
        self.probe_timeout = probe;
        self.analyze_timeout = analyze;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the relay answers `/health` within the probe timeout ([`PROBE_TIMEOUT`] by default)
    pub async fn probe(&self) -> bool {
        let result = self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(self.probe_timeout)
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Relay liveness probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl Analyzer for RelayClient {
    async fn analyze(
        &self,
        request: &InteractionRequest,
    ) -> Result<AnalyzeResponse, RelayClientError> {
        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .timeout(self.analyze_timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<AnalyzeResponse>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(body) if !body.message.trim().is_empty() => Err(RelayClientError::Rejected {
                status: status.as_u16(),
                body,
            }),
            _ => Err(RelayClientError::UnexpectedStatus(status.as_u16())),
        }
    }
}
