//! HTTP client for the backend payload endpoint.
//!
//! Endpoints:
//! - POST /safe/deployment-payload  { "owner": "0x..." }

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use safe_types::{Address, Result, SafeError};

use crate::{DeploymentPayload, PayloadService};

#[derive(Debug, Serialize)]
struct PayloadRequestBody<'a> {
    owner: &'a Address,
}

/// Backend client that produces deployment payloads.
pub struct PayloadClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl PayloadClient {
    pub fn new(base_url: &str, timeout_ms: Option<u64>) -> Self {
        let timeout_ms = timeout_ms.unwrap_or(30_000);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

#[async_trait]
impl PayloadService for PayloadClient {
    /// POST /safe/deployment-payload
    async fn get_deployment_payload(&self, owner: &Address) -> Result<DeploymentPayload> {
        let url = format!("{}/safe/deployment-payload", self.base_url);
        debug!(%owner, %url, "requesting Safe deployment payload");

        let resp = self.client
            .post(&url)
            .json(&PayloadRequestBody { owner })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SafeError::Other(format!("payload request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, %body, "payload service returned an error");
            return Err(SafeError::Other(format!(
                "payload service returned status {}: {}",
                status, body
            )));
        }

        let payload: DeploymentPayload = resp
            .json()
            .await
            .map_err(|e| SafeError::Other(format!("failed to parse payload response: {}", e)))?;

        debug!(predicted = %payload.predicted_address, "Safe payload received");
        Ok(payload)
    }
}
