//! HTTP client for the backend relay endpoints.
//!
//! Endpoints:
//! - POST /safe/relay-sponsored-transaction
//! - GET /safe/task-status?taskId=<task_id>

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use safe_types::{Result, SafeError};

use crate::{RelayService, SignedRelayRequest, TaskHandle, TaskStatus, TaskStatusService};

/// Relay client for submitting sponsored transactions and polling their tasks.
pub struct RelayClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl RelayClient {
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
impl RelayService for RelayClient {
    /// POST /safe/relay-sponsored-transaction
    async fn relay_sponsored_transaction(&self, signed: SignedRelayRequest) -> Result<TaskHandle> {
        let url = format!("{}/safe/relay-sponsored-transaction", self.base_url);

        let resp = self.client
            .post(&url)
            .json(&signed)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SafeError::Other(format!("relay request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, %body, "relay rejected sponsored transaction");
            return Err(SafeError::Other(format!(
                "relay returned status {}: {}",
                status, body
            )));
        }

        let handle: TaskHandle = resp
            .json()
            .await
            .map_err(|e| SafeError::Other(format!("failed to parse relay response: {}", e)))?;

        if handle.task_id.is_empty() {
            return Err(SafeError::Other("relay returned an empty task id".into()));
        }

        debug!(task_id = %handle.task_id, "relay accepted sponsored transaction");
        Ok(handle)
    }
}

#[async_trait]
impl TaskStatusService for RelayClient {
    /// GET /safe/task-status?taskId=<task_id>
    async fn get_task_status(&self, task: &TaskHandle) -> Result<TaskStatus> {
        let url = format!("{}/safe/task-status", self.base_url);

        let resp = self.client
            .get(&url)
            .query(&[("taskId", task.task_id.as_str())])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SafeError::Other(format!("task status request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(SafeError::Other(format!(
                "task status returned status {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| SafeError::Other(format!("failed to parse task status: {}", e)))
    }
}
