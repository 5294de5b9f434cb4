//! HTTP client for the backend onboarding endpoints.
//!
//! Endpoints:
//! - POST /onboarding/complete  { "primarySafeAddress": "0x..." }
//! - GET /onboarding/status

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use safe_types::{Address, Result, SafeError};

use crate::{OnboardingStatus, ProfileStore};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompleteOnboardingBody<'a> {
    primary_safe_address: &'a Address,
}

/// Profile client backed by the application API.
pub struct ProfileClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
    auth_token: Option<String>,
}

impl ProfileClient {
    pub fn new(base_url: &str, timeout_ms: Option<u64>) -> Self {
        let timeout_ms = timeout_ms.unwrap_or(20_000);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_millis(timeout_ms),
            auth_token: None,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl ProfileStore for ProfileClient {
    /// POST /onboarding/complete
    async fn complete_onboarding(&self, primary_safe_address: &Address) -> Result<()> {
        let url = format!("{}/onboarding/complete", self.base_url);

        let resp = self
            .authorize(self.client.post(&url))
            .json(&CompleteOnboardingBody { primary_safe_address })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SafeError::Other(format!("profile request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, %body, "profile service rejected onboarding completion");
            return Err(SafeError::Other(format!(
                "profile service returned status {}: {}",
                status, body
            )));
        }

        info!(safe = %primary_safe_address, "primary Safe saved to profile");
        Ok(())
    }

    /// GET /onboarding/status
    async fn onboarding_status(&self) -> Result<OnboardingStatus> {
        let url = format!("{}/onboarding/status", self.base_url);

        let resp = self
            .authorize(self.client.get(&url))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SafeError::Other(format!("profile request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(SafeError::Other(format!(
                "profile service returned status {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| SafeError::Other(format!("failed to parse onboarding status: {}", e)))
    }
}
