//! HTTP client for the Safe transaction service.
//!
//! Endpoints:
//! - GET /v1/safes/<address>/all-transactions/?executed=true&queued=false&trusted=true
//! - GET /v1/safes/<address>/creation/

use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use safe_types::{Address, Hex, Result, SafeError};

use crate::{map_transaction, parse_timestamp_ms, Page, ServiceTransaction, TransactionItem, TransactionKind};

/// Production transaction service for Base.
pub const BASE_TRANSACTION_SERVICE_URL: &str = "https://safe-transaction-base.safe.global/api";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SafeCreation {
    created: String,
    creator: Address,
    transaction_hash: Hex,
    #[serde(default)]
    factory_address: Option<Address>,
}

/// Transaction service client.
pub struct SafeHistoryClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
    max_pages: usize,
}

impl SafeHistoryClient {
    pub fn new(base_url: &str, timeout_ms: Option<u64>) -> Self {
        let timeout_ms = timeout_ms.unwrap_or(20_000);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_millis(timeout_ms),
            max_pages: 5,
        }
    }

    /// Follow at most `max_pages` `next` links per listing.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Fetch executed transactions for `safe`, newest first as served.
    pub async fn get_transactions(&self, safe: &Address) -> Result<Vec<TransactionItem>> {
        let mut url = format!(
            "{}/v1/safes/{}/all-transactions/?executed=true&queued=false&trusted=true",
            self.base_url, safe
        );
        debug!(%safe, %url, "fetching Safe transactions");

        let mut items = Vec::new();
        for _ in 0..self.max_pages {
            let resp = self.client
                .get(&url)
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| SafeError::Other(format!("transaction service request failed: {}", e)))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                warn!(%status, %body, "transaction service returned an error");
                return Err(SafeError::Other(format!(
                    "failed to fetch data from transaction service: status {}",
                    status
                )));
            }

            let page: Page<serde_json::Value> = resp
                .json()
                .await
                .map_err(|e| SafeError::Other(format!("failed to parse transaction page: {}", e)))?;

            for entry in page.results {
                match serde_json::from_value::<ServiceTransaction>(entry) {
                    Ok(tx) => items.extend(map_transaction(&tx, safe)),
                    Err(e) => warn!(%safe, error = %e, "skipping unreadable transaction entry"),
                }
            }

            match page.next {
                Some(next) => url = next,
                None => break,
            }
        }

        info!(%safe, count = items.len(), "fetched executed transactions");
        Ok(items)
    }

    /// Executed transactions followed by the creation transaction.
    pub async fn get_history(&self, safe: &Address) -> Result<Vec<TransactionItem>> {
        let mut items = self.get_transactions(safe).await?;
        match self.get_creation(safe).await {
            Ok(Some(creation)) if !items.iter().any(|i| i.hash == creation.hash) => items.push(creation),
            Ok(_) => {}
            Err(e) => warn!(%safe, error = %e, "creation lookup failed"),
        }
        Ok(items)
    }

    /// The Safe's creation transaction, if the service knows it.
    pub async fn get_creation(&self, safe: &Address) -> Result<Option<TransactionItem>> {
        let url = format!("{}/v1/safes/{}/creation/", self.base_url, safe);

        let resp = self.client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SafeError::Other(format!("transaction service request failed: {}", e)))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(SafeError::Other(format!(
                "transaction service returned status {}",
                resp.status()
            )));
        }

        let creation: SafeCreation = resp
            .json()
            .await
            .map_err(|e| SafeError::Other(format!("failed to parse creation info: {}", e)))?;

        Ok(parse_timestamp_ms(&creation.created).map(|timestamp| TransactionItem {
            kind: TransactionKind::Creation,
            hash: creation.transaction_hash,
            timestamp,
            from: Some(creation.creator),
            to: creation.factory_address,
            value: None,
            token_address: None,
            token_symbol: None,
            token_decimals: None,
            method_name: None,
        }))
    }
}
