//! Bounded retry-with-backoff around a page fetcher.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fetcher::{FetchResult, PageFetcher};

/// Retry policy for transient upstream failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Extra attempts after the first one. Zero disables retries.
    #[serde(default)]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds; doubled on every retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound for a single delay in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_base_delay_ms() -> u64 {
    250
}

fn default_max_delay_ms() -> u64 {
    4_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Returns the delay to wait before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u64.checked_shl(retry.saturating_sub(1)).unwrap_or(u64::MAX);
        let ms = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(ms)
    }

    pub fn is_enabled(&self) -> bool {
        self.max_retries > 0
    }
}

/// A fetcher that retries transient failures of an inner fetcher.
///
/// Only timeouts, transport errors, 429 and 5xx statuses are retried; any
/// other status is returned immediately.
pub struct RetryingFetcher {
    inner: Arc<dyn PageFetcher>,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(inner: Arc<dyn PageFetcher>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl PageFetcher for RetryingFetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        let mut retry = 0;
        loop {
            match self.inner.fetch(url).await {
                Ok(page) => return Ok(page),
                Err(err) if retry < self.policy.max_retries && err.kind.is_transient() => {
                    retry += 1;
                    let delay = self.policy.delay_for(retry);
                    debug!(%url, retry, delay_ms = delay.as_millis() as u64, error = %err, "Retrying fetch");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    if retry > 0 {
                        warn!(%url, attempts = retry + 1, error = %err, "Fetch failed after retries");
                    }
                    return Err(err);
                }
            }
        }
    }
}
