//! HTTP-based page fetcher using reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{FetchError, FetchErrorKind};
use crate::fetcher::{FetchResult, Page, PageFetcher};
use crate::Result;

/// Browser-like user agent; the upstream serves reduced markup to unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A page fetcher that uses plain HTTP GET requests via reqwest.
///
/// The client is owned by the fetcher and shares one connection pool across
/// clones, so a single instance can serve the whole process.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the given user agent and per-request timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(%url, status = status.as_u16(), "Upstream returned non-success status");
            return Err(FetchError::new(url, FetchErrorKind::Status(status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;
        debug!(%url, bytes = body.len(), "Fetched page");

        Ok(Page::new(url, body))
    }
}
