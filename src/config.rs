//! Scraper configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetcher_http::DEFAULT_USER_AGENT;
use crate::retry::RetryPolicy;
use crate::selectors::SelectorTable;
use crate::{Result, ScrapeError};

/// Where trending keywords are read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingSource {
    /// The site's JSON explore API.
    #[default]
    Api,
    /// An HTML page scraped with the `trending` selector.
    Html,
}

/// Configuration for the scraping pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Site origin; relative article links are resolved against it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the search endpoint, appended to `base_url`.
    #[serde(default = "default_search_path")]
    pub search_path: String,
    /// Absolute URL of the trending source.
    #[serde(default = "default_trending_url")]
    pub trending_url: String,
    /// Format of the trending source.
    #[serde(default)]
    pub trending_source: TrendingSource,
    /// User agent sent upstream.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-fetch timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Deadline for one search or trending lookup in seconds. Fetches still
    /// pending when it passes are abandoned and reported as timed out.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Maximum fetches in flight for one search.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Whether article bodies are fetched by default.
    #[serde(default = "default_fetch_content")]
    pub fetch_content: bool,
    /// Whether repeated article URLs across pages are dropped.
    #[serde(default)]
    pub dedup: bool,
    /// Retry policy wrapped around the fetcher.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Markup selectors.
    #[serde(default)]
    pub selectors: SelectorTable,
}

fn default_base_url() -> String {
    "https://www.detik.com".to_string()
}

fn default_search_path() -> String {
    "/search/searchall".to_string()
}

fn default_trending_url() -> String {
    "https://explore-api.detik.com/trending".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    60
}

fn default_max_concurrency() -> usize {
    4
}

fn default_fetch_content() -> bool {
    true
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_path: default_search_path(),
            trending_url: default_trending_url(),
            trending_source: TrendingSource::Api,
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
            request_timeout_secs: default_request_timeout(),
            max_concurrency: default_max_concurrency(),
            fetch_content: default_fetch_content(),
            dedup: false,
            retry: RetryPolicy::default(),
            selectors: SelectorTable::default(),
        }
    }
}

impl ScraperConfig {
    /// Loads a configuration from a JSON file; absent fields take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScrapeError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| ScrapeError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Checks values that would otherwise fail later at request time.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(ScrapeError::Config("max_concurrency must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ScrapeError::Config("timeout_secs must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ScrapeError::Config("request_timeout_secs must be at least 1".into()));
        }
        self.base()?;
        self.search_url()?;
        Url::parse(&self.trending_url)?;
        self.selectors.compile()?;
        Ok(())
    }

    /// Parsed site origin.
    pub fn base(&self) -> Result<Url> {
        let base = Url::parse(&self.base_url)?;
        if base.cannot_be_a_base() {
            return Err(ScrapeError::Config(format!(
                "base_url {:?} cannot be used as a base",
                self.base_url
            )));
        }
        Ok(base)
    }

    /// Absolute URL of the search endpoint, without query.
    pub fn search_url(&self) -> Result<Url> {
        Ok(self.base()?.join(&self.search_path)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
