//! Search request representation.

use serde::{Deserialize, Serialize};

use crate::{Result, ScrapeError};

/// A keyword search over the first `pages` result pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The search keyword.
    pub keyword: String,
    /// Number of result pages to scrape (1-indexed, at least 1).
    pub pages: u32,
    /// Overrides the configured article-body enrichment for this request.
    #[serde(default)]
    pub fetch_content: Option<bool>,
}

impl SearchRequest {
    /// Creates a request for the first page of results.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            pages: 1,
            fetch_content: None,
        }
    }

    /// Sets the number of pages.
    pub fn with_pages(mut self, pages: u32) -> Self {
        self.pages = pages;
        self
    }

    /// Enables or disables article-body enrichment for this request.
    pub fn with_fetch_content(mut self, fetch_content: bool) -> Self {
        self.fetch_content = Some(fetch_content);
        self
    }

    /// Rejects an empty keyword or a page count below one.
    pub fn validate(&self) -> Result<()> {
        if self.keyword.trim().is_empty() {
            return Err(ScrapeError::InvalidRequest(
                "keyword must not be empty".into(),
            ));
        }
        if self.pages < 1 {
            return Err(ScrapeError::InvalidRequest(
                "pages must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
