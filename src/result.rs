//! Scraped article records and aggregated search outcomes.

use serde::{Deserialize, Serialize};

/// A single search result entry scraped from the upstream site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Headline as displayed on the results page.
    pub title: String,
    /// Absolute article URL.
    pub url: String,
    /// Publication date as displayed by the site.
    pub published_at: String,
    /// Short description/snippet; empty when the entry has none.
    pub description: String,
    /// Full body text, when the article page was fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ArticleRecord {
    /// Creates a new record without body content.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        published_at: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            published_at: published_at.into(),
            description: description.into(),
            content: None,
        }
    }

    /// Returns a copy of this record carrying the given body content.
    pub fn with_content(mut self, content: Option<String>) -> Self {
        self.content = content;
        self
    }

    /// Returns a normalized URL for deduplication (without scheme and trailing slash).
    pub fn normalized_url(&self) -> String {
        let url = self
            .url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        url.to_lowercase()
    }
}

/// A results page that contributed nothing because its fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFailure {
    /// 1-based page index.
    pub page: u32,
    /// URL that was requested.
    pub url: String,
    /// Human readable failure reason.
    pub reason: String,
}

/// Overall health of an aggregated search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    /// Every requested page was fetched.
    Complete,
    /// Some pages failed; the articles come from the others.
    Partial,
    /// Every page failed. Distinct from a successful search with no hits.
    Unavailable,
}

impl SearchStatus {
    /// Derives the status from the number of requested and failed pages.
    pub fn from_counts(requested: u32, failed: usize) -> Self {
        if failed == 0 {
            SearchStatus::Complete
        } else if failed as u64 >= requested as u64 {
            SearchStatus::Unavailable
        } else {
            SearchStatus::Partial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStatus::Complete => "complete",
            SearchStatus::Partial => "partial",
            SearchStatus::Unavailable => "unavailable",
        }
    }
}

/// Aggregated result of a multi-page search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Articles in ascending page order, document order within a page.
    pub articles: Vec<ArticleRecord>,
    /// Pages whose fetch failed, in ascending page order.
    pub failed_pages: Vec<PageFailure>,
    /// Number of pages requested.
    pub pages_requested: u32,
    /// Aggregate status.
    pub status: SearchStatus,
    /// Search duration in milliseconds.
    pub duration_ms: u64,
}

impl SearchOutcome {
    pub fn new(
        articles: Vec<ArticleRecord>,
        failed_pages: Vec<PageFailure>,
        pages_requested: u32,
    ) -> Self {
        let status = SearchStatus::from_counts(pages_requested, failed_pages.len());
        Self {
            articles,
            failed_pages,
            pages_requested,
            status,
            duration_ms: 0,
        }
    }

    /// Returns the articles.
    pub fn items(&self) -> &[ArticleRecord] {
        &self.articles
    }

    /// Consumes the outcome, returning the articles.
    pub fn into_items(self) -> Vec<ArticleRecord> {
        self.articles
    }

    /// Returns the 1-based indexes of the pages that failed.
    pub fn failed_page_numbers(&self) -> Vec<u32> {
        self.failed_pages.iter().map(|f| f.page).collect()
    }

    /// Sets the search duration.
    pub fn set_duration(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
    }
}
