//! # detik-scraper
//!
//! Scrapes keyword search results and trending keywords from detik.com and
//! serves them as JSON.
//!
//! The library is a small fetch-parse-aggregate pipeline:
//!
//! - A [`PageFetcher`] retrieves pages (plain HTTP, optionally with bounded retries)
//! - Pure extractors turn markup into [`ArticleRecord`]s and keyword lists
//! - [`SearchPipeline`] fetches result pages concurrently and keeps page order
//! - [`api`] exposes the pipeline over axum
//!
//! ## Example
//!
//! ```rust,no_run
//! use detik_scraper::{ScraperConfig, SearchPipeline, SearchRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pipeline = SearchPipeline::from_config(&ScraperConfig::default())?;
//!
//!     let request = SearchRequest::new("teknologi").with_pages(2);
//!     let outcome = pipeline.search(&request).await?;
//!
//!     for article in outcome.items() {
//!         println!("{}: {}", article.title, article.url);
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod query;
mod result;
mod search;

pub mod api;
pub mod config;
pub mod extract;
pub mod fetcher;
pub mod fetcher_http;
pub mod retry;
pub mod selectors;

pub use config::{ScraperConfig, TrendingSource};
pub use error::{FetchError, FetchErrorKind, Result, ScrapeError};
pub use fetcher::{FetchResult, Page, PageFetcher};
pub use fetcher_http::HttpFetcher;
pub use query::SearchRequest;
pub use result::{ArticleRecord, PageFailure, SearchOutcome, SearchStatus};
pub use retry::{RetryPolicy, RetryingFetcher};
pub use search::SearchPipeline;
pub use selectors::{CompiledSelectors, SelectorTable};
