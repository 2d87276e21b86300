//! Search orchestration.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{ScraperConfig, TrendingSource};
use crate::error::{FetchError, FetchErrorKind};
use crate::extract::{extract_articles, extract_content, extract_trending, extract_trending_json};
use crate::fetcher::{FetchResult, PageFetcher};
use crate::fetcher_http::HttpFetcher;
use crate::retry::RetryingFetcher;
use crate::selectors::CompiledSelectors;
use crate::{ArticleRecord, PageFailure, Result, ScrapeError, SearchOutcome, SearchRequest};

/// Keyword search and trending pipeline over the upstream site.
///
/// Result pages are fetched concurrently, at most `max_concurrency` at a
/// time, and aggregated in ascending page order regardless of which fetch
/// completes first. A page whose fetch fails contributes nothing and is
/// reported in [`SearchOutcome::failed_pages`].
///
/// Every search runs against a deadline of `request_timeout`. Pages still
/// pending when it passes are reported as timed out and articles not yet
/// enriched keep `content = None`, so a slow upstream yields fewer results
/// rather than no response.
pub struct SearchPipeline {
    fetcher: Arc<dyn PageFetcher>,
    selectors: Arc<CompiledSelectors>,
    base: Url,
    search_url: Url,
    trending_url: String,
    trending_source: TrendingSource,
    max_concurrency: usize,
    fetch_content: bool,
    dedup: bool,
    request_timeout: Duration,
}

impl SearchPipeline {
    /// Creates a pipeline using the given fetcher.
    pub fn new(config: &ScraperConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            fetcher,
            selectors: Arc::new(config.selectors.compile()?),
            base: config.base()?,
            search_url: config.search_url()?,
            trending_url: config.trending_url.clone(),
            trending_source: config.trending_source,
            max_concurrency: config.max_concurrency,
            fetch_content: config.fetch_content,
            dedup: config.dedup,
            request_timeout: config.request_timeout(),
        })
    }

    /// Creates a pipeline with an HTTP fetcher built from the configuration,
    /// wrapped in a retrying fetcher when the retry policy is enabled.
    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        let http: Arc<dyn PageFetcher> =
            Arc::new(HttpFetcher::new(&config.user_agent, config.timeout())?);
        let fetcher: Arc<dyn PageFetcher> = if config.retry.is_enabled() {
            Arc::new(RetryingFetcher::new(http, config.retry.clone()))
        } else {
            http
        };
        Self::new(config, fetcher)
    }

    /// Builds the URL of one results page.
    pub fn page_url(&self, keyword: &str, page: u32) -> String {
        format!(
            "{}?query={}&page={}",
            self.search_url,
            urlencoding::encode(keyword.trim()),
            page
        )
    }

    /// Runs a keyword search over pages `1..=request.pages`, bounded by the
    /// configured request deadline.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome> {
        self.search_until(request, Instant::now() + self.request_timeout).await
    }

    /// Runs a keyword search that stops waiting on upstream at `deadline`.
    pub async fn search_until(
        &self,
        request: &SearchRequest,
        deadline: Instant,
    ) -> Result<SearchOutcome> {
        request.validate()?;

        let start = Instant::now();
        let keyword = request.keyword.trim();
        debug!(keyword, pages = request.pages, "Searching");

        let fetched: Vec<_> = stream::iter(1..=request.pages)
            .map(|page| {
                let url = self.page_url(keyword, page);
                async move {
                    let result = self.fetch_until(&url, deadline).await;
                    (page, url, result)
                }
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut articles = Vec::new();
        let mut failed_pages = Vec::new();

        for (page, url, result) in fetched {
            match result {
                Ok(fetched_page) => {
                    let found = extract_articles(&fetched_page.body, &self.selectors, &self.base);
                    debug!(page, count = found.len(), "Extracted articles");
                    articles.extend(found);
                }
                Err(e) => {
                    warn!(page, %url, error = %e, "Skipping results page");
                    failed_pages.push(PageFailure {
                        page,
                        url,
                        reason: e.kind.to_string(),
                    });
                }
            }
        }

        if self.dedup {
            articles = dedup_by_url(articles);
        }

        if request.fetch_content.unwrap_or(self.fetch_content) {
            articles = self.enrich(articles, deadline).await;
        }

        let mut outcome = SearchOutcome::new(articles, failed_pages, request.pages);
        outcome.set_duration(start.elapsed().as_millis() as u64);

        info!(
            keyword,
            pages = request.pages,
            count = outcome.articles.len(),
            failed = outcome.failed_pages.len(),
            status = outcome.status.as_str(),
            duration_ms = outcome.duration_ms,
            "Search finished"
        );

        Ok(outcome)
    }

    /// Fills in the body content of each article, keeping input order.
    ///
    /// An article whose page cannot be fetched before `deadline` keeps
    /// `content = None`.
    pub async fn enrich(
        &self,
        articles: Vec<ArticleRecord>,
        deadline: Instant,
    ) -> Vec<ArticleRecord> {
        stream::iter(articles)
            .map(|article| async move {
                match self.fetch_until(&article.url, deadline).await {
                    Ok(page) => {
                        let content = extract_content(&page.body, &self.selectors);
                        article.with_content(content)
                    }
                    Err(e) => {
                        warn!(url = %article.url, error = %e, "Failed to fetch article content");
                        article
                    }
                }
            })
            .buffered(self.max_concurrency)
            .collect()
            .await
    }

    /// Fetches the current trending keywords, in the site's ranking order.
    pub async fn trending(&self) -> Result<Vec<String>> {
        let deadline = Instant::now() + self.request_timeout;
        let page = self
            .fetch_until(&self.trending_url, deadline)
            .await
            .map_err(|e| ScrapeError::Upstream(e.to_string()))?;

        let keywords = match self.trending_source {
            TrendingSource::Api => extract_trending_json(&page.body)?,
            TrendingSource::Html => extract_trending(&page.body, &self.selectors),
        };
        debug!(count = keywords.len(), "Fetched trending keywords");

        Ok(keywords)
    }

    /// Returns whether article bodies are fetched when a request does not say.
    pub fn fetches_content_by_default(&self) -> bool {
        self.fetch_content
    }

    async fn fetch_until(&self, url: &str, deadline: Instant) -> FetchResult {
        match timeout_at(deadline, self.fetcher.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::new(url, FetchErrorKind::Timeout)),
        }
    }
}

/// Drops later records whose normalized URL was already seen.
fn dedup_by_url(articles: Vec<ArticleRecord>) -> Vec<ArticleRecord> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|a| seen.insert(a.normalized_url()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::Page;
    use crate::SearchStatus;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves canned bodies by URL; unknown URLs are 404s.
    #[derive(Default)]
    struct MockFetcher {
        pages: HashMap<String, std::result::Result<String, FetchErrorKind>>,
        delays: HashMap<String, Duration>,
        requested: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl MockFetcher {
        fn with_page(mut self, url: &str, body: impl Into<String>) -> Self {
            self.pages.insert(url.to_string(), Ok(body.into()));
            self
        }

        fn with_failure(mut self, url: &str, kind: FetchErrorKind) -> Self {
            self.pages.insert(url.to_string(), Err(kind));
            self
        }

        fn with_delay(mut self, url: &str, delay: Duration) -> Self {
            self.delays.insert(url.to_string(), delay);
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }

        fn peak_in_flight(&self) -> usize {
            self.peak_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> FetchResult {
            self.requested.lock().unwrap().push(url.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(url) {
                tokio::time::sleep(*delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match self.pages.get(url) {
                Some(Ok(body)) => Ok(Page::new(url, body.clone())),
                Some(Err(kind)) => Err(FetchError::new(url, kind.clone())),
                None => Err(FetchError::new(url, FetchErrorKind::Status(404))),
            }
        }
    }

    fn config() -> ScraperConfig {
        ScraperConfig {
            fetch_content: false,
            ..Default::default()
        }
    }

    fn page_url(keyword: &str, page: u32) -> String {
        format!(
            "https://www.detik.com/search/searchall?query={}&page={}",
            urlencoding::encode(keyword),
            page
        )
    }

    fn results_page(prefix: &str, count: usize) -> String {
        let entries: String = (1..=count)
            .map(|i| {
                format!(
                    r#"<article><a href="https://news.detik.com/{p}-{i}"><h3 class="media__title">{p} {i}</h3></a>
                       <div class="media__date"><span title="Senin, 14 Okt 2024">x</span></div>
                       <div class="media__desc">desc {i}</div></article>"#,
                    p = prefix,
                    i = i
                )
            })
            .collect();
        format!("<html><body>{}</body></html>", entries)
    }

    fn pipeline(config: &ScraperConfig, fetcher: Arc<MockFetcher>) -> SearchPipeline {
        SearchPipeline::new(config, fetcher).unwrap()
    }

    #[test]
    fn test_page_url_encodes_keyword() {
        let p = pipeline(&config(), Arc::new(MockFetcher::default()));
        assert_eq!(
            p.page_url(" mobil listrik ", 2),
            "https://www.detik.com/search/searchall?query=mobil%20listrik&page=2"
        );
    }

    #[tokio::test]
    async fn test_search_empty_keyword_makes_no_requests() {
        let fetcher = Arc::new(MockFetcher::default());
        let p = pipeline(&config(), fetcher.clone());

        let result = p.search(&SearchRequest::new("").with_pages(5)).await;
        assert!(matches!(result, Err(ScrapeError::InvalidRequest(_))));
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_search_zero_pages_makes_no_requests() {
        let fetcher = Arc::new(MockFetcher::default());
        let p = pipeline(&config(), fetcher.clone());

        let result = p.search(&SearchRequest::new("teknologi").with_pages(0)).await;
        assert!(matches!(result, Err(ScrapeError::InvalidRequest(_))));
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_search_issues_one_fetch_per_page() {
        let fetcher = Arc::new(
            MockFetcher::default()
                .with_page(&page_url("teknologi", 1), results_page("a", 2))
                .with_page(&page_url("teknologi", 2), results_page("b", 3))
                .with_page(&page_url("teknologi", 3), results_page("c", 1)),
        );
        let p = pipeline(&config(), fetcher.clone());

        let outcome = p.search(&SearchRequest::new("teknologi").with_pages(3)).await.unwrap();

        let mut requested = fetcher.requested();
        requested.sort();
        assert_eq!(
            requested,
            vec![
                page_url("teknologi", 1),
                page_url("teknologi", 2),
                page_url("teknologi", 3)
            ]
        );
        assert_eq!(outcome.items().len(), 6);
        assert_eq!(outcome.status, SearchStatus::Complete);
    }

    #[tokio::test]
    async fn test_search_preserves_page_order_despite_completion_order() {
        let fetcher = Arc::new(
            MockFetcher::default()
                .with_page(&page_url("bola", 1), results_page("first", 2))
                .with_delay(&page_url("bola", 1), Duration::from_millis(80))
                .with_page(&page_url("bola", 2), results_page("second", 2))
                .with_delay(&page_url("bola", 2), Duration::from_millis(40))
                .with_page(&page_url("bola", 3), results_page("third", 2)),
        );
        let p = pipeline(&config(), fetcher);

        let outcome = p.search(&SearchRequest::new("bola").with_pages(3)).await.unwrap();
        let titles: Vec<_> = outcome.items().iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["first 1", "first 2", "second 1", "second 2", "third 1", "third 2"]
        );
    }

    #[tokio::test]
    async fn test_search_skips_failed_pages() {
        let fetcher = Arc::new(
            MockFetcher::default()
                .with_page(&page_url("banjir", 1), results_page("a", 2))
                .with_failure(&page_url("banjir", 2), FetchErrorKind::Timeout)
                .with_page(&page_url("banjir", 3), results_page("c", 1)),
        );
        let p = pipeline(&config(), fetcher);

        let outcome = p.search(&SearchRequest::new("banjir").with_pages(3)).await.unwrap();
        assert_eq!(outcome.items().len(), 3);
        assert_eq!(outcome.status, SearchStatus::Partial);
        assert_eq!(outcome.failed_page_numbers(), vec![2]);
        assert_eq!(outcome.failed_pages[0].reason, "timed out");
    }

    #[tokio::test]
    async fn test_search_all_pages_fail_is_unavailable_not_error() {
        let fetcher = Arc::new(MockFetcher::default());
        let p = pipeline(&config(), fetcher);

        let outcome = p.search(&SearchRequest::new("gempa").with_pages(2)).await.unwrap();
        assert!(outcome.items().is_empty());
        assert_eq!(outcome.status, SearchStatus::Unavailable);
        assert_eq!(outcome.failed_page_numbers(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_search_no_results_is_complete() {
        let fetcher = Arc::new(
            MockFetcher::default().with_page(&page_url("xyzzy", 1), "<html><body></body></html>"),
        );
        let p = pipeline(&config(), fetcher);

        let outcome = p.search(&SearchRequest::new("xyzzy")).await.unwrap();
        assert!(outcome.items().is_empty());
        assert_eq!(outcome.status, SearchStatus::Complete);
    }

    #[tokio::test]
    async fn test_search_keeps_duplicates_by_default() {
        let fetcher = Arc::new(
            MockFetcher::default()
                .with_page(&page_url("pemilu", 1), results_page("same", 2))
                .with_page(&page_url("pemilu", 2), results_page("same", 2)),
        );
        let p = pipeline(&config(), fetcher);

        let outcome = p.search(&SearchRequest::new("pemilu").with_pages(2)).await.unwrap();
        assert_eq!(outcome.items().len(), 4);
    }

    #[tokio::test]
    async fn test_search_dedup_keeps_first_occurrence() {
        let fetcher = Arc::new(
            MockFetcher::default()
                .with_page(&page_url("pemilu", 1), results_page("same", 2))
                .with_page(&page_url("pemilu", 2), results_page("same", 3)),
        );
        let config = ScraperConfig {
            dedup: true,
            ..config()
        };
        let p = pipeline(&config, fetcher);

        let outcome = p.search(&SearchRequest::new("pemilu").with_pages(2)).await.unwrap();
        let titles: Vec<_> = outcome.items().iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["same 1", "same 2", "same 3"]);
    }

    #[tokio::test]
    async fn test_search_enriches_content() {
        let body = r#"<div class="detail__body-text"><p>Isi berita.</p></div>"#;
        let fetcher = Arc::new(
            MockFetcher::default()
                .with_page(&page_url("ekonomi", 1), results_page("e", 2))
                .with_page("https://news.detik.com/e-1", body),
        );
        let p = pipeline(&config(), fetcher);

        let request = SearchRequest::new("ekonomi").with_fetch_content(true);
        let outcome = p.search(&request).await.unwrap();

        assert_eq!(outcome.items().len(), 2);
        assert_eq!(outcome.items()[0].content.as_deref(), Some("Isi berita."));
        // e-2 has no canned page, so its fetch fails and content stays empty.
        assert!(outcome.items()[1].content.is_none());
        assert_eq!(outcome.status, SearchStatus::Complete);
    }

    #[tokio::test]
    async fn test_search_content_default_follows_config() {
        let fetcher = Arc::new(
            MockFetcher::default().with_page(&page_url("ekonomi", 1), results_page("e", 1)),
        );
        let p = pipeline(&config(), fetcher.clone());
        assert!(!p.fetches_content_by_default());

        p.search(&SearchRequest::new("ekonomi")).await.unwrap();
        assert_eq!(fetcher.requested().len(), 1);
    }

    #[tokio::test]
    async fn test_search_respects_max_concurrency() {
        let mut fetcher = MockFetcher::default();
        for page in 1..=10 {
            let url = page_url("cuaca", page);
            fetcher = fetcher
                .with_page(&url, results_page(&format!("p{}", page), 1))
                .with_delay(&url, Duration::from_millis(20));
        }
        let fetcher = Arc::new(fetcher);
        let config = ScraperConfig {
            max_concurrency: 2,
            ..config()
        };
        let p = pipeline(&config, fetcher.clone());

        let outcome = p.search(&SearchRequest::new("cuaca").with_pages(10)).await.unwrap();

        assert_eq!(outcome.items().len(), 10);
        assert_eq!(fetcher.requested().len(), 10);
        assert!(fetcher.peak_in_flight() <= 2, "peak {}", fetcher.peak_in_flight());
        assert_eq!(fetcher.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_enrich_respects_max_concurrency() {
        let body = r#"<div class="detail__body-text"><p>Isi.</p></div>"#;
        let mut fetcher =
            MockFetcher::default().with_page(&page_url("cuaca", 1), results_page("c", 8));
        for i in 1..=8 {
            let url = format!("https://news.detik.com/c-{}", i);
            fetcher = fetcher
                .with_page(&url, body)
                .with_delay(&url, Duration::from_millis(20));
        }
        let fetcher = Arc::new(fetcher);
        let config = ScraperConfig {
            max_concurrency: 3,
            ..config()
        };
        let p = pipeline(&config, fetcher.clone());

        let request = SearchRequest::new("cuaca").with_fetch_content(true);
        let outcome = p.search(&request).await.unwrap();

        assert_eq!(outcome.items().len(), 8);
        assert!(outcome.items().iter().all(|a| a.content.as_deref() == Some("Isi.")));
        assert!(fetcher.peak_in_flight() <= 3, "peak {}", fetcher.peak_in_flight());
    }

    #[tokio::test]
    async fn test_search_deadline_keeps_finished_pages() {
        let fetcher = Arc::new(
            MockFetcher::default()
                .with_page(&page_url("macet", 1), results_page("cepat", 2))
                .with_page(&page_url("macet", 2), results_page("lambat", 2))
                .with_delay(&page_url("macet", 2), Duration::from_secs(5)),
        );
        let p = pipeline(&config(), fetcher);

        let deadline = Instant::now() + Duration::from_millis(200);
        let outcome = p
            .search_until(&SearchRequest::new("macet").with_pages(2), deadline)
            .await
            .unwrap();

        let titles: Vec<_> = outcome.items().iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["cepat 1", "cepat 2"]);
        assert_eq!(outcome.status, SearchStatus::Partial);
        assert_eq!(outcome.failed_page_numbers(), vec![2]);
        assert_eq!(outcome.failed_pages[0].reason, "timed out");
    }

    #[tokio::test]
    async fn test_search_deadline_leaves_slow_content_empty() {
        let body = r#"<div class="detail__body-text"><p>Isi.</p></div>"#;
        let fetcher = Arc::new(
            MockFetcher::default()
                .with_page(&page_url("macet", 1), results_page("m", 2))
                .with_page("https://news.detik.com/m-1", body)
                .with_page("https://news.detik.com/m-2", body)
                .with_delay("https://news.detik.com/m-2", Duration::from_secs(5)),
        );
        let p = pipeline(&config(), fetcher);

        let request = SearchRequest::new("macet").with_fetch_content(true);
        let deadline = Instant::now() + Duration::from_millis(200);
        let outcome = p.search_until(&request, deadline).await.unwrap();

        assert_eq!(outcome.items().len(), 2);
        assert_eq!(outcome.items()[0].content.as_deref(), Some("Isi."));
        assert!(outcome.items()[1].content.is_none());
        assert_eq!(outcome.status, SearchStatus::Complete);
    }

    #[tokio::test]
    async fn test_trending_from_api() {
        let fetcher = Arc::new(MockFetcher::default().with_page(
            "https://explore-api.detik.com/trending",
            r#"{"body":{"topKeywordSearch":[{"keyword":"ikn"},{"keyword":"timnas"}]}}"#,
        ));
        let p = pipeline(&config(), fetcher);

        assert_eq!(p.trending().await.unwrap(), vec!["ikn", "timnas"]);
    }

    #[tokio::test]
    async fn test_trending_from_html() {
        let fetcher = Arc::new(MockFetcher::default().with_page(
            "https://www.detik.com/trending",
            r#"<ul class="trending-keyword"><li>satu</li><li> dua </li></ul>"#,
        ));
        let config = ScraperConfig {
            trending_url: "https://www.detik.com/trending".to_string(),
            trending_source: TrendingSource::Html,
            ..config()
        };
        let p = pipeline(&config, fetcher);

        assert_eq!(p.trending().await.unwrap(), vec!["satu", "dua"]);
    }

    #[tokio::test]
    async fn test_trending_upstream_failure() {
        let p = pipeline(&config(), Arc::new(MockFetcher::default()));
        assert!(matches!(p.trending().await, Err(ScrapeError::Upstream(_))));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ScraperConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        let result = SearchPipeline::new(&config, Arc::new(MockFetcher::default()));
        assert!(matches!(result, Err(ScrapeError::Config(_))));
    }

    #[test]
    fn test_from_config_with_retry() {
        let mut config = ScraperConfig::default();
        config.retry.max_retries = 2;
        assert!(SearchPipeline::from_config(&config).is_ok());
    }
}
