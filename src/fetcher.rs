//! Page fetcher abstraction for retrieving upstream pages.

use async_trait::async_trait;

use crate::error::FetchError;

/// A successfully fetched page body, tagged with its source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// The URL that was requested.
    pub url: String,
    /// Response body as text.
    pub body: String,
}

impl Page {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }
}

/// Outcome of a single fetch.
pub type FetchResult = std::result::Result<Page, FetchError>;

/// Trait for fetching the body of a URL.
///
/// All configuration (user-agent, timeouts) is set at construction time;
/// `fetch` is a simple URL-in, body-out interface. Implementations report
/// every failure as a [`FetchError`] and never panic past this boundary.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the body of the given URL.
    async fn fetch(&self, url: &str) -> FetchResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;

    struct StaticFetcher;

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> FetchResult {
            if url.ends_with("/missing") {
                Err(FetchError::new(url, FetchErrorKind::Status(404)))
            } else {
                Ok(Page::new(url, "<html></html>"))
            }
        }
    }

    #[test]
    fn test_page_new() {
        let page = Page::new("https://example.com", "body");
        assert_eq!(page.url, "https://example.com");
        assert_eq!(page.body, "body");
    }

    #[tokio::test]
    async fn test_fetcher_as_trait_object() {
        let fetcher: Box<dyn PageFetcher> = Box::new(StaticFetcher);

        let page = fetcher.fetch("https://example.com/ok").await.unwrap();
        assert_eq!(page.url, "https://example.com/ok");

        let err = fetcher.fetch("https://example.com/missing").await.unwrap_err();
        assert_eq!(err.url, "https://example.com/missing");
        assert_eq!(err.kind, FetchErrorKind::Status(404));
    }
}
