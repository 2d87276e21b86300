//! Error types for the scraper.

use std::fmt;

use thiserror::Error;

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Errors that can occur while scraping.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Bad keyword or page count supplied by the caller.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A single upstream fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Failed to parse markup, a selector or an upstream payload.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The upstream site could not serve the requested resource.
    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// HTTP client construction failed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Why a fetch failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Connection, TLS, body decoding or any other transport failure.
    Network(String),
    /// The upstream answered with a non-2xx status.
    Status(u16),
    /// The request did not complete within the fetcher's timeout.
    Timeout,
}

impl FetchErrorKind {
    /// Returns true if trying the same request again may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchErrorKind::Network(_) | FetchErrorKind::Timeout => true,
            FetchErrorKind::Status(code) => *code == 429 || *code >= 500,
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::Network(msg) => write!(f, "network error: {}", msg),
            FetchErrorKind::Status(code) => write!(f, "HTTP status {}", code),
            FetchErrorKind::Timeout => write!(f, "timed out"),
        }
    }
}

/// A failed fetch, tagged with the URL it was for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Fetch of {url} failed: {kind}")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(url: impl Into<String>, kind: FetchErrorKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }

    /// Classifies a reqwest error for the given URL.
    pub fn from_reqwest(url: impl Into<String>, err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FetchErrorKind::Timeout
        } else if let Some(status) = err.status() {
            FetchErrorKind::Status(status.as_u16())
        } else {
            FetchErrorKind::Network(err.to_string())
        };
        Self::new(url, kind)
    }
}
