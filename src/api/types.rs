//! HTTP API Request/Response Types

use serde::{Deserialize, Serialize};

/// Query string of `GET /scrape/`.
///
/// Every field is taken as raw text so malformed values are reported as a
/// JSON 400 instead of the framework's plain-text rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapeParams {
    /// Keyword to search for (required)
    pub keyword: Option<String>,
    /// Number of result pages (default: 1)
    pub pages: Option<String>,
    /// Whether to fetch article bodies (default: configured)
    pub content: Option<String>,
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new("INVALID_REQUEST", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
}
