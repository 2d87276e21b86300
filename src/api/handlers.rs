//! HTTP API Request Handlers
//!
//! Handlers that map HTTP requests to search pipeline operations.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error, warn};

use crate::search::SearchPipeline;
use crate::{ScrapeError, SearchRequest, SearchStatus};

use super::types::*;

/// Aggregate status of the scrape behind a response.
pub const SCRAPE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-scrape-status");

/// Comma-separated page numbers whose fetch failed.
pub const FAILED_PAGES_HEADER: HeaderName = HeaderName::from_static("x-failed-pages");

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SearchPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<SearchPipeline>) -> Self {
        Self { pipeline }
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::invalid_request(message)),
    )
        .into_response()
}

fn status_headers(status: SearchStatus, failed_pages: &[u32]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(SCRAPE_STATUS_HEADER, HeaderValue::from_static(status.as_str()));
    if !failed_pages.is_empty() {
        let pages = failed_pages
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",");
        if let Ok(value) = HeaderValue::from_str(&pages) {
            headers.insert(FAILED_PAGES_HEADER, value);
        }
    }
    headers
}

/// Turns raw query parameters into a search request.
pub fn parse_scrape_params(params: ScrapeParams) -> Result<SearchRequest, String> {
    let keyword = params
        .keyword
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| "keyword is required".to_string())?;

    let pages = match params.pages.as_deref().map(str::trim) {
        None | Some("") => 1,
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if n >= 1 => u32::try_from(n).map_err(|_| format!("pages is too large: {}", n))?,
            Ok(n) => return Err(format!("pages must be a positive integer, got {}", n)),
            Err(_) => return Err(format!("pages must be a positive integer, got {:?}", raw)),
        },
    };

    let mut request = SearchRequest::new(keyword).with_pages(pages);

    if let Some(raw) = params.content.as_deref().map(str::trim) {
        let fetch_content = match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => return Err(format!("content must be true or false, got {:?}", raw)),
        };
        request = request.with_fetch_content(fetch_content);
    }

    Ok(request)
}

/// Service description endpoint
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let content_default = state.pipeline.fetches_content_by_default();
    Json(json!({
        "message": "Welcome to the detik scraper API",
        "description": "Scrapes search results and trending keywords from detik.com.",
        "endpoints": {
            "/trending/": {
                "method": "GET",
                "description": "Retrieve the list of trending keywords."
            },
            "/scrape/": {
                "method": "GET",
                "description": "Scrape search results for a keyword.",
                "parameters": {
                    "keyword": "string (required) - the search term",
                    "pages": "integer (optional) - number of result pages, defaults to 1",
                    "content": format!(
                        "boolean (optional) - fetch article bodies, defaults to {}",
                        content_default
                    )
                }
            },
            "/health": {
                "method": "GET",
                "description": "Liveness check."
            }
        }
    }))
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Keyword search endpoint
///
/// Pages the pipeline could not fetch before its deadline are reported in
/// the status headers; the articles it did collect are always returned.
pub async fn scrape(State(state): State<AppState>, Query(params): Query<ScrapeParams>) -> Response {
    let request = match parse_scrape_params(params) {
        Ok(request) => request,
        Err(message) => return bad_request(message),
    };

    debug!(keyword = %request.keyword, pages = request.pages, "HTTP scrape request");

    match state.pipeline.search(&request).await {
        Ok(outcome) => {
            let headers = status_headers(outcome.status, &outcome.failed_page_numbers());
            (StatusCode::OK, headers, Json(outcome.into_items())).into_response()
        }
        Err(ScrapeError::InvalidRequest(message)) => bad_request(message),
        Err(e) => {
            error!(error = %e, "Scrape failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error(e.to_string())),
            )
                .into_response()
        }
    }
}

/// Trending keywords endpoint
///
/// An unreachable upstream degrades to an empty list flagged as unavailable.
pub async fn trending(State(state): State<AppState>) -> Response {
    match state.pipeline.trending().await {
        Ok(keywords) => (
            StatusCode::OK,
            status_headers(SearchStatus::Complete, &[]),
            Json(keywords),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Trending keywords unavailable");
            (
                StatusCode::OK,
                status_headers(SearchStatus::Unavailable, &[]),
                Json(Vec::<String>::new()),
            )
                .into_response()
        }
    }
}
