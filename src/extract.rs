//! Extractors turning upstream pages into structured records.
//!
//! All functions here are pure: identical input always yields identical
//! output, and malformed entries are dropped instead of failing the page.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use serde::Deserialize;
use url::Url;

use crate::selectors::CompiledSelectors;
use crate::{ArticleRecord, Result, ScrapeError};

static RE_WHITESPACE: OnceLock<Regex> = OnceLock::new();

/// Collapses whitespace runs to a single space and trims the ends.
pub fn clean_text(text: &str) -> String {
    let re = RE_WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"));
    re.replace_all(text.trim(), " ").into_owned()
}

fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Resolves `href` against `base`, keeping only http(s) targets.
fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Extracts the article summaries of one search-results page.
///
/// Entries without a title or a resolvable link are skipped. A page with no
/// matching entries yields an empty vector.
pub fn extract_articles(html: &str, selectors: &CompiledSelectors, base: &Url) -> Vec<ArticleRecord> {
    let document = Html::parse_document(html);
    let mut articles = Vec::new();

    for entry in document.select(&selectors.item) {
        let title = match entry.select(&selectors.title).next().map(element_text) {
            Some(title) if !title.is_empty() => title,
            _ => continue,
        };

        let url = match entry
            .select(&selectors.link)
            .filter_map(|el| el.value().attr("href"))
            .find_map(|href| resolve_link(base, href))
        {
            Some(url) => url,
            None => continue,
        };

        let published_at = entry
            .select(&selectors.date)
            .next()
            .map(|el| match el.value().attr("title") {
                Some(full) if !full.trim().is_empty() => clean_text(full),
                _ => element_text(el),
            })
            .unwrap_or_default();

        let description = entry
            .select(&selectors.description)
            .next()
            .map(element_text)
            .unwrap_or_default();

        articles.push(ArticleRecord::new(title, url, published_at, description));
    }

    articles
}

/// Extracts trending keywords from the trending page, in displayed order.
pub fn extract_trending(html: &str, selectors: &CompiledSelectors) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&selectors.trending)
        .map(element_text)
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

#[derive(Deserialize)]
struct TrendingResponse {
    body: Option<TrendingBody>,
}

#[derive(Deserialize)]
struct TrendingBody {
    #[serde(rename = "topKeywordSearch")]
    top_keyword_search: Option<Vec<TrendingEntry>>,
}

#[derive(Deserialize)]
struct TrendingEntry {
    keyword: Option<String>,
}

/// Extracts trending keywords from the explore API's JSON payload.
///
/// A payload without `body.topKeywordSearch` yields an empty vector; a
/// payload that is not JSON at all is a parse error.
pub fn extract_trending_json(body: &str) -> Result<Vec<String>> {
    let response: TrendingResponse = serde_json::from_str(body)
        .map_err(|e| ScrapeError::Parse(format!("Invalid trending payload: {}", e)))?;

    let keywords = response
        .body
        .and_then(|b| b.top_keyword_search)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| entry.keyword)
        .map(|keyword| clean_text(&keyword))
        .filter(|keyword| !keyword.is_empty())
        .collect();

    Ok(keywords)
}

/// Extracts the body text of an article page, one paragraph per line.
pub fn extract_content(html: &str, selectors: &CompiledSelectors) -> Option<String> {
    let document = Html::parse_document(html);
    let paragraphs: Vec<String> = document
        .select(&selectors.content)
        .map(element_text)
        .filter(|p| !p.is_empty())
        .collect();

    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n"))
    }
}
