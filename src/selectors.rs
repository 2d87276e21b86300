//! CSS selector table for the upstream markup.
//!
//! Every selector the extractors use lives here, one per field, so a change
//! in the site's markup is fixed by editing configuration rather than code.

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::{Result, ScrapeError};

/// Selector strings, one per extracted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorTable {
    /// Repeating container of a single search result.
    pub item: String,
    /// Headline inside a result.
    pub title: String,
    /// Link inside a result; its `href` is the article URL.
    pub link: String,
    /// Date element inside a result; its `title` attribute holds the full date.
    pub date: String,
    /// Short description inside a result.
    pub description: String,
    /// Body paragraphs on an article page.
    pub content: String,
    /// Keyword entries on the trending page.
    pub trending: String,
}

impl Default for SelectorTable {
    fn default() -> Self {
        Self {
            item: "article".to_string(),
            title: "h3.media__title".to_string(),
            link: "a[href]".to_string(),
            date: ".media__date > span".to_string(),
            description: "div.media__desc".to_string(),
            content: "div.detail__body-text > p".to_string(),
            trending: "ul.trending-keyword li".to_string(),
        }
    }
}

impl SelectorTable {
    /// Parses every selector, failing on the first invalid one.
    pub fn compile(&self) -> Result<CompiledSelectors> {
        Ok(CompiledSelectors {
            item: parse("item", &self.item)?,
            title: parse("title", &self.title)?,
            link: parse("link", &self.link)?,
            date: parse("date", &self.date)?,
            description: parse("description", &self.description)?,
            content: parse("content", &self.content)?,
            trending: parse("trending", &self.trending)?,
        })
    }
}

fn parse(field: &str, css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| {
        ScrapeError::Parse(format!("Failed to parse {} selector {:?}: {:?}", field, css, e))
    })
}

/// Parsed selectors, ready to be matched against documents.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub item: Selector,
    pub title: Selector,
    pub link: Selector,
    pub date: Selector,
    pub description: Selector,
    pub content: Selector,
    pub trending: Selector,
}

impl CompiledSelectors {
    /// Compiles the default selector table.
    pub fn detik() -> Self {
        SelectorTable::default()
            .compile()
            .expect("default selector table is valid")
    }
}

impl Default for CompiledSelectors {
    fn default() -> Self {
        Self::detik()
    }
}
