// src/ingest/providers/arxiv.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::sync::Arc;

use crate::ingest::http::Fetcher;
use crate::ingest::types::{RawItem, SourceProvider};
use crate::ingest::{normalize_text, parse_rfc3339, record_parse};

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    #[serde(rename = "author", default)]
    author: Vec<Author>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<String>,
}

/// arXiv API query (Atom). Newest submissions first, capped at `max_items`.
pub struct ArxivProvider {
    fetcher: Arc<dyn Fetcher>,
    url: String,
    max_items: usize,
}

impl ArxivProvider {
    pub fn new(fetcher: Arc<dyn Fetcher>, url: impl Into<String>, max_items: usize) -> Self {
        Self {
            fetcher,
            url: url.into(),
            max_items,
        }
    }

    pub fn parse_feed(xml: &str, max_items: usize) -> Result<Vec<RawItem>> {
        let t0 = std::time::Instant::now();
        let feed: Feed = from_str(xml).context("parsing arxiv atom xml")?;

        let mut out = Vec::with_capacity(feed.entry.len().min(max_items));
        for e in feed.entry.into_iter().take(max_items) {
            let title = normalize_text(e.title.as_deref().unwrap_or_default());
            if title.is_empty() {
                continue;
            }
            let summary = e.summary.as_deref().map(normalize_text);
            let mut item = RawItem::new(
                title,
                e.id.unwrap_or_default().trim(),
                "arXiv",
                e.published.as_deref().map(parse_rfc3339).unwrap_or_default(),
            )
            .with_summary(summary);
            item.authors = e
                .author
                .into_iter()
                .filter_map(|a| a.name)
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect();
            out.push(item);
        }

        record_parse(t0, "arXiv", out.len());
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for ArxivProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        let body = self.fetcher.get_text(&self.url).await.context("arxiv fetch")?;
        Self::parse_feed(&body, self.max_items)
    }

    fn name(&self) -> &'static str {
        "arXiv"
    }
}
