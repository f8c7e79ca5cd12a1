// src/ingest/providers/techcrunch_rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::sync::Arc;

use crate::ingest::http::Fetcher;
use crate::ingest::types::{RawItem, SourceProvider};
use crate::ingest::{normalize_text, parse_rfc2822, record_parse};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

/// TechCrunch AI category RSS.
pub struct TechCrunchRssProvider {
    fetcher: Arc<dyn Fetcher>,
    url: String,
    max_items: usize,
}

impl TechCrunchRssProvider {
    pub fn new(fetcher: Arc<dyn Fetcher>, url: impl Into<String>, max_items: usize) -> Self {
        Self {
            fetcher,
            url: url.into(),
            max_items,
        }
    }

    pub fn parse_feed(xml: &str, max_items: usize) -> Result<Vec<RawItem>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(xml);
        let rss: Rss = from_str(&xml_clean).context("parsing techcrunch rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len().min(max_items));
        for it in rss.channel.item.into_iter().take(max_items) {
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            if title.is_empty() {
                continue;
            }
            out.push(
                RawItem::new(
                    title,
                    it.link.unwrap_or_default().trim(),
                    "TechCrunch",
                    it.pub_date.as_deref().map(parse_rfc2822).unwrap_or_default(),
                )
                .with_summary(it.description.as_deref().map(normalize_text)),
            );
        }

        record_parse(t0, "TechCrunch", out.len());
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for TechCrunchRssProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        let body = self
            .fetcher
            .get_text(&self.url)
            .await
            .context("techcrunch fetch")?;
        Self::parse_feed(&body, self.max_items)
    }

    fn name(&self) -> &'static str {
        "TechCrunch"
    }
}

// Named HTML entities are not valid XML; WordPress feeds leak a few of them.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
