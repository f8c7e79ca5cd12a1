// src/ingest/providers/github.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::ingest::http::Fetcher;
use crate::ingest::types::{RawItem, SourceProvider};
use crate::ingest::{normalize_text, parse_rfc3339, record_parse};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Repo>,
}

#[derive(Debug, Deserialize)]
struct Repo {
    name: String,
    description: Option<String>,
    html_url: String,
    #[serde(default)]
    stargazers_count: u64,
    created_at: Option<String>,
}

/// GitHub repository search (most-starred ML/LLM repos).
pub struct GithubSearchProvider {
    fetcher: Arc<dyn Fetcher>,
    url: String,
    max_items: usize,
}

impl GithubSearchProvider {
    pub fn new(fetcher: Arc<dyn Fetcher>, url: impl Into<String>, max_items: usize) -> Self {
        Self {
            fetcher,
            url: url.into(),
            max_items,
        }
    }

    pub fn parse_search(json: &str, max_items: usize) -> Result<Vec<RawItem>> {
        let t0 = std::time::Instant::now();
        let resp: SearchResponse = serde_json::from_str(json).context("parsing github search json")?;

        let out: Vec<RawItem> = resp
            .items
            .into_iter()
            .take(max_items)
            .map(|r| {
                let desc = r
                    .description
                    .as_deref()
                    .map(normalize_text)
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| "No description".to_string());
                let mut item = RawItem::new(
                    format!("{} - {}", r.name, desc),
                    r.html_url,
                    "GitHub",
                    r.created_at.as_deref().map(parse_rfc3339).unwrap_or_default(),
                );
                item.engagement = Some(r.stargazers_count);
                item
            })
            .collect();

        record_parse(t0, "GitHub", out.len());
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for GithubSearchProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        let body = self.fetcher.get_text(&self.url).await.context("github fetch")?;
        Self::parse_search(&body, self.max_items)
    }

    fn name(&self) -> &'static str {
        "GitHub"
    }
}
