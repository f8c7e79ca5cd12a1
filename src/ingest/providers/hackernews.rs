// src/ingest/providers/hackernews.rs
//! Hacker News top stories with a client-side keyword filter.
//!
//! The top-stories endpoint only returns ids, so each candidate is resolved with
//! its own request, in list order. Resolution stops at `max_items` matches or
//! after `candidate_limit` candidates, whichever comes first. A candidate that
//! fails to resolve is skipped.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Deserialize;
use std::sync::Arc;

use crate::config::HackerNewsConfig;
use crate::ingest::http::Fetcher;
use crate::ingest::types::{RawItem, SourceProvider};
use crate::ingest::{normalize_text, record_parse};

#[derive(Debug, Deserialize)]
struct Story {
    id: u64,
    title: Option<String>,
    url: Option<String>,
    #[serde(default)]
    score: u64,
    #[serde(default)]
    time: i64,
}

pub struct HackerNewsProvider {
    fetcher: Arc<dyn Fetcher>,
    top_stories_url: String,
    /// Contains `{id}`.
    item_url_template: String,
    candidate_limit: usize,
    max_items: usize,
    /// Lowercased.
    keywords: Vec<String>,
}

impl HackerNewsProvider {
    pub fn from_config(fetcher: Arc<dyn Fetcher>, cfg: &HackerNewsConfig) -> Self {
        Self {
            fetcher,
            top_stories_url: cfg.top_stories_url.clone(),
            item_url_template: cfg.item_url_template.clone(),
            candidate_limit: cfg.candidate_limit,
            max_items: cfg.max_items,
            keywords: cfg.keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn item_url(&self, id: u64) -> String {
        self.item_url_template.replace("{id}", &id.to_string())
    }

    pub fn matches_keywords(&self, title: &str) -> bool {
        let t = title.to_lowercase();
        self.keywords.iter().any(|k| t.contains(k.as_str()))
    }

    async fn resolve(&self, id: u64) -> Result<Option<Story>> {
        let body = self
            .fetcher
            .get_text(&self.item_url(id))
            .await
            .with_context(|| format!("hn item {id}"))?;
        // Deleted items come back as `null`.
        serde_json::from_str::<Option<Story>>(&body).with_context(|| format!("hn item {id} json"))
    }
}

fn discussion_url(id: u64) -> String {
    format!("https://news.ycombinator.com/item?id={id}")
}

#[async_trait]
impl SourceProvider for HackerNewsProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        let t0 = std::time::Instant::now();
        let body = self
            .fetcher
            .get_text(&self.top_stories_url)
            .await
            .context("hn top stories fetch")?;
        let ids: Vec<u64> = serde_json::from_str(&body).context("parsing hn top stories json")?;

        let mut out = Vec::with_capacity(self.max_items);
        for id in ids.into_iter().take(self.candidate_limit) {
            if out.len() >= self.max_items {
                break;
            }
            let story = match self.resolve(id).await {
                Ok(Some(s)) => s,
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!(target: "ingest", error = ?e, id, "hn item skipped");
                    counter!("ingest_hn_item_errors_total").increment(1);
                    continue;
                }
            };
            let title = normalize_text(story.title.as_deref().unwrap_or_default());
            if title.is_empty() || !self.matches_keywords(&title) {
                continue;
            }
            let url = story
                .url
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| discussion_url(story.id));
            let published = DateTime::<Utc>::from_timestamp(story.time, 0).unwrap_or_default();
            let mut item = RawItem::new(title, url, "Hacker News", published);
            item.engagement = Some(story.score);
            out.push(item);
        }

        record_parse(t0, "Hacker News", out.len());
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "Hacker News"
    }
}
