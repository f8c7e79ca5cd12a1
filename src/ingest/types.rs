// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One normalized feed entry, as produced by a source adapter.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RawItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub url: String,
    pub source: String, // e.g., "arXiv", "Hacker News"
    pub published: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    /// HN points or GitHub stars, when the source has them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<u64>,
}

impl RawItem {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
        published: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            summary: None,
            url: url.into(),
            source: source.into(),
            published,
            authors: Vec::new(),
            engagement: None,
        }
    }

    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary.filter(|s| !s.is_empty());
        self
    }

    /// Summary for prompts; falls back to the title.
    pub fn summary_or_title(&self) -> &str {
        self.summary.as_deref().unwrap_or(&self.title)
    }
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>>;
    fn name(&self) -> &'static str;
}
