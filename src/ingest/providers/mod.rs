// src/ingest/providers/mod.rs
pub mod arxiv;
pub mod github;
pub mod hackernews;
pub mod techcrunch_rss;

use std::sync::Arc;

use crate::config::SourcesConfig;
use crate::ingest::http::Fetcher;
use crate::ingest::DynSource;

/// Build the enabled adapters from config, all sharing one fetcher.
pub fn build_sources(cfg: &SourcesConfig, fetcher: Arc<dyn Fetcher>) -> Vec<DynSource> {
    let mut out: Vec<DynSource> = Vec::new();
    if cfg.arxiv.enabled {
        out.push(Arc::new(arxiv::ArxivProvider::new(
            fetcher.clone(),
            cfg.arxiv.url.clone(),
            cfg.arxiv.max_items,
        )));
    }
    if cfg.hackernews.enabled {
        out.push(Arc::new(hackernews::HackerNewsProvider::from_config(
            fetcher.clone(),
            &cfg.hackernews,
        )));
    }
    if cfg.techcrunch.enabled {
        out.push(Arc::new(techcrunch_rss::TechCrunchRssProvider::new(
            fetcher.clone(),
            cfg.techcrunch.url.clone(),
            cfg.techcrunch.max_items,
        )));
    }
    if cfg.github.enabled {
        out.push(Arc::new(github::GithubSearchProvider::new(
            fetcher,
            cfg.github.url.clone(),
            cfg.github.max_items,
        )));
    }
    out
}
