// src/ingest/http.rs
//! Transport seam for source adapters: real HTTP in production, a URL → body
//! map in tests.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the body. Non-2xx statuses are errors.
    async fn get_text(&self, url: &str) -> Result<String>;
}

/// `reqwest`-backed fetcher with a per-request timeout.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout.min(Duration::from_secs(4)))
            .timeout(timeout)
            .build()
            .context("building feed http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let resp = resp
            .error_for_status()
            .with_context(|| format!("GET {url} status"))?;
        resp.text().await.with_context(|| format!("GET {url} body"))
    }
}

/// Serves fixed bodies by exact URL; unknown URLs fail like a network error.
/// Records every requested URL so tests can assert on the request sequence.
#[derive(Default)]
pub struct StaticFetcher {
    routes: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.routes.insert(url.into(), body.into());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        match self.requested.lock() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn get_text(&self, url: &str) -> Result<String> {
        if let Ok(mut g) = self.requested.lock() {
            g.push(url.to_string());
        }
        self.routes
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("no route for {url}"))
    }
}
