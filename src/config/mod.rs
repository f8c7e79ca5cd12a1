// src/config/mod.rs
//! Runtime configuration loaded from `config/intel.toml` (or `$INTEL_CONFIG_PATH`).
//!
//! Every field has a default, so an absent file means "run with defaults".
//! Out-of-range values are sanitized instead of rejected.

pub mod ai;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use ai::OracleConfig;

pub const ENV_CONFIG_PATH: &str = "INTEL_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/intel.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub schedule: ScheduleConfig,
    pub sources: SourcesConfig,
    pub scoring: ScoringConfig,
    pub ranking: RankingConfig,
    pub dedup: DedupConfig,
    pub oracle: OracleConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub refresh_interval_secs: u64,
    pub run_on_startup: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 2 * 3600,
            run_on_startup: true,
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    pub arxiv: FeedSourceConfig,
    pub hackernews: HackerNewsConfig,
    pub techcrunch: FeedSourceConfig,
    pub github: FeedSourceConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 10,
            user_agent: "AI-Intelligence-Dashboard/1.0".to_string(),
            arxiv: FeedSourceConfig::new(
                "http://export.arxiv.org/api/query?search_query=cat:cs.AI+OR+cat:cs.LG+OR+cat:cs.CL&start=0&max_results=20&sortBy=submittedDate&sortOrder=descending",
                20,
            ),
            hackernews: HackerNewsConfig::default(),
            techcrunch: FeedSourceConfig::new(
                "https://techcrunch.com/category/artificial-intelligence/feed/",
                15,
            ),
            github: FeedSourceConfig::new(
                "https://api.github.com/search/repositories?q=machine+learning+OR+artificial+intelligence+OR+LLM&sort=stars&order=desc&per_page=20",
                10,
            ),
        }
    }
}

impl SourcesConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

/// A single-request feed: URL plus an item cap.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedSourceConfig {
    pub enabled: bool,
    pub url: String,
    pub max_items: usize,
}

impl FeedSourceConfig {
    fn new(url: &str, max_items: usize) -> Self {
        Self {
            enabled: true,
            url: url.to_string(),
            max_items,
        }
    }
}

impl Default for FeedSourceConfig {
    fn default() -> Self {
        Self::new("", 10)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HackerNewsConfig {
    pub enabled: bool,
    pub top_stories_url: String,
    pub item_url_template: String,
    pub candidate_limit: usize,
    pub max_items: usize,
    pub keywords: Vec<String>,
}

impl Default for HackerNewsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            top_stories_url: "https://hacker-news.firebaseio.com/v0/topstories.json".to_string(),
            item_url_template: "https://hacker-news.firebaseio.com/v0/item/{id}.json".to_string(),
            candidate_limit: 50,
            max_items: 10,
            keywords: [
                "AI",
                "artificial intelligence",
                "machine learning",
                "LLM",
                "GPT",
                "OpenAI",
                "Anthropic",
                "neural",
                "deep learning",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub batch_size: usize,
    pub batch_delay_ms: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_delay_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub keep_top: usize,
    /// LOW items survive the filter only at or above this overall score.
    pub min_low_score: u8,
    /// How many ranked items the cross-link pass sees.
    pub link_top: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            keep_top: 20,
            min_low_score: 6,
            link_top: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub enabled: bool,
    pub title_similarity: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            title_similarity: 0.92,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(s).context("parsing intel config toml")?;
        Ok(cfg.sanitized())
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using env var + fallbacks:
    /// 1) $INTEL_CONFIG_PATH (must exist)
    /// 2) config/intel.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default.exists() {
            return Self::load_from(&default);
        }
        Ok(Self::default().sanitized())
    }

    fn sanitized(mut self) -> Self {
        self.scoring.batch_size = self.scoring.batch_size.max(1);
        self.ranking.keep_top = self.ranking.keep_top.max(1);
        self.ranking.min_low_score = self.ranking.min_low_score.clamp(1, 10);
        if !(0.0..=1.0).contains(&self.dedup.title_similarity) {
            self.dedup.title_similarity = DedupConfig::default().title_similarity;
        }
        self.schedule.refresh_interval_secs = self.schedule.refresh_interval_secs.max(60);
        self.oracle = self.oracle.sanitized();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.scoring.batch_size, 5);
        assert_eq!(cfg.scoring.batch_delay_ms, 2000);
        assert_eq!(cfg.ranking.keep_top, 20);
        assert_eq!(cfg.ranking.link_top, 10);
        assert_eq!(cfg.sources.hackernews.candidate_limit, 50);
        assert_eq!(cfg.sources.fetch_timeout_secs, 10);
        assert_eq!(cfg.schedule.refresh_interval_secs, 7200);
        assert!(!cfg.dedup.enabled);
    }

    #[test]
    fn partial_sections_merge_with_defaults_and_sanitize() {
        let toml = r#"
            [scoring]
            batch_size = 0

            [dedup]
            enabled = true
            title_similarity = 4.0

            [sources.github]
            enabled = false
        "#;
        let cfg = AppConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.scoring.batch_size, 1);
        assert_eq!(cfg.scoring.batch_delay_ms, 2000);
        assert!(cfg.dedup.enabled);
        assert!((cfg.dedup.title_similarity - 0.92).abs() < f64::EPSILON);
        assert!(!cfg.sources.github.enabled);
        assert_eq!(cfg.sources.github.max_items, 10);
        assert!(cfg.sources.arxiv.enabled);
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);

        // No file in temp CWD → defaults
        let cfg = AppConfig::load_default().unwrap();
        assert_eq!(cfg.ranking.keep_top, 20);

        // Env takes precedence
        let p = tmp.path().join("custom.toml");
        fs::write(&p, "[ranking]\nkeep_top = 5\n").unwrap();
        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        assert_eq!(AppConfig::load_default().unwrap().ranking.keep_top, 5);

        // Dangling env path is an error
        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml"));
        assert!(AppConfig::load_default().is_err());
        env::remove_var(ENV_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
