//! Oracle adapter: the language-model seam used by scoring and cross-linking.
//!
//! Callers build a typed [`OracleRequest`], the oracle returns free text, and
//! [`ask_json`] extracts and deserializes the JSON object inside it. Every call
//! site owns its own fallback; nothing here retries.

pub mod limiter;
pub mod openai;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use metrics::counter;
use serde::de::DeserializeOwned;

use crate::config::OracleConfig;
pub use limiter::{RateLimited, TokenBucket};
pub use openai::OpenAiOracle;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    /// First-pass category/importance/sub-scores for one item.
    Categorize,
    /// Strategic follow-up for HIGH items.
    DeepDive,
    /// Connections and trends across the top items.
    Connect,
}

impl PromptKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PromptKind::Categorize => "categorize",
            PromptKind::DeepDive => "deep_dive",
            PromptKind::Connect => "connect",
        }
    }

    pub fn max_tokens(self) -> u32 {
        match self {
            PromptKind::Categorize => 500,
            PromptKind::DeepDive => 600,
            PromptKind::Connect => 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    pub kind: PromptKind,
    pub prompt: String,
}

impl OracleRequest {
    pub fn new(kind: PromptKind, prompt: impl Into<String>) -> Self {
        Self {
            kind,
            prompt: prompt.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("oracle is disabled")]
    Disabled,
    #[error("no API key configured for the oracle")]
    MissingApiKey,
    #[error("oracle rejected credentials (HTTP {0})")]
    Unauthorized(u16),
    #[error("oracle transport error: {0}")]
    Transport(String),
    #[error("oracle returned HTTP {0}")]
    Status(u16),
    #[error("oracle returned an empty completion")]
    Empty,
    #[error("malformed oracle response: {0}")]
    Malformed(String),
}

impl OracleError {
    /// Fatal errors mean no call can succeed this run (not a per-item hiccup).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OracleError::Disabled | OracleError::MissingApiKey | OracleError::Unauthorized(_)
        )
    }
}

pub type OracleFuture<'a> = Pin<Box<dyn Future<Output = Result<String, OracleError>> + Send + 'a>>;

/// Trait object used by the pipeline (and by tests to script responses).
pub trait Oracle: Send + Sync {
    /// Send the prompt, return the raw completion text.
    fn complete<'a>(&'a self, req: &'a OracleRequest) -> OracleFuture<'a>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynOracle = Arc<dyn Oracle>;

/// Call the oracle and parse its reply as `T`.
pub async fn ask_json<T: DeserializeOwned>(
    oracle: &dyn Oracle,
    req: &OracleRequest,
) -> Result<T, OracleError> {
    counter!("oracle_calls_total", "kind" => req.kind.as_str()).increment(1);
    let text = oracle.complete(req).await?;
    parse_json_reply(&text)
}

pub fn parse_json_reply<T: DeserializeOwned>(text: &str) -> Result<T, OracleError> {
    let body = extract_json(text).ok_or_else(|| OracleError::Malformed("no JSON object".into()))?;
    serde_json::from_str(body).map_err(|e| OracleError::Malformed(e.to_string()))
}

/// Slice out the outermost `{ ... }`, tolerating code fences and chatter.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Factory: build an oracle according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns the deterministic mock.
/// * Else if `enabled == false` or the provider is unknown, returns a disabled oracle.
/// * Else builds the OpenAI oracle.
///
/// Any of these is wrapped in the token bucket when `requests_per_minute` is set.
pub fn build_oracle(cfg: &OracleConfig) -> anyhow::Result<DynOracle> {
    let base: DynOracle = if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        Arc::new(MockOracle)
    } else if !cfg.enabled {
        Arc::new(DisabledOracle)
    } else {
        match cfg.provider.as_str() {
            "openai" => Arc::new(OpenAiOracle::from_config(cfg)?),
            other => {
                tracing::warn!(provider = other, "unsupported oracle provider; oracle disabled");
                Arc::new(DisabledOracle)
            }
        }
    };

    Ok(match cfg.rate_limit() {
        Some((per_sec, burst)) => Arc::new(RateLimited::new(base, TokenBucket::new(per_sec, burst))),
        None => base,
    })
}

// ------------------------------------------------------------
// Stand-in oracles
// ------------------------------------------------------------

/// Always fails with `Disabled`; a refresh with items to score will error.
pub struct DisabledOracle;

impl Oracle for DisabledOracle {
    fn complete<'a>(&'a self, _req: &'a OracleRequest) -> OracleFuture<'a> {
        Box::pin(async { Err(OracleError::Disabled) })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Canned, well-formed answers for local runs (`AI_TEST_MODE=mock`).
pub struct MockOracle;

impl Oracle for MockOracle {
    fn complete<'a>(&'a self, req: &'a OracleRequest) -> OracleFuture<'a> {
        let body = match req.kind {
            PromptKind::Categorize => {
                r#"{"category":"model_releases","importance":"MEDIUM","impact_score":6,"timing_score":7,"players_score":5,"precedent_score":6,"reasoning":"Mock assessment"}"#
            }
            PromptKind::DeepDive => {
                r#"{"strategic_takeaway":"Mock takeaway","implications":["mock"],"affected_players":["MockCorp"],"next_moves":"none","timing_significance":"mock"}"#
            }
            PromptKind::Connect => {
                r#"{"connections":[],"trends":["Mock trend"],"power_shifts":"Mock power shift"}"#
            }
        };
        Box::pin(async move { Ok(body.to_string()) })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
