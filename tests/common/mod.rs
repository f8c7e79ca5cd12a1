// tests/common/mod.rs
//! Shared test doubles: a scripted oracle and in-memory sources.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ai_intel_dashboard::ingest::types::{RawItem, SourceProvider};
use ai_intel_dashboard::ingest::DynSource;
use ai_intel_dashboard::oracle::{Oracle, OracleError, OracleFuture, OracleRequest, PromptKind};
use chrono::{DateTime, TimeZone, Utc};

type Handler = dyn Fn(&OracleRequest) -> Result<String, OracleError> + Send + Sync;

/// Oracle whose replies come from a closure; records every call.
pub struct ScriptedOracle {
    handler: Box<Handler>,
    delay: Duration,
    calls: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    pub fn new(
        handler: impl Fn(&OracleRequest) -> Result<String, OracleError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<OracleRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, kind: PromptKind) -> usize {
        self.calls().iter().filter(|r| r.kind == kind).count()
    }
}

impl Oracle for ScriptedOracle {
    fn complete<'a>(&'a self, req: &'a OracleRequest) -> OracleFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(req.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            (self.handler)(req)
        })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Pull the `Title: ...` line out of a categorize/deep-dive prompt.
pub fn title_of(prompt: &str) -> &str {
    prompt
        .lines()
        .find_map(|l| l.strip_prefix("Title: "))
        .unwrap_or_default()
}

pub fn categorize_json(category: &str, importance: &str, scores: [u8; 4]) -> String {
    format!(
        r#"{{"category":"{category}","importance":"{importance}","impact_score":{},"timing_score":{},"players_score":{},"precedent_score":{},"reasoning":"scripted"}}"#,
        scores[0], scores[1], scores[2], scores[3]
    )
}

pub fn deep_dive_json(takeaway: &str) -> String {
    format!(
        r#"{{"strategic_takeaway":"{takeaway}","implications":["i1","i2"],"affected_players":["OpenAI","Google"],"next_moves":"responses","timing_significance":"now"}}"#
    )
}

pub fn raw(title: &str, source: &str) -> RawItem {
    let published: DateTime<Utc> = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
    RawItem::new(
        title,
        format!("https://example.com/{}", title.replace(' ', "-")),
        source,
        published,
    )
    .with_summary(Some(format!("About {title}")))
}

/// Source returning fixed items, or failing like a dead endpoint.
pub struct FixedSource {
    pub name: &'static str,
    pub items: Vec<RawItem>,
    pub fail: bool,
}

impl FixedSource {
    pub fn ok(name: &'static str, titles: &[&str]) -> DynSource {
        Arc::new(Self {
            name,
            items: titles.iter().map(|t| raw(t, name)).collect(),
            fail: false,
        })
    }

    pub fn failing(name: &'static str) -> DynSource {
        Arc::new(Self {
            name,
            items: Vec::new(),
            fail: true,
        })
    }
}

#[async_trait::async_trait]
impl SourceProvider for FixedSource {
    async fn fetch_latest(&self) -> anyhow::Result<Vec<RawItem>> {
        if self.fail {
            anyhow::bail!("simulated network error for {}", self.name);
        }
        Ok(self.items.clone())
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Oracle that scores by title keywords: "urgent" → HIGH, "minor" → LOW/2,
/// everything else MEDIUM/6; deep dives succeed; connect links the first two ids.
pub fn keyword_oracle() -> ScriptedOracle {
    ScriptedOracle::new(|req| match req.kind {
        PromptKind::Categorize => {
            let t = title_of(&req.prompt).to_lowercase();
            Ok(if t.contains("urgent") {
                categorize_json("model_releases", "HIGH", [9, 8, 9, 8])
            } else if t.contains("minor") {
                categorize_json("infrastructure", "LOW", [2, 2, 2, 2])
            } else {
                categorize_json("funding", "MEDIUM", [6, 6, 7, 6])
            })
        }
        PromptKind::DeepDive => Ok(deep_dive_json("It matters")),
        PromptKind::Connect => {
            let ids: Vec<&str> = req
                .prompt
                .lines()
                .filter_map(|l| l.strip_prefix("ID: "))
                .filter_map(|l| l.split(',').next())
                .collect();
            Ok(format!(
                r#"{{"connections":[{{"story1_id":{},"story2_id":{},"relationship":"competes_with","explanation":"same market"}}],"trends":["consolidation"],"power_shifts":"incumbents gain"}}"#,
                ids[0], ids[1]
            ))
        }
    })
}
