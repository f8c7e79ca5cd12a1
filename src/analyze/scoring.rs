// src/analyze/scoring.rs
//! Scoring engine: one categorization call per item, plus a deep-dive call for
//! HIGH items, in fixed-size concurrent groups separated by a pacing delay.
//!
//! Per-item failures never fail the batch: a broken categorization becomes
//! [`Assessment::fallback`] and a broken deep dive leaves the detail unset.
//! Only fatal oracle errors (disabled, no key, rejected key) abort.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use serde::Deserialize;

use crate::analyze::prompts;
use crate::config::ScoringConfig;
use crate::ingest::types::RawItem;
use crate::model::{Assessment, Category, Importance, ScoredItem, StrategicDetail, SubScores};
use crate::oracle::{ask_json, DynOracle, OracleError, OracleRequest, PromptKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringSettings {
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_delay: Duration::from_secs(2),
        }
    }
}

impl From<&ScoringConfig> for ScoringSettings {
    fn from(cfg: &ScoringConfig) -> Self {
        Self {
            batch_size: cfg.batch_size.max(1),
            batch_delay: Duration::from_millis(cfg.batch_delay_ms),
        }
    }
}

// ------------------------------------------------------------
// Reply DTOs + validation
// ------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CategorizeReply {
    category: String,
    importance: String,
    impact_score: f64,
    timing_score: f64,
    players_score: f64,
    precedent_score: f64,
    #[serde(default)]
    reasoning: String,
}

fn score(name: &str, v: f64) -> Result<u8, OracleError> {
    if !v.is_finite() {
        return Err(OracleError::Malformed(format!("{name} is not a number")));
    }
    Ok(v.round().clamp(SubScores::MIN as f64, SubScores::MAX as f64) as u8)
}

impl CategorizeReply {
    fn validate(self) -> Result<Assessment, OracleError> {
        let category = Category::parse(&self.category)
            .ok_or_else(|| OracleError::Malformed(format!("unknown category {:?}", self.category)))?;
        let importance = Importance::parse(&self.importance).ok_or_else(|| {
            OracleError::Malformed(format!("unknown importance {:?}", self.importance))
        })?;
        Ok(Assessment {
            category,
            importance,
            scores: SubScores {
                impact_score: score("impact_score", self.impact_score)?,
                timing_score: score("timing_score", self.timing_score)?,
                players_score: score("players_score", self.players_score)?,
                precedent_score: score("precedent_score", self.precedent_score)?,
            },
            reasoning: self.reasoning.trim().to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct DeepDiveReply {
    #[serde(alias = "takeaway")]
    strategic_takeaway: String,
    #[serde(default)]
    implications: Vec<String>,
    #[serde(default)]
    affected_players: Vec<String>,
    #[serde(default)]
    next_moves: String,
    #[serde(default, alias = "timing_rationale")]
    timing_significance: String,
}

impl DeepDiveReply {
    fn validate(self) -> Result<StrategicDetail, OracleError> {
        let takeaway = self.strategic_takeaway.trim().to_string();
        if takeaway.is_empty() {
            return Err(OracleError::Malformed("empty strategic_takeaway".into()));
        }
        let mut seen = HashSet::new();
        let affected_players = self
            .affected_players
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty() && seen.insert(p.to_lowercase()))
            .collect();
        Ok(StrategicDetail {
            takeaway,
            implications: self
                .implications
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            affected_players,
            next_moves: self.next_moves.trim().to_string(),
            timing_rationale: self.timing_significance.trim().to_string(),
        })
    }
}

// ------------------------------------------------------------
// Engine
// ------------------------------------------------------------

pub struct ScoringEngine {
    oracle: DynOracle,
    settings: ScoringSettings,
}

impl ScoringEngine {
    pub fn new(oracle: DynOracle, settings: ScoringSettings) -> Self {
        Self { oracle, settings }
    }

    /// Score every item; output order equals input order and item `i` gets
    /// id `id_base + i`. Errors only on a fatal oracle error.
    pub async fn score_all(
        &self,
        items: Vec<RawItem>,
        id_base: u64,
    ) -> Result<Vec<ScoredItem>, OracleError> {
        let total = items.len();
        let mut out = Vec::with_capacity(total);
        let mut pending = items.into_iter().enumerate().peekable();
        let mut group_no = 0usize;

        while pending.peek().is_some() {
            if group_no > 0 && !self.settings.batch_delay.is_zero() {
                tokio::time::sleep(self.settings.batch_delay).await;
            }
            let group: Vec<(usize, RawItem)> =
                pending.by_ref().take(self.settings.batch_size).collect();
            tracing::debug!(target: "scoring", group = group_no, size = group.len(), total, "scoring group");

            let scored = futures::future::join_all(
                group
                    .into_iter()
                    .map(|(idx, raw)| self.score_one(id_base + idx as u64, raw)),
            )
            .await;
            for r in scored {
                out.push(r?);
            }
            group_no += 1;
        }

        Ok(out)
    }

    /// Categorize one item, deep-dive it if HIGH.
    pub async fn score_one(&self, id: u64, raw: RawItem) -> Result<ScoredItem, OracleError> {
        let assessment = match self.assess(&raw).await {
            Ok(a) => a,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(target: "scoring", error = %e, title = %raw.title, "categorization failed; using fallback");
                counter!("scoring_fallbacks_total").increment(1);
                Assessment::fallback()
            }
        };

        let detail = if assessment.importance == Importance::High {
            match self.deep_dive(&raw).await {
                Ok(d) => Some(d),
                Err(e) => {
                    tracing::warn!(target: "scoring", error = %e, title = %raw.title, "deep dive failed");
                    counter!("scoring_deep_dive_failures_total").increment(1);
                    None
                }
            }
        } else {
            None
        };

        Ok(ScoredItem::new(id, raw, assessment, detail, Utc::now()))
    }

    async fn assess(&self, raw: &RawItem) -> Result<Assessment, OracleError> {
        let req = OracleRequest::new(PromptKind::Categorize, prompts::categorize(raw));
        let reply: CategorizeReply = ask_json(self.oracle.as_ref(), &req).await?;
        reply.validate()
    }

    async fn deep_dive(&self, raw: &RawItem) -> Result<StrategicDetail, OracleError> {
        let req = OracleRequest::new(PromptKind::DeepDive, prompts::deep_dive(raw));
        let reply: DeepDiveReply = ask_json(self.oracle.as_ref(), &req).await?;
        reply.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::parse_json_reply;

    #[test]
    fn categorize_reply_is_clamped_and_case_insensitive() {
        let reply: CategorizeReply = parse_json_reply(
            r#"{"category":"Funding","importance":"high","impact_score":12,"timing_score":0,"players_score":7.6,"precedent_score":5,"reasoning":"  big round "}"#,
        )
        .unwrap();
        let a = reply.validate().unwrap();
        assert_eq!(a.category, Category::Funding);
        assert_eq!(a.importance, Importance::High);
        assert_eq!(
            a.scores,
            SubScores {
                impact_score: 10,
                timing_score: 1,
                players_score: 8,
                precedent_score: 5
            }
        );
        assert_eq!(a.reasoning, "big round");
    }

    #[test]
    fn unknown_tags_are_malformed() {
        let reply: CategorizeReply = parse_json_reply(
            r#"{"category":"gossip","importance":"HIGH","impact_score":5,"timing_score":5,"players_score":5,"precedent_score":5}"#,
        )
        .unwrap();
        assert!(matches!(reply.validate(), Err(OracleError::Malformed(_))));

        let reply: CategorizeReply = parse_json_reply(
            r#"{"category":"funding","importance":"URGENT","impact_score":5,"timing_score":5,"players_score":5,"precedent_score":5}"#,
        )
        .unwrap();
        assert!(matches!(reply.validate(), Err(OracleError::Malformed(_))));
    }

    #[test]
    fn deep_dive_dedups_players_and_requires_takeaway() {
        let reply: DeepDiveReply = parse_json_reply(
            r#"{"strategic_takeaway":"Matters.","implications":["a",""," b "],"affected_players":["OpenAI","openai","Google"],"next_moves":"x","timing_significance":"y"}"#,
        )
        .unwrap();
        let d = reply.validate().unwrap();
        assert_eq!(d.implications, vec!["a", "b"]);
        assert_eq!(d.affected_players, vec!["OpenAI", "Google"]);
        assert_eq!(d.timing_rationale, "y");

        let reply: DeepDiveReply = parse_json_reply(r#"{"strategic_takeaway":"  "}"#).unwrap();
        assert!(reply.validate().is_err());
    }
}
