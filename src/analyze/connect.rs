// src/analyze/connect.rs
//! Cross-link engine: one oracle call over the top ranked items to find pairwise
//! relationships, trends and a power-shift narrative. Best effort: any failure
//! yields an empty result.

use std::collections::HashSet;

use metrics::counter;
use serde::Deserialize;
use serde_json::Value;

use crate::analyze::prompts;
use crate::model::{Connection, CrossLinks, Relationship, ScoredItem};
use crate::oracle::{ask_json, DynOracle, OracleRequest, PromptKind};

#[derive(Debug, Deserialize)]
struct ConnectReply {
    #[serde(default)]
    connections: Vec<ConnectionReply>,
    #[serde(default)]
    trends: Vec<Value>,
    #[serde(default, alias = "power_shift_summary")]
    power_shifts: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ConnectionReply {
    #[serde(alias = "item_a_id")]
    story1_id: Value,
    #[serde(alias = "item_b_id")]
    story2_id: Value,
    #[serde(default)]
    relationship: String,
    #[serde(default)]
    explanation: String,
}

/// Ids come back as numbers or as strings depending on the model's mood.
fn id_of(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_of(v: Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl ConnectReply {
    /// Keep only connections between two distinct supplied ids with a known tag.
    fn validate(self, candidates: &[ScoredItem]) -> CrossLinks {
        let allowed: HashSet<u64> = candidates.iter().map(|c| c.id).collect();
        let connections = self
            .connections
            .into_iter()
            .filter_map(|c| {
                let a = id_of(&c.story1_id)?;
                let b = id_of(&c.story2_id)?;
                if a == b || !allowed.contains(&a) || !allowed.contains(&b) {
                    return None;
                }
                Some(Connection {
                    item_a_id: a,
                    item_b_id: b,
                    relationship: Relationship::parse(&c.relationship)?,
                    explanation: c.explanation.trim().to_string(),
                })
            })
            .collect();
        CrossLinks {
            connections,
            trends: self
                .trends
                .into_iter()
                .map(text_of)
                .filter(|t| !t.is_empty())
                .collect(),
            power_shift_summary: self.power_shifts.map(text_of).unwrap_or_default(),
        }
    }
}

pub struct CrossLinkEngine {
    oracle: DynOracle,
    max_items: usize,
}

impl CrossLinkEngine {
    pub fn new(oracle: DynOracle, max_items: usize) -> Self {
        Self { oracle, max_items }
    }

    /// Link the first `max_items` of `ranked`. Fewer than two candidates means no call.
    pub async fn link(&self, ranked: &[ScoredItem]) -> CrossLinks {
        let candidates = &ranked[..ranked.len().min(self.max_items)];
        if candidates.len() < 2 {
            return CrossLinks::empty();
        }

        let req = OracleRequest::new(PromptKind::Connect, prompts::connect(candidates));
        match ask_json::<ConnectReply>(self.oracle.as_ref(), &req).await {
            Ok(reply) => reply.validate(candidates),
            Err(e) => {
                tracing::warn!(target: "pipeline", error = %e, "cross-link failed; publishing without connections");
                counter!("crosslink_failures_total").increment(1);
                CrossLinks::empty()
            }
        }
    }
}
