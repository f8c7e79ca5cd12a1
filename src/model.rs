//! Scored items, connections and the published snapshot.
//!
//! A snapshot is built once at the end of a successful refresh and never
//! mutated afterwards; handlers only ever see it behind an `Arc`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::types::RawItem;

/// Strategic bucket assigned by the scoring oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ModelReleases,
    Regulatory,
    Funding,
    ResearchBreakthrough,
    CompetitivePositioning,
    Infrastructure,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::ModelReleases,
        Category::Regulatory,
        Category::Funding,
        Category::ResearchBreakthrough,
        Category::CompetitivePositioning,
        Category::Infrastructure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::ModelReleases => "model_releases",
            Category::Regulatory => "regulatory",
            Category::Funding => "funding",
            Category::ResearchBreakthrough => "research_breakthrough",
            Category::CompetitivePositioning => "competitive_positioning",
            Category::Infrastructure => "infrastructure",
        }
    }

    /// Case-insensitive lookup; tolerates spaces or dashes instead of underscores.
    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL.into_iter().find(|c| c.as_str() == key)
    }
}

/// Coarse priority tier. Declaration order gives `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Importance {
    Low,
    Medium,
    High,
}

impl Importance {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Some(Importance::High),
            "MEDIUM" => Some(Importance::Medium),
            "LOW" => Some(Importance::Low),
            _ => None,
        }
    }
}

/// Sub-scores as returned by the first oracle pass, already clamped to 1..=10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    pub impact_score: u8,
    pub timing_score: u8,
    pub players_score: u8,
    pub precedent_score: u8,
}

impl SubScores {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn uniform(v: u8) -> Self {
        Self {
            impact_score: v,
            timing_score: v,
            players_score: v,
            precedent_score: v,
        }
    }

    /// Rounded mean of the four sub-scores, halves rounding up.
    pub fn overall(&self) -> u8 {
        let sum = self.impact_score as u32
            + self.timing_score as u32
            + self.players_score as u32
            + self.precedent_score as u32;
        ((sum + 2) / 4) as u8
    }
}

/// Result of the first-pass categorization call (or its fallback).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub category: Category,
    pub importance: Importance,
    pub scores: SubScores,
    pub reasoning: String,
}

impl Assessment {
    pub const FALLBACK_REASONING: &'static str = "analysis failed";

    /// Low-confidence default used whenever categorization fails for an item.
    pub fn fallback() -> Self {
        Self {
            category: Category::ResearchBreakthrough,
            importance: Importance::Low,
            scores: SubScores::uniform(3),
            reasoning: Self::FALLBACK_REASONING.to_string(),
        }
    }
}

/// Deep-dive output, only ever attached to HIGH items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategicDetail {
    pub takeaway: String,
    pub implications: Vec<String>,
    pub affected_players: Vec<String>,
    pub next_moves: String,
    pub timing_rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    /// Unique within one snapshot only.
    pub id: u64,
    #[serde(flatten)]
    pub raw: RawItem,
    pub category: Category,
    pub importance: Importance,
    #[serde(flatten)]
    pub scores: SubScores,
    pub overall_score: u8,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategic_detail: Option<StrategicDetail>,
    pub scored_at: DateTime<Utc>,
}

impl ScoredItem {
    /// Builds an item with `overall_score` derived from the sub-scores. A detail
    /// passed for a non-HIGH assessment is discarded. Published items always
    /// carry a summary; a missing one becomes the title.
    pub fn new(
        id: u64,
        mut raw: RawItem,
        assessment: Assessment,
        detail: Option<StrategicDetail>,
        scored_at: DateTime<Utc>,
    ) -> Self {
        if raw.summary.is_none() {
            raw.summary = Some(raw.title.clone());
        }
        let strategic_detail = if assessment.importance == Importance::High {
            detail
        } else {
            None
        };
        Self {
            id,
            raw,
            category: assessment.category,
            importance: assessment.importance,
            overall_score: assessment.scores.overall(),
            scores: assessment.scores,
            reasoning: assessment.reasoning,
            strategic_detail,
            scored_at,
        }
    }

    pub fn title(&self) -> &str {
        &self.raw.title
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    ResponseTo,
    Enables,
    CompetesWith,
    BuildsOn,
}

impl Relationship {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "response_to" => Some(Relationship::ResponseTo),
            "enables" => Some(Relationship::Enables),
            "competes_with" => Some(Relationship::CompetesWith),
            "builds_on" => Some(Relationship::BuildsOn),
            _ => None,
        }
    }
}

/// Pairwise link between two items of the same snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub item_a_id: u64,
    pub item_b_id: u64,
    pub relationship: Relationship,
    pub explanation: String,
}

/// Output of the cross-link pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossLinks {
    pub connections: Vec<Connection>,
    pub trends: Vec<String>,
    pub power_shift_summary: String,
}

impl CrossLinks {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty() && self.trends.is_empty() && self.power_shift_summary.is_empty()
    }
}

/// The cache content: one complete, immutable pipeline result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceSnapshot {
    /// Rank order.
    pub items: Vec<ScoredItem>,
    pub generated_at: DateTime<Utc>,
    pub connections: Vec<Connection>,
    pub trends: Vec<String>,
    pub power_shift_summary: String,
}

impl IntelligenceSnapshot {
    pub fn assemble(items: Vec<ScoredItem>, links: CrossLinks, generated_at: DateTime<Utc>) -> Self {
        Self {
            items,
            generated_at,
            connections: links.connections,
            trends: links.trends,
            power_shift_summary: links.power_shift_summary,
        }
    }

    pub fn find_item(&self, id: u64) -> Option<&ScoredItem> {
        self.items.iter().find(|it| it.id == id)
    }
}
