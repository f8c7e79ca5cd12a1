// src/analyze/prompts.rs
//! Prompt templates for the three oracle calls. Each one asks for a single JSON
//! object whose shape matches the reply DTOs in `scoring` and `connect`.

use crate::ingest::types::RawItem;
use crate::model::ScoredItem;

const CATEGORIZE: &str = r#"You are a strategic analyst covering the AI industry.
Categorize the news item below. Respond with ONLY a JSON object:
{
  "category": "model_releases|regulatory|funding|research_breakthrough|competitive_positioning|infrastructure",
  "importance": "HIGH|MEDIUM|LOW",
  "impact_score": 1-10,
  "timing_score": 1-10,
  "players_score": 1-10,
  "precedent_score": 1-10,
  "reasoning": "one or two sentences"
}
Weigh strategic consequences over technical novelty."#;

const DEEP_DIVE: &str = r#"You are a strategic analyst covering the AI industry.
Explain why the development below matters. Respond with ONLY a JSON object:
{
  "strategic_takeaway": "one or two sentences on why this matters",
  "implications": ["implication", "..."],
  "affected_players": ["company", "..."],
  "next_moves": "what this enables or which responses to expect",
  "timing_significance": "why this is happening now"
}"#;

const CONNECT: &str = r#"You are a strategic analyst covering the AI industry.
Find relationships between the developments listed below. Respond with ONLY a JSON object:
{
  "connections": [
    {
      "story1_id": <id>,
      "story2_id": <id>,
      "relationship": "response_to|enables|competes_with|builds_on",
      "explanation": "why the two are connected"
    }
  ],
  "trends": ["trend", "..."],
  "power_shifts": "how competitive dynamics are changing"
}
Only use ids from the list."#;

pub fn categorize(item: &RawItem) -> String {
    format!(
        "{CATEGORIZE}\n\nTitle: {}\nSummary: {}\nSource: {}\n",
        item.title,
        item.summary_or_title(),
        item.source
    )
}

pub fn deep_dive(item: &RawItem) -> String {
    format!(
        "{DEEP_DIVE}\n\nTitle: {}\nSummary: {}\n",
        item.title,
        item.summary_or_title()
    )
}

pub fn connect(items: &[ScoredItem]) -> String {
    let listing = items
        .iter()
        .map(|s| format!("ID: {}, Title: {}, Category: {}", s.id, s.title(), s.category.as_str()))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{CONNECT}\n\nDevelopments:\n{listing}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    #[test]
    fn categorize_falls_back_to_title_for_summary() {
        let item = RawItem::new("Tiny model wins", "u", "GitHub", DateTime::<Utc>::default());
        let p = categorize(&item);
        assert!(p.contains("Title: Tiny model wins\nSummary: Tiny model wins\nSource: GitHub"));
        assert!(p.contains("\"importance\": \"HIGH|MEDIUM|LOW\""));
    }
}
