// src/analyze/rank.rs
//! Ranking: drop weak LOW items, order by importance tier then overall score,
//! keep the top N.
//!
//! The sort is stable, so items tied on both keys keep their scoring order and
//! identical input always ranks identically.

use crate::config::RankingConfig;
use crate::model::{Importance, ScoredItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankSettings {
    pub keep_top: usize,
    pub min_low_score: u8,
}

impl Default for RankSettings {
    fn default() -> Self {
        Self {
            keep_top: 20,
            min_low_score: 6,
        }
    }
}

impl From<&RankingConfig> for RankSettings {
    fn from(cfg: &RankingConfig) -> Self {
        Self {
            keep_top: cfg.keep_top,
            min_low_score: cfg.min_low_score,
        }
    }
}

/// LOW items survive only with a strong overall score.
pub fn is_retained(item: &ScoredItem, settings: &RankSettings) -> bool {
    item.importance != Importance::Low || item.overall_score >= settings.min_low_score
}

pub fn rank_and_filter(items: Vec<ScoredItem>, settings: &RankSettings) -> Vec<ScoredItem> {
    let mut kept: Vec<ScoredItem> = items
        .into_iter()
        .filter(|it| is_retained(it, settings))
        .collect();
    kept.sort_by(|a, b| {
        b.importance
            .cmp(&a.importance)
            .then_with(|| b.overall_score.cmp(&a.overall_score))
    });
    kept.truncate(settings.keep_top);
    kept
}
