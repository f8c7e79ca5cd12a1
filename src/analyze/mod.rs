// src/analyze/mod.rs
//! Analysis stages between gathering and publishing: oracle scoring, ranking
//! and cross-linking.

pub mod connect;
pub mod prompts;
pub mod rank;
pub mod scoring;

pub use crate::analyze::connect::CrossLinkEngine;
pub use crate::analyze::rank::{rank_and_filter, RankSettings};
pub use crate::analyze::scoring::{ScoringEngine, ScoringSettings};
