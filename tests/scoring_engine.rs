// tests/scoring_engine.rs
//
// Scoring engine against a scripted oracle: fallbacks, deep dives, fatal
// aborts and batch pacing (paused tokio clock).

mod common;

use std::sync::Arc;
use std::time::Duration;

use ai_intel_dashboard::analyze::{ScoringEngine, ScoringSettings};
use ai_intel_dashboard::model::{Category, Importance};
use ai_intel_dashboard::oracle::{OracleError, PromptKind};
use common::{categorize_json, deep_dive_json, keyword_oracle, raw, title_of, ScriptedOracle};
use tokio::time::Instant;

fn no_delay() -> ScoringSettings {
    ScoringSettings {
        batch_size: 5,
        batch_delay: Duration::ZERO,
    }
}

fn titles(n: usize) -> Vec<ai_intel_dashboard::ingest::types::RawItem> {
    (0..n).map(|i| raw(&format!("story {i}"), "arXiv")).collect()
}

#[tokio::test]
async fn ids_follow_input_order_and_overall_is_mean_of_subscores() {
    let oracle = Arc::new(keyword_oracle());
    let engine = ScoringEngine::new(oracle.clone(), no_delay());

    let items = vec![
        raw("urgent frontier model", "TechCrunch"),
        raw("minor dependency bump", "GitHub"),
        raw("seed round for agents", "Hacker News"),
    ];
    let out = engine.score_all(items, 1_000).await.expect("no fatal error");

    assert_eq!(out.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1_000, 1_001, 1_002]);
    assert_eq!(out[0].title(), "urgent frontier model");
    assert_eq!(out[0].importance, Importance::High);
    assert_eq!(out[0].category, Category::ModelReleases);
    assert_eq!(out[0].overall_score, 9); // (9+8+9+8)/4 = 8.5
    assert_eq!(out[1].overall_score, 2);
    assert_eq!(out[2].overall_score, 6); // 6.25

    for it in &out {
        assert!((1..=10).contains(&it.overall_score));
        assert_eq!(it.overall_score, it.scores.overall());
    }
    assert_eq!(oracle.count(PromptKind::Categorize), 3);
    assert_eq!(oracle.count(PromptKind::DeepDive), 1, "only HIGH items get a deep dive");
}

#[tokio::test]
async fn broken_replies_fall_back_per_item() {
    let oracle = Arc::new(ScriptedOracle::new(|req| {
        match title_of(&req.prompt) {
            "garbled" => Ok("I think this is important!".to_string()),
            "server error" => Err(OracleError::Status(500)),
            "bad tag" => Ok(categorize_json("gossip", "HIGH", [9, 9, 9, 9])),
            _ => Ok(categorize_json("regulatory", "MEDIUM", [5, 5, 5, 5])),
        }
    }));
    let engine = ScoringEngine::new(oracle, no_delay());

    let items = vec![
        raw("garbled", "s"),
        raw("server error", "s"),
        raw("fine", "s"),
        raw("bad tag", "s"),
    ];
    let out = engine.score_all(items, 0).await.expect("no fatal error");
    assert_eq!(out.len(), 4);

    for idx in [0, 1, 3] {
        let it = &out[idx];
        assert_eq!(it.category, Category::ResearchBreakthrough);
        assert_eq!(it.importance, Importance::Low);
        assert_eq!(it.overall_score, 3);
        assert_eq!(it.reasoning, "analysis failed");
        assert!(it.strategic_detail.is_none());
    }
    assert_eq!(out[2].category, Category::Regulatory);
    assert_eq!(out[2].overall_score, 5);
}

#[tokio::test]
async fn high_items_carry_detail_unless_the_deep_dive_fails() {
    let oracle = Arc::new(ScriptedOracle::new(|req| match req.kind {
        PromptKind::Categorize => Ok(categorize_json("funding", "HIGH", [8, 8, 8, 8])),
        PromptKind::DeepDive if title_of(&req.prompt) == "flaky" => {
            Err(OracleError::Transport("connection reset".into()))
        }
        PromptKind::DeepDive => Ok(deep_dive_json("Capital is concentrating")),
        PromptKind::Connect => Ok("{}".into()),
    }));
    let engine = ScoringEngine::new(oracle, no_delay());

    let out = engine
        .score_all(vec![raw("solid", "s"), raw("flaky", "s")], 0)
        .await
        .unwrap();

    let detail = out[0].strategic_detail.as_ref().expect("detail for HIGH");
    assert_eq!(detail.takeaway, "Capital is concentrating");
    assert_eq!(detail.affected_players, vec!["OpenAI", "Google"]);

    assert_eq!(out[1].importance, Importance::High, "first pass result is kept");
    assert!(out[1].strategic_detail.is_none());
}

#[tokio::test]
async fn fatal_error_aborts_after_the_current_group() {
    let oracle = Arc::new(ScriptedOracle::new(|_| Err(OracleError::Unauthorized(401))));
    let engine = ScoringEngine::new(oracle.clone(), no_delay());

    let err = engine.score_all(titles(11), 0).await.unwrap_err();
    assert_eq!(err, OracleError::Unauthorized(401));
    assert_eq!(oracle.count(PromptKind::Categorize), 5, "later groups never start");
}

#[tokio::test]
async fn empty_input_makes_no_calls() {
    let oracle = Arc::new(keyword_oracle());
    let engine = ScoringEngine::new(oracle.clone(), ScoringSettings::default());
    assert!(engine.score_all(Vec::new(), 0).await.unwrap().is_empty());
    assert!(oracle.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn groups_are_separated_by_the_pacing_delay() {
    let oracle = Arc::new(keyword_oracle());
    let engine = ScoringEngine::new(oracle.clone(), ScoringSettings::default());

    let t0 = Instant::now();
    let out = engine.score_all(titles(11), 0).await.unwrap();
    assert_eq!(out.len(), 11);
    // 3 groups (5, 5, 1) → 2 pauses of 2s
    assert_eq!(t0.elapsed(), Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn calls_within_a_group_run_concurrently() {
    let oracle = Arc::new(keyword_oracle().with_delay(Duration::from_secs(1)));
    let engine = ScoringEngine::new(oracle.clone(), ScoringSettings::default());

    let t0 = Instant::now();
    engine.score_all(titles(5), 0).await.unwrap();
    assert_eq!(t0.elapsed(), Duration::from_secs(1));

    let t0 = Instant::now();
    engine.score_all(titles(6), 0).await.unwrap();
    // group 1 (1s) + pause (2s) + group 2 (1s)
    assert_eq!(t0.elapsed(), Duration::from_secs(4));
}
