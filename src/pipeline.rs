// src/pipeline.rs
//! Refresh orchestrator: gather → score → rank → link → publish.
//!
//! Stages run strictly one after another and the working set stays private to
//! the run until the final swap into [`SnapshotStore`], so readers never see a
//! partial result. A failed run leaves the previous snapshot in place.
//!
//! Overlapping triggers are rejected: while a run is in flight, `run_once`
//! returns [`RefreshError::InProgress`] immediately and the in-flight run is
//! unaffected.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use chrono::Utc;
use metrics::{counter, gauge, histogram};
use serde::Serialize;

use crate::analyze::connect::CrossLinkEngine;
use crate::analyze::rank::{rank_and_filter, RankSettings};
use crate::analyze::scoring::{ScoringEngine, ScoringSettings};
use crate::cache::{CacheStatus, SnapshotStore};
use crate::config::AppConfig;
use crate::ingest::{self, http::HttpFetcher, providers::build_sources, DynSource};
use crate::model::{IntelligenceSnapshot, ScoredItem};
use crate::oracle::{build_oracle, DynOracle, OracleError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Stage {
    Idle = 0,
    Gathering = 1,
    Scoring = 2,
    Ranking = 3,
    Linking = 4,
    Publishing = 5,
    /// Last run failed; cleared by the next run.
    Error = 6,
}

impl Stage {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Stage::Gathering,
            2 => Stage::Scoring,
            3 => Stage::Ranking,
            4 => Stage::Linking,
            5 => Stage::Publishing,
            6 => Stage::Error,
            _ => Stage::Idle,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Idle => "idle",
            Stage::Gathering => "gathering",
            Stage::Scoring => "scoring",
            Stage::Ranking => "ranking",
            Stage::Linking => "linking",
            Stage::Publishing => "publishing",
            Stage::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("a refresh is already in progress")]
    InProgress,
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: OracleError,
    },
    #[error("refresh task aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub scoring: ScoringSettings,
    pub ranking: RankSettings,
    /// Ranked items handed to the cross-link pass.
    pub link_top: usize,
    /// Title similarity threshold; `None` disables cross-source dedup.
    pub dedup_similarity: Option<f64>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            scoring: ScoringSettings::default(),
            ranking: RankSettings::default(),
            link_top: 10,
            dedup_similarity: None,
        }
    }
}

impl From<&AppConfig> for PipelineSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            scoring: ScoringSettings::from(&cfg.scoring),
            ranking: RankSettings::from(&cfg.ranking),
            link_top: cfg.ranking.link_top,
            dedup_similarity: cfg.dedup.enabled.then_some(cfg.dedup.title_similarity),
        }
    }
}

/// Liveness and staleness, as served on `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct Health {
    #[serde(flatten)]
    pub cache: CacheStatus,
    pub stage: Stage,
    pub refreshing: bool,
}

pub struct Pipeline {
    sources: Vec<DynSource>,
    scoring: ScoringEngine,
    linker: CrossLinkEngine,
    settings: PipelineSettings,
    store: Arc<SnapshotStore>,
    running: AtomicBool,
    stage: AtomicU8,
}

/// Held by the task that owns a run. Clears the in-flight flag on every exit
/// path; a run that stops mid-stage (task aborted, panic) is marked `Error`.
struct RunGuard {
    pipeline: Arc<Pipeline>,
}

impl RunGuard {
    fn acquire(pipeline: &Arc<Pipeline>) -> Option<Self> {
        pipeline
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RunGuard {
                pipeline: pipeline.clone(),
            })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !matches!(self.pipeline.stage(), Stage::Idle | Stage::Error) {
            self.pipeline.enter(Stage::Error);
        }
        self.pipeline.running.store(false, Ordering::SeqCst);
    }
}

impl Pipeline {
    pub fn new(
        sources: Vec<DynSource>,
        oracle: DynOracle,
        settings: PipelineSettings,
        store: Arc<SnapshotStore>,
    ) -> Self {
        Self {
            sources,
            scoring: ScoringEngine::new(oracle.clone(), settings.scoring),
            linker: CrossLinkEngine::new(oracle, settings.link_top),
            settings,
            store,
            running: AtomicBool::new(false),
            stage: AtomicU8::new(Stage::Idle as u8),
        }
    }

    /// Wire real HTTP sources and the configured oracle.
    pub fn from_config(cfg: &AppConfig, store: Arc<SnapshotStore>) -> anyhow::Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(
            &cfg.sources.user_agent,
            cfg.sources.fetch_timeout(),
        )?);
        let sources = build_sources(&cfg.sources, fetcher);
        let oracle = build_oracle(&cfg.oracle)?;
        tracing::info!(
            target: "pipeline",
            sources = sources.len(),
            oracle = oracle.provider_name(),
            "pipeline configured"
        );
        Ok(Self::new(sources, oracle, PipelineSettings::from(cfg), store))
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn current(&self) -> Option<Arc<IntelligenceSnapshot>> {
        self.store.current()
    }

    pub fn find_item(&self, id: u64) -> Option<ScoredItem> {
        self.store.find_item(id)
    }

    pub fn stage(&self) -> Stage {
        Stage::from_u8(self.stage.load(Ordering::SeqCst))
    }

    pub fn is_refreshing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn health(&self) -> Health {
        Health {
            cache: self.store.status(),
            stage: self.stage(),
            refreshing: self.is_refreshing(),
        }
    }

    fn enter(&self, stage: Stage) {
        self.stage.store(stage as u8, Ordering::SeqCst);
        tracing::debug!(target: "pipeline", %stage, "stage");
    }

    /// Run the whole pipeline once and publish the result.
    ///
    /// The run lives on its own task: dropping the returned future (client
    /// disconnect, timeout) only stops waiting, the run still completes and
    /// publishes.
    pub async fn run_once(self: &Arc<Self>) -> Result<Arc<IntelligenceSnapshot>, RefreshError> {
        let Some(guard) = RunGuard::acquire(self) else {
            tracing::info!(target: "pipeline", "refresh already running; trigger rejected");
            counter!("pipeline_runs_total", "outcome" => "rejected").increment(1);
            return Err(RefreshError::InProgress);
        };

        let pipeline = self.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            pipeline.run_guarded().await
        });
        task.await.map_err(|e| {
            counter!("pipeline_runs_total", "outcome" => "aborted").increment(1);
            tracing::error!(target: "pipeline", error = %e, "refresh task did not finish");
            RefreshError::Aborted(e.to_string())
        })?
    }

    async fn run_guarded(&self) -> Result<Arc<IntelligenceSnapshot>, RefreshError> {
        let t0 = std::time::Instant::now();
        let result = self.execute().await;
        histogram!("pipeline_run_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        match &result {
            Ok(snap) => {
                self.enter(Stage::Idle);
                counter!("pipeline_runs_total", "outcome" => "ok").increment(1);
                gauge!("pipeline_last_run_ts").set(snap.generated_at.timestamp() as f64);
                tracing::info!(
                    target: "pipeline",
                    items = snap.items.len(),
                    connections = snap.connections.len(),
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "intelligence refresh complete"
                );
            }
            Err(e) => {
                self.enter(Stage::Error);
                counter!("pipeline_runs_total", "outcome" => "error").increment(1);
                tracing::error!(target: "pipeline", error = %e, "intelligence refresh failed; keeping previous snapshot");
            }
        }
        result
    }

    async fn execute(&self) -> Result<Arc<IntelligenceSnapshot>, RefreshError> {
        self.enter(Stage::Gathering);
        let mut raw = ingest::flatten(ingest::gather(&self.sources).await);
        if let Some(similarity) = self.settings.dedup_similarity {
            let (kept, dropped) = ingest::dedup_similar(raw, similarity);
            tracing::info!(target: "pipeline", dropped, "cross-source dedup");
            raw = kept;
        }
        tracing::info!(target: "pipeline", raw = raw.len(), "gathered raw items");

        self.enter(Stage::Scoring);
        // Ids are unique within the snapshot only.
        let id_base = Utc::now().timestamp_millis().max(0) as u64;
        let scored = self
            .scoring
            .score_all(raw, id_base)
            .await
            .map_err(|source| RefreshError::Stage {
                stage: Stage::Scoring,
                source,
            })?;

        self.enter(Stage::Ranking);
        let ranked = rank_and_filter(scored, &self.settings.ranking);

        self.enter(Stage::Linking);
        let links = self.linker.link(&ranked).await;

        self.enter(Stage::Publishing);
        let snapshot = IntelligenceSnapshot::assemble(ranked, links, Utc::now());
        Ok(self.store.publish(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_roundtrips_through_atomic_repr() {
        for s in [
            Stage::Idle,
            Stage::Gathering,
            Stage::Scoring,
            Stage::Ranking,
            Stage::Linking,
            Stage::Publishing,
            Stage::Error,
        ] {
            assert_eq!(Stage::from_u8(s as u8), s);
        }
    }

    fn idle_pipeline() -> Arc<Pipeline> {
        Arc::new(Pipeline::new(
            Vec::new(),
            Arc::new(crate::oracle::DisabledOracle),
            PipelineSettings::default(),
            Arc::new(SnapshotStore::new()),
        ))
    }

    #[test]
    fn run_guard_is_exclusive_and_released_on_drop() {
        let p = idle_pipeline();
        let g = RunGuard::acquire(&p).expect("first acquire");
        assert!(p.is_refreshing());
        assert!(RunGuard::acquire(&p).is_none());
        drop(g);
        assert!(!p.is_refreshing());
        assert!(RunGuard::acquire(&p).is_some());
    }

    #[test]
    fn dropped_guard_never_leaves_a_running_stage() {
        let p = idle_pipeline();
        let g = RunGuard::acquire(&p).unwrap();
        p.enter(Stage::Scoring);
        drop(g);
        assert_eq!(p.stage(), Stage::Error);

        let g = RunGuard::acquire(&p).unwrap();
        p.enter(Stage::Idle);
        drop(g);
        assert_eq!(p.stage(), Stage::Idle);
    }

    #[test]
    fn settings_follow_config() {
        let mut cfg = AppConfig::default();
        cfg.dedup.enabled = true;
        cfg.ranking.link_top = 4;
        let s = PipelineSettings::from(&cfg);
        assert_eq!(s.link_top, 4);
        assert_eq!(s.dedup_similarity, Some(0.92));
        assert_eq!(s.scoring.batch_size, 5);
    }
}
