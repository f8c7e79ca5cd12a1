// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::pipeline::{Pipeline, RefreshError};

#[derive(Clone, Copy, Debug)]
pub struct RefreshSchedule {
    pub interval: Duration,
    pub run_on_startup: bool,
}

/// Spawn the periodic refresh loop. A tick that lands while another refresh
/// (e.g. a manual one) is running is skipped.
pub fn spawn_refresh_loop(pipeline: Arc<Pipeline>, schedule: RefreshSchedule) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(schedule.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        if !schedule.run_on_startup {
            // First tick completes immediately.
            ticker.tick().await;
        }
        loop {
            ticker.tick().await;
            counter!("scheduler_ticks_total").increment(1);
            tracing::info!(target: "ingest", "scheduled intelligence refresh starting");
            match pipeline.run_once().await {
                Ok(_) => {}
                Err(RefreshError::InProgress) => {
                    tracing::info!(target: "ingest", "scheduled refresh skipped; another run in flight");
                }
                // Already logged by the pipeline; the loop keeps going.
                Err(_) => {}
            }
        }
    })
}
