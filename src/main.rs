//! AI Intelligence Dashboard: binary entrypoint.
//! Boots the Axum HTTP server, the refresh scheduler and the metrics exporter.

use std::sync::Arc;

use ai_intel_dashboard::ingest::scheduler::{spawn_refresh_loop, RefreshSchedule};
use ai_intel_dashboard::metrics::Metrics;
use ai_intel_dashboard::{api, AppConfig, AppState, Pipeline, SnapshotStore};
use shuttle_axum::ShuttleAxum;
use tower_http::services::ServeDir;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// JSON logs when LOG_FORMAT=json, compact otherwise. A subscriber installed
/// by the hosting runtime takes precedence.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ai_intel_dashboard=info,pipeline=info,ingest=info,scoring=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load_default()?;
    let metrics = Metrics::init()?;

    let store = Arc::new(SnapshotStore::new());
    let pipeline = Arc::new(Pipeline::from_config(&cfg, store)?);

    spawn_refresh_loop(
        pipeline.clone(),
        RefreshSchedule {
            interval: cfg.schedule.interval(),
            run_on_startup: cfg.schedule.run_on_startup,
        },
    );

    let router = api::router(AppState { pipeline })
        .merge(metrics.router())
        .fallback_service(ServeDir::new("public"));

    Ok(router.into())
}
