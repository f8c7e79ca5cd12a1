// src/api.rs
//! Thin HTTP mapping over the pipeline. Reads never fail: before the first
//! refresh the intelligence endpoint returns an empty-shaped body.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::pipeline::{Health, Pipeline, RefreshError};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/intelligence", get(intelligence))
        .route("/api/refresh", post(refresh))
        .route("/api/story/{id}", get(story))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct HealthOut {
    status: &'static str,
    #[serde(flatten)]
    health: Health,
}

async fn health(State(state): State<AppState>) -> Json<HealthOut> {
    Json(HealthOut {
        status: "ok",
        health: state.pipeline.health(),
    })
}

async fn intelligence(State(state): State<AppState>) -> Response {
    match state.pipeline.current() {
        Some(snap) => Json(snap.as_ref()).into_response(),
        None => Json(json!({
            "items": [],
            "generated_at": null,
            "connections": [],
            "trends": [],
            "power_shift_summary": "",
        }))
        .into_response(),
    }
}

async fn refresh(State(state): State<AppState>) -> Response {
    match state.pipeline.run_once().await {
        Ok(snap) => Json(json!({ "success": true, "data": snap.as_ref() })).into_response(),
        Err(e) => {
            let status = match e {
                RefreshError::InProgress => StatusCode::CONFLICT,
                RefreshError::Stage { .. } | RefreshError::Aborted(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (status, Json(json!({ "success": false, "error": e.to_string() }))).into_response()
        }
    }
}

async fn story(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let found = id.trim().parse::<u64>().ok().and_then(|id| state.pipeline.find_item(id));
    match found {
        Some(item) => Json(item).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Story not found" })),
        )
            .into_response(),
    }
}
