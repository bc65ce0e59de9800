// src/api.rs
//! HTTP trigger surface. An external scheduler hits `/check` on the same
//! cadence as `check_interval_minutes`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::pipeline::PipelineRunner;

#[derive(Clone)]
pub struct AppState {
    runner: Arc<PipelineRunner>,
    /// Held for the duration of a run; overlapping triggers get 409.
    in_flight: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(runner: Arc<PipelineRunner>) -> Self {
        Self {
            runner,
            in_flight: Arc::new(Mutex::new(())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/check", get(check).post(check))
        .with_state(state)
        .merge(health_router())
        .layer(TraceLayer::new_for_http())
}

/// Liveness only. Used alone by the scheduler mode.
pub fn health_router() -> Router {
    Router::new().route("/health", get(|| async { "ok" }))
}

async fn check(State(state): State<AppState>) -> Response {
    let Ok(_guard) = state.in_flight.try_lock() else {
        tracing::warn!(target: "pipeline", "trigger ignored: run already in progress");
        return (StatusCode::CONFLICT, "run already in progress").into_response();
    };

    tracing::info!(target: "pipeline", "check triggered");
    match state.runner.run_now().await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            tracing::error!(target: "pipeline", error = %e, "pipeline failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {e}")).into_response()
        }
    }
}
