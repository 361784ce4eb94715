// src/server/routes.rs

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive};
use axum::response::Sse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::catalog::CostEstimate;
use crate::engine::Orchestrator;
use crate::state::JobState;
use crate::types::{JobId, RunConfig};

use super::error::ApiError;

type AppState = Arc<Orchestrator>;

/// All HTTP routes, bound to `orchestrator`.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/experiments/results", get(list_all))
        .route("/api/experiments/cost-estimate", get(cost_estimate))
        .route("/api/experiments/{job_id}/run", post(run_job))
        .route("/api/experiments/{job_id}/status", get(job_status))
        .route("/api/experiments/{job_id}/logs", get(job_logs))
        .with_state(orchestrator)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn run_job(
    State(orchestrator): State<AppState>,
    Path(job_id): Path<String>,
    config: Option<Json<RunConfig>>,
) -> Result<Json<JobState>, ApiError> {
    let config = config.map(|Json(c)| c).unwrap_or_default();
    let state = orchestrator.start(&job_id, config)?;
    Ok(Json(state))
}

async fn job_status(
    State(orchestrator): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobState>, ApiError> {
    Ok(Json(orchestrator.status(&job_id).await?))
}

async fn job_logs(
    State(orchestrator): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let events = orchestrator.stream_logs(&job_id).await?;
    debug!(job = %job_id, "log subscriber attached");

    let stream = events.filter_map(|event| match Event::default().json_data(&event) {
        Ok(sse) => Some(Ok(sse)),
        Err(err) => {
            warn!(error = %err, "failed to encode log event");
            None
        }
    });

    Ok(Sse::new(stream).keep_alive(default_keep_alive()))
}

async fn list_all(
    State(orchestrator): State<AppState>,
) -> Result<Json<BTreeMap<JobId, JobState>>, ApiError> {
    Ok(Json(orchestrator.list_all().await?))
}

async fn cost_estimate(State(orchestrator): State<AppState>) -> Json<Vec<CostEstimate>> {
    Json(orchestrator.estimate_cost())
}

fn default_keep_alive() -> KeepAlive {
    KeepAlive::new()
        .interval(Duration::from_secs(15))
        .text("keep-alive")
}
