//! Scheduled job endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use showrunner_core::JobStatus;
use std::sync::Arc;
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobStatus>,
}

#[derive(Serialize)]
pub struct TriggerResponse {
    pub job: String,
    pub accepted: bool,
}

pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<JobListResponse> {
    Json(JobListResponse {
        jobs: state.scheduler().status(),
    })
}

/// Run a job now, outside its schedule.
///
/// Returns 202 once the run is spawned. An overlapping run is still
/// accepted here and skipped by the scheduler; an unknown name is 404.
pub async fn trigger_job(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> (StatusCode, Json<TriggerResponse>) {
    let accepted = state.scheduler().trigger(&name);
    let status = if accepted {
        info!("Manual trigger of job '{}'", name);
        StatusCode::ACCEPTED
    } else {
        warn!("Manual trigger of unknown job '{}'", name);
        StatusCode::NOT_FOUND
    };

    (status, Json(TriggerResponse { job: name, accepted }))
}
