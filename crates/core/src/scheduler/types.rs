//! Scheduler job types.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;

use super::cron::CronError;

/// Async body of a scheduled job.
pub type JobFn = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Invalid schedule for job '{job}': {source}")]
    InvalidSchedule {
        job: String,
        #[source]
        source: CronError,
    },
}

/// Result of a single [`Scheduler::run`](super::Scheduler::run) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed(String),
    /// The job was already running; nothing was queued.
    Skipped,
    NotFound,
}

impl RunOutcome {
    /// Label used for the `result` metric dimension.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::Failed(_) => "failed",
            RunOutcome::Skipped => "skipped",
            RunOutcome::NotFound => "not_found",
        }
    }
}

/// Snapshot of one registered job.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub running: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_run_duration_ms: Option<u64>,
    pub last_run_error: Option<String>,
    pub next_run_at: Option<DateTime<Utc>>,
}

/// Mutable per-job run state.
#[derive(Debug, Default)]
pub(super) struct JobState {
    pub running: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_run_duration_ms: Option<u64>,
    pub last_run_error: Option<String>,
}
