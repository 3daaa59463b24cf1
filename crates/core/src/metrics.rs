//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Scheduler (job runs, durations)
//! - Discovery (new episodes)
//! - Acquisition (rejections, submissions)
//! - Completion (moves, cleanup)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Scheduler Metrics
// =============================================================================

/// Job runs total by job and result.
pub static JOB_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("showrunner_job_runs_total", "Total scheduled job runs"),
        &["job", "result"], // "completed", "failed", "skipped"
    )
    .unwrap()
});

/// Job duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("showrunner_job_duration_seconds", "Duration of job runs")
            .buckets(vec![0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0]),
        &["job"],
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Episodes discovered total.
pub static EPISODES_DISCOVERED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "showrunner_episodes_discovered_total",
        "Total newly aired episodes recorded",
    )
    .unwrap()
});

/// Candidate releases rejected by reason kind.
pub static RELEASES_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "showrunner_releases_rejected_total",
            "Total candidate releases rejected",
        ),
        &["reason"],
    )
    .unwrap()
});

/// Downloads submitted total.
pub static DOWNLOADS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "showrunner_downloads_submitted_total",
        "Total releases submitted to the download client",
    )
    .unwrap()
});

/// Downloads completed total.
pub static DOWNLOADS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "showrunner_downloads_completed_total",
        "Total downloads moved into the library",
    )
    .unwrap()
});

/// Move failures total.
pub static MOVE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "showrunner_move_failures_total",
        "Total failed library moves",
    )
    .unwrap()
});

/// Torrents removed from the download client total.
pub static TORRENTS_REMOVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "showrunner_torrents_removed_total",
        "Total torrents removed after seeding",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Scheduler
        Box::new(JOB_RUNS.clone()),
        Box::new(JOB_DURATION.clone()),
        // Pipeline
        Box::new(EPISODES_DISCOVERED.clone()),
        Box::new(RELEASES_REJECTED.clone()),
        Box::new(DOWNLOADS_SUBMITTED.clone()),
        Box::new(DOWNLOADS_COMPLETED.clone()),
        Box::new(MOVE_FAILURES.clone()),
        Box::new(TORRENTS_REMOVED.clone()),
    ]
}
