//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the showrunner server:
//! - HTTP request metrics (latency, counts)
//! - Scheduler state (collected dynamically from job status)
//!
//! Pipeline counters live in `showrunner_core::metrics` and are registered
//! into the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use tracing::error;

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "showrunner_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("showrunner_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "showrunner_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Scheduler Metrics
// =============================================================================

/// Whether a job is executing right now (1) or idle (0).
pub static JOB_RUNNING: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("showrunner_job_running", "Whether the job is currently running"),
        &["job"],
    )
    .unwrap()
});

/// Unix timestamp of the next scheduled run, 0 when none is due.
pub static JOB_NEXT_RUN: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "showrunner_job_next_run_timestamp_seconds",
            "Next scheduled run of the job",
        ),
        &["job"],
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    let server: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        Box::new(JOB_RUNNING.clone()),
        Box::new(JOB_NEXT_RUN.clone()),
    ];

    for metric in server
        .into_iter()
        .chain(showrunner_core::metrics::all_metrics())
    {
        if let Err(e) = registry.register(metric) {
            error!("Failed to register metric: {}", e);
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Refresh the scheduler gauges from current job status.
pub fn collect_dynamic_metrics(state: &AppState) {
    for job in state.scheduler().status() {
        JOB_RUNNING
            .with_label_values(&[job.name.as_str()])
            .set(i64::from(job.running));
        JOB_NEXT_RUN
            .with_label_values(&[job.name.as_str()])
            .set(job.next_run_at.map(|t| t.timestamp()).unwrap_or(0));
    }
}

/// Normalize a path for metric labels (job names in trigger paths become a placeholder).
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        ["", "api", "v1", "jobs", _, "trigger"] => "/api/v1/jobs/{name}/trigger".to_string(),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use showrunner_core::{Config, Scheduler};

    #[test]
    fn test_normalize_path_trigger() {
        assert_eq!(
            normalize_path("/api/v1/jobs/discovery/trigger"),
            "/api/v1/jobs/{name}/trigger"
        );
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
        assert_eq!(normalize_path("/api/v1/jobs"), "/api/v1/jobs");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics().unwrap();
        assert!(output.contains("showrunner_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_includes_core_metrics() {
        showrunner_core::metrics::DOWNLOADS_SUBMITTED.inc_by(0);
        showrunner_core::metrics::JOB_RUNS
            .with_label_values(&["test", "completed"])
            .inc();

        let output = encode_metrics().unwrap();
        assert!(output.contains("showrunner_downloads_submitted_total"));
        assert!(output.contains("showrunner_job_runs_total"));
    }

    #[tokio::test]
    async fn test_collect_dynamic_metrics() {
        let scheduler = Scheduler::new();
        scheduler
            .register("metrics-sample", "sample job", "0 * * * *", || async {
                Ok::<(), anyhow::Error>(())
            })
            .unwrap();
        let state = AppState::new(Config::default(), scheduler);

        collect_dynamic_metrics(&state);

        assert_eq!(JOB_RUNNING.with_label_values(&["metrics-sample"]).get(), 0);
        assert!(JOB_NEXT_RUN.with_label_values(&["metrics-sample"]).get() > 0);
    }
}
