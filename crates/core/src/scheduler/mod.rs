//! Named, cron-driven jobs with at most one concurrent run per name.
//!
//! The [`Scheduler`] is a cheap cloneable handle. Jobs are registered once
//! at startup; [`Scheduler::start`] spawns one ticker per job that sleeps
//! until the next cron instant and spawns a run. A run that finds its job
//! already running is skipped, never queued.

mod cron;
mod types;

pub use cron::{CronError, CronSchedule};
pub use types::{JobFn, JobStatus, RunOutcome, SchedulerError};

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::metrics;
use types::JobState;

struct Job {
    name: String,
    description: String,
    schedule: CronSchedule,
    func: JobFn,
    state: Mutex<JobState>,
}

struct Inner {
    jobs: Mutex<Vec<Arc<Job>>>,
    shutdown_tx: broadcast::Sender<()>,
    started: AtomicBool,
}

/// Cloneable handle to the job registry.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            inner: Arc::new(Inner {
                jobs: Mutex::new(Vec::new()),
                shutdown_tx,
                started: AtomicBool::new(false),
            }),
        }
    }

    /// Register a job.
    ///
    /// Re-registering an existing name keeps the first registration. A job
    /// registered after [`start`](Self::start) gets its ticker immediately.
    pub fn register<F, Fut>(
        &self,
        name: &str,
        description: &str,
        schedule: &str,
        func: F,
    ) -> Result<(), SchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let schedule =
            CronSchedule::parse(schedule).map_err(|source| SchedulerError::InvalidSchedule {
                job: name.to_string(),
                source,
            })?;

        let job = {
            let mut jobs = lock(&self.inner.jobs);
            if jobs.iter().any(|j| j.name == name) {
                warn!("Job '{}' is already registered, keeping the first registration", name);
                return Ok(());
            }
            let job = Arc::new(Job {
                name: name.to_string(),
                description: description.to_string(),
                schedule,
                func: Arc::new(move || func().boxed()),
                state: Mutex::new(JobState::default()),
            });
            jobs.push(Arc::clone(&job));
            job
        };

        info!("Registered job '{}' ({})", job.name, job.schedule);

        if self.inner.started.load(Ordering::SeqCst) {
            self.spawn_ticker(job);
        }
        Ok(())
    }

    fn find(&self, name: &str) -> Option<Arc<Job>> {
        lock(&self.inner.jobs)
            .iter()
            .find(|j| j.name == name)
            .cloned()
    }

    /// Run a job now and wait for it to finish.
    ///
    /// Errors and panics of the job body are captured into the job's
    /// status and never propagate.
    pub async fn run(&self, name: &str) -> RunOutcome {
        let Some(job) = self.find(name) else {
            warn!("Job '{}' not found", name);
            return RunOutcome::NotFound;
        };

        {
            let mut state = lock(&job.state);
            if state.running {
                debug!("Job '{}' is already running, skipping this trigger", name);
                metrics::JOB_RUNS
                    .with_label_values(&[name, RunOutcome::Skipped.as_str()])
                    .inc();
                return RunOutcome::Skipped;
            }
            state.running = true;
        }

        let started_at = Utc::now();
        let timer = Instant::now();
        info!("Job '{}' started", name);

        let func = Arc::clone(&job.func);
        let result = AssertUnwindSafe(async move { func().await })
            .catch_unwind()
            .await;

        let outcome = match result {
            Ok(Ok(())) => RunOutcome::Completed,
            Ok(Err(e)) => RunOutcome::Failed(format!("{:#}", e)),
            Err(panic) => RunOutcome::Failed(panic_message(panic.as_ref())),
        };

        let elapsed = timer.elapsed();
        {
            let mut state = lock(&job.state);
            state.running = false;
            state.last_run_at = Some(started_at);
            state.last_run_duration_ms = Some(elapsed.as_millis() as u64);
            state.last_run_error = match &outcome {
                RunOutcome::Failed(msg) => Some(msg.clone()),
                _ => None,
            };
        }

        metrics::JOB_RUNS
            .with_label_values(&[name, outcome.as_str()])
            .inc();
        metrics::JOB_DURATION
            .with_label_values(&[name])
            .observe(elapsed.as_secs_f64());

        match &outcome {
            RunOutcome::Failed(msg) => {
                error!("Job '{}' failed after {:?}: {}", name, elapsed, msg)
            }
            _ => info!("Job '{}' completed in {:?}", name, elapsed),
        }

        outcome
    }

    /// Spawn a run of `name` without waiting for it.
    ///
    /// Returns `false` if no such job is registered.
    pub fn trigger(&self, name: &str) -> bool {
        if self.find(name).is_none() {
            return false;
        }
        let scheduler = self.clone();
        let name = name.to_string();
        tokio::spawn(async move {
            scheduler.run(&name).await;
        });
        true
    }

    /// Status of every job, in registration order.
    pub fn status(&self) -> Vec<JobStatus> {
        let now = Utc::now();
        let jobs: Vec<Arc<Job>> = lock(&self.inner.jobs).clone();

        jobs.iter()
            .map(|job| {
                let state = lock(&job.state);
                JobStatus {
                    name: job.name.clone(),
                    description: job.description.clone(),
                    schedule: job.schedule.to_string(),
                    running: state.running,
                    last_run_at: state.last_run_at,
                    last_run_duration_ms: state.last_run_duration_ms,
                    last_run_error: state.last_run_error.clone(),
                    next_run_at: job.schedule.next_after(now),
                }
            })
            .collect()
    }

    /// Names of all registered jobs.
    pub fn job_names(&self) -> Vec<String> {
        lock(&self.inner.jobs)
            .iter()
            .map(|j| j.name.clone())
            .collect()
    }

    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst)
    }

    /// Start one ticker task per registered job. Calling twice is a no-op.
    pub fn start(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let jobs: Vec<Arc<Job>> = lock(&self.inner.jobs).clone();
        info!("Starting scheduler with {} jobs", jobs.len());
        for job in jobs {
            self.spawn_ticker(job);
        }
    }

    /// Signal every ticker to exit. Runs already in flight finish normally.
    pub fn stop(&self) {
        if !self.inner.started.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("Stopping scheduler");
        let _ = self.inner.shutdown_tx.send(());
    }

    fn spawn_ticker(&self, job: Arc<Job>) {
        let scheduler = self.clone();
        let mut shutdown_rx = self.inner.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut last_fire: Option<DateTime<Utc>> = None;
            loop {
                let now = Utc::now();
                // never fire the same instant twice if the clock lags the timer
                let from = last_fire.map_or(now, |fired| fired.max(now));
                let Some(next) = job.schedule.next_after(from) else {
                    warn!(
                        "Job '{}' schedule '{}' never fires, ticker exiting",
                        job.name, job.schedule
                    );
                    break;
                };
                let wait = (next - now).to_std().unwrap_or_default();

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Ticker for job '{}' shutting down", job.name);
                        break;
                    }
                    _ = tokio::time::sleep(wait) => {
                        last_fire = Some(next);
                        let scheduler = scheduler.clone();
                        let name = job.name.clone();
                        tokio::spawn(async move {
                            scheduler.run(&name).await;
                        });
                    }
                }
            }
        });
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic: <non-string payload>".to_string()
    }
}
