use showrunner_core::{Config, Scheduler};

/// Shared application state
pub struct AppState {
    config: Config,
    scheduler: Scheduler,
}

impl AppState {
    pub fn new(config: Config, scheduler: Scheduler) -> Self {
        Self { config, scheduler }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}
