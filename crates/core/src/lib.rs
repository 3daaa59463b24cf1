pub mod config;
pub mod download_client;
pub mod events;
pub mod feed;
pub mod matcher;
pub mod metadata;
pub mod metrics;
pub mod monitor;
pub mod placer;
pub mod scheduler;
pub mod store;
pub mod testing;
pub mod util;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use monitor::{
    Monitor, MonitorConfig, MonitorError, MonitorServices, ACQUISITION_JOB, COMPLETION_JOB,
    DISCOVERY_JOB,
};
pub use scheduler::{JobStatus, RunOutcome, Scheduler, SchedulerError};
