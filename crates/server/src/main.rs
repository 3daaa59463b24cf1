use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use showrunner_core::{
    events::{create_event_system, LogNotifier},
    load_config,
    placer::{FsMover, PathTranslator},
    store::SqliteMediaStore,
    validate_config, Monitor, MonitorServices, Scheduler,
};
use showrunner_server::{init_tracing, serve, shutdown_signal, upstream::Unconfigured, AppState};

/// Buffer size for the monitor event channel
const EVENT_BUFFER_SIZE: usize = 256;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let json_logs = std::env::var("SHOWRUNNER_LOG_FORMAT").is_ok_and(|f| f == "json");
    init_tracing(json_logs);

    let config_path = std::env::var("SHOWRUNNER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;
    info!("Database path: {:?}", config.database.path);

    let store = Arc::new(
        SqliteMediaStore::new(&config.database.path).context("Failed to open media store")?,
    );

    let (events, dispatcher) = create_event_system(Arc::new(LogNotifier), EVENT_BUFFER_SIZE);
    tokio::spawn(dispatcher.run());

    let services = MonitorServices {
        store,
        metadata: Arc::new(Unconfigured::new("metadata provider")),
        episode_list: Arc::new(Unconfigured::new("episode list provider")),
        searcher: Arc::new(Unconfigured::new("release searcher")),
        download_client: Arc::new(Unconfigured::new("download client")),
        mover: Arc::new(FsMover::new(config.placer.clone())),
        path_translator: PathTranslator::new(&config.path_mappings),
        events: Some(events),
    };
    let monitor = Arc::new(Monitor::new(services, &config.download));

    let scheduler = Scheduler::new();
    monitor
        .register_jobs(&scheduler, &config.monitor)
        .context("Failed to register monitor jobs")?;

    let state = Arc::new(AppState::new(config, scheduler));
    serve(state, shutdown_signal()).await
}
