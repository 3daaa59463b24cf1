//! The background monitor: discovery, acquisition and completion stages,
//! wired into the [`Scheduler`] as three independently scheduled jobs.

mod acquisition;
mod completion;
mod config;
mod discovery;
mod types;

pub use acquisition::Acquisition;
pub use completion::Completion;
pub use config::{DownloadConfig, MonitorConfig};
pub use discovery::{select_season, Discovery};
pub use types::{AcquisitionReport, CompletionReport, DiscoveryReport, MonitorError};

use std::sync::Arc;

use tracing::info;

use crate::download_client::{DownloadClient, TorrentLifecycle};
use crate::events::EventHandle;
use crate::feed::ReleaseSearcher;
use crate::metadata::{EpisodeListProvider, MetadataProvider};
use crate::placer::{Mover, PathTranslator};
use crate::scheduler::{Scheduler, SchedulerError};
use crate::store::MediaStore;

/// Job name of the discovery stage.
pub const DISCOVERY_JOB: &str = "discovery";
/// Job name of the acquisition stage.
pub const ACQUISITION_JOB: &str = "acquisition";
/// Job name of the completion stage.
pub const COMPLETION_JOB: &str = "completion";

/// Collaborators the monitor stages call out to.
#[derive(Clone)]
pub struct MonitorServices {
    pub store: Arc<dyn MediaStore>,
    pub metadata: Arc<dyn MetadataProvider>,
    pub episode_list: Arc<dyn EpisodeListProvider>,
    pub searcher: Arc<dyn ReleaseSearcher>,
    pub download_client: Arc<dyn DownloadClient>,
    pub mover: Arc<dyn Mover>,
    pub path_translator: PathTranslator,
    pub events: Option<EventHandle>,
}

/// The three pipeline stages sharing one set of collaborators.
pub struct Monitor {
    discovery: Discovery,
    acquisition: Acquisition,
    completion: Completion,
}

impl Monitor {
    pub fn new(services: MonitorServices, download: &DownloadConfig) -> Self {
        let lifecycle = TorrentLifecycle::new(
            Arc::clone(&services.download_client),
            download.tags(),
            download.delete_files_on_cleanup,
        )
        .with_events(services.events.clone());

        Self {
            discovery: Discovery::new(
                Arc::clone(&services.store),
                services.metadata,
                services.episode_list,
                services.events.clone(),
            ),
            acquisition: Acquisition::new(
                Arc::clone(&services.store),
                services.searcher,
                services.download_client,
                download.clone(),
                services.events.clone(),
            ),
            completion: Completion::new(
                services.store,
                lifecycle,
                services.mover,
                services.path_translator,
                services.events,
            ),
        }
    }

    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    pub fn acquisition(&self) -> &Acquisition {
        &self.acquisition
    }

    pub fn completion(&self) -> &Completion {
        &self.completion
    }

    /// Register the three stages with `scheduler`.
    ///
    /// Does nothing when the monitor is disabled. When
    /// `run_discovery_on_start` is set, discovery is also triggered once
    /// right away, so this must be called inside a tokio runtime.
    pub fn register_jobs(
        self: &Arc<Self>,
        scheduler: &Scheduler,
        config: &MonitorConfig,
    ) -> Result<(), SchedulerError> {
        if !config.enabled {
            info!("Monitor disabled, no jobs registered");
            return Ok(());
        }

        let monitor = Arc::clone(self);
        scheduler.register(
            DISCOVERY_JOB,
            "Record newly aired episodes as pending",
            &config.discovery_schedule,
            move || {
                let monitor = Arc::clone(&monitor);
                async move {
                    monitor.discovery.run().await?;
                    Ok::<(), anyhow::Error>(())
                }
            },
        )?;

        let monitor = Arc::clone(self);
        scheduler.register(
            ACQUISITION_JOB,
            "Search feeds and submit matching releases",
            &config.acquisition_schedule,
            move || {
                let monitor = Arc::clone(&monitor);
                async move {
                    monitor.acquisition.run().await?;
                    Ok::<(), anyhow::Error>(())
                }
            },
        )?;

        let monitor = Arc::clone(self);
        scheduler.register(
            COMPLETION_JOB,
            "Move finished downloads into the library",
            &config.completion_schedule,
            move || {
                let monitor = Arc::clone(&monitor);
                async move {
                    monitor.completion.run().await?;
                    Ok::<(), anyhow::Error>(())
                }
            },
        )?;

        if config.run_discovery_on_start {
            info!("Running discovery once at startup");
            scheduler.trigger(DISCOVERY_JOB);
        }
        Ok(())
    }
}
