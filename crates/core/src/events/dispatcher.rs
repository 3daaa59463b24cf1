use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::{EventEnvelope, EventHandle, MonitorEvent};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification transport failed: {0}")]
    Transport(String),
}

/// Delivers monitor events to the outside world.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, envelope: &EventEnvelope) -> Result<(), NotifyError>;
}

/// Notifier that writes events to the tracing log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, envelope: &EventEnvelope) -> Result<(), NotifyError> {
        match &envelope.event {
            MonitorEvent::EpisodeDiscovered {
                title,
                season,
                episode_number,
                ..
            } => tracing::info!(
                "New episode: {} S{:02}E{:02}",
                title,
                season.unwrap_or(1),
                episode_number
            ),
            MonitorEvent::DownloadStarted {
                title,
                release_title,
                ..
            } => tracing::info!("Download started for {}: {}", title, release_title),
            MonitorEvent::DownloadCompleted {
                title, file_path, ..
            } => tracing::info!("Download completed for {}: {}", title, file_path),
            MonitorEvent::MoveFailed {
                hash,
                source_path,
                error,
                ..
            } => tracing::warn!(
                "Move failed for torrent {} ({}): {}",
                hash,
                source_path,
                error
            ),
            MonitorEvent::TorrentRemoved { hash, name, .. } => {
                tracing::info!("Removed torrent {} ({})", name, hash)
            }
        }
        Ok(())
    }
}

/// Background task that receives events and forwards them to a notifier
pub struct EventDispatcher {
    rx: mpsc::Receiver<EventEnvelope>,
    notifier: Arc<dyn Notifier>,
}

impl EventDispatcher {
    pub fn new(rx: mpsc::Receiver<EventEnvelope>, notifier: Arc<dyn Notifier>) -> Self {
        Self { rx, notifier }
    }

    /// Run the dispatcher, consuming events until every handle is dropped
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        tracing::info!("Event dispatcher started ({})", self.notifier.name());

        while let Some(envelope) = self.rx.recv().await {
            if let Err(e) = self.notifier.notify(&envelope).await {
                tracing::error!(
                    "Failed to deliver {} event: {}",
                    envelope.event.event_type(),
                    e
                );
            }
        }

        tracing::info!("Event dispatcher shutting down");
    }
}

/// Create a complete event system
///
/// Returns the `EventHandle` to clone into the pipeline stages and the
/// `EventDispatcher` to spawn with `tokio::spawn(dispatcher.run())`.
pub fn create_event_system(
    notifier: Arc<dyn Notifier>,
    buffer_size: usize,
) -> (EventHandle, EventDispatcher) {
    let (tx, rx) = mpsc::channel(buffer_size);
    let handle = EventHandle::new(tx);
    let dispatcher = EventDispatcher::new(rx, notifier);
    (handle, dispatcher)
}
