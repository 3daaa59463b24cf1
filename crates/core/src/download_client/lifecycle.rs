//! Managed-torrent scoping and post-seeding cleanup.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info};

use super::types::{ClientTorrent, DownloadClient, DownloadClientError};
use crate::events::{EventHandle, MonitorEvent};
use crate::metrics;

/// Download-client tags the monitor owns, in configured order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedTags(Vec<String>);

impl ManagedTags {
    /// Parse a comma-separated tag string. Tags are trimmed, empties and
    /// repeats dropped.
    pub fn parse(raw: &str) -> Self {
        let mut tags: Vec<String> = Vec::new();
        for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        Self(tags)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// Tag attached to new downloads: the first configured one.
    pub fn primary(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Whether the payload of `torrent` is fully downloaded.
pub fn is_complete(torrent: &ClientTorrent) -> bool {
    torrent.progress >= 1.0 || torrent.state.is_done()
}

/// Whether `torrent` carries at least one managed tag. An empty set manages nothing.
pub fn is_managed(torrent: &ClientTorrent, tags: &ManagedTags) -> bool {
    torrent.tag_list().any(|t| tags.contains(t))
}

/// Result of a cleanup attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    Removed,
    NotManaged,
    StillActive,
    Failed,
}

/// Wraps a download client with the monitor's ownership rules.
pub struct TorrentLifecycle {
    client: Arc<dyn DownloadClient>,
    tags: ManagedTags,
    delete_files: bool,
    events: Option<EventHandle>,
}

impl TorrentLifecycle {
    pub fn new(client: Arc<dyn DownloadClient>, tags: ManagedTags, delete_files: bool) -> Self {
        Self {
            client,
            tags,
            delete_files,
            events: None,
        }
    }

    pub fn with_events(mut self, events: Option<EventHandle>) -> Self {
        self.events = events;
        self
    }

    pub fn tags(&self) -> &ManagedTags {
        &self.tags
    }

    /// Torrents visible to the monitor.
    ///
    /// With no managed tags the whole client is listed once. Otherwise one
    /// listing per tag is made and the union is deduplicated by hash.
    pub async fn resolve_managed_torrents(&self) -> Result<Vec<ClientTorrent>, DownloadClientError> {
        if self.tags.is_empty() {
            return self.client.list_torrents(None).await;
        }

        let mut seen = HashSet::new();
        let mut torrents = Vec::new();
        for tag in self.tags.iter() {
            for torrent in self.client.list_torrents(Some(tag)).await? {
                if seen.insert(torrent.hash.to_lowercase()) {
                    torrents.push(torrent);
                }
            }
        }
        Ok(torrents)
    }

    /// Delete `torrent` from the client if it is managed and paused.
    pub async fn cleanup(&self, torrent: &ClientTorrent) -> CleanupOutcome {
        if !is_managed(torrent, &self.tags) {
            debug!("Torrent {} is not managed, leaving it", torrent.hash);
            return CleanupOutcome::NotManaged;
        }

        if !torrent.state.is_stopped() {
            debug!(
                "Torrent {} still {}, cleanup deferred",
                torrent.hash,
                torrent.state.as_str()
            );
            return CleanupOutcome::StillActive;
        }

        match self.client.delete(&torrent.hash, self.delete_files).await {
            Ok(()) => {
                info!(
                    "Removed torrent {} ({}) from {}",
                    torrent.name,
                    torrent.hash,
                    self.client.name()
                );
                metrics::TORRENTS_REMOVED.inc();
                if let Some(events) = &self.events {
                    events.try_emit(MonitorEvent::TorrentRemoved {
                        hash: torrent.hash.to_lowercase(),
                        name: torrent.name.clone(),
                        delete_files: self.delete_files,
                    });
                }
                CleanupOutcome::Removed
            }
            Err(e) => {
                error!("Failed to remove torrent {}: {}", torrent.hash, e);
                CleanupOutcome::Failed
            }
        }
    }
}
