//! Finished-download detection, library placement and client cleanup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::types::{CompletionReport, MonitorError};
use crate::download_client::{is_complete, CleanupOutcome, ClientTorrent, TorrentLifecycle};
use crate::events::{EventHandle, MonitorEvent};
use crate::metrics;
use crate::placer::{Mover, PathTranslator, PlacerError};
use crate::store::{
    Episode, EpisodePatch, EpisodeStatus, MediaStore, Subscription, SubscriptionPatch,
    SubscriptionStatus, TorrentPatch, TorrentRecord, TorrentStatus,
};
use crate::util::{
    build_episode_filename, build_movie_filename, pick_primary_video, VIDEO_EXTENSIONS,
};

/// What is being completed.
enum Item<'a> {
    Episode(&'a Episode),
    Movie(&'a TorrentRecord),
}

impl Item<'_> {
    fn episode_id(&self) -> Option<i64> {
        match self {
            Item::Episode(episode) => Some(episode.id),
            Item::Movie(record) => record.episode_id,
        }
    }
}

/// Moves finished downloads into the library and reclaims seeded torrents.
pub struct Completion {
    store: Arc<dyn MediaStore>,
    lifecycle: TorrentLifecycle,
    mover: Arc<dyn Mover>,
    translator: PathTranslator,
    events: Option<EventHandle>,
}

impl Completion {
    pub fn new(
        store: Arc<dyn MediaStore>,
        lifecycle: TorrentLifecycle,
        mover: Arc<dyn Mover>,
        translator: PathTranslator,
        events: Option<EventHandle>,
    ) -> Self {
        Self {
            store,
            lifecycle,
            mover,
            translator,
            events,
        }
    }

    pub async fn run(&self) -> Result<CompletionReport, MonitorError> {
        let torrents = self.lifecycle.resolve_managed_torrents().await?;
        let by_hash: HashMap<String, &ClientTorrent> = torrents
            .iter()
            .map(|t| (t.hash.to_lowercase(), t))
            .collect();

        let subscriptions = self.store.list_active_subscriptions()?;
        let mut report = CompletionReport::default();

        self.retry_cleanup(&subscriptions, &by_hash, &mut report)
            .await;

        for subscription in &subscriptions {
            let result = if subscription.media_type.is_episodic() {
                self.complete_episodes(subscription, &by_hash, &mut report)
                    .await
            } else {
                self.complete_movie(subscription, &by_hash, &mut report)
                    .await
            };
            if let Err(e) = result {
                warn!(
                    "Completion check failed for subscription {} ({}): {}",
                    subscription.id, subscription.title, e
                );
            }
        }

        info!(
            "Completion moved {} downloads, cleaned up {} torrents, {} move failures",
            report.completed, report.cleaned_up, report.move_failures
        );
        Ok(report)
    }

    /// Cleanup of torrents already completed on an earlier run but still present.
    async fn retry_cleanup(
        &self,
        subscriptions: &[Subscription],
        by_hash: &HashMap<String, &ClientTorrent>,
        report: &mut CompletionReport,
    ) {
        for subscription in subscriptions {
            let records = match self.store.list_torrents(subscription.id) {
                Ok(records) => records,
                Err(e) => {
                    warn!(
                        "Failed to list torrents of subscription {}: {}",
                        subscription.id, e
                    );
                    continue;
                }
            };

            for record in records
                .iter()
                .filter(|r| r.status == TorrentStatus::Completed)
            {
                let Some(torrent) = record.hash.as_deref().and_then(|h| by_hash.get(h)) else {
                    continue;
                };
                debug!("Retrying cleanup of completed torrent {}", torrent.hash);
                if self.lifecycle.cleanup(torrent).await == CleanupOutcome::Removed {
                    report.cleaned_up += 1;
                }
            }
        }
    }

    async fn complete_episodes(
        &self,
        subscription: &Subscription,
        by_hash: &HashMap<String, &ClientTorrent>,
        report: &mut CompletionReport,
    ) -> Result<(), MonitorError> {
        let episodes = self.store.list_episodes(subscription.id)?;

        for episode in episodes
            .iter()
            .filter(|e| e.status == EpisodeStatus::Downloading)
        {
            let Some(hash) = episode.torrent_hash.as_deref() else {
                continue;
            };
            let Some(torrent) = finished(by_hash, hash) else {
                continue;
            };

            if let Err(e) = self
                .complete(subscription, Item::Episode(episode), torrent, report)
                .await
            {
                error!(
                    "Failed to record completion of '{}' episode {} ({}): {}",
                    subscription.title, episode.episode_number, hash, e
                );
            }
        }
        Ok(())
    }

    async fn complete_movie(
        &self,
        subscription: &Subscription,
        by_hash: &HashMap<String, &ClientTorrent>,
        report: &mut CompletionReport,
    ) -> Result<(), MonitorError> {
        let records = self.store.list_torrents(subscription.id)?;

        for record in records
            .iter()
            .filter(|r| r.status == TorrentStatus::Downloading)
        {
            let Some(hash) = record.hash.as_deref() else {
                continue;
            };
            let Some(torrent) = finished(by_hash, hash) else {
                continue;
            };

            match self
                .complete(subscription, Item::Movie(record), torrent, report)
                .await
            {
                // one placed file completes the movie
                Ok(true) => break,
                Ok(false) => {}
                Err(e) => error!(
                    "Failed to record completion of movie '{}' ({}): {}",
                    subscription.title, hash, e
                ),
            }
        }
        Ok(())
    }

    /// Local path of the torrent content.
    fn source_path(&self, torrent: &ClientTorrent) -> Option<PathBuf> {
        let remote = match torrent.content_path.as_deref().filter(|p| !p.is_empty()) {
            Some(path) => path.to_string(),
            None => {
                let save_path = torrent.save_path.as_deref().filter(|p| !p.is_empty())?;
                format!("{}/{}", save_path.trim_end_matches('/'), torrent.name)
            }
        };
        Some(self.translator.to_local_path(&remote))
    }

    async fn library_dir(
        &self,
        subscription: &Subscription,
        season: Option<u32>,
    ) -> Result<PathBuf, PlacerError> {
        match subscription.library_path.as_deref().filter(|p| !p.is_empty()) {
            Some(path) => Ok(PathBuf::from(path)),
            None => {
                self.mover
                    .ensure_folder(subscription.media_type, &subscription.title, season)
                    .await
            }
        }
    }

    /// Locate, name and move the primary video of a finished torrent.
    async fn place(
        &self,
        subscription: &Subscription,
        item: &Item<'_>,
        source: &Path,
    ) -> Result<PathBuf, PlacerError> {
        let files = match self.mover.find_video_files(source).await {
            Ok(files) => files,
            Err(PlacerError::SourceNotFound { path }) => {
                return self
                    .recover_placed(subscription, item)
                    .await?
                    .ok_or(PlacerError::SourceNotFound { path });
            }
            Err(e) => return Err(e),
        };
        let Some(primary) = pick_primary_video(&files) else {
            return self
                .recover_placed(subscription, item)
                .await?
                .ok_or_else(|| PlacerError::NoVideoFile {
                    path: source.to_path_buf(),
                });
        };

        let (season, file_name) = target_name(subscription, item, &primary.display_path());
        let dest_dir = self.library_dir(subscription, season).await?;
        self.mover.move_to(&primary.path, &dest_dir, &file_name).await
    }

    /// A file placed by an earlier run whose store update did not land.
    async fn recover_placed(
        &self,
        subscription: &Subscription,
        item: &Item<'_>,
    ) -> Result<Option<PathBuf>, PlacerError> {
        let (season, _) = target_name(subscription, item, "");
        let names: Vec<String> = VIDEO_EXTENSIONS
            .iter()
            .map(|ext| target_name(subscription, item, &format!("video.{}", ext)).1)
            .collect();

        let dest_dir = self.library_dir(subscription, season).await?;
        let found = self.mover.find_placed(&dest_dir, &names).await?;
        if let Some(path) = &found {
            info!(
                "Source of '{}' is gone but {} is already in the library",
                subscription.title,
                path.display()
            );
        }
        Ok(found)
    }

    /// Returns whether the download was placed.
    async fn complete(
        &self,
        subscription: &Subscription,
        item: Item<'_>,
        torrent: &ClientTorrent,
        report: &mut CompletionReport,
    ) -> Result<bool, MonitorError> {
        let hash = torrent.hash.to_lowercase();

        let placed = match self.source_path(torrent) {
            Some(source) => self
                .place(subscription, &item, &source)
                .await
                .map_err(|e| (source.display().to_string(), e.is_retryable(), e.to_string())),
            None => Err((
                String::new(),
                false,
                "torrent reports no content or save path".to_string(),
            )),
        };

        let file_path = match placed {
            Ok(path) => path.display().to_string(),
            Err((source_path, retryable, message)) => {
                if retryable {
                    warn!(
                        "Failed to move '{}' (torrent {}, subscription {}, episode {:?}) from '{}', retrying next run: {}",
                        torrent.name,
                        hash,
                        subscription.id,
                        item.episode_id(),
                        source_path,
                        message
                    );
                } else {
                    error!(
                        "Failed to move '{}' (torrent {}, subscription {}, episode {:?}) from '{}': {}",
                        torrent.name,
                        hash,
                        subscription.id,
                        item.episode_id(),
                        source_path,
                        message
                    );
                }
                metrics::MOVE_FAILURES.inc();
                report.move_failures += 1;
                if let Some(events) = &self.events {
                    events.try_emit(MonitorEvent::MoveFailed {
                        subscription_id: subscription.id,
                        episode_id: item.episode_id(),
                        hash,
                        source_path,
                        error: message,
                    });
                }
                return Ok(false);
            }
        };

        // the record that selects this item for completion is written last
        match &item {
            Item::Episode(episode) => {
                match self.store.find_torrent_by_hash(&hash)? {
                    Some(record) => {
                        self.store
                            .update_torrent(record.id, TorrentPatch::status(TorrentStatus::Completed))?;
                    }
                    None => warn!("No torrent record for completed hash {}", hash),
                }
                self.store.update_episode(
                    episode.id,
                    EpisodePatch::status(EpisodeStatus::Completed).with_file_path(&file_path),
                )?;
            }
            Item::Movie(record) => {
                self.store.update_subscription(
                    subscription.id,
                    SubscriptionPatch::status(SubscriptionStatus::Completed)
                        .with_file_path(&file_path),
                )?;
                self.store
                    .update_torrent(record.id, TorrentPatch::status(TorrentStatus::Completed))?;
            }
        }

        metrics::DOWNLOADS_COMPLETED.inc();
        report.completed += 1;
        info!("Placed '{}' at {}", torrent.name, file_path);

        if let Some(events) = &self.events {
            events.try_emit(MonitorEvent::DownloadCompleted {
                subscription_id: subscription.id,
                episode_id: item.episode_id(),
                title: subscription.title.clone(),
                file_path,
            });
        }

        if self.lifecycle.cleanup(torrent).await == CleanupOutcome::Removed {
            report.cleaned_up += 1;
        }
        Ok(true)
    }
}

/// Library season and canonical file name for `item`, keeping the extension of `source_name`.
fn target_name(subscription: &Subscription, item: &Item<'_>, source_name: &str) -> (Option<u32>, String) {
    match item {
        Item::Episode(episode) => {
            let season = episode.season.or(subscription.season).unwrap_or(1);
            (
                Some(season),
                build_episode_filename(
                    &subscription.title,
                    season,
                    episode.episode_number,
                    source_name,
                ),
            )
        }
        Item::Movie(_) => (None, build_movie_filename(&subscription.title, source_name)),
    }
}

/// The client torrent for `hash`, if it has finished downloading.
fn finished<'a>(by_hash: &HashMap<String, &'a ClientTorrent>, hash: &str) -> Option<&'a ClientTorrent> {
    let torrent = by_hash.get(&hash.to_lowercase()).copied()?;
    if is_complete(torrent) {
        Some(torrent)
    } else {
        debug!(
            "Torrent {} at {:.0}% ({})",
            torrent.hash,
            torrent.progress * 100.0,
            torrent.state.as_str()
        );
        None
    }
}
