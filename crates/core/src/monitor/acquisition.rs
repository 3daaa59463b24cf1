//! Release search and download submission.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::config::DownloadConfig;
use super::types::{AcquisitionReport, MonitorError};
use crate::download_client::{AddTorrentOptions, DownloadClient, ManagedTags};
use crate::events::{EventHandle, MonitorEvent};
use crate::feed::{Release, ReleaseSearcher, SearchHints};
use crate::matcher::{check_candidate, MatchTarget};
use crate::metrics;
use crate::store::{
    Episode, EpisodePatch, EpisodeStatus, MediaStore, MediaType, NewTorrent, Profile,
    Subscription, SubscriptionPatch, SubscriptionStatus, TorrentStatus,
};
use crate::util::{parse_air_date, parse_magnet_hash, sanitize_filename, today};

/// What happened to one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Submitted,
    AlreadyCovered,
    /// Not eligible yet or no candidate passed the filters.
    Nothing,
}

/// Searches feeds for pending work and hands accepted releases to the download client.
pub struct Acquisition {
    store: Arc<dyn MediaStore>,
    searcher: Arc<dyn ReleaseSearcher>,
    client: Arc<dyn DownloadClient>,
    download: DownloadConfig,
    tags: ManagedTags,
    events: Option<EventHandle>,
    /// Bad air-date values already warned about.
    reported_air_dates: Mutex<HashSet<String>>,
}

impl Acquisition {
    pub fn new(
        store: Arc<dyn MediaStore>,
        searcher: Arc<dyn ReleaseSearcher>,
        client: Arc<dyn DownloadClient>,
        download: DownloadConfig,
        events: Option<EventHandle>,
    ) -> Self {
        let tags = download.tags();
        Self {
            store,
            searcher,
            client,
            download,
            tags,
            events,
            reported_air_dates: Mutex::new(HashSet::new()),
        }
    }

    pub async fn run(&self) -> Result<AcquisitionReport, MonitorError> {
        self.run_on(today()).await
    }

    /// Run acquisition treating `today` as the current date.
    pub async fn run_on(&self, today: NaiveDate) -> Result<AcquisitionReport, MonitorError> {
        let subscriptions = self.store.list_active_subscriptions()?;
        let mut report = AcquisitionReport::default();

        for subscription in &subscriptions {
            report.subscriptions_checked += 1;
            let result = match subscription.media_type {
                MediaType::Tv => {
                    self.acquire_episodes(subscription, today, &mut report)
                        .await
                }
                MediaType::Movie => match self.acquire_movie(subscription).await {
                    Ok(outcome) => {
                        report.record(outcome);
                        Ok(())
                    }
                    Err(e) => Err(e),
                },
            };

            if let Err(e) = result {
                warn!(
                    "Acquisition failed for subscription {} ({}): {}",
                    subscription.id, subscription.title, e
                );
                report.failures += 1;
            }
        }

        info!(
            "Acquisition checked {} subscriptions, submitted {}, {} already covered, {} failures",
            report.subscriptions_checked, report.submitted, report.already_covered, report.failures
        );
        Ok(report)
    }

    fn profile_for(&self, subscription: &Subscription) -> Result<Option<Profile>, MonitorError> {
        let Some(profile_id) = subscription.profile_id else {
            return Ok(None);
        };
        let profile = self.store.get_profile(profile_id)?;
        if profile.is_none() {
            warn!(
                "Subscription {} references missing profile {}, accepting any release",
                subscription.id, profile_id
            );
        }
        Ok(profile)
    }

    async fn acquire_episodes(
        &self,
        subscription: &Subscription,
        today: NaiveDate,
        report: &mut AcquisitionReport,
    ) -> Result<(), MonitorError> {
        let profile = self.profile_for(subscription)?;
        let episodes = self.store.list_episodes(subscription.id)?;

        for episode in episodes
            .iter()
            .filter(|e| e.status == EpisodeStatus::Pending)
        {
            match self
                .acquire_episode(subscription, episode, profile.as_ref(), today)
                .await
            {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    warn!(
                        "Acquisition failed for '{}' episode {} (id {}): {}",
                        subscription.title, episode.episode_number, episode.id, e
                    );
                    report.failures += 1;
                }
            }
        }
        Ok(())
    }

    async fn acquire_episode(
        &self,
        subscription: &Subscription,
        episode: &Episode,
        profile: Option<&Profile>,
        today: NaiveDate,
    ) -> Result<Outcome, MonitorError> {
        let aired = match episode.air_date.as_deref().and_then(parse_air_date) {
            Some(date) => date,
            None => {
                self.warn_bad_air_date(subscription, episode);
                return Ok(Outcome::Nothing);
            }
        };
        if aired > today {
            debug!(
                "'{}' episode {} airs {}, not searching yet",
                subscription.title, episode.episode_number, aired
            );
            return Ok(Outcome::Nothing);
        }

        if self.store.find_torrent_by_episode(episode.id)?.is_some() {
            return Ok(Outcome::AlreadyCovered);
        }

        let hints = SearchHints {
            season: subscription.season.or(episode.season),
            episode: Some(episode.episode_number),
        };
        let releases = self.searcher.search(&subscription.title, &hints).await?;
        let target =
            MatchTarget::episode(&subscription.title, subscription.season, episode.episode_number);

        for release in &releases {
            let hash = parse_magnet_hash(&release.link);
            if self.is_tracked(release, hash.as_deref())? {
                debug!(
                    "'{}' episode {} already tracked via {}",
                    subscription.title, episode.episode_number, release.title
                );
                return Ok(Outcome::AlreadyCovered);
            }

            if let Err(reason) = check_candidate(release, &target, profile) {
                debug!(
                    "Rejected '{}' for '{}' episode {}: {}",
                    release.title, subscription.title, episode.episode_number, reason
                );
                metrics::RELEASES_REJECTED
                    .with_label_values(&[reason.kind()])
                    .inc();
                continue;
            }

            return self
                .submit(subscription, Some(episode), release, hash)
                .await;
        }

        debug!(
            "No acceptable release among {} for '{}' episode {}",
            releases.len(),
            subscription.title,
            episode.episode_number
        );
        Ok(Outcome::Nothing)
    }

    async fn acquire_movie(&self, subscription: &Subscription) -> Result<Outcome, MonitorError> {
        if subscription.status == SubscriptionStatus::Completed {
            return Ok(Outcome::Nothing);
        }

        let torrents = self.store.list_torrents(subscription.id)?;
        if torrents.iter().any(|t| {
            matches!(t.status, TorrentStatus::Downloading | TorrentStatus::Completed)
        }) {
            return Ok(Outcome::AlreadyCovered);
        }

        let profile = self.profile_for(subscription)?;
        let releases = self
            .searcher
            .search(&subscription.title, &SearchHints::default())
            .await?;
        let target = MatchTarget::movie(&subscription.title);

        for release in &releases {
            let hash = parse_magnet_hash(&release.link);
            if self.is_tracked(release, hash.as_deref())? {
                return Ok(Outcome::AlreadyCovered);
            }

            if let Err(reason) = check_candidate(release, &target, profile.as_ref()) {
                debug!(
                    "Rejected '{}' for movie '{}': {}",
                    release.title, subscription.title, reason
                );
                metrics::RELEASES_REJECTED
                    .with_label_values(&[reason.kind()])
                    .inc();
                continue;
            }

            return self.submit(subscription, None, release, hash).await;
        }

        Ok(Outcome::Nothing)
    }

    fn is_tracked(&self, release: &Release, hash: Option<&str>) -> Result<bool, MonitorError> {
        if let Some(hash) = hash {
            if self.store.find_torrent_by_hash(hash)?.is_some() {
                return Ok(true);
            }
        }
        Ok(self.store.find_torrent_by_link(&release.link)?.is_some())
    }

    /// Client options for a subscription's downloads.
    pub fn add_options(&self, subscription: &Subscription) -> AddTorrentOptions {
        let mut options = AddTorrentOptions::default();

        let base = self.download.save_path.trim_end_matches('/');
        if !base.is_empty() {
            options = options.with_save_path(format!(
                "{}/{}",
                base,
                sanitize_filename(&subscription.title)
            ));
        }
        if let Some(category) = self.download.category() {
            options = options.with_category(category);
        }
        if let Some(tag) = self.tags.primary() {
            options = options.with_tag(tag);
        }
        options
    }

    async fn submit(
        &self,
        subscription: &Subscription,
        episode: Option<&Episode>,
        release: &Release,
        magnet_hash: Option<String>,
    ) -> Result<Outcome, MonitorError> {
        let options = self.add_options(subscription);
        let added = self.client.add_by_url(&release.link, &options).await?;
        let hash = magnet_hash.or_else(|| added.hash.map(|h| h.to_lowercase()));

        if let Some(hash) = &hash {
            if self.store.find_torrent_by_hash(hash)?.is_some() {
                warn!(
                    "{} returned hash {} for '{}' which is already tracked",
                    self.client.name(),
                    hash,
                    release.title
                );
                return Ok(Outcome::AlreadyCovered);
            }
        }

        match episode {
            Some(episode) => {
                self.store.update_episode(
                    episode.id,
                    EpisodePatch::status(EpisodeStatus::Downloading).with_torrent_hash(hash.clone()),
                )?;
            }
            None => {
                self.store.update_subscription(
                    subscription.id,
                    SubscriptionPatch::status(SubscriptionStatus::Downloading),
                )?;
            }
        }

        self.store.create_torrent(NewTorrent {
            subscription_id: subscription.id,
            episode_id: episode.map(|e| e.id),
            title: release.title.clone(),
            link: release.link.clone(),
            hash: hash.clone(),
            status: TorrentStatus::Downloading,
        })?;

        metrics::DOWNLOADS_SUBMITTED.inc();
        match episode {
            Some(episode) => info!(
                "Submitted '{}' for '{}' episode {} to {}",
                release.title,
                subscription.title,
                episode.episode_number,
                self.client.name()
            ),
            None => info!(
                "Submitted '{}' for movie '{}' to {}",
                release.title,
                subscription.title,
                self.client.name()
            ),
        }

        if let Some(events) = &self.events {
            events.try_emit(MonitorEvent::DownloadStarted {
                subscription_id: subscription.id,
                episode_id: episode.map(|e| e.id),
                title: subscription.title.clone(),
                release_title: release.title.clone(),
                hash,
            });
        }

        Ok(Outcome::Submitted)
    }

    fn warn_bad_air_date(&self, subscription: &Subscription, episode: &Episode) {
        let raw = episode.air_date.clone().unwrap_or_default();
        let first_time = self
            .reported_air_dates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(raw.clone());

        if first_time {
            warn!(
                "Episode {} of '{}' has unusable air date '{}', skipping",
                episode.id, subscription.title, raw
            );
        } else {
            debug!("Episode {} skipped for air date '{}'", episode.id, raw);
        }
    }
}

impl AcquisitionReport {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Submitted => self.submitted += 1,
            Outcome::AlreadyCovered => self.already_covered += 1,
            Outcome::Nothing => {}
        }
    }
}
