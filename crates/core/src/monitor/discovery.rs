//! New-episode detection.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::types::{DiscoveryReport, MonitorError};
use crate::events::{EventHandle, MonitorEvent};
use crate::metadata::{EpisodeListProvider, MetadataProvider, SeasonSummary};
use crate::metrics;
use crate::store::{
    Episode, EpisodeStatus, MediaStore, MetadataSource, NewEpisode, Subscription,
};
use crate::util::{has_aired, parse_air_date, today};

/// Pick the season to follow when a subscription names none.
///
/// The season with the latest premiere on or before `today` wins; if none has
/// aired, the highest-numbered season. Season 0 (specials) is only chosen when
/// it is the only season.
pub fn select_season(seasons: &[SeasonSummary], today: NaiveDate) -> Option<u32> {
    let regular: Vec<&SeasonSummary> = seasons.iter().filter(|s| s.season_number > 0).collect();
    let candidates: Vec<&SeasonSummary> = if regular.is_empty() {
        seasons.iter().collect()
    } else {
        regular
    };

    let aired = candidates
        .iter()
        .filter_map(|s| {
            let date = s.air_date.as_deref().and_then(parse_air_date)?;
            (date <= today).then_some((date, s.season_number))
        })
        .max();

    aired
        .map(|(_, number)| number)
        .or_else(|| candidates.iter().map(|s| s.season_number).max())
}

/// Records newly aired episodes as `pending`.
pub struct Discovery {
    store: Arc<dyn MediaStore>,
    metadata: Arc<dyn MetadataProvider>,
    episode_list: Arc<dyn EpisodeListProvider>,
    events: Option<EventHandle>,
}

impl Discovery {
    pub fn new(
        store: Arc<dyn MediaStore>,
        metadata: Arc<dyn MetadataProvider>,
        episode_list: Arc<dyn EpisodeListProvider>,
        events: Option<EventHandle>,
    ) -> Self {
        Self {
            store,
            metadata,
            episode_list,
            events,
        }
    }

    pub async fn run(&self) -> Result<DiscoveryReport, MonitorError> {
        self.run_on(today()).await
    }

    /// Run discovery treating `today` as the current date.
    pub async fn run_on(&self, today: NaiveDate) -> Result<DiscoveryReport, MonitorError> {
        let subscriptions = self.store.list_active_subscriptions()?;
        let mut report = DiscoveryReport::default();

        for subscription in subscriptions.iter().filter(|s| s.media_type.is_episodic()) {
            report.subscriptions_checked += 1;
            match self.check_subscription(subscription, today).await {
                Ok(created) => report.episodes_created += created,
                Err(e) => {
                    warn!(
                        "Discovery failed for subscription {} ({}): {}",
                        subscription.id, subscription.title, e
                    );
                    report.failures += 1;
                }
            }
        }

        info!(
            "Discovery checked {} subscriptions, created {} episodes, {} failures",
            report.subscriptions_checked, report.episodes_created, report.failures
        );
        Ok(report)
    }

    async fn check_subscription(
        &self,
        subscription: &Subscription,
        today: NaiveDate,
    ) -> Result<usize, MonitorError> {
        match subscription.source {
            MetadataSource::Tmdb => self.check_seasonal(subscription, today).await,
            MetadataSource::Bangumi => self.check_flat(subscription, today).await,
        }
    }

    async fn check_seasonal(
        &self,
        subscription: &Subscription,
        today: NaiveDate,
    ) -> Result<usize, MonitorError> {
        let season = match subscription.season {
            Some(season) => season,
            None => {
                let show = self
                    .metadata
                    .get_show_detail(&subscription.external_id)
                    .await?;
                match select_season(&show.seasons, today) {
                    Some(season) => season,
                    None => {
                        warn!(
                            "{} reports no seasons for '{}' ({})",
                            self.metadata.name(),
                            subscription.title,
                            subscription.external_id
                        );
                        return Ok(0);
                    }
                }
            }
        };

        let detail = self
            .metadata
            .get_season_detail(&subscription.external_id, season)
            .await?;

        let existing = self.store.list_episodes(subscription.id)?;
        let mut known: HashSet<u32> = existing
            .iter()
            .filter(|e| e.season == Some(season))
            .map(|e| e.episode_number)
            .collect();
        // rows recorded before season tracking are matched by air date
        let legacy_air_dates: HashSet<&str> = existing
            .iter()
            .filter(|e| e.season.is_none())
            .filter_map(|e| e.air_date.as_deref())
            .collect();

        let mut created = 0;
        for episode in &detail.episodes {
            if !has_aired(episode.air_date.as_deref(), today)
                || known.contains(&episode.episode_number)
            {
                continue;
            }
            if episode
                .air_date
                .as_deref()
                .is_some_and(|date| legacy_air_dates.contains(date))
            {
                debug!(
                    "'{}' S{:02}E{:02} matches a legacy episode by air date, skipping",
                    subscription.title, season, episode.episode_number
                );
                continue;
            }

            let request = NewEpisode {
                subscription_id: subscription.id,
                season: Some(season),
                episode_number: episode.episode_number,
                name: episode.name.clone(),
                overview: episode.overview.clone(),
                still_path: episode.still_path.clone(),
                air_date: episode.air_date.clone(),
                status: EpisodeStatus::Pending,
            };
            let record = self.store.create_episode(request)?;
            known.insert(record.episode_number);
            self.announce(subscription, &record);
            created += 1;
        }

        Ok(created)
    }

    async fn check_flat(
        &self,
        subscription: &Subscription,
        today: NaiveDate,
    ) -> Result<usize, MonitorError> {
        let episodes = self
            .episode_list
            .get_all_episodes(&subscription.external_id)
            .await?;

        let mut known: HashSet<u32> = self
            .store
            .list_episodes(subscription.id)?
            .iter()
            .map(|e| e.episode_number)
            .collect();

        let mut created = 0;
        for episode in &episodes {
            let Some(number) = episode.episode_number() else {
                debug!(
                    "Ignoring '{}' entry without a usable episode number",
                    subscription.title
                );
                continue;
            };
            if !has_aired(episode.air_date.as_deref(), today) || known.contains(&number) {
                continue;
            }

            let request = NewEpisode {
                subscription_id: subscription.id,
                season: subscription.season,
                episode_number: number,
                name: episode.name.clone(),
                overview: episode.desc.clone(),
                still_path: None,
                air_date: episode.air_date.clone(),
                status: EpisodeStatus::Pending,
            };
            let record = self.store.create_episode(request)?;
            known.insert(number);
            self.announce(subscription, &record);
            created += 1;
        }

        Ok(created)
    }

    fn announce(&self, subscription: &Subscription, episode: &Episode) {
        info!(
            "New episode of '{}': season {:?} episode {} (aired {})",
            subscription.title,
            episode.season,
            episode.episode_number,
            episode.air_date.as_deref().unwrap_or("?")
        );
        metrics::EPISODES_DISCOVERED.inc();

        if let Some(events) = &self.events {
            events.try_emit(MonitorEvent::EpisodeDiscovered {
                subscription_id: subscription.id,
                title: subscription.title.clone(),
                season: episode.season,
                episode_number: episode.episode_number,
                air_date: episode.air_date.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn season(number: u32, air_date: Option<&str>) -> SeasonSummary {
        SeasonSummary {
            season_number: number,
            air_date: air_date.map(String::from),
            episode_count: None,
        }
    }

    fn date(s: &str) -> NaiveDate {
        parse_air_date(s).unwrap()
    }

    #[test]
    fn test_select_latest_aired_season() {
        let seasons = vec![
            season(0, Some("2024-12-01")),
            season(1, Some("2022-01-01")),
            season(2, Some("2023-06-01")),
            season(3, Some("2030-01-01")),
        ];
        assert_eq!(select_season(&seasons, date("2024-06-01")), Some(2));
    }

    #[test]
    fn test_select_falls_back_to_highest_number() {
        let seasons = vec![season(1, None), season(2, Some("2030-01-01"))];
        assert_eq!(select_season(&seasons, date("2024-06-01")), Some(2));
    }

    #[test]
    fn test_select_specials_only_when_alone() {
        assert_eq!(
            select_season(&[season(0, Some("2020-01-01"))], date("2024-06-01")),
            Some(0)
        );
        assert_eq!(
            select_season(
                &[season(0, Some("2020-01-01")), season(1, None)],
                date("2024-06-01")
            ),
            Some(1)
        );
        assert_eq!(select_season(&[], date("2024-06-01")), None);
    }
}
