//! Mock metadata providers for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::metadata::{
    EpisodeListProvider, FlatEpisode, MetadataError, MetadataProvider, SeasonDetail, ShowDetail,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock seasonal provider.
///
/// Unknown shows and seasons return [`MetadataError::NotFound`]; shows
/// marked with [`fail_show`](Self::fail_show) return
/// [`MetadataError::RequestFailed`].
#[derive(Debug, Default)]
pub struct MockMetadataProvider {
    shows: Mutex<HashMap<String, ShowDetail>>,
    seasons: Mutex<HashMap<(String, u32), SeasonDetail>>,
    failing: Mutex<HashSet<String>>,
    season_requests: Mutex<Vec<(String, u32)>>,
}

impl MockMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_show(&self, show: ShowDetail) {
        lock(&self.shows).insert(show.id.clone(), show);
    }

    pub fn set_season(&self, show_id: &str, season: SeasonDetail) {
        lock(&self.seasons).insert((show_id.to_string(), season.season_number), season);
    }

    pub fn fail_show(&self, show_id: &str) {
        lock(&self.failing).insert(show_id.to_string());
    }

    /// Every `(show_id, season)` passed to `get_season_detail`.
    pub fn season_requests(&self) -> Vec<(String, u32)> {
        lock(&self.season_requests).clone()
    }

    fn check_failing(&self, show_id: &str) -> Result<(), MetadataError> {
        if lock(&self.failing).contains(show_id) {
            return Err(MetadataError::RequestFailed(format!(
                "mock failure for {}",
                show_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataProvider for MockMetadataProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_show_detail(&self, show_id: &str) -> Result<ShowDetail, MetadataError> {
        self.check_failing(show_id)?;
        lock(&self.shows)
            .get(show_id)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(show_id.to_string()))
    }

    async fn get_season_detail(
        &self,
        show_id: &str,
        season: u32,
    ) -> Result<SeasonDetail, MetadataError> {
        lock(&self.season_requests).push((show_id.to_string(), season));
        self.check_failing(show_id)?;
        lock(&self.seasons)
            .get(&(show_id.to_string(), season))
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(format!("{} season {}", show_id, season)))
    }
}

/// Mock flat episode-list provider.
#[derive(Debug, Default)]
pub struct MockEpisodeListProvider {
    episodes: Mutex<HashMap<String, Vec<FlatEpisode>>>,
    failing: Mutex<HashSet<String>>,
}

impl MockEpisodeListProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_episodes(&self, subject_id: &str, episodes: Vec<FlatEpisode>) {
        lock(&self.episodes).insert(subject_id.to_string(), episodes);
    }

    pub fn fail_subject(&self, subject_id: &str) {
        lock(&self.failing).insert(subject_id.to_string());
    }
}

#[async_trait]
impl EpisodeListProvider for MockEpisodeListProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_all_episodes(&self, subject_id: &str) -> Result<Vec<FlatEpisode>, MetadataError> {
        if lock(&self.failing).contains(subject_id) {
            return Err(MetadataError::RateLimited);
        }
        lock(&self.episodes)
            .get(subject_id)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(subject_id.to_string()))
    }
}
