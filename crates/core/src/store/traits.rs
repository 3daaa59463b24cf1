//! Data store trait and request/patch types.

use thiserror::Error;

use super::types::{
    EpisodeStatus, MediaType, MetadataSource, Profile, Subscription, SubscriptionStatus,
    TorrentRecord, TorrentStatus, Episode,
};

/// Errors returned by a [`MediaStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// A uniqueness constraint was violated (e.g. a duplicate torrent hash).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored value could not be decoded.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Request to create a subscription.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub source: MetadataSource,
    pub external_id: String,
    pub media_type: MediaType,
    pub title: String,
    pub season: Option<u32>,
    pub profile_id: Option<i64>,
    pub library_path: Option<String>,
}

impl NewSubscription {
    /// A TMDB TV subscription following the latest aired season.
    pub fn tv(external_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source: MetadataSource::Tmdb,
            external_id: external_id.into(),
            media_type: MediaType::Tv,
            title: title.into(),
            season: None,
            profile_id: None,
            library_path: None,
        }
    }

    /// A TMDB movie subscription.
    pub fn movie(external_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            media_type: MediaType::Movie,
            ..Self::tv(external_id, title)
        }
    }

    pub fn with_source(mut self, source: MetadataSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_season(mut self, season: u32) -> Self {
        self.season = Some(season);
        self
    }

    pub fn with_profile(mut self, profile_id: i64) -> Self {
        self.profile_id = Some(profile_id);
        self
    }

    pub fn with_library_path(mut self, path: impl Into<String>) -> Self {
        self.library_path = Some(path.into());
        self
    }
}

/// Fields of a subscription the monitor may change.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionPatch {
    pub status: Option<SubscriptionStatus>,
    pub file_path: Option<String>,
}

impl SubscriptionPatch {
    pub fn status(status: SubscriptionStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }
}

/// Request to create an episode.
#[derive(Debug, Clone)]
pub struct NewEpisode {
    pub subscription_id: i64,
    pub season: Option<u32>,
    pub episode_number: u32,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub still_path: Option<String>,
    pub air_date: Option<String>,
    pub status: EpisodeStatus,
}

/// Fields of an episode the monitor may change.
#[derive(Debug, Clone, Default)]
pub struct EpisodePatch {
    pub status: Option<EpisodeStatus>,
    pub torrent_hash: Option<String>,
    pub file_path: Option<String>,
}

impl EpisodePatch {
    pub fn status(status: EpisodeStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_torrent_hash(mut self, hash: Option<String>) -> Self {
        self.torrent_hash = hash;
        self
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }
}

/// Request to create a torrent record.
#[derive(Debug, Clone)]
pub struct NewTorrent {
    pub subscription_id: i64,
    pub episode_id: Option<i64>,
    pub title: String,
    pub link: String,
    pub hash: Option<String>,
    pub status: TorrentStatus,
}

/// Fields of a torrent record the monitor may change.
#[derive(Debug, Clone, Default)]
pub struct TorrentPatch {
    pub status: Option<TorrentStatus>,
    pub hash: Option<String>,
}

impl TorrentPatch {
    pub fn status(status: TorrentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Request to create a quality profile.
#[derive(Debug, Clone, Default)]
pub struct NewProfile {
    pub name: String,
    pub resolutions: Vec<String>,
    pub qualities: Vec<String>,
    pub formats: Vec<String>,
    pub encoders: Vec<String>,
    pub preferred_keywords: Vec<String>,
    pub excluded_keywords: Vec<String>,
    pub min_size_mb: Option<f64>,
    pub max_size_mb: Option<f64>,
}

/// Persistent storage of subscriptions, episodes, torrent records and profiles.
///
/// Implementations serialize writes per row; the monitor relies on that plus
/// per-job non-overlap for read-then-write sequences.
pub trait MediaStore: Send + Sync {
    /// All subscriptions that are not disabled.
    fn list_active_subscriptions(&self) -> Result<Vec<Subscription>, StoreError>;

    fn get_subscription(&self, id: i64) -> Result<Option<Subscription>, StoreError>;

    fn create_subscription(&self, request: NewSubscription) -> Result<Subscription, StoreError>;

    fn update_subscription(
        &self,
        id: i64,
        patch: SubscriptionPatch,
    ) -> Result<Subscription, StoreError>;

    /// Episodes of a subscription ordered by season then episode number.
    fn list_episodes(&self, subscription_id: i64) -> Result<Vec<Episode>, StoreError>;

    fn create_episode(&self, request: NewEpisode) -> Result<Episode, StoreError>;

    fn update_episode(&self, id: i64, patch: EpisodePatch) -> Result<Episode, StoreError>;

    fn list_torrents(&self, subscription_id: i64) -> Result<Vec<TorrentRecord>, StoreError>;

    /// Create a torrent record. Fails with [`StoreError::Conflict`] on a duplicate hash.
    fn create_torrent(&self, request: NewTorrent) -> Result<TorrentRecord, StoreError>;

    fn update_torrent(&self, id: i64, patch: TorrentPatch) -> Result<TorrentRecord, StoreError>;

    fn find_torrent_by_hash(&self, hash: &str) -> Result<Option<TorrentRecord>, StoreError>;

    fn find_torrent_by_link(&self, link: &str) -> Result<Option<TorrentRecord>, StoreError>;

    fn find_torrent_by_episode(&self, episode_id: i64)
        -> Result<Option<TorrentRecord>, StoreError>;

    fn get_profile(&self, id: i64) -> Result<Option<Profile>, StoreError>;

    fn create_profile(&self, request: NewProfile) -> Result<Profile, StoreError>;
}
