//! Domain records owned by the data store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata provider a subscription is sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataSource {
    /// TMDB-like provider with seasons.
    Tmdb,
    /// Bangumi-like provider with a flat episode list.
    Bangumi,
}

impl MetadataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataSource::Tmdb => "tmdb",
            MetadataSource::Bangumi => "bangumi",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tmdb" => Some(MetadataSource::Tmdb),
            "bangumi" | "bgm" => Some(MetadataSource::Bangumi),
            _ => None,
        }
    }
}

/// Kind of media a subscription tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Tv,
    Movie,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Tv => "tv",
            MediaType::Movie => "movie",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tv" => Some(MediaType::Tv),
            "movie" => Some(MediaType::Movie),
            _ => None,
        }
    }

    pub fn is_episodic(&self) -> bool {
        matches!(self, MediaType::Tv)
    }
}

/// Subscription lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Disabled,
    Downloading,
    Completed,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Disabled => "disabled",
            SubscriptionStatus::Downloading => "downloading",
            SubscriptionStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SubscriptionStatus::Active),
            "disabled" => Some(SubscriptionStatus::Disabled),
            "downloading" => Some(SubscriptionStatus::Downloading),
            "completed" => Some(SubscriptionStatus::Completed),
            _ => None,
        }
    }
}

/// A tracked show or movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub source: MetadataSource,
    /// Identifier of the title at the metadata provider.
    pub external_id: String,
    pub media_type: MediaType,
    pub title: String,
    /// Explicit season scope. `None` follows the most recently aired season.
    pub season: Option<u32>,
    pub status: SubscriptionStatus,
    pub profile_id: Option<i64>,
    /// Library folder files are moved into. `None` derives one from the title.
    pub library_path: Option<String>,
    /// Final location of a completed movie.
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Episode lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeStatus {
    Pending,
    Downloading,
    /// Downloaded and moved into the library.
    Completed,
}

impl EpisodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeStatus::Pending => "pending",
            EpisodeStatus::Downloading => "downloading",
            EpisodeStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(EpisodeStatus::Pending),
            "downloading" => Some(EpisodeStatus::Downloading),
            "completed" | "moved" => Some(EpisodeStatus::Completed),
            _ => None,
        }
    }
}

/// One unit of episodic content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: i64,
    pub subscription_id: i64,
    /// `None` for rows recorded before season tracking and for season-less providers.
    pub season: Option<u32>,
    pub episode_number: u32,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub still_path: Option<String>,
    /// Date-only string (`YYYY-MM-DD`).
    pub air_date: Option<String>,
    pub status: EpisodeStatus,
    pub torrent_hash: Option<String>,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Torrent record status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentStatus {
    Pending,
    Downloading,
    Completed,
    Failed,
}

impl TorrentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TorrentStatus::Pending => "pending",
            TorrentStatus::Downloading => "downloading",
            TorrentStatus::Completed => "completed",
            TorrentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TorrentStatus::Pending),
            "downloading" => Some(TorrentStatus::Downloading),
            "completed" => Some(TorrentStatus::Completed),
            "failed" => Some(TorrentStatus::Failed),
            _ => None,
        }
    }
}

/// Bookkeeping row for one download attempt.
///
/// Distinct from the download client's own torrent object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentRecord {
    pub id: i64,
    pub subscription_id: i64,
    pub episode_id: Option<i64>,
    pub title: String,
    pub link: String,
    /// Lowercase info hash, `None` until resolved.
    pub hash: Option<String>,
    pub status: TorrentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Quality filter applied to candidate releases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub resolutions: Vec<String>,
    #[serde(default)]
    pub qualities: Vec<String>,
    #[serde(default)]
    pub formats: Vec<String>,
    #[serde(default)]
    pub encoders: Vec<String>,
    #[serde(default)]
    pub preferred_keywords: Vec<String>,
    #[serde(default)]
    pub excluded_keywords: Vec<String>,
    pub min_size_mb: Option<f64>,
    pub max_size_mb: Option<f64>,
}
