//! Types for download client operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during download client operations.
#[derive(Debug, Error)]
pub enum DownloadClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Torrent not found: {0}")]
    TorrentNotFound(String),

    #[error("Torrent rejected: {0}")]
    Rejected(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

/// Torrent state in qBittorrent's vocabulary.
///
/// qBittorrent 5 renamed the paused states to `stoppedUP` / `stoppedDL`;
/// both spellings map to the paused variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientTorrentState {
    Error,
    MissingFiles,
    Uploading,
    PausedUploading,
    QueuedUploading,
    StalledUploading,
    CheckingUploading,
    ForcedUploading,
    Allocating,
    Downloading,
    MetaDownloading,
    PausedDownloading,
    QueuedDownloading,
    StalledDownloading,
    CheckingDownloading,
    ForcedDownloading,
    CheckingResumeData,
    Moving,
    Unknown,
}

impl ClientTorrentState {
    /// Normalize a raw qBittorrent state string.
    pub fn from_qbittorrent(state: &str) -> Self {
        match state {
            "error" => Self::Error,
            "missingFiles" => Self::MissingFiles,
            "uploading" => Self::Uploading,
            "pausedUP" | "stoppedUP" => Self::PausedUploading,
            "queuedUP" => Self::QueuedUploading,
            "stalledUP" => Self::StalledUploading,
            "checkingUP" => Self::CheckingUploading,
            "forcedUP" => Self::ForcedUploading,
            "allocating" => Self::Allocating,
            "downloading" => Self::Downloading,
            "metaDL" | "forcedMetaDL" => Self::MetaDownloading,
            "pausedDL" | "stoppedDL" => Self::PausedDownloading,
            "queuedDL" => Self::QueuedDownloading,
            "stalledDL" => Self::StalledDownloading,
            "checkingDL" => Self::CheckingDownloading,
            "forcedDL" => Self::ForcedDownloading,
            "checkingResumeData" => Self::CheckingResumeData,
            "moving" => Self::Moving,
            _ => Self::Unknown,
        }
    }

    /// Whether the payload is fully downloaded (any seeding state).
    pub fn is_done(&self) -> bool {
        matches!(
            self,
            Self::Uploading
                | Self::StalledUploading
                | Self::PausedUploading
                | Self::QueuedUploading
                | Self::CheckingUploading
                | Self::ForcedUploading
        )
    }

    /// Whether the torrent is paused (stopped) in either direction.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::PausedUploading | Self::PausedDownloading)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::MissingFiles => "missing_files",
            Self::Uploading => "uploading",
            Self::PausedUploading => "paused_uploading",
            Self::QueuedUploading => "queued_uploading",
            Self::StalledUploading => "stalled_uploading",
            Self::CheckingUploading => "checking_uploading",
            Self::ForcedUploading => "forced_uploading",
            Self::Allocating => "allocating",
            Self::Downloading => "downloading",
            Self::MetaDownloading => "meta_downloading",
            Self::PausedDownloading => "paused_downloading",
            Self::QueuedDownloading => "queued_downloading",
            Self::StalledDownloading => "stalled_downloading",
            Self::CheckingDownloading => "checking_downloading",
            Self::ForcedDownloading => "forced_downloading",
            Self::CheckingResumeData => "checking_resume_data",
            Self::Moving => "moving",
            Self::Unknown => "unknown",
        }
    }
}

/// A torrent as reported by the download client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientTorrent {
    /// Info hash as reported (case not guaranteed).
    pub hash: String,
    pub name: String,
    pub state: ClientTorrentState,
    /// Download progress (0.0 - 1.0).
    pub progress: f64,
    /// Path of the torrent content (single file or root folder).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_path: Option<String>,
    /// Comma-separated tag list.
    #[serde(default)]
    pub tags: String,
}

impl ClientTorrent {
    /// Whether the torrent's tag field contains `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_list().any(|t| t == tag)
    }

    /// Trimmed, non-empty tags.
    pub fn tag_list(&self) -> impl Iterator<Item = &str> {
        self.tags.split(',').map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Options attached to a new download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTorrentOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AddTorrentOptions {
    pub fn with_save_path(mut self, path: impl Into<String>) -> Self {
        self.save_path = Some(path.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Result of adding a torrent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTorrentResult {
    /// Info hash, when the client reports one.
    pub hash: Option<String>,
}

/// Trait for download client backends.
#[async_trait]
pub trait DownloadClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Add a torrent by magnet or `.torrent` URL.
    async fn add_by_url(
        &self,
        url: &str,
        options: &AddTorrentOptions,
    ) -> Result<AddTorrentResult, DownloadClientError>;

    /// List torrents, optionally restricted to one tag.
    async fn list_torrents(
        &self,
        tag: Option<&str>,
    ) -> Result<Vec<ClientTorrent>, DownloadClientError>;

    /// Remove a torrent. If `delete_files` is true, also delete downloaded files.
    async fn delete(&self, hash: &str, delete_files: bool) -> Result<(), DownloadClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_mapping() {
        assert_eq!(
            ClientTorrentState::from_qbittorrent("stalledUP"),
            ClientTorrentState::StalledUploading
        );
        assert_eq!(
            ClientTorrentState::from_qbittorrent("stoppedUP"),
            ClientTorrentState::PausedUploading
        );
        assert_eq!(
            ClientTorrentState::from_qbittorrent("stoppedDL"),
            ClientTorrentState::PausedDownloading
        );
        assert_eq!(
            ClientTorrentState::from_qbittorrent("somethingNew"),
            ClientTorrentState::Unknown
        );
    }

    #[test]
    fn test_done_states() {
        for raw in [
            "uploading",
            "stalledUP",
            "pausedUP",
            "stoppedUP",
            "queuedUP",
            "checkingUP",
            "forcedUP",
        ] {
            assert!(ClientTorrentState::from_qbittorrent(raw).is_done(), "{}", raw);
        }
        for raw in ["downloading", "pausedDL", "stalledDL", "metaDL", "error"] {
            assert!(!ClientTorrentState::from_qbittorrent(raw).is_done(), "{}", raw);
        }
    }

    #[test]
    fn test_stopped_states() {
        assert!(ClientTorrentState::PausedUploading.is_stopped());
        assert!(ClientTorrentState::PausedDownloading.is_stopped());
        assert!(!ClientTorrentState::StalledUploading.is_stopped());
    }

    #[test]
    fn test_tags() {
        let torrent = ClientTorrent {
            hash: "abc".to_string(),
            name: "Show".to_string(),
            state: ClientTorrentState::Uploading,
            progress: 1.0,
            content_path: None,
            save_path: None,
            tags: "showrunner, anime,".to_string(),
        };
        assert!(torrent.has_tag("anime"));
        assert!(!torrent.has_tag("movies"));
        assert_eq!(torrent.tag_list().count(), 2);
    }

    #[test]
    fn test_add_options_builder() {
        let options = AddTorrentOptions::default()
            .with_save_path("/downloads/Show")
            .with_category("showrunner")
            .with_tag("showrunner");
        assert_eq!(options.save_path.as_deref(), Some("/downloads/Show"));
        assert_eq!(options.tags, vec!["showrunner".to_string()]);
    }
}
