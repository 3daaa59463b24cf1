use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notable monitor transitions, delivered to the configured notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    EpisodeDiscovered {
        subscription_id: i64,
        title: String,
        season: Option<u32>,
        episode_number: u32,
        air_date: Option<String>,
    },
    DownloadStarted {
        subscription_id: i64,
        episode_id: Option<i64>,
        title: String,
        release_title: String,
        hash: Option<String>,
    },
    DownloadCompleted {
        subscription_id: i64,
        episode_id: Option<i64>,
        title: String,
        file_path: String,
    },
    MoveFailed {
        subscription_id: i64,
        episode_id: Option<i64>,
        hash: String,
        source_path: String,
        error: String,
    },
    TorrentRemoved {
        hash: String,
        name: String,
        delete_files: bool,
    },
}

impl MonitorEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::EpisodeDiscovered { .. } => "episode_discovered",
            Self::DownloadStarted { .. } => "download_started",
            Self::DownloadCompleted { .. } => "download_completed",
            Self::MoveFailed { .. } => "move_failed",
            Self::TorrentRemoved { .. } => "torrent_removed",
        }
    }

    /// Subscription the event concerns, if any.
    pub fn subscription_id(&self) -> Option<i64> {
        match self {
            Self::EpisodeDiscovered {
                subscription_id, ..
            }
            | Self::DownloadStarted {
                subscription_id, ..
            }
            | Self::DownloadCompleted {
                subscription_id, ..
            }
            | Self::MoveFailed {
                subscription_id, ..
            } => Some(*subscription_id),
            Self::TorrentRemoved { .. } => None,
        }
    }
}

/// Envelope wrapping a monitor event with metadata
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: MonitorEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = MonitorEvent::TorrentRemoved {
            hash: "abc".to_string(),
            name: "Show".to_string(),
            delete_files: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "torrent_removed");
        assert_eq!(event.event_type(), "torrent_removed");
        assert_eq!(event.subscription_id(), None);
    }

    #[test]
    fn test_subscription_id() {
        let event = MonitorEvent::EpisodeDiscovered {
            subscription_id: 7,
            title: "Show".to_string(),
            season: Some(1),
            episode_number: 3,
            air_date: Some("2024-01-01".to_string()),
        };
        assert_eq!(event.subscription_id(), Some(7));
    }
}
