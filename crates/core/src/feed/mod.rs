//! Release feed interface.
//!
//! A searcher queries torrent feeds and returns candidate releases,
//! optionally annotated with attributes parsed from the release title.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from release searchers.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Feed request failed: {0}")]
    RequestFailed(String),

    #[error("Feed parse failed: {0}")]
    ParseFailed(String),
}

/// Narrowing hints passed along with a title query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHints {
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

/// Attributes parsed from a release title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRelease {
    #[serde(default)]
    pub english_title: Option<String>,
    #[serde(default)]
    pub localized_title: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    /// Container/codec/source tokens (e.g. `mkv`, `HEVC`, `WEB-DL`).
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub sub_team: Option<String>,
    #[serde(default)]
    pub subtitle_language: Option<String>,
    /// Human size text such as `1.2 GiB`.
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub episode_number: Option<u32>,
    #[serde(default)]
    pub season_number: Option<u32>,
}

/// A candidate release returned by a feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub title: String,
    /// Magnet URI or `.torrent` URL.
    pub link: String,
    /// Feed the release came from.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub parsed: Option<ParsedRelease>,
}

impl Release {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            ..Default::default()
        }
    }

    pub fn with_parsed(mut self, parsed: ParsedRelease) -> Self {
        self.parsed = Some(parsed);
        self
    }

    pub fn with_size_bytes(mut self, size: u64) -> Self {
        self.size_bytes = Some(size);
        self
    }
}

/// Searches release feeds for a title.
#[async_trait]
pub trait ReleaseSearcher: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, title: &str, hints: &SearchHints)
        -> Result<Vec<Release>, FeedError>;
}
