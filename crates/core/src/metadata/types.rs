//! Provider payloads, validated before discovery sees them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from metadata providers.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,
}

/// A show and its season index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShowDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub seasons: Vec<SeasonSummary>,
}

/// One entry of a show's season index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub season_number: u32,
    /// Premiere date (`YYYY-MM-DD`).
    pub air_date: Option<String>,
    #[serde(default)]
    pub episode_count: Option<u32>,
}

/// Episodes of one season.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonDetail {
    pub season_number: u32,
    #[serde(default)]
    pub episodes: Vec<ProviderEpisode>,
}

/// An episode as reported by a seasonal provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEpisode {
    pub episode_number: u32,
    #[serde(default)]
    pub season_number: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub still_path: Option<String>,
    #[serde(default)]
    pub air_date: Option<String>,
}

/// An entry of a season-less provider's flat episode list.
///
/// Numbering is carried in two fields; `ep` is the in-season number and
/// `sort` the overall position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatEpisode {
    #[serde(default)]
    pub ep: Option<f64>,
    #[serde(default)]
    pub sort: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "airdate")]
    pub air_date: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}

impl FlatEpisode {
    /// The usable episode number: the first non-null numbering field,
    /// accepted only when it is a positive integer.
    pub fn episode_number(&self) -> Option<u32> {
        let raw = self.ep.or(self.sort)?;
        if raw.is_finite() && raw >= 1.0 && raw.fract() == 0.0 && raw <= u32::MAX as f64 {
            Some(raw as u32)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(ep: Option<f64>, sort: Option<f64>) -> FlatEpisode {
        FlatEpisode {
            ep,
            sort,
            ..Default::default()
        }
    }

    #[test]
    fn test_flat_episode_number() {
        assert_eq!(flat(Some(3.0), Some(15.0)).episode_number(), Some(3));
        assert_eq!(flat(None, Some(15.0)).episode_number(), Some(15));
        assert_eq!(flat(None, None).episode_number(), None);
    }

    #[test]
    fn test_flat_episode_number_rejects_non_positive_integers() {
        assert_eq!(flat(Some(0.0), Some(1.0)).episode_number(), None);
        assert_eq!(flat(Some(6.5), None).episode_number(), None);
        assert_eq!(flat(Some(-2.0), None).episode_number(), None);
        assert_eq!(flat(Some(f64::NAN), None).episode_number(), None);
    }

    #[test]
    fn test_flat_episode_deserialize_alias() {
        let episode: FlatEpisode =
            serde_json::from_str(r#"{"ep": 2, "sort": 14, "airdate": "2024-04-10"}"#).unwrap();
        assert_eq!(episode.episode_number(), Some(2));
        assert_eq!(episode.air_date.as_deref(), Some("2024-04-10"));
    }
}
