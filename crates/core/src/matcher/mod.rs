//! Accept/reject decisions for candidate releases.
//!
//! Every check is a pure function of the release and the subscription's
//! target. A rejection carries a machine-readable reason tag.

mod profile;

use std::fmt;

use crate::feed::Release;
use crate::store::Profile;

pub use profile::{check_profile, parse_size_mb, release_size_mb};

/// Why a candidate release was turned down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    ExcludedKeyword(String),
    PreferredKeywordMiss,
    ResolutionMiss,
    QualityMiss,
    FormatMiss,
    EncoderMiss,
    SizeBelowMin,
    SizeAboveMax,
    TitleMismatch,
    EpisodeMismatch,
    SeasonMismatch,
}

impl RejectReason {
    /// Reason tag without any payload, used as a metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ExcludedKeyword(_) => "excluded_keyword",
            Self::PreferredKeywordMiss => "preferred_keyword_miss",
            Self::ResolutionMiss => "resolution_miss",
            Self::QualityMiss => "quality_miss",
            Self::FormatMiss => "format_miss",
            Self::EncoderMiss => "encoder_miss",
            Self::SizeBelowMin => "size_below_min",
            Self::SizeAboveMax => "size_above_max",
            Self::TitleMismatch => "title_mismatch",
            Self::EpisodeMismatch => "episode_mismatch",
            Self::SeasonMismatch => "season_mismatch",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExcludedKeyword(keyword) => write!(f, "excluded_keyword:{}", keyword),
            other => f.write_str(other.kind()),
        }
    }
}

/// What a release must match to be accepted.
#[derive(Debug, Clone, Copy)]
pub struct MatchTarget<'a> {
    pub title: &'a str,
    /// Season scope of the subscription, if it has one.
    pub season: Option<u32>,
    /// Episode number wanted. `None` for movies.
    pub episode: Option<u32>,
}

impl<'a> MatchTarget<'a> {
    pub fn episode(title: &'a str, season: Option<u32>, episode: u32) -> Self {
        Self {
            title,
            season,
            episode: Some(episode),
        }
    }

    pub fn movie(title: &'a str) -> Self {
        Self {
            title,
            season: None,
            episode: None,
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

/// Whether the release is for the subscribed title.
///
/// Parsed titles match when either contains the other, case-insensitively.
/// Without parsed titles, the raw release title must contain the subscription title.
pub fn title_matches(release: &Release, title: &str) -> bool {
    let wanted = title.trim().to_lowercase();
    if wanted.is_empty() {
        return false;
    }

    let parsed_titles: Vec<String> = release
        .parsed
        .as_ref()
        .map(|p| {
            [p.english_title.as_ref(), p.localized_title.as_ref()]
                .into_iter()
                .filter_map(non_empty)
                .collect()
        })
        .unwrap_or_default();

    if parsed_titles.is_empty() {
        return release.title.to_lowercase().contains(&wanted);
    }

    parsed_titles
        .iter()
        .any(|candidate| candidate.contains(&wanted) || wanted.contains(candidate.as_str()))
}

/// Whether the parsed episode number is the wanted one. A missing number never matches.
pub fn episode_matches(release: &Release, episode: u32) -> bool {
    release
        .parsed
        .as_ref()
        .and_then(|p| p.episode_number)
        .is_some_and(|n| n == episode)
}

/// Whether the parsed season (if any) agrees with the subscription season (if any).
pub fn season_matches(release: &Release, season: Option<u32>) -> bool {
    let parsed = release.parsed.as_ref().and_then(|p| p.season_number);
    match (parsed, season) {
        (Some(parsed), Some(wanted)) => parsed == wanted,
        _ => true,
    }
}

/// Full acceptance chain: title, episode, season, then profile.
pub fn check_candidate(
    release: &Release,
    target: &MatchTarget<'_>,
    profile: Option<&Profile>,
) -> Result<(), RejectReason> {
    if !title_matches(release, target.title) {
        return Err(RejectReason::TitleMismatch);
    }

    if let Some(episode) = target.episode {
        if !episode_matches(release, episode) {
            return Err(RejectReason::EpisodeMismatch);
        }
        if !season_matches(release, target.season) {
            return Err(RejectReason::SeasonMismatch);
        }
    }

    check_profile(release, profile)
}
