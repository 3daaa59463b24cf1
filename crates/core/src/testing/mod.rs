//! Testing utilities and mock implementations of the collaborator traits.
//!
//! The mocks keep their state behind `std::sync::Mutex` so fixtures can be
//! configured synchronously; the filesystem mover is exercised for real
//! against a temporary directory instead of being mocked.
//!
//! # Example
//!
//! ```rust,ignore
//! use showrunner_core::testing::{fixtures, MockDownloadClient, MockReleaseSearcher};
//!
//! let searcher = MockReleaseSearcher::new();
//! searcher.set_results(vec![fixtures::episode_release("Show", 3, "abc")]);
//!
//! let client = MockDownloadClient::new();
//! client.insert(fixtures::client_torrent("abc", 1.0, "showrunner"));
//! ```

mod mock_download_client;
mod mock_metadata;
mod mock_release_searcher;

pub use mock_download_client::{MockDownloadClient, RecordedAdd};
pub use mock_metadata::{MockEpisodeListProvider, MockMetadataProvider};
pub use mock_release_searcher::{MockReleaseSearcher, RecordedSearch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::download_client::{ClientTorrent, ClientTorrentState};
    use crate::feed::{ParsedRelease, Release};
    use crate::metadata::{FlatEpisode, ProviderEpisode, SeasonDetail, SeasonSummary, ShowDetail};

    /// Magnet link for a hash.
    pub fn magnet(hash: &str) -> String {
        format!("magnet:?xt=urn:btih:{}&dn=mock", hash)
    }

    /// A release for episode `episode` of `title`, parsed as 1080p mkv.
    pub fn episode_release(title: &str, episode: u32, hash: &str) -> Release {
        Release::new(
            format!("[Group] {} - {:02} [1080p].mkv", title, episode),
            magnet(hash),
        )
        .with_parsed(ParsedRelease {
            english_title: Some(title.to_string()),
            resolution: Some("1080p".to_string()),
            format: Some("mkv".to_string()),
            sub_team: Some("Group".to_string()),
            size: Some("1.2 GiB".to_string()),
            episode_number: Some(episode),
            ..Default::default()
        })
    }

    /// A movie release without parsed attributes.
    pub fn movie_release(title: &str, year: u32, hash: &str) -> Release {
        Release::new(format!("{} ({}) 1080p BluRay", title, year), magnet(hash))
            .with_size_bytes(4 * 1024 * 1024 * 1024)
    }

    /// A managed client torrent at the given progress.
    pub fn client_torrent(hash: &str, progress: f64, tags: &str) -> ClientTorrent {
        ClientTorrent {
            hash: hash.to_string(),
            name: format!("torrent-{}", hash),
            state: if progress >= 1.0 {
                ClientTorrentState::Uploading
            } else {
                ClientTorrentState::Downloading
            },
            progress,
            content_path: None,
            save_path: Some("/downloads".to_string()),
            tags: tags.to_string(),
        }
    }

    pub fn season_summary(number: u32, air_date: Option<&str>) -> SeasonSummary {
        SeasonSummary {
            season_number: number,
            air_date: air_date.map(String::from),
            episode_count: None,
        }
    }

    pub fn show(id: &str, name: &str, seasons: Vec<SeasonSummary>) -> ShowDetail {
        ShowDetail {
            id: id.to_string(),
            name: name.to_string(),
            seasons,
        }
    }

    pub fn provider_episode(number: u32, air_date: Option<&str>) -> ProviderEpisode {
        ProviderEpisode {
            episode_number: number,
            season_number: None,
            name: Some(format!("Episode {}", number)),
            overview: None,
            still_path: None,
            air_date: air_date.map(String::from),
        }
    }

    pub fn season(number: u32, episodes: Vec<ProviderEpisode>) -> SeasonDetail {
        SeasonDetail {
            season_number: number,
            episodes,
        }
    }

    pub fn flat_episode(ep: f64, air_date: Option<&str>) -> FlatEpisode {
        FlatEpisode {
            ep: Some(ep),
            sort: None,
            name: Some(format!("Episode {}", ep)),
            air_date: air_date.map(String::from),
            desc: None,
        }
    }
}
