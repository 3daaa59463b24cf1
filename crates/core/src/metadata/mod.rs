//! Metadata provider interfaces.
//!
//! Two shapes are supported: a seasonal provider (show index plus
//! per-season episode lists) and a flat provider that returns every
//! episode of a subject at once.

mod types;

use async_trait::async_trait;

pub use types::{
    FlatEpisode, MetadataError, ProviderEpisode, SeasonDetail, SeasonSummary, ShowDetail,
};

/// Seasonal metadata provider (TMDB-like).
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn get_show_detail(&self, show_id: &str) -> Result<ShowDetail, MetadataError>;

    async fn get_season_detail(
        &self,
        show_id: &str,
        season: u32,
    ) -> Result<SeasonDetail, MetadataError>;
}

/// Season-less metadata provider (Bangumi-like).
#[async_trait]
pub trait EpisodeListProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn get_all_episodes(&self, subject_id: &str) -> Result<Vec<FlatEpisode>, MetadataError>;
}
