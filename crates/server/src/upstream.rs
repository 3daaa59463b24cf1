//! Placeholder upstreams for the slots no backend has been wired into.
//!
//! Every call fails, so the affected stage records a failed run instead of
//! acting on empty data.

use async_trait::async_trait;

use showrunner_core::download_client::{
    AddTorrentOptions, AddTorrentResult, ClientTorrent, DownloadClient, DownloadClientError,
};
use showrunner_core::feed::{FeedError, Release, ReleaseSearcher, SearchHints};
use showrunner_core::metadata::{
    EpisodeListProvider, FlatEpisode, MetadataError, MetadataProvider, SeasonDetail, ShowDetail,
};

/// Upstream slot without a configured backend.
#[derive(Debug, Clone, Copy)]
pub struct Unconfigured {
    role: &'static str,
}

impl Unconfigured {
    pub fn new(role: &'static str) -> Self {
        Self { role }
    }

    fn reason(&self) -> String {
        format!("no {} configured", self.role)
    }
}

#[async_trait]
impl MetadataProvider for Unconfigured {
    fn name(&self) -> &str {
        self.role
    }

    async fn get_show_detail(&self, _show_id: &str) -> Result<ShowDetail, MetadataError> {
        Err(MetadataError::RequestFailed(self.reason()))
    }

    async fn get_season_detail(
        &self,
        _show_id: &str,
        _season: u32,
    ) -> Result<SeasonDetail, MetadataError> {
        Err(MetadataError::RequestFailed(self.reason()))
    }
}

#[async_trait]
impl EpisodeListProvider for Unconfigured {
    fn name(&self) -> &str {
        self.role
    }

    async fn get_all_episodes(&self, _subject_id: &str) -> Result<Vec<FlatEpisode>, MetadataError> {
        Err(MetadataError::RequestFailed(self.reason()))
    }
}

#[async_trait]
impl ReleaseSearcher for Unconfigured {
    fn name(&self) -> &str {
        self.role
    }

    async fn search(&self, _title: &str, _hints: &SearchHints) -> Result<Vec<Release>, FeedError> {
        Err(FeedError::RequestFailed(self.reason()))
    }
}

#[async_trait]
impl DownloadClient for Unconfigured {
    fn name(&self) -> &str {
        self.role
    }

    async fn add_by_url(
        &self,
        _url: &str,
        _options: &AddTorrentOptions,
    ) -> Result<AddTorrentResult, DownloadClientError> {
        Err(DownloadClientError::ConnectionFailed(self.reason()))
    }

    async fn list_torrents(
        &self,
        _tag: Option<&str>,
    ) -> Result<Vec<ClientTorrent>, DownloadClientError> {
        Err(DownloadClientError::ConnectionFailed(self.reason()))
    }

    async fn delete(&self, _hash: &str, _delete_files: bool) -> Result<(), DownloadClientError> {
        Err(DownloadClientError::ConnectionFailed(self.reason()))
    }
}
