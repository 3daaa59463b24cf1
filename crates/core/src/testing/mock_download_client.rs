//! Mock download client for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::download_client::{
    AddTorrentOptions, AddTorrentResult, ClientTorrent, ClientTorrentState, DownloadClient,
    DownloadClientError,
};
use crate::util::parse_magnet_hash;

/// A recorded `add_by_url` call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedAdd {
    pub url: String,
    pub options: AddTorrentOptions,
    pub timestamp: chrono::DateTime<Utc>,
}

/// Mock implementation of the DownloadClient trait.
///
/// Provides controllable behavior for testing:
/// - Pre-populate torrents and drive their progress/state
/// - Track additions and deletions for assertions
/// - Simulate failures
///
/// Helpers are synchronous so fixtures can be set up outside async code.
///
/// # Example
///
/// ```rust,ignore
/// let client = MockDownloadClient::new();
/// client.add_by_url("magnet:?xt=urn:btih:abc", &AddTorrentOptions::default()).await?;
/// client.set_progress("abc", 1.0);
/// client.set_state("abc", ClientTorrentState::PausedUploading);
/// assert_eq!(client.added().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockDownloadClient {
    torrents: Mutex<Vec<ClientTorrent>>,
    added: Mutex<Vec<RecordedAdd>>,
    deleted: Mutex<Vec<(String, bool)>>,
    list_calls: Mutex<Vec<Option<String>>>,
    /// If set, the next operation will fail with this error.
    next_error: Mutex<Option<DownloadClientError>>,
    fail_delete: AtomicBool,
    /// Whether `add_by_url` reports a hash for non-magnet links.
    hide_hashes: AtomicBool,
    hash_counter: AtomicU32,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockDownloadClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace (by case-insensitive hash) a torrent.
    pub fn insert(&self, torrent: ClientTorrent) {
        let mut torrents = lock(&self.torrents);
        torrents.retain(|t| !t.hash.eq_ignore_ascii_case(&torrent.hash));
        torrents.push(torrent);
    }

    pub fn torrent(&self, hash: &str) -> Option<ClientTorrent> {
        lock(&self.torrents)
            .iter()
            .find(|t| t.hash.eq_ignore_ascii_case(hash))
            .cloned()
    }

    pub fn torrent_count(&self) -> usize {
        lock(&self.torrents).len()
    }

    fn update(&self, hash: &str, f: impl FnOnce(&mut ClientTorrent)) {
        if let Some(torrent) = lock(&self.torrents)
            .iter_mut()
            .find(|t| t.hash.eq_ignore_ascii_case(hash))
        {
            f(torrent);
        }
    }

    /// Set the progress for a torrent (0.0 to 1.0).
    ///
    /// Reaching 1.0 moves a downloading torrent to `Uploading`.
    pub fn set_progress(&self, hash: &str, progress: f64) {
        self.update(hash, |t| {
            t.progress = progress.clamp(0.0, 1.0);
            if t.progress >= 1.0 && t.state == ClientTorrentState::Downloading {
                t.state = ClientTorrentState::Uploading;
            }
        });
    }

    pub fn set_state(&self, hash: &str, state: ClientTorrentState) {
        self.update(hash, |t| t.state = state);
    }

    pub fn set_content_path(&self, hash: &str, path: impl Into<String>) {
        let path = path.into();
        self.update(hash, |t| t.content_path = Some(path));
    }

    /// Configure the next operation to fail with the given error.
    pub fn set_next_error(&self, error: DownloadClientError) {
        *lock(&self.next_error) = Some(error);
    }

    /// Make every delete fail until reset.
    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// Report no hash from `add_by_url` for links without a magnet hash.
    pub fn set_hide_hashes(&self, hide: bool) {
        self.hide_hashes.store(hide, Ordering::SeqCst);
    }

    pub fn added(&self) -> Vec<RecordedAdd> {
        lock(&self.added).clone()
    }

    /// Successful deletions as `(hash, delete_files)`.
    pub fn deleted(&self) -> Vec<(String, bool)> {
        lock(&self.deleted).clone()
    }

    /// Tag filter of every `list_torrents` call.
    pub fn list_calls(&self) -> Vec<Option<String>> {
        lock(&self.list_calls).clone()
    }

    fn take_error(&self) -> Option<DownloadClientError> {
        lock(&self.next_error).take()
    }

    fn generate_hash(&self) -> String {
        let n = self.hash_counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("mockhash{:08x}", n)
    }
}

#[async_trait]
impl DownloadClient for MockDownloadClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn add_by_url(
        &self,
        url: &str,
        options: &AddTorrentOptions,
    ) -> Result<AddTorrentResult, DownloadClientError> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }

        lock(&self.added).push(RecordedAdd {
            url: url.to_string(),
            options: options.clone(),
            timestamp: Utc::now(),
        });

        let magnet_hash = parse_magnet_hash(url);
        let reported = magnet_hash.is_some() || !self.hide_hashes.load(Ordering::SeqCst);
        let hash = magnet_hash.unwrap_or_else(|| self.generate_hash());

        if self.torrent(&hash).is_none() {
            self.insert(ClientTorrent {
                hash: hash.clone(),
                name: format!("Mock Torrent {}", hash),
                state: ClientTorrentState::Downloading,
                progress: 0.0,
                content_path: None,
                save_path: options.save_path.clone(),
                tags: options.tags.join(","),
            });
        }

        Ok(AddTorrentResult {
            hash: reported.then_some(hash),
        })
    }

    async fn list_torrents(
        &self,
        tag: Option<&str>,
    ) -> Result<Vec<ClientTorrent>, DownloadClientError> {
        lock(&self.list_calls).push(tag.map(String::from));
        if let Some(err) = self.take_error() {
            return Err(err);
        }

        Ok(lock(&self.torrents)
            .iter()
            .filter(|t| tag.map_or(true, |tag| t.has_tag(tag)))
            .cloned()
            .collect())
    }

    async fn delete(&self, hash: &str, delete_files: bool) -> Result<(), DownloadClientError> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(DownloadClientError::ApiError("delete failed".to_string()));
        }

        // unknown hashes are ignored, as qBittorrent does
        lock(&self.torrents).retain(|t| !t.hash.eq_ignore_ascii_case(hash));
        lock(&self.deleted).push((hash.to_string(), delete_files));
        Ok(())
    }
}
