//! Download client abstraction and the managed-torrent lifecycle helper.

mod lifecycle;
mod types;

pub use lifecycle::{is_complete, is_managed, CleanupOutcome, ManagedTags, TorrentLifecycle};
pub use types::{
    AddTorrentOptions, AddTorrentResult, ClientTorrent, ClientTorrentState, DownloadClient,
    DownloadClientError,
};
