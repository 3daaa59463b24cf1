//! Persistent storage of subscriptions, episodes, torrent records and quality profiles.

mod sqlite;
mod traits;
mod types;

pub use sqlite::SqliteMediaStore;
pub use traits::{
    EpisodePatch, MediaStore, NewEpisode, NewProfile, NewSubscription, NewTorrent, StoreError,
    SubscriptionPatch, TorrentPatch,
};
pub use types::{
    Episode, EpisodeStatus, MediaType, MetadataSource, Profile, Subscription, SubscriptionStatus,
    TorrentRecord, TorrentStatus,
};
