//! Stage reports and the monitor error type.

use serde::Serialize;
use thiserror::Error;

use crate::download_client::DownloadClientError;
use crate::feed::FeedError;
use crate::metadata::MetadataError;
use crate::placer::PlacerError;
use crate::store::StoreError;

/// Errors raised while processing one subscription, episode or run.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Download client error: {0}")]
    DownloadClient(#[from] DownloadClientError),

    #[error("Placer error: {0}")]
    Placer(#[from] PlacerError),
}

/// Summary of one discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    pub subscriptions_checked: usize,
    pub episodes_created: usize,
    pub failures: usize,
}

/// Summary of one acquisition run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AcquisitionReport {
    pub subscriptions_checked: usize,
    pub submitted: usize,
    /// Episodes or movies whose release was already tracked.
    pub already_covered: usize,
    pub failures: usize,
}

/// Summary of one completion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompletionReport {
    pub completed: usize,
    pub cleaned_up: usize,
    pub move_failures: usize,
}
