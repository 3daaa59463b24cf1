//! Mock release searcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::feed::{FeedError, Release, ReleaseSearcher, SearchHints};

/// A recorded search for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSearch {
    pub title: String,
    pub hints: SearchHints,
}

/// Mock implementation of the ReleaseSearcher trait.
///
/// Results registered for a title with [`set_results_for`](Self::set_results_for)
/// take precedence over the default list from [`set_results`](Self::set_results).
#[derive(Debug, Default)]
pub struct MockReleaseSearcher {
    results: Mutex<Vec<Release>>,
    by_title: Mutex<HashMap<String, Vec<Release>>>,
    searches: Mutex<Vec<RecordedSearch>>,
    /// If set, the next search will fail with this error.
    next_error: Mutex<Option<FeedError>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockReleaseSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_results(&self, releases: Vec<Release>) {
        *lock(&self.results) = releases;
    }

    pub fn set_results_for(&self, title: &str, releases: Vec<Release>) {
        lock(&self.by_title).insert(title.to_string(), releases);
    }

    pub fn set_next_error(&self, error: FeedError) {
        *lock(&self.next_error) = Some(error);
    }

    pub fn searches(&self) -> Vec<RecordedSearch> {
        lock(&self.searches).clone()
    }
}

#[async_trait]
impl ReleaseSearcher for MockReleaseSearcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, title: &str, hints: &SearchHints) -> Result<Vec<Release>, FeedError> {
        lock(&self.searches).push(RecordedSearch {
            title: title.to_string(),
            hints: *hints,
        });

        if let Some(err) = lock(&self.next_error).take() {
            return Err(err);
        }

        if let Some(releases) = lock(&self.by_title).get(title) {
            return Ok(releases.clone());
        }
        Ok(lock(&self.results).clone())
    }
}
