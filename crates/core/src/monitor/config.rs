//! Monitor and download configuration.

use serde::{Deserialize, Serialize};

use crate::download_client::ManagedTags;

/// Cadences of the pipeline jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// When disabled, no jobs are registered and nothing runs unattended.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cron expression for new-episode discovery (daily).
    #[serde(default = "default_discovery_schedule")]
    pub discovery_schedule: String,

    /// Cron expression for release search and submission (hourly).
    #[serde(default = "default_acquisition_schedule")]
    pub acquisition_schedule: String,

    /// Cron expression for completion polling (every 5 minutes).
    #[serde(default = "default_completion_schedule")]
    pub completion_schedule: String,

    /// Run discovery once right after startup.
    #[serde(default = "default_true")]
    pub run_discovery_on_start: bool,
}

fn default_true() -> bool {
    true
}

fn default_discovery_schedule() -> String {
    "0 3 * * *".to_string()
}

fn default_acquisition_schedule() -> String {
    "0 * * * *".to_string()
}

fn default_completion_schedule() -> String {
    "*/5 * * * *".to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            discovery_schedule: default_discovery_schedule(),
            acquisition_schedule: default_acquisition_schedule(),
            completion_schedule: default_completion_schedule(),
            run_discovery_on_start: true,
        }
    }
}

/// How releases are handed to the download client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Comma-separated tags marking torrents this service owns.
    #[serde(default = "default_managed_tags")]
    pub managed_tags: String,

    /// Download-client category for submitted torrents.
    #[serde(default = "default_category")]
    pub category: String,

    /// Base download directory as seen by the download client.
    #[serde(default = "default_save_path")]
    pub save_path: String,

    /// Delete downloaded data when a seeded torrent is removed.
    #[serde(default = "default_true")]
    pub delete_files_on_cleanup: bool,
}

fn default_managed_tags() -> String {
    "showrunner".to_string()
}

fn default_category() -> String {
    "showrunner".to_string()
}

fn default_save_path() -> String {
    "/downloads".to_string()
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            managed_tags: default_managed_tags(),
            category: default_category(),
            save_path: default_save_path(),
            delete_files_on_cleanup: true,
        }
    }
}

impl DownloadConfig {
    pub fn tags(&self) -> ManagedTags {
        ManagedTags::parse(&self.managed_tags)
    }

    /// Category to submit with, if one is configured.
    pub fn category(&self) -> Option<&str> {
        let category = self.category.trim();
        (!category.is_empty()).then_some(category)
    }
}
