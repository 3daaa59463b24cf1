//! Trait definitions for the placer module.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::error::PlacerError;
use super::types::VideoFile;
use crate::store::MediaType;

/// Moves completed downloads into the media library.
#[async_trait]
pub trait Mover: Send + Sync {
    /// Returns the name of this mover implementation.
    fn name(&self) -> &str;

    /// Video files under `path`. A path naming a single file yields just that file.
    async fn find_video_files(&self, path: &Path) -> Result<Vec<VideoFile>, PlacerError>;

    /// Move `source` into `dest_dir` as `file_name`, returning the final path.
    async fn move_to(
        &self,
        source: &Path,
        dest_dir: &Path,
        file_name: &str,
    ) -> Result<PathBuf, PlacerError>;

    /// The first of `file_names` already present in `dest_dir`.
    async fn find_placed(
        &self,
        dest_dir: &Path,
        file_names: &[String],
    ) -> Result<Option<PathBuf>, PlacerError>;

    /// Create (if needed) and return the library folder for a title.
    async fn ensure_folder(
        &self,
        media_type: MediaType,
        title: &str,
        season: Option<u32>,
    ) -> Result<PathBuf, PlacerError>;
}
