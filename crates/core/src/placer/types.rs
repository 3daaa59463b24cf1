//! Types for the placer module.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A video file found inside a completed download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFile {
    /// Absolute local path of the file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size_bytes: u64,
}

impl VideoFile {
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            size_bytes,
        }
    }

    /// Lossy UTF-8 rendering of the path, used for logs and filename building.
    pub fn display_path(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}
