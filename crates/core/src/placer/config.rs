//! Configuration for the placer module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the library mover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacerConfig {
    /// Root of the media library.
    #[serde(default = "default_library_root")]
    pub library_root: PathBuf,

    /// Folder under the library root holding TV shows.
    #[serde(default = "default_tv_folder")]
    pub tv_folder: String,

    /// Folder under the library root holding movies.
    #[serde(default = "default_movie_folder")]
    pub movie_folder: String,

    /// Whether to try a rename before falling back to copy.
    #[serde(default = "default_true")]
    pub prefer_atomic_moves: bool,

    /// Whether an existing library file may be replaced.
    #[serde(default)]
    pub overwrite: bool,

    /// Buffer size for file copies in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_library_root() -> PathBuf {
    PathBuf::from("/media")
}

fn default_tv_folder() -> String {
    "TV Shows".to_string()
}

fn default_movie_folder() -> String {
    "Movies".to_string()
}

fn default_buffer_size() -> usize {
    8 * 1024 * 1024 // 8 MB
}

fn default_true() -> bool {
    true
}

impl Default for PlacerConfig {
    fn default() -> Self {
        Self {
            library_root: default_library_root(),
            tv_folder: default_tv_folder(),
            movie_folder: default_movie_folder(),
            prefer_atomic_moves: true,
            overwrite: false,
            buffer_size: default_buffer_size(),
        }
    }
}

impl PlacerConfig {
    /// Sets the library root.
    pub fn with_library_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.library_root = root.into();
        self
    }

    /// Enables or disables rename-first moves.
    pub fn with_atomic_moves(mut self, enabled: bool) -> Self {
        self.prefer_atomic_moves = enabled;
        self
    }

    /// Allows replacing existing library files.
    pub fn with_overwrite(mut self, enabled: bool) -> Self {
        self.overwrite = enabled;
        self
    }

    /// Sets the buffer size for copies.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlacerConfig::default();
        assert_eq!(config.buffer_size, 8 * 1024 * 1024);
        assert_eq!(config.library_root, PathBuf::from("/media"));
        assert_eq!(config.tv_folder, "TV Shows");
        assert!(config.prefer_atomic_moves);
        assert!(!config.overwrite);
    }

    #[test]
    fn test_config_builder() {
        let config = PlacerConfig::default()
            .with_library_root("/srv/library")
            .with_atomic_moves(false)
            .with_overwrite(true)
            .with_buffer_size(1024 * 1024);

        assert_eq!(config.library_root, PathBuf::from("/srv/library"));
        assert!(!config.prefer_atomic_moves);
        assert!(config.overwrite);
        assert_eq!(config.buffer_size, 1024 * 1024);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: PlacerConfig = toml::from_str("library_root = \"/data\"").unwrap();
        assert_eq!(config.library_root, PathBuf::from("/data"));
        assert_eq!(config.movie_folder, "Movies");
    }
}
