//! File system mover implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, info, warn};

use super::config::PlacerConfig;
use super::error::PlacerError;
use super::traits::Mover;
use super::types::VideoFile;
use crate::store::MediaType;
use crate::util::{is_video_path, sanitize_filename};

/// File system based mover.
pub struct FsMover {
    config: PlacerConfig,
}

impl FsMover {
    /// Creates a new file system mover with the given configuration.
    pub fn new(config: PlacerConfig) -> Self {
        Self { config }
    }

    /// Creates a mover with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(PlacerConfig::default())
    }

    pub fn config(&self) -> &PlacerConfig {
        &self.config
    }

    /// Attempts to move a file atomically (rename).
    ///
    /// Returns `Ok(false)` when source and destination live on different filesystems.
    async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
        match fs::rename(source, destination).await {
            Ok(()) => Ok(true),
            Err(e) => {
                // EXDEV is 18 on Linux
                if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                    Ok(false)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Copies a file, returning the number of bytes written.
    async fn copy_file(&self, source: &Path, destination: &Path) -> Result<u64, PlacerError> {
        let source_file = File::open(source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlacerError::SourceNotFound {
                    path: source.to_path_buf(),
                }
            } else {
                PlacerError::Io(e)
            }
        })?;

        let dest_file = File::create(destination).await.map_err(|e| {
            PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, dest_file);

        let mut total_bytes = 0u64;
        let mut buffer = vec![0u8; self.config.buffer_size];

        loop {
            let bytes_read = reader.read(&mut buffer).await.map_err(|e| {
                PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

            if bytes_read == 0 {
                break;
            }

            writer.write_all(&buffer[..bytes_read]).await.map_err(|e| {
                PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

            total_bytes += bytes_read as u64;
        }

        writer.flush().await.map_err(|e| {
            PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        Ok(total_bytes)
    }

    /// Copies `source` next to `destination` and renames it into place.
    ///
    /// The destination path only ever holds a complete copy; a failed copy
    /// leaves nothing behind.
    async fn copy_into_place(&self, source: &Path, destination: &Path) -> Result<u64, PlacerError> {
        let partial = partial_path(destination);
        let copied = match self.copy_file(source, &partial).await {
            Ok(bytes) => fs::rename(&partial, destination)
                .await
                .map(|()| bytes)
                .map_err(|e| {
                    PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
                }),
            Err(e) => Err(e),
        };

        if copied.is_err() {
            if let Err(e) = fs::remove_file(&partial).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove partial copy {}: {}", partial.display(), e);
                }
            }
        }
        copied
    }

    async fn create_dir(path: &Path) -> Result<(), PlacerError> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| PlacerError::DirectoryCreationFailed {
                path: path.to_path_buf(),
                source: e,
            })
    }
}

/// Sibling of `destination` that receives an in-progress copy.
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    destination.with_file_name(name)
}

#[async_trait]
impl Mover for FsMover {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn find_video_files(&self, path: &Path) -> Result<Vec<VideoFile>, PlacerError> {
        let metadata = fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlacerError::SourceNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                PlacerError::Io(e)
            }
        })?;

        if metadata.is_file() {
            if !is_video_path(path) {
                return Ok(Vec::new());
            }
            return Ok(vec![VideoFile::new(path, metadata.len())]);
        }

        let mut found = Vec::new();
        let mut pending = vec![path.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                let entry_path = entry.path();
                if file_type.is_dir() {
                    pending.push(entry_path);
                } else if file_type.is_file() && is_video_path(&entry_path) {
                    let size = entry.metadata().await?.len();
                    found.push(VideoFile::new(entry_path, size));
                }
            }
        }

        found.sort_by(|a, b| a.path.cmp(&b.path));
        debug!("Found {} video file(s) under {}", found.len(), path.display());
        Ok(found)
    }

    async fn move_to(
        &self,
        source: &Path,
        dest_dir: &Path,
        file_name: &str,
    ) -> Result<PathBuf, PlacerError> {
        if fs::metadata(source).await.is_err() {
            return Err(PlacerError::SourceNotFound {
                path: source.to_path_buf(),
            });
        }

        Self::create_dir(dest_dir).await?;
        let destination = dest_dir.join(file_name);

        if fs::metadata(&destination).await.is_ok() {
            if !self.config.overwrite {
                return Err(PlacerError::DestinationExists { path: destination });
            }
            fs::remove_file(&destination).await?;
        }

        if self.config.prefer_atomic_moves {
            let moved = Self::try_atomic_move(source, &destination)
                .await
                .map_err(|e| {
                    PlacerError::move_failed(source.to_path_buf(), destination.clone(), e)
                })?;
            if moved {
                info!(
                    "Moved {} -> {}",
                    source.display(),
                    destination.display()
                );
                return Ok(destination);
            }
            debug!(
                "Rename crosses filesystems, copying {} instead",
                source.display()
            );
        }

        let bytes = self.copy_into_place(source, &destination).await?;
        if let Err(e) = fs::remove_file(source).await {
            // keep a single copy so the next attempt starts from the source again
            if let Err(cleanup) = fs::remove_file(&destination).await {
                warn!(
                    "Failed to roll back {} after source removal failed: {}",
                    destination.display(),
                    cleanup
                );
            }
            return Err(PlacerError::move_failed(
                source.to_path_buf(),
                destination,
                e,
            ));
        }

        info!(
            "Copied {} -> {} ({} bytes)",
            source.display(),
            destination.display(),
            bytes
        );
        Ok(destination)
    }

    async fn find_placed(
        &self,
        dest_dir: &Path,
        file_names: &[String],
    ) -> Result<Option<PathBuf>, PlacerError> {
        for name in file_names {
            let candidate = dest_dir.join(name);
            match fs::metadata(&candidate).await {
                Ok(metadata) if metadata.is_file() => return Ok(Some(candidate)),
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(PlacerError::Io(e)),
            }
        }
        Ok(None)
    }

    async fn ensure_folder(
        &self,
        media_type: MediaType,
        title: &str,
        season: Option<u32>,
    ) -> Result<PathBuf, PlacerError> {
        let title = sanitize_filename(title);
        let mut folder = match media_type {
            MediaType::Tv => self.config.library_root.join(&self.config.tv_folder),
            MediaType::Movie => self.config.library_root.join(&self.config.movie_folder),
        };
        folder.push(title);

        if let (MediaType::Tv, Some(season)) = (media_type, season) {
            folder.push(format!("Season {:02}", season));
        }

        Self::create_dir(&folder).await?;
        Ok(folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.unwrap();
        }
        fs::write(&path, content).await.unwrap();
        path
    }

    fn mover_for(root: &Path) -> FsMover {
        FsMover::new(PlacerConfig::default().with_library_root(root))
    }

    #[tokio::test]
    async fn test_find_video_files_recursive() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "Show/ep1.mkv", b"aaaa").await;
        create_test_file(temp.path(), "Show/Sample/sample.mp4", b"bb").await;
        create_test_file(temp.path(), "Show/info.nfo", b"text").await;

        let mover = FsMover::with_defaults();
        let files = mover
            .find_video_files(&temp.path().join("Show"))
            .await
            .unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|f| f.path.ends_with("ep1.mkv") && f.size_bytes == 4));
        assert!(files.iter().all(|f| !f.path.ends_with("info.nfo")));
    }

    #[tokio::test]
    async fn test_find_video_files_single_file() {
        let temp = TempDir::new().unwrap();
        let file = create_test_file(temp.path(), "movie.mp4", b"12345").await;

        let files = FsMover::with_defaults().find_video_files(&file).await.unwrap();
        assert_eq!(files, vec![VideoFile::new(file, 5)]);
    }

    #[tokio::test]
    async fn test_find_video_files_missing_path() {
        let temp = TempDir::new().unwrap();
        let result = FsMover::with_defaults()
            .find_video_files(&temp.path().join("missing"))
            .await;
        assert!(matches!(result, Err(PlacerError::SourceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_move_to_renames() {
        let temp = TempDir::new().unwrap();
        let source = create_test_file(temp.path(), "dl/ep.mkv", b"video").await;
        let dest_dir = temp.path().join("library/Show/Season 01");

        let mover = mover_for(&temp.path().join("library"));
        let placed = mover
            .move_to(&source, &dest_dir, "Show - S01E01.mkv")
            .await
            .unwrap();

        assert_eq!(placed, dest_dir.join("Show - S01E01.mkv"));
        assert!(!source.exists());
        assert_eq!(fs::read(&placed).await.unwrap(), b"video");
    }

    #[tokio::test]
    async fn test_move_to_copy_path() {
        let temp = TempDir::new().unwrap();
        let source = create_test_file(temp.path(), "dl/movie.mp4", b"movie bytes").await;
        let dest_dir = temp.path().join("out");

        let mover = FsMover::new(
            PlacerConfig::default()
                .with_atomic_moves(false)
                .with_buffer_size(4),
        );
        let placed = mover.move_to(&source, &dest_dir, "Movie.mp4").await.unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read(&placed).await.unwrap(), b"movie bytes");
    }

    #[tokio::test]
    async fn test_failed_copy_leaves_no_destination() {
        let temp = TempDir::new().unwrap();
        // a directory opens but cannot be read as a file
        let source = temp.path().join("dl/ep.mkv");
        fs::create_dir_all(&source).await.unwrap();
        let dest_dir = temp.path().join("out");

        let mover = FsMover::new(PlacerConfig::default().with_atomic_moves(false));
        let result = mover.move_to(&source, &dest_dir, "ep.mkv").await;

        assert!(result.is_err());
        assert!(!dest_dir.join("ep.mkv").exists());
        assert!(!dest_dir.join("ep.mkv.partial").exists());

        fs::remove_dir(&source).await.unwrap();
        fs::write(&source, b"video").await.unwrap();
        let placed = mover.move_to(&source, &dest_dir, "ep.mkv").await.unwrap();

        assert_eq!(placed, dest_dir.join("ep.mkv"));
        assert_eq!(fs::read(&placed).await.unwrap(), b"video");
        assert!(!source.exists());
    }

    #[test]
    fn test_partial_path_is_sibling() {
        assert_eq!(
            partial_path(Path::new("/lib/Show - S01E01.mkv")),
            PathBuf::from("/lib/Show - S01E01.mkv.partial")
        );
    }

    #[tokio::test]
    async fn test_destination_exists_error() {
        let temp = TempDir::new().unwrap();
        let source = create_test_file(temp.path(), "dl/ep.mkv", b"new").await;
        create_test_file(temp.path(), "out/ep.mkv", b"old").await;

        let result = FsMover::with_defaults()
            .move_to(&source, &temp.path().join("out"), "ep.mkv")
            .await;

        assert!(matches!(result, Err(PlacerError::DestinationExists { .. })));
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_move_with_overwrite() {
        let temp = TempDir::new().unwrap();
        let source = create_test_file(temp.path(), "dl/ep.mkv", b"new").await;
        create_test_file(temp.path(), "out/ep.mkv", b"old").await;

        let mover = FsMover::new(PlacerConfig::default().with_overwrite(true));
        let placed = mover
            .move_to(&source, &temp.path().join("out"), "ep.mkv")
            .await
            .unwrap();
        assert_eq!(fs::read(&placed).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_move_missing_source() {
        let temp = TempDir::new().unwrap();
        let result = FsMover::with_defaults()
            .move_to(&temp.path().join("nope.mkv"), temp.path(), "x.mkv")
            .await;
        assert!(matches!(result, Err(PlacerError::SourceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_find_placed() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "Show - S01E01.mp4", b"video").await;
        let mover = FsMover::with_defaults();

        let names = vec![
            "Show - S01E01.mkv".to_string(),
            "Show - S01E01.mp4".to_string(),
        ];
        let found = mover.find_placed(temp.path(), &names).await.unwrap();
        assert_eq!(found, Some(temp.path().join("Show - S01E01.mp4")));

        let missing = mover
            .find_placed(temp.path(), &["Show - S01E02.mkv".to_string()])
            .await
            .unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_ensure_folder_layout() {
        let temp = TempDir::new().unwrap();
        let mover = mover_for(temp.path());

        let tv = mover
            .ensure_folder(MediaType::Tv, "Re:Zero", Some(2))
            .await
            .unwrap();
        assert_eq!(tv, temp.path().join("TV Shows/Re Zero/Season 02"));
        assert!(tv.is_dir());

        let movie = mover
            .ensure_folder(MediaType::Movie, "The Matrix", Some(1))
            .await
            .unwrap();
        assert_eq!(movie, temp.path().join("Movies/The Matrix"));

        let unscoped = mover
            .ensure_folder(MediaType::Tv, "Show", None)
            .await
            .unwrap();
        assert_eq!(unscoped, temp.path().join("TV Shows/Show"));
    }
}
