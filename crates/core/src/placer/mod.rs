//! Placer module for moving completed downloads into the media library.
//!
//! Provides the [`Mover`] trait, the filesystem implementation [`FsMover`]
//! and the [`PathTranslator`] that maps download-client paths to the local
//! filesystem view.
//!
//! # Features
//!
//! - Recursive discovery of video files in a completed download
//! - Atomic rename when source and destination share a filesystem
//! - Automatic fallback to copy-then-delete across filesystems
//! - Library folder layout (`<root>/<TV Shows>/<Title>/Season NN`, `<root>/<Movies>/<Title>`)
//!
//! # Example
//!
//! ```ignore
//! use showrunner_core::placer::{FsMover, Mover, PlacerConfig};
//! use showrunner_core::store::MediaType;
//!
//! let mover = FsMover::new(PlacerConfig::default());
//! let folder = mover.ensure_folder(MediaType::Tv, "Show", Some(1)).await?;
//! let placed = mover.move_to(&source, &folder, "Show - S01E01.mkv").await?;
//! ```

mod config;
mod error;
mod fs_mover;
mod path_map;
mod traits;
mod types;

pub use config::PlacerConfig;
pub use error::PlacerError;
pub use fs_mover::FsMover;
pub use path_map::{PathMapping, PathTranslator};
pub use traits::Mover;
pub use types::VideoFile;
