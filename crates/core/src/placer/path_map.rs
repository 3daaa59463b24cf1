//! Translation of download-client paths into the local filesystem view.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One remote-to-local prefix mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMapping {
    /// Prefix as reported by the download client.
    pub remote: String,
    /// Where that prefix is mounted locally.
    pub local: String,
}

impl PathMapping {
    pub fn new(remote: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            local: local.into(),
        }
    }
}

/// Maps remote paths through a prefix table.
///
/// The longest matching prefix wins. A prefix only matches on a path
/// component boundary, so `/data` does not match `/database`.
#[derive(Debug, Clone, Default)]
pub struct PathTranslator {
    mappings: Vec<(String, String)>,
}

fn trim_trailing_slash(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

impl PathTranslator {
    pub fn new(mappings: &[PathMapping]) -> Self {
        let mut mappings: Vec<(String, String)> = mappings
            .iter()
            .filter(|m| !m.remote.trim().is_empty())
            .map(|m| {
                (
                    trim_trailing_slash(m.remote.trim()).to_string(),
                    trim_trailing_slash(m.local.trim()).to_string(),
                )
            })
            .collect();
        mappings.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { mappings }
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Local view of `remote`. Unmapped paths are returned unchanged.
    pub fn to_local_path(&self, remote: &str) -> PathBuf {
        for (prefix, local) in &self.mappings {
            let rest = if prefix == "/" {
                remote.strip_prefix('/')
            } else {
                match remote.strip_prefix(prefix.as_str()) {
                    Some("") => Some(""),
                    Some(rest) if rest.starts_with('/') => Some(rest.trim_start_matches('/')),
                    _ => None,
                }
            };

            if let Some(rest) = rest {
                let mut path = PathBuf::from(local);
                if !rest.is_empty() {
                    path.push(rest);
                }
                return path;
            }
        }
        PathBuf::from(remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> PathTranslator {
        PathTranslator::new(&[
            PathMapping::new("/downloads/", "/mnt/nas/downloads"),
            PathMapping::new("/downloads/anime", "/mnt/anime/"),
            PathMapping::new("/data", "/srv/data"),
        ])
    }

    #[test]
    fn test_longest_prefix_wins() {
        let t = translator();
        assert_eq!(
            t.to_local_path("/downloads/anime/Show/ep1.mkv"),
            PathBuf::from("/mnt/anime/Show/ep1.mkv")
        );
        assert_eq!(
            t.to_local_path("/downloads/tv/Show"),
            PathBuf::from("/mnt/nas/downloads/tv/Show")
        );
    }

    #[test]
    fn test_component_boundary() {
        let t = translator();
        assert_eq!(
            t.to_local_path("/database/file.mkv"),
            PathBuf::from("/database/file.mkv")
        );
        assert_eq!(t.to_local_path("/data"), PathBuf::from("/srv/data"));
    }

    #[test]
    fn test_unmapped_passthrough() {
        let t = PathTranslator::default();
        assert!(t.is_empty());
        assert_eq!(t.to_local_path("/x/y"), PathBuf::from("/x/y"));
    }

    #[test]
    fn test_root_mapping() {
        let t = PathTranslator::new(&[PathMapping::new("/", "/mnt/remote")]);
        assert_eq!(t.to_local_path("/a/b"), PathBuf::from("/mnt/remote/a/b"));
    }
}
