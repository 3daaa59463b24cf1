//! Pure helpers shared by the pipeline stages: magnet parsing, library
//! filenames, primary video selection and air-date handling.

use std::path::Path;

use chrono::{Local, NaiveDate};

use crate::placer::VideoFile;

/// File extensions treated as video content.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "mov", "wmv", "ts", "m2ts", "webm", "flv", "rmvb",
];

/// Extract the lowercase info hash from a magnet URI.
///
/// 32-character base32 hashes are converted to the 40-character hex form
/// download clients report. Returns `None` for anything that is not a magnet
/// link or has no `xt=urn:btih:` parameter.
pub fn parse_magnet_hash(link: &str) -> Option<String> {
    let query = link.trim().strip_prefix("magnet:?")?;

    for param in query.split('&') {
        let Some(prefix) = param.get(..12) else {
            continue;
        };
        if prefix.eq_ignore_ascii_case("xt=urn:btih:") {
            let hash = &param[12..];
            if hash.is_empty() {
                return None;
            }
            if hash.len() == 32 {
                if let Some(hex) = base32_to_hex(hash) {
                    return Some(hex);
                }
            }
            return Some(hash.to_lowercase());
        }
    }
    None
}

/// Decode an RFC 4648 base32 info hash (32 chars, 20 bytes) into lowercase hex.
fn base32_to_hex(encoded: &str) -> Option<String> {
    let mut bits: u64 = 0;
    let mut width = 0;
    let mut hex = String::with_capacity(40);

    for c in encoded.bytes() {
        let value = match c.to_ascii_uppercase() {
            c @ b'A'..=b'Z' => c - b'A',
            c @ b'2'..=b'7' => c - b'2' + 26,
            _ => return None,
        };
        bits = (bits << 5) | u64::from(value);
        width += 5;
        if width >= 8 {
            width -= 8;
            hex.push_str(&format!("{:02x}", (bits >> width) & 0xff));
        }
    }
    Some(hex)
}

/// Replace characters that are not allowed in file names on common filesystems.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => ' ',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();

    replaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches('.')
        .trim()
        .to_string()
}

/// Extension of `source`, including the leading dot, or an empty string.
fn dotted_extension(source: &str) -> String {
    Path::new(source)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}

/// Canonical episode filename: `Title - S01E02.ext`.
pub fn build_episode_filename(title: &str, season: u32, episode: u32, source: &str) -> String {
    format!(
        "{} - S{:02}E{:02}{}",
        sanitize_filename(title),
        season,
        episode,
        dotted_extension(source)
    )
}

/// Canonical movie filename: `Title.ext`.
pub fn build_movie_filename(title: &str, source: &str) -> String {
    format!("{}{}", sanitize_filename(title), dotted_extension(source))
}

/// Whether the path has a known video extension.
pub fn is_video_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            VIDEO_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Samples and trailers shipped alongside the main feature.
fn is_extra(path: &Path) -> bool {
    let in_extras_dir = path.parent().is_some_and(|parent| {
        parent.components().any(|c| {
            let c = c.as_os_str().to_string_lossy().to_lowercase();
            c == "sample" || c == "samples" || c == "extras"
        })
    });

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    in_extras_dir || stem.contains("sample") || stem.contains("trailer")
}

/// Pick the single file to place in the library from a completed download.
///
/// Non-video files are ignored. The largest file that is not a sample or
/// trailer wins; if every video is an extra, the largest extra is used.
/// Equal sizes resolve to the lexicographically smallest path.
pub fn pick_primary_video(files: &[VideoFile]) -> Option<&VideoFile> {
    let videos: Vec<&VideoFile> = files.iter().filter(|f| is_video_path(&f.path)).collect();

    largest(videos.iter().copied().filter(|f| !is_extra(&f.path)))
        .or_else(|| largest(videos.iter().copied()))
}

fn largest<'a>(candidates: impl Iterator<Item = &'a VideoFile>) -> Option<&'a VideoFile> {
    candidates.fold(None, |best: Option<&'a VideoFile>, file| match best {
        Some(current)
            if current.size_bytes > file.size_bytes
                || (current.size_bytes == file.size_bytes && current.path <= file.path) =>
        {
            Some(current)
        }
        _ => Some(file),
    })
}

/// Today's date in the local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a provider air date (`YYYY-MM-DD`, optionally followed by a time part).
pub fn parse_air_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Whether an episode with this air date has aired by `today`.
///
/// Missing or unparseable dates never count as aired.
pub fn has_aired(air_date: Option<&str>, today: NaiveDate) -> bool {
    air_date
        .and_then(parse_air_date)
        .is_some_and(|date| date <= today)
}
