//! Quality-profile filtering of candidate releases.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::RejectReason;
use crate::feed::Release;
use crate::store::Profile;

static SIZE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*([kmgt])i?b").expect("size pattern is valid")
});

/// Parse human size text (`1.2 GiB`, `700MB`, `1,024 KB`) into megabytes.
///
/// Units are binary multiples regardless of the optional `i`.
pub fn parse_size_mb(text: &str) -> Option<f64> {
    let cleaned = text.replace(',', "");
    let caps = SIZE_PATTERN.captures(&cleaned)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let factor = match caps.get(2)?.as_str().to_ascii_lowercase().as_str() {
        "t" => 1024.0 * 1024.0,
        "g" => 1024.0,
        "m" => 1.0,
        "k" => 1.0 / 1024.0,
        _ => return None,
    };
    Some(value * factor)
}

/// Size of a release in megabytes: parsed size text first, then the byte length.
pub fn release_size_mb(release: &Release) -> Option<f64> {
    release
        .parsed
        .as_ref()
        .and_then(|p| p.size.as_deref())
        .and_then(parse_size_mb)
        .or_else(|| {
            release
                .size_bytes
                .map(|bytes| bytes as f64 / (1024.0 * 1024.0))
        })
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case-insensitive substring match, retried on the alphanumeric-only form
/// so that `WEB-DL` matches `webdl` and `x.265` matches `x265`.
fn term_matches(term: &str, haystacks: &[&str]) -> bool {
    let term_lower = term.to_lowercase();
    let term_norm = normalize(term);

    haystacks.iter().any(|haystack| {
        haystack.to_lowercase().contains(&term_lower)
            || (!term_norm.is_empty() && normalize(haystack).contains(&term_norm))
    })
}

fn terms(list: &[String]) -> impl Iterator<Item = &str> {
    list.iter().map(|t| t.trim()).filter(|t| !t.is_empty())
}

/// Whether any term of a non-empty list matches. Lists with no usable terms always pass.
fn list_satisfied(list: &[String], haystacks: &[&str]) -> bool {
    let mut usable = terms(list).peekable();
    if usable.peek().is_none() {
        return true;
    }
    usable.any(|term| term_matches(term, haystacks))
}

/// Apply a quality profile to a release. `None` accepts everything.
pub fn check_profile(release: &Release, profile: Option<&Profile>) -> Result<(), RejectReason> {
    let Some(profile) = profile else {
        return Ok(());
    };

    let parsed = release.parsed.as_ref();
    let sub_team = parsed.and_then(|p| p.sub_team.as_deref());
    let subtitle_language = parsed.and_then(|p| p.subtitle_language.as_deref());
    let resolution = parsed.and_then(|p| p.resolution.as_deref());
    let format = parsed.and_then(|p| p.format.as_deref());

    let title = release.title.as_str();
    let mut keyword_fields = vec![title];
    keyword_fields.extend(sub_team);
    keyword_fields.extend(subtitle_language);

    if let Some(keyword) =
        terms(&profile.excluded_keywords).find(|kw| term_matches(kw, &keyword_fields))
    {
        return Err(RejectReason::ExcludedKeyword(keyword.to_string()));
    }

    if !list_satisfied(&profile.preferred_keywords, &keyword_fields) {
        return Err(RejectReason::PreferredKeywordMiss);
    }

    let mut resolution_fields = vec![title];
    resolution_fields.extend(resolution);
    if !list_satisfied(&profile.resolutions, &resolution_fields) {
        return Err(RejectReason::ResolutionMiss);
    }

    let mut format_fields = vec![title];
    format_fields.extend(format);
    if !list_satisfied(&profile.qualities, &format_fields) {
        return Err(RejectReason::QualityMiss);
    }
    if !list_satisfied(&profile.formats, &format_fields) {
        return Err(RejectReason::FormatMiss);
    }
    if !list_satisfied(&profile.encoders, &format_fields) {
        return Err(RejectReason::EncoderMiss);
    }

    if let Some(size) = release_size_mb(release) {
        if profile.min_size_mb.is_some_and(|min| size < min) {
            return Err(RejectReason::SizeBelowMin);
        }
        if profile.max_size_mb.is_some_and(|max| size > max) {
            return Err(RejectReason::SizeAboveMax);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ParsedRelease;

    fn release(title: &str) -> Release {
        Release::new(title, "magnet:?xt=urn:btih:abc")
    }

    fn sized(title: &str, size: &str) -> Release {
        release(title).with_parsed(ParsedRelease {
            size: Some(size.to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_no_profile_accepts() {
        assert_eq!(check_profile(&release("anything"), None), Ok(()));
    }

    #[test]
    fn test_excluded_keyword_and_resolution() {
        let profile = Profile {
            resolutions: vec!["1080p".to_string()],
            excluded_keywords: vec!["bad".to_string()],
            ..Default::default()
        };

        assert_eq!(
            check_profile(&release("Show bad 1080p"), Some(&profile)),
            Err(RejectReason::ExcludedKeyword("bad".to_string()))
        );
        assert_eq!(check_profile(&release("Show 1080p"), Some(&profile)), Ok(()));
        assert_eq!(
            check_profile(&release("Show 720p"), Some(&profile)),
            Err(RejectReason::ResolutionMiss)
        );
    }

    #[test]
    fn test_size_bounds() {
        let profile = Profile {
            min_size_mb: Some(100.0),
            max_size_mb: Some(2000.0),
            ..Default::default()
        };

        assert_eq!(
            check_profile(&sized("Show", "50MB"), Some(&profile)),
            Err(RejectReason::SizeBelowMin)
        );
        assert_eq!(check_profile(&sized("Show", "1.2GB"), Some(&profile)), Ok(()));
        assert_eq!(
            check_profile(&sized("Show", "3 GiB"), Some(&profile)),
            Err(RejectReason::SizeAboveMax)
        );
        // unknown size never rejects
        assert_eq!(check_profile(&release("Show"), Some(&profile)), Ok(()));
    }

    #[test]
    fn test_size_falls_back_to_byte_length() {
        let profile = Profile {
            min_size_mb: Some(100.0),
            ..Default::default()
        };
        let small = release("Show").with_size_bytes(10 * 1024 * 1024);
        assert_eq!(
            check_profile(&small, Some(&profile)),
            Err(RejectReason::SizeBelowMin)
        );
        let unparseable = sized("Show", "big").with_size_bytes(500 * 1024 * 1024);
        assert_eq!(check_profile(&unparseable, Some(&profile)), Ok(()));
    }

    #[test]
    fn test_parse_size_mb() {
        assert_eq!(parse_size_mb("700MB"), Some(700.0));
        assert_eq!(parse_size_mb("1.5 GiB"), Some(1536.0));
        assert_eq!(parse_size_mb("1,024 kb"), Some(1.0));
        assert_eq!(parse_size_mb("2TB"), Some(2.0 * 1024.0 * 1024.0));
        assert_eq!(parse_size_mb("unknown"), None);
    }

    #[test]
    fn test_normalized_term_matching() {
        let profile = Profile {
            formats: vec!["WEB-DL".to_string()],
            encoders: vec!["x265".to_string()],
            ..Default::default()
        };
        assert_eq!(
            check_profile(&release("Show S01E01 WEBDL x.265"), Some(&profile)),
            Ok(())
        );
        assert_eq!(
            check_profile(&release("Show S01E01 BluRay x265"), Some(&profile)),
            Err(RejectReason::FormatMiss)
        );
        assert_eq!(
            check_profile(&release("Show S01E01 WEB-DL x264"), Some(&profile)),
            Err(RejectReason::EncoderMiss)
        );
    }

    #[test]
    fn test_parsed_fields_are_consulted() {
        let profile = Profile {
            resolutions: vec!["1080p".to_string()],
            qualities: vec!["hevc".to_string()],
            preferred_keywords: vec!["SubsPlease".to_string()],
            ..Default::default()
        };
        let candidate = release("[Group] Show - 03").with_parsed(ParsedRelease {
            resolution: Some("1080P".to_string()),
            format: Some("HEVC".to_string()),
            sub_team: Some("SubsPlease".to_string()),
            ..Default::default()
        });
        assert_eq!(check_profile(&candidate, Some(&profile)), Ok(()));

        let no_team = release("[Group] Show - 03 1080p HEVC");
        assert_eq!(
            check_profile(&no_team, Some(&profile)),
            Err(RejectReason::PreferredKeywordMiss)
        );
    }

    #[test]
    fn test_quality_miss_and_blank_terms() {
        let profile = Profile {
            qualities: vec!["remux".to_string()],
            excluded_keywords: vec!["  ".to_string()],
            ..Default::default()
        };
        assert_eq!(
            check_profile(&release("Show 1080p WEB"), Some(&profile)),
            Err(RejectReason::QualityMiss)
        );
    }
}
