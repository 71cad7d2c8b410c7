//! Offline YouTube URL recognition.
//!
//! Maps the URL shapes YouTube hands out (watch pages, short links,
//! embeds, shorts, live) to the bare video id. No network access.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static RE_VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap());

/// Path prefixes that carry the id as the next segment.
const ID_PATH_PREFIXES: &[&str] = &["embed", "v", "vi", "e", "shorts", "live"];

/// Extract the video id from a YouTube URL, or `None` if the URL is not a
/// recognised YouTube video link.
pub fn parse_video_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let url = if raw.contains("://") {
        Url::parse(raw).ok()?
    } else {
        Url::parse(&format!("https://{raw}")).ok()?
    };
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .or_else(|| host.strip_prefix("music."))
        .unwrap_or(&host);

    let mut segments = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter();

    let candidate = match host {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(k, _)| k == "v" || k == "vi")
                .map(|(_, v)| v.into_owned()),
            Some(prefix) if ID_PATH_PREFIXES.contains(&prefix) => {
                segments.next().map(str::to_string)
            }
            _ => None,
        },
        _ => None,
    }?;

    RE_VIDEO_ID.is_match(&candidate).then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_urls() {
        assert_eq!(
            parse_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            parse_video_id("https://m.youtube.com/watch?feature=share&v=abc123").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            parse_video_id("https://music.youtube.com/watch?v=abc_-9&list=RD").as_deref(),
            Some("abc_-9")
        );
    }

    #[test]
    fn test_short_and_path_forms() {
        assert_eq!(parse_video_id("https://youtu.be/abc123?t=42").as_deref(), Some("abc123"));
        assert_eq!(parse_video_id("youtu.be/abc123").as_deref(), Some("abc123"));
        assert_eq!(
            parse_video_id("https://www.youtube.com/shorts/XyZ987").as_deref(),
            Some("XyZ987")
        );
        assert_eq!(
            parse_video_id("https://www.youtube-nocookie.com/embed/abc123").as_deref(),
            Some("abc123")
        );
        assert_eq!(parse_video_id("http://youtube.com/live/abc123").as_deref(), Some("abc123"));
    }

    #[test]
    fn test_rejects_non_video_links() {
        assert!(parse_video_id("https://example.com/watch?v=abc123").is_none());
        assert!(parse_video_id("https://www.youtube.com/").is_none());
        assert!(parse_video_id("https://www.youtube.com/watch").is_none());
        assert!(parse_video_id("https://www.youtube.com/channel/UC123").is_none());
        assert!(parse_video_id("https://youtu.be/").is_none());
        assert!(parse_video_id("https://www.youtube.com/watch?v=bad%20id").is_none());
        assert!(parse_video_id("ftp://youtube.com/watch?v=abc123").is_none());
        assert!(parse_video_id("").is_none());
    }
}
