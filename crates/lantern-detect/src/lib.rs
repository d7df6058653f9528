//! Resource-type detection from a URL.
//!
//! Shared by lesson authoring, resource authoring, and submission
//! conversion. All three call sites must classify identically, so the
//! heuristics live here and nowhere else.

use lantern_types::models::ResourceType;
use url::Url;

/// Classify a URL as video or article content.
///
/// Pure and deterministic. Returns `None` for anything that does not parse
/// as an absolute http(s) URL with a host — callers must then require a
/// manual type selection rather than defaulting.
pub fn detect(raw: &str) -> Option<ResourceType> {
    let parsed = Url::parse(raw).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if host.is_empty() {
        return None;
    }

    if is_video(host, parsed.path()) {
        Some(ResourceType::Video)
    } else {
        Some(ResourceType::Article)
    }
}

fn is_video(host: &str, path: &str) -> bool {
    match host {
        // Short links: the path is the video id.
        "youtu.be" => path.len() > 1,
        "youtube.com" | "m.youtube.com" => {
            path == "/watch"
                || path.starts_with("/shorts/")
                || path.starts_with("/embed/")
                || path.starts_with("/live/")
        }
        "vimeo.com" | "player.vimeo.com" => {
            // Canonical video pages are /<numeric id> or /video/<id>.
            path.starts_with("/video/")
                || path
                    .strip_prefix('/')
                    .and_then(|rest| rest.chars().next())
                    .is_some_and(|c| c.is_ascii_digit())
        }
        "loom.com" => path.starts_with("/share/"),
        "dailymotion.com" => path.starts_with("/video/"),
        "twitch.tv" => path.starts_with("/videos/"),
        _ => host.ends_with(".wistia.com") || host.ends_with(".wistia.net"),
    }
}
