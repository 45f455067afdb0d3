// URL normalization
//
// Rewrites YouTube short links, shorts and tracked watch URLs into a single
// canonical watch form so every attempt profile sees the same input.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

const WATCH_BASE: &str = "https://www.youtube.com/watch";

lazy_static! {
    static ref SHORT_LINK: Regex = Regex::new(r"youtu\.be/([^?&]+)").expect("valid regex");
    static ref SHORTS: Regex = Regex::new(r"youtube\.com/shorts/([^?&]+)").expect("valid regex");
}

/// Normalize a user-supplied media URL.
///
/// Returns an empty string when nothing usable remains after trimming.
pub fn normalize(raw: &str) -> String {
    let url = raw
        .trim()
        .trim_matches(|c: char| matches!(c, '\'' | '"' | ' ' | '\t' | '\n' | '\r'));

    if url.is_empty() {
        return String::new();
    }

    let url = if url.contains("youtu.be/") {
        match SHORT_LINK.captures(url) {
            Some(caps) => watch_url(&caps[1]),
            None => url.to_string(),
        }
    } else if url.contains("youtube.com/shorts/") {
        match SHORTS.captures(url) {
            Some(caps) => watch_url(&caps[1]),
            None => url.to_string(),
        }
    } else if url.contains("youtube.com/watch") && url.contains("v=") {
        video_id_param(url)
            .map(|id| watch_url(&id))
            .unwrap_or_else(|| url.to_string())
    } else {
        url.to_string()
    };

    if url.starts_with("http://") || url.starts_with("https://") {
        url
    } else {
        format!("https://{}", url)
    }
}

/// Whether the URL targets YouTube, which gets the extra client profiles.
pub fn is_youtube(url: &str) -> bool {
    url.contains("youtube") || url.contains("youtu.be")
}

fn watch_url(video_id: &str) -> String {
    match Url::parse_with_params(WATCH_BASE, &[("v", video_id)]) {
        Ok(u) => u.to_string(),
        Err(_) => format!("{}?v={}", WATCH_BASE, video_id),
    }
}

fn video_id_param(url: &str) -> Option<String> {
    let parsed = if url.starts_with("http://") || url.starts_with("https://") {
        Url::parse(url)
    } else {
        Url::parse(&format!("https://{}", url))
    }
    .ok()?;

    parsed
        .query_pairs()
        .find(|(k, v)| k == "v" && !v.is_empty())
        .map(|(_, v)| v.into_owned())
}
