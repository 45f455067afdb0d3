// Stderr diagnostics
//
// Classifies yt-dlp error output so failed attempts are logged with a reason,
// and recognizes the sign-in wall that switches the invoker to its
// bot-detection clients.

/// Marker YouTube puts in front of its sign-in/bot wall.
pub const SIGN_IN_MARKER: &str = "Sign in to confirm";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingReason {
    /// Sign-in wall, captcha or "unusual traffic"
    BotDetection,
    AgeRestricted,
    PrivateVideo,
    VideoUnavailable,
    GeoBlocked,
    /// 429 or similar
    RateLimited,
    Http403Forbidden,
    NetworkTimeout,
    /// No yt-dlp extractor handles the page
    UnsupportedUrl,
    Unknown,
}

impl BlockingReason {
    pub fn description(&self) -> &'static str {
        match self {
            Self::BotDetection => "Bot detection triggered",
            Self::AgeRestricted => "Age-restricted content",
            Self::PrivateVideo => "Private video",
            Self::VideoUnavailable => "Video unavailable",
            Self::GeoBlocked => "Geographic restriction",
            Self::RateLimited => "Rate limited",
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::NetworkTimeout => "Network timeout",
            Self::UnsupportedUrl => "Unsupported URL",
            Self::Unknown => "Unknown error",
        }
    }
}

/// Whether the stderr carries the sign-in marker (case-sensitive, like yt-dlp prints it).
pub fn requires_sign_in(stderr: &str) -> bool {
    stderr.contains(SIGN_IN_MARKER)
}

/// Best-effort classification of an error message. `None` for empty input.
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    if error.trim().is_empty() {
        return None;
    }

    let lower = error.to_lowercase();

    if lower.contains("sign in to confirm your age") || lower.contains("age-restricted") {
        return Some(BlockingReason::AgeRestricted);
    }

    if lower.contains("sign in to confirm")
        || lower.contains("captcha")
        || lower.contains("unusual traffic")
        || lower.contains("not a bot")
    {
        return Some(BlockingReason::BotDetection);
    }

    if lower.contains("private video") || lower.contains("video is private") {
        return Some(BlockingReason::PrivateVideo);
    }

    if lower.contains("video unavailable")
        || lower.contains("video has been removed")
        || lower.contains("no longer available")
    {
        return Some(BlockingReason::VideoUnavailable);
    }

    if lower.contains("not available in your country") || lower.contains("geo restrict") {
        return Some(BlockingReason::GeoBlocked);
    }

    if lower.contains("429") || lower.contains("too many requests") || lower.contains("rate limit") {
        return Some(BlockingReason::RateLimited);
    }

    if lower.contains("403") || lower.contains("forbidden") {
        return Some(BlockingReason::Http403Forbidden);
    }

    if lower.contains("timed out") || lower.contains("timeout") {
        return Some(BlockingReason::NetworkTimeout);
    }

    if lower.contains("unsupported url") {
        return Some(BlockingReason::UnsupportedUrl);
    }

    Some(BlockingReason::Unknown)
}
