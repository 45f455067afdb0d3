// Error types for the extraction pipeline

use thiserror::Error;

/// Longest diagnostic carried by an exhaustion error.
pub const MAX_DIAGNOSTIC_CHARS: usize = 200;

/// Reported when no attempt produced any stderr or spawn failure.
pub const NO_OUTPUT: &str = "No output from yt-dlp";

/// Reported when the sign-in fallback clients also come back empty.
pub const BOT_DETECTION_EXHAUSTED: &str =
    "YouTube bot detection - try again later or use a different video";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// Nothing left of the URL after normalization
    #[error("Invalid URL: {0:?}")]
    InvalidUrl(String),

    /// Requested timeout is zero or negative
    #[error("Invalid timeout: {0} (must be greater than zero)")]
    InvalidTimeout(i64),

    /// The first attempt ran past the caller's timeout
    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Every attempt profile failed to produce parseable output
    #[error("yt-dlp failed: {0}")]
    Exhausted(String),
}

impl ExtractError {
    /// Build an exhaustion error, truncating the diagnostic on a char boundary.
    pub fn exhausted(diagnostic: &str) -> Self {
        Self::Exhausted(truncate_chars(diagnostic.trim(), MAX_DIAGNOSTIC_CHARS))
    }
}

/// Failure of a single subprocess run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("Failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("Timed out after {0}s")]
    TimedOut(u64),

    #[error("I/O error: {0}")]
    Io(String),
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
