// Data models shared by the extraction pipeline and the HTTP layer

use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMEOUT_SECONDS: i64 = 30;
pub const MAX_VIDEO_STREAMS: usize = 20;
pub const MAX_AUDIO_STREAMS: usize = 10;

/// Body of `POST /api/extract`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub url: String,
    /// Seconds per attempt; the server default applies when absent
    #[serde(default)]
    pub timeout: Option<i64>,
}

impl ExtractionRequest {
    pub fn timeout_or(&self, default: i64) -> i64 {
        self.timeout.unwrap_or(default)
    }
}

/// Basic metadata about the page being extracted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    /// Duration in seconds (may be fractional)
    pub duration: f64,
    pub thumbnail: String,
    pub uploader: String,
    pub upload_date: String,
    pub view_count: u64,
    pub like_count: u64,
    pub webpage_url: String,
    /// Name of the yt-dlp extractor that handled the page
    pub extractor: String,
}

/// A stream carrying video, with or without paired audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStream {
    pub format_id: String,
    pub url: String,
    pub ext: String,
    pub filesize: Option<u64>,
    pub filesize_human: Option<String>,
    pub protocol: String,
    pub height: u32,
    pub width: u32,
    pub fps: f64,
    #[serde(rename = "vcodec")]
    pub video_codec: String,
    pub quality_label: String,
    /// True when the stream has no paired audio
    pub is_adaptive: bool,
}

/// An audio-only stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioStream {
    pub format_id: String,
    pub url: String,
    pub ext: String,
    pub filesize: Option<u64>,
    pub filesize_human: Option<String>,
    pub protocol: String,
    #[serde(rename = "acodec")]
    pub audio_codec: String,
    /// Bitrate in kbps
    #[serde(rename = "abr")]
    pub bitrate_kbps: f64,
    /// Sample rate in Hz
    #[serde(rename = "asr")]
    pub sample_rate: u32,
    pub quality_label: String,
    pub is_adaptive: bool,
}

/// Response envelope for a single extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_info: Option<VideoInfo>,
    #[serde(rename = "video_formats")]
    pub video_streams: Vec<VideoStream>,
    #[serde(rename = "audio_formats")]
    pub audio_streams: Vec<AudioStream>,
    #[serde(rename = "total_video_formats")]
    pub total_video_streams: usize,
    #[serde(rename = "total_audio_formats")]
    pub total_audio_streams: usize,
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// RFC 3339 UTC timestamp
    #[serde(rename = "extraction_time")]
    pub extraction_timestamp: String,
}

impl ExtractionResult {
    pub fn failure(message: String, timestamp: String) -> Self {
        Self {
            success: false,
            video_info: None,
            video_streams: Vec::new(),
            audio_streams: Vec::new(),
            total_video_streams: 0,
            total_audio_streams: 0,
            error_message: Some(message),
            extraction_timestamp: timestamp,
        }
    }
}
