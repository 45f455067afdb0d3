// Format normalization
//
// Turns yt-dlp's raw `--dump-json` document into typed video/audio stream
// lists:
// - Usable URL detection (direct, manifest, fragment base)
// - Video/audio classification and adaptive flagging
// - Quality labels and human-readable sizes
// - Deduplication, sorting and truncation

use serde_json::Value;
use std::collections::HashSet;

use super::models::{AudioStream, VideoInfo, VideoStream, MAX_AUDIO_STREAMS, MAX_VIDEO_STREAMS};

/// One entry of yt-dlp's `formats` array, with only the fields we consume
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFormat {
    pub format_id: Option<String>,
    pub url: Option<String>,
    pub manifest_url: Option<String>,
    pub fragment_base_url: Option<String>,
    pub ext: Option<String>,
    pub filesize: Option<u64>,
    pub filesize_approx: Option<u64>,
    pub protocol: Option<String>,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub fps: Option<f64>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub abr: Option<f64>,
    pub asr: Option<u32>,
    pub format_note: Option<String>,
}

impl RawFormat {
    pub fn from_json(f: &Value) -> Self {
        Self {
            format_id: str_field(f, "format_id"),
            url: str_field(f, "url"),
            manifest_url: str_field(f, "manifest_url"),
            fragment_base_url: str_field(f, "fragment_base_url"),
            ext: str_field(f, "ext"),
            filesize: u64_field(f, "filesize"),
            filesize_approx: u64_field(f, "filesize_approx"),
            protocol: str_field(f, "protocol"),
            height: u64_field(f, "height").and_then(|h| u32::try_from(h).ok()),
            width: u64_field(f, "width").and_then(|w| u32::try_from(w).ok()),
            fps: f["fps"].as_f64(),
            vcodec: str_field(f, "vcodec"),
            acodec: str_field(f, "acodec"),
            abr: f["abr"].as_f64(),
            asr: u64_field(f, "asr").and_then(|a| u32::try_from(a).ok()),
            format_note: str_field(f, "format_note"),
        }
    }

    /// First http(s) candidate among the direct, manifest and fragment URLs.
    pub fn usable_url(&self) -> Option<&str> {
        [&self.url, &self.manifest_url, &self.fragment_base_url]
            .into_iter()
            .filter_map(|u| u.as_deref())
            .find(|u| u.starts_with("http"))
    }

    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref().map_or(false, |v| v != "none")
    }

    pub fn has_audio(&self) -> bool {
        self.acodec.as_deref().map_or(false, |a| a != "none")
    }

    /// Exact size when known, otherwise the estimate.
    pub fn effective_size(&self) -> Option<u64> {
        self.filesize.or(self.filesize_approx)
    }
}

/// Output of [`normalize`]
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFormats {
    pub video_info: VideoInfo,
    pub video_streams: Vec<VideoStream>,
    pub audio_streams: Vec<AudioStream>,
    pub total_video_streams: usize,
    pub total_audio_streams: usize,
}

/// Normalize a yt-dlp JSON document. `source_url` backs `webpage_url` when the
/// document has none.
pub fn normalize(json: &Value, source_url: &str) -> NormalizedFormats {
    let video_info = video_info(json, source_url);

    let mut raw: Vec<RawFormat> = json["formats"]
        .as_array()
        .map(|arr| arr.iter().map(RawFormat::from_json).collect())
        .unwrap_or_default();

    // Single-format pages put the stream fields on the top-level object
    if raw.is_empty() && json["url"].as_str().is_some() {
        raw.push(RawFormat::from_json(json));
    }

    let mut video_streams = Vec::new();
    let mut audio_streams = Vec::new();

    for fmt in &raw {
        let Some(url) = fmt.usable_url() else {
            continue;
        };

        let has_video = fmt.has_video();
        let has_audio = fmt.has_audio();

        if has_video {
            video_streams.push(video_stream(fmt, url, has_audio));
        }

        if has_audio && !has_video {
            audio_streams.push(audio_stream(fmt, url));
        }
    }

    let mut video_streams = dedup_video(video_streams);
    video_streams.sort_by(|a, b| b.height.cmp(&a.height).then(b.fps.total_cmp(&a.fps)));

    let mut audio_streams = dedup_audio(audio_streams);
    audio_streams.sort_by(|a, b| b.bitrate_kbps.total_cmp(&a.bitrate_kbps));

    let total_video_streams = video_streams.len();
    let total_audio_streams = audio_streams.len();
    video_streams.truncate(MAX_VIDEO_STREAMS);
    audio_streams.truncate(MAX_AUDIO_STREAMS);

    NormalizedFormats {
        video_info,
        video_streams,
        audio_streams,
        total_video_streams,
        total_audio_streams,
    }
}

fn video_info(json: &Value, source_url: &str) -> VideoInfo {
    VideoInfo {
        title: str_field(json, "title").unwrap_or_else(|| "Unknown".to_string()),
        duration: json["duration"].as_f64().unwrap_or(0.0),
        thumbnail: str_field(json, "thumbnail").unwrap_or_default(),
        uploader: str_field(json, "uploader")
            .or_else(|| str_field(json, "channel"))
            .unwrap_or_else(|| "Unknown".to_string()),
        upload_date: str_field(json, "upload_date").unwrap_or_default(),
        view_count: u64_field(json, "view_count").unwrap_or(0),
        like_count: u64_field(json, "like_count").unwrap_or(0),
        webpage_url: str_field(json, "webpage_url").unwrap_or_else(|| source_url.to_string()),
        extractor: str_field(json, "extractor").unwrap_or_else(|| "unknown".to_string()),
    }
}

fn video_stream(fmt: &RawFormat, url: &str, has_audio: bool) -> VideoStream {
    let size = fmt.effective_size();
    let height = fmt.height.unwrap_or(0);
    let fps = fmt.fps.unwrap_or(0.0);
    let vcodec = fmt.vcodec.clone().unwrap_or_default();

    VideoStream {
        format_id: fmt.format_id.clone().unwrap_or_else(|| "unknown".to_string()),
        url: url.to_string(),
        ext: fmt.ext.clone().unwrap_or_else(|| "unknown".to_string()),
        filesize: size,
        filesize_human: humanize_bytes(size),
        protocol: fmt.protocol.clone().unwrap_or_else(|| "https".to_string()),
        height,
        width: fmt.width.unwrap_or(0),
        fps,
        quality_label: video_quality_label(height, fps, fmt.format_note.as_deref(), &vcodec),
        video_codec: vcodec,
        // Callers only build video streams for formats with video
        is_adaptive: !has_audio,
    }
}

fn audio_stream(fmt: &RawFormat, url: &str) -> AudioStream {
    let size = fmt.effective_size();
    let acodec = fmt.acodec.clone().unwrap_or_default();
    let abr = fmt.abr.unwrap_or(0.0);

    AudioStream {
        format_id: fmt.format_id.clone().unwrap_or_else(|| "unknown".to_string()),
        url: url.to_string(),
        ext: fmt.ext.clone().unwrap_or_else(|| "unknown".to_string()),
        filesize: size,
        filesize_human: humanize_bytes(size),
        protocol: fmt.protocol.clone().unwrap_or_else(|| "https".to_string()),
        quality_label: audio_quality_label(&acodec, abr),
        audio_codec: acodec,
        bitrate_kbps: abr,
        sample_rate: fmt.asr.unwrap_or(0),
        is_adaptive: true,
    }
}

/// Label such as `1080p60fps (VP9)`.
pub fn video_quality_label(height: u32, fps: f64, format_note: Option<&str>, vcodec: &str) -> String {
    let mut label = match height {
        h if h >= 4320 => "8K".to_string(),
        h if h >= 2160 => "4K".to_string(),
        h if h >= 1440 => "1440p".to_string(),
        h if h >= 1080 => "1080p".to_string(),
        h if h >= 720 => "720p".to_string(),
        h if h >= 480 => "480p".to_string(),
        h if h >= 360 => "360p".to_string(),
        h if h >= 240 => "240p".to_string(),
        h if h >= 144 => "144p".to_string(),
        h => match format_note {
            Some(note) if !note.is_empty() => note.to_string(),
            _ => format!("{}p", h),
        },
    };

    // Covers 60fps as well
    if fps > 30.0 {
        label.push_str(&format!("{}fps", fps as u64));
    }

    if !vcodec.is_empty() && vcodec != "none" {
        let codec = vcodec.to_lowercase();
        if codec.contains("vp9") {
            label.push_str(" (VP9)");
        } else if codec.contains("avc") {
            label.push_str(" (H.264)");
        } else if codec.contains("av1") {
            label.push_str(" (AV1)");
        }
    }

    label
}

/// Label such as `Opus 160kbps`.
pub fn audio_quality_label(acodec: &str, abr: f64) -> String {
    let codec = acodec.to_lowercase();
    let name = if codec.contains("opus") {
        "Opus"
    } else if codec.contains("aac") {
        "AAC"
    } else if codec.contains("mp3") {
        "MP3"
    } else if codec.contains("flac") {
        "FLAC"
    } else if codec.contains("vorbis") {
        "Vorbis"
    } else {
        "Audio"
    };

    if abr != 0.0 {
        format!("{} {}kbps", name, abr as u64)
    } else {
        name.to_string()
    }
}

/// Binary-prefixed size with one decimal, `None` for absent or zero sizes.
pub fn humanize_bytes(bytes: Option<u64>) -> Option<String> {
    let bytes = bytes.filter(|b| *b > 0)?;
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return Some(format!("{:.1} {}", size, unit));
        }
        size /= 1024.0;
    }
    Some(format!("{:.1} TB", size))
}

fn dedup_video(streams: Vec<VideoStream>) -> Vec<VideoStream> {
    let mut seen = HashSet::new();
    streams
        .into_iter()
        .filter(|s| seen.insert((s.height, s.fps.to_bits(), s.video_codec.clone())))
        .collect()
}

fn dedup_audio(streams: Vec<AudioStream>) -> Vec<AudioStream> {
    let mut seen = HashSet::new();
    streams
        .into_iter()
        .filter(|s| seen.insert((s.bitrate_kbps.to_bits(), s.audio_codec.clone())))
        .collect()
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v[key].as_str().map(|s| s.to_string())
}

/// Integer field that yt-dlp sometimes emits as a float.
fn u64_field(v: &Value, key: &str) -> Option<u64> {
    let field = &v[key];
    field
        .as_u64()
        .or_else(|| field.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_video_format(id: &str, height: u32, fps: f64, vcodec: &str, acodec: &str) -> Value {
        json!({
            "format_id": id,
            "url": format!("https://cdn.example.com/{}", id),
            "ext": "mp4",
            "protocol": "https",
            "height": height,
            "width": height * 16 / 9,
            "fps": fps,
            "vcodec": vcodec,
            "acodec": acodec,
        })
    }

    fn make_audio_format(id: &str, abr: f64, acodec: &str) -> Value {
        json!({
            "format_id": id,
            "url": format!("https://cdn.example.com/{}", id),
            "ext": "m4a",
            "vcodec": "none",
            "acodec": acodec,
            "abr": abr,
            "asr": 44100,
        })
    }

    #[test]
    fn test_mux_and_adaptive_classification() {
        let doc = json!({
            "title": "clip",
            "formats": [
                make_video_format("22", 720, 30.0, "avc1.64001F", "mp4a.40.2"),
                make_video_format("248", 1080, 30.0, "vp9", "none"),
            ]
        });

        let out = normalize(&doc, "https://x");
        assert_eq!(out.video_streams.len(), 2);
        assert_eq!(out.video_streams[0].height, 1080);
        assert!(out.video_streams[0].is_adaptive);
        assert_eq!(out.video_streams[1].height, 720);
        assert!(!out.video_streams[1].is_adaptive);
        assert!(out.audio_streams.is_empty());
    }

    #[test]
    fn test_audio_only_stream() {
        let doc = json!({ "formats": [make_audio_format("140", 129.5, "mp4a.40.2")] });
        let out = normalize(&doc, "https://x");
        assert!(out.video_streams.is_empty());
        assert_eq!(out.audio_streams.len(), 1);
        let audio = &out.audio_streams[0];
        assert!(audio.is_adaptive);
        assert_eq!(audio.sample_rate, 44100);
        assert_eq!(audio.quality_label, "Audio 129kbps");
    }

    #[test]
    fn test_dedup_keeps_first_seen() {
        let doc = json!({
            "formats": [
                make_video_format("first", 480, 30.0, "avc1", "none"),
                make_video_format("second", 480, 30.0, "avc1", "none"),
            ]
        });
        let out = normalize(&doc, "https://x");
        assert_eq!(out.video_streams.len(), 1);
        assert_eq!(out.video_streams[0].format_id, "first");
        assert_eq!(out.total_video_streams, 1);
    }

    #[test]
    fn test_audio_dedup_by_bitrate_and_codec() {
        let doc = json!({
            "formats": [
                make_audio_format("a", 128.0, "opus"),
                make_audio_format("b", 128.0, "opus"),
                make_audio_format("c", 128.0, "mp4a.40.2"),
                make_audio_format("d", 160.0, "opus"),
            ]
        });
        let out = normalize(&doc, "https://x");
        let ids: Vec<&str> = out.audio_streams.iter().map(|a| a.format_id.as_str()).collect();
        assert_eq!(ids, vec!["d", "a", "c"]);
    }

    #[test]
    fn test_sort_by_height_then_fps() {
        let doc = json!({
            "formats": [
                make_video_format("a", 720, 30.0, "avc1", "none"),
                make_video_format("b", 1080, 30.0, "avc1", "none"),
                make_video_format("c", 720, 60.0, "avc1", "none"),
                make_video_format("d", 1080, 60.0, "vp9", "none"),
            ]
        });
        let out = normalize(&doc, "https://x");
        let ids: Vec<&str> = out.video_streams.iter().map(|v| v.format_id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_truncation_reports_totals() {
        let video: Vec<Value> = (0..25)
            .map(|i| make_video_format(&format!("v{}", i), 100 + i, 30.0, "avc1", "none"))
            .collect();
        let audio: Vec<Value> = (0..15)
            .map(|i| make_audio_format(&format!("a{}", i), 32.0 + i as f64, "opus"))
            .collect();
        let doc = json!({ "formats": video.into_iter().chain(audio).collect::<Vec<_>>() });

        let out = normalize(&doc, "https://x");
        assert_eq!(out.video_streams.len(), 20);
        assert_eq!(out.audio_streams.len(), 10);
        assert_eq!(out.total_video_streams, 25);
        assert_eq!(out.total_audio_streams, 15);
        assert_eq!(out.video_streams[0].height, 124);
        assert_eq!(out.audio_streams[0].bitrate_kbps, 46.0);
    }

    #[test]
    fn test_url_fallback_order() {
        let doc = json!({
            "formats": [
                { "format_id": "hls", "url": "", "manifest_url": "https://m/master.m3u8",
                  "vcodec": "avc1", "acodec": "mp4a", "height": 720 },
                { "format_id": "dash", "url": "rtmp://bad", "fragment_base_url": "http://frag/",
                  "vcodec": "vp9", "acodec": "none", "height": 1080 },
                { "format_id": "none", "url": "ftp://nope", "vcodec": "avc1", "height": 360 },
            ]
        });
        let out = normalize(&doc, "https://x");
        assert_eq!(out.video_streams.len(), 2);
        assert_eq!(out.video_streams[0].url, "http://frag/");
        assert_eq!(out.video_streams[1].url, "https://m/master.m3u8");
    }

    #[test]
    fn test_missing_codecs_are_dropped_from_both_lists() {
        let doc = json!({ "formats": [{ "format_id": "x", "url": "https://a" }] });
        let out = normalize(&doc, "https://x");
        assert!(out.video_streams.is_empty());
        assert!(out.audio_streams.is_empty());
    }

    #[test]
    fn test_single_format_document() {
        let doc = json!({
            "title": "direct",
            "url": "https://cdn/video.mp4",
            "ext": "mp4",
            "vcodec": "h264",
            "acodec": "aac",
            "height": 480,
        });
        let out = normalize(&doc, "https://page");
        assert_eq!(out.video_streams.len(), 1);
        assert_eq!(out.video_streams[0].url, "https://cdn/video.mp4");
        assert_eq!(out.video_info.webpage_url, "https://page");
    }

    #[test]
    fn test_video_info_defaults_and_uploader_fallback() {
        let doc = json!({ "channel": "Chan", "duration": 12.5, "view_count": 42 });
        let info = normalize(&doc, "https://page").video_info;
        assert_eq!(info.title, "Unknown");
        assert_eq!(info.uploader, "Chan");
        assert_eq!(info.duration, 12.5);
        assert_eq!(info.view_count, 42);
        assert_eq!(info.like_count, 0);
        assert_eq!(info.extractor, "unknown");
    }

    #[test]
    fn test_quality_labels() {
        assert_eq!(video_quality_label(2160, 60.0, None, "vp9"), "4K60fps (VP9)");
        assert_eq!(video_quality_label(4320, 30.0, None, "av1"), "8K (AV1)");
        assert_eq!(video_quality_label(1080, 29.97, None, "avc1.640028"), "1080p (H.264)");
        assert_eq!(video_quality_label(1440, 50.0, None, "AVC1"), "1440p50fps (H.264)");
        assert_eq!(video_quality_label(100, 0.0, Some("tiny"), "h264"), "tiny");
        assert_eq!(video_quality_label(0, 0.0, None, "h264"), "0p");
        assert_eq!(video_quality_label(0, 0.0, Some(""), "h264"), "0p");
    }

    #[test]
    fn test_audio_labels() {
        assert_eq!(audio_quality_label("opus", 160.0), "Opus 160kbps");
        assert_eq!(audio_quality_label("AAC", 0.0), "AAC");
        assert_eq!(audio_quality_label("mp3", 320.0), "MP3 320kbps");
        assert_eq!(audio_quality_label("flac", 0.0), "FLAC");
        assert_eq!(audio_quality_label("vorbis", 96.3), "Vorbis 96kbps");
        assert_eq!(audio_quality_label("ec-3", 384.0), "Audio 384kbps");
    }

    #[test]
    fn test_humanize_bytes() {
        assert_eq!(humanize_bytes(Some(1536)).as_deref(), Some("1.5 KB"));
        assert_eq!(humanize_bytes(Some(512)).as_deref(), Some("512.0 B"));
        assert_eq!(humanize_bytes(Some(5 * 1024 * 1024)).as_deref(), Some("5.0 MB"));
        assert_eq!(
            humanize_bytes(Some(3 * 1024 * 1024 * 1024 * 1024)).as_deref(),
            Some("3.0 TB")
        );
        assert_eq!(humanize_bytes(Some(0)), None);
        assert_eq!(humanize_bytes(None), None);
    }

    #[test]
    fn test_filesize_prefers_exact_then_approx() {
        let doc = json!({
            "formats": [
                { "format_id": "a", "url": "https://a", "vcodec": "avc1", "height": 720,
                  "filesize": null, "filesize_approx": 2048.0 },
            ]
        });
        let out = normalize(&doc, "https://x");
        assert_eq!(out.video_streams[0].filesize, Some(2048));
        assert_eq!(out.video_streams[0].filesize_human.as_deref(), Some("2.0 KB"));
    }

    #[test]
    fn test_out_of_range_dimensions_are_dropped() {
        let raw = RawFormat::from_json(&json!({
            "height": 5_000_000_000u64,
            "width": 4_294_967_296u64,
            "asr": 48000,
        }));
        assert_eq!(raw.height, None);
        assert_eq!(raw.width, None);
        assert_eq!(raw.asr, Some(48000));

        let max = RawFormat::from_json(&json!({ "height": u32::MAX }));
        assert_eq!(max.height, Some(u32::MAX));
    }
}
