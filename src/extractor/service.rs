// Extraction service - URL normalizer, invoker and format normalizer glued
// into a single call that always returns an envelope.

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{error, info};

use super::errors::ExtractError;
use super::formats;
use super::invoker::Invoker;
use super::models::ExtractionResult;
use super::url;

pub struct ExtractionService {
    invoker: Invoker,
}

impl ExtractionService {
    pub fn new(invoker: Invoker) -> Self {
        Self { invoker }
    }

    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    /// Extract stream listings for `raw_url`. Failures are reported inside
    /// the returned envelope, never as an error.
    pub async fn extract(&self, raw_url: &str, timeout_secs: i64) -> ExtractionResult {
        info!(url = %preview(raw_url), "extracting");

        match self.try_extract(raw_url, timeout_secs).await {
            Ok(result) => {
                info!(
                    video = result.total_video_streams,
                    audio = result.total_audio_streams,
                    "extraction succeeded"
                );
                result
            }
            Err(e) => {
                error!(error = %e, "extraction failed");
                ExtractionResult::failure(e.to_string(), now_rfc3339())
            }
        }
    }

    async fn try_extract(
        &self,
        raw_url: &str,
        timeout_secs: i64,
    ) -> Result<ExtractionResult, ExtractError> {
        if timeout_secs <= 0 {
            return Err(ExtractError::InvalidTimeout(timeout_secs));
        }

        let url = url::normalize(raw_url);
        if url.is_empty() {
            return Err(ExtractError::InvalidUrl(raw_url.to_string()));
        }

        let json = self.invoker.invoke(&url, timeout_secs as u64).await?;
        let normalized = formats::normalize(&json, &url);

        Ok(ExtractionResult {
            success: true,
            video_info: Some(normalized.video_info),
            video_streams: normalized.video_streams,
            audio_streams: normalized.audio_streams,
            total_video_streams: normalized.total_video_streams,
            total_audio_streams: normalized.total_audio_streams,
            error_message: None,
            extraction_timestamp: now_rfc3339(),
        })
    }
}

/// Current UTC time as RFC 3339.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::UNIX_EPOCH.to_string())
}

fn preview(url: &str) -> String {
    url.chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::errors::RunError;
    use crate::extractor::invoker::tests::{stderr, stdout, ScriptedRunner};
    use crate::extractor::tools::ExtractorTool;
    use std::sync::Arc;

    fn service(runner: Arc<ScriptedRunner>) -> ExtractionService {
        ExtractionService::new(Invoker::new(
            ExtractorTool::new("yt-dlp", "python3"),
            runner,
        ))
    }

    const DOC: &str = r#"{"title":"Clip","extractor":"youtube","formats":[
        {"format_id":"22","url":"https://cdn/22","vcodec":"avc1","acodec":"mp4a.40.2","height":720,"fps":30},
        {"format_id":"251","url":"https://cdn/251","vcodec":"none","acodec":"opus","abr":160}
    ]}"#;

    #[tokio::test]
    async fn test_success_envelope() {
        let runner = ScriptedRunner::new(vec![stdout(&DOC.replace('\n', ""))]);
        let result = service(runner.clone())
            .extract("https://youtu.be/abc?si=track", 30)
            .await;

        assert!(result.success);
        assert!(result.error_message.is_none());
        let info = result.video_info.unwrap();
        assert_eq!(info.title, "Clip");
        assert_eq!(info.webpage_url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(result.total_video_streams, 1);
        assert_eq!(result.total_audio_streams, 1);
        assert_eq!(result.audio_streams[0].quality_label, "Opus 160kbps");
        assert!(OffsetDateTime::parse(&result.extraction_timestamp, &Rfc3339).is_ok());

        // Invoker saw the normalized URL
        let (_, args) = runner.call(0);
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/watch?v=abc");
    }

    #[tokio::test]
    async fn test_timeout_becomes_failure_envelope() {
        let runner = ScriptedRunner::new(vec![Err(RunError::TimedOut(5))]);
        let result = service(runner).extract("https://vimeo.com/1", 5).await;
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("Timeout after 5 seconds"));
        assert!(result.video_info.is_none());
        assert!(result.video_streams.is_empty());
        assert!(!result.extraction_timestamp.is_empty());
    }

    #[tokio::test]
    async fn test_exhaustion_becomes_failure_envelope() {
        let runner = ScriptedRunner::new(vec![
            stderr("ERROR: Unsupported URL"),
            stderr("ERROR: Unsupported URL"),
            stderr("ERROR: Unsupported URL"),
        ]);
        let result = service(runner).extract("example.com/page", 30).await;
        assert!(!result.success);
        assert_eq!(
            result.error_message.as_deref(),
            Some("yt-dlp failed: ERROR: Unsupported URL")
        );
    }

    #[tokio::test]
    async fn test_invalid_input_spawns_nothing() {
        let runner = ScriptedRunner::new(vec![]);
        let svc = service(runner.clone());

        let result = svc.extract("  \"\" ", 30).await;
        assert!(!result.success);

        let result = svc.extract("https://vimeo.com/1", 0).await;
        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("timeout"));

        assert_eq!(runner.call_count(), 0);
    }
}
