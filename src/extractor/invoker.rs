// Extraction invoker - runs yt-dlp through the attempt cascade
//
// Attempts are strictly sequential; the first one whose stdout starts with a
// JSON line wins and nothing after it runs. Only a timeout on the very first
// attempt aborts the call, every later failure falls through to the next
// profile.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::diagnostics::{diagnose_error, requires_sign_in};
use super::errors::{ExtractError, RunError, BOT_DETECTION_EXHAUSTED, NO_OUTPUT};
use super::process::ProcessRunner;
use super::profiles::{AttemptProfile, Launcher};
use super::tools::ExtractorTool;

/// Result of one attempt
#[derive(Debug)]
enum AttemptOutcome {
    Parsed(Value),
    /// Process ran but stdout had no parseable first line
    NoResult { stderr: String },
    TimedOut(RunError),
    /// Spawn or pipe failure
    Failed(RunError),
}

/// Failure bookkeeping across a cascade
#[derive(Debug, Default)]
struct CascadeLog {
    last_stderr: Option<String>,
    last_failure: Option<String>,
}

impl CascadeLog {
    fn record(&mut self, outcome: AttemptOutcome) {
        match outcome {
            AttemptOutcome::NoResult { stderr } => {
                let stderr = stderr.trim();
                if !stderr.is_empty() {
                    self.last_stderr = Some(stderr.to_string());
                }
            }
            AttemptOutcome::TimedOut(e) | AttemptOutcome::Failed(e) => {
                self.last_failure = Some(e.to_string());
            }
            AttemptOutcome::Parsed(_) => {}
        }
    }

    fn diagnostic(&self) -> &str {
        self.last_stderr
            .as_deref()
            .or(self.last_failure.as_deref())
            .unwrap_or(NO_OUTPUT)
    }
}

pub struct Invoker {
    tool: ExtractorTool,
    runner: Arc<dyn ProcessRunner>,
}

impl Invoker {
    pub fn new(tool: ExtractorTool, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { tool, runner }
    }

    pub fn tool(&self) -> &ExtractorTool {
        &self.tool
    }

    pub fn runner(&self) -> &dyn ProcessRunner {
        self.runner.as_ref()
    }

    /// Run the cascade for an already normalized URL and return the first
    /// JSON document yt-dlp printed.
    pub async fn invoke(&self, url: &str, timeout_secs: u64) -> Result<Value, ExtractError> {
        let mut log = CascadeLog::default();

        for (index, profile) in AttemptProfile::cascade(url).iter().enumerate() {
            match self.attempt(profile, url, timeout_secs).await {
                AttemptOutcome::Parsed(json) => {
                    info!(profile = profile.name, "extraction attempt succeeded");
                    return Ok(json);
                }
                AttemptOutcome::TimedOut(_) if index == 0 => {
                    warn!(profile = profile.name, timeout_secs, "first attempt timed out");
                    return Err(ExtractError::Timeout {
                        seconds: timeout_secs,
                    });
                }
                outcome => log.record(outcome),
            }
        }

        let diagnostic = log.diagnostic();
        if requires_sign_in(diagnostic) {
            warn!("YouTube bot detection triggered, trying fallback clients");
            return self.invoke_bot_fallback(url, timeout_secs).await;
        }

        warn!(
            reason = diagnose_error(diagnostic).map(|r| r.description()),
            "all extraction attempts failed"
        );
        Err(ExtractError::exhausted(diagnostic))
    }

    async fn invoke_bot_fallback(
        &self,
        url: &str,
        timeout_secs: u64,
    ) -> Result<Value, ExtractError> {
        for profile in AttemptProfile::bot_detection_cascade() {
            if let AttemptOutcome::Parsed(json) = self.attempt(&profile, url, timeout_secs).await {
                info!(profile = profile.name, "fallback client succeeded");
                return Ok(json);
            }
        }
        Err(ExtractError::exhausted(BOT_DETECTION_EXHAUSTED))
    }

    async fn attempt(&self, profile: &AttemptProfile, url: &str, timeout_secs: u64) -> AttemptOutcome {
        let (program, args) = match profile.launcher {
            Launcher::Binary => (self.tool.binary.as_str(), profile.command_args(url)),
            Launcher::PythonModule => {
                let mut args = vec!["-m".to_string(), "yt_dlp".to_string()];
                args.extend(profile.command_args(url));
                (self.tool.python.as_str(), args)
            }
        };

        info!(profile = profile.name, program, "running extraction attempt");

        match self.runner.run(program, &args, timeout_secs).await {
            Ok(output) => match parse_first_line(&output.stdout) {
                Some(json) => AttemptOutcome::Parsed(json),
                None => {
                    debug!(
                        profile = profile.name,
                        stderr = %output.stderr.trim(),
                        "attempt produced no JSON"
                    );
                    AttemptOutcome::NoResult {
                        stderr: output.stderr,
                    }
                }
            },
            Err(e @ RunError::TimedOut(_)) => {
                debug!(profile = profile.name, error = %e, "attempt timed out");
                AttemptOutcome::TimedOut(e)
            }
            Err(e) => {
                debug!(profile = profile.name, error = %e, "attempt failed to run");
                AttemptOutcome::Failed(e)
            }
        }
    }
}

/// yt-dlp may print several JSON documents or interleaved noise; only the
/// first line counts.
fn parse_first_line(stdout: &str) -> Option<Value> {
    let first_line = stdout.trim().lines().next()?;
    serde_json::from_str(first_line).ok()
}
