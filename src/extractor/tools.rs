// Extractor tool discovery
//
// Resolved once at startup and injected into the invoker; nothing here is
// consulted per request except the version check behind the health check.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::process::ProcessRunner;

const BINARY_NAME: &str = "yt-dlp";
const VERSION_CHECK_TIMEOUT_SECS: u64 = 5;
const INSTALL_TIMEOUT: Duration = Duration::from_secs(60);
const INSTALL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Resolved locations of the extractor and the interpreter used for the
/// module fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorTool {
    pub binary: String,
    pub python: String,
}

impl ExtractorTool {
    pub fn new(binary: impl Into<String>, python: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            python: python.into(),
        }
    }

    /// Locate yt-dlp and a Python interpreter.
    ///
    /// `auto_install` allows one `pip install --upgrade yt-dlp` when the binary
    /// cannot be found anywhere.
    pub fn resolve(
        binary_override: Option<String>,
        python_override: Option<String>,
        auto_install: bool,
    ) -> Self {
        let python = python_override.unwrap_or_else(find_python);

        let binary = match binary_override {
            Some(path) => path,
            None => find_ytdlp()
                .or_else(|| {
                    if auto_install {
                        install_ytdlp(&python);
                        find_ytdlp()
                    } else {
                        None
                    }
                })
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|| {
                    warn!("yt-dlp not found; falling back to bare command name");
                    BINARY_NAME.to_string()
                }),
        };

        info!(binary = %binary, python = %python, "resolved extractor tool");
        Self { binary, python }
    }

    /// `yt-dlp --version`, or `None` when the tool does not answer.
    pub async fn version(&self, runner: &dyn ProcessRunner) -> Option<String> {
        match runner
            .run(&self.binary, &["--version".to_string()], VERSION_CHECK_TIMEOUT_SECS)
            .await
        {
            Ok(out) if out.success => {
                let version = out.stdout.trim();
                (!version.is_empty()).then(|| version.to_string())
            }
            _ => None,
        }
    }
}

fn find_ytdlp() -> Option<PathBuf> {
    // 1. PATH
    if let Some(path) = which(BINARY_NAME) {
        return Some(path);
    }

    // 2. Common install locations
    let mut candidates = vec![
        PathBuf::from("/usr/local/bin/yt-dlp"),
        PathBuf::from("/usr/bin/yt-dlp"),
        PathBuf::from("/opt/homebrew/bin/yt-dlp"),
    ];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".local/bin/yt-dlp"));
        candidates.push(home.join("bin/yt-dlp"));
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(BINARY_NAME));
    }

    candidates.into_iter().find(|p| p.is_file())
}

fn which(name: &str) -> Option<PathBuf> {
    let output = Command::new("which").arg(name).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if path.is_empty() || !Path::new(&path).exists() {
        return None;
    }
    Some(PathBuf::from(path))
}

fn find_python() -> String {
    for cmd in ["python3", "python"] {
        if let Ok(output) = Command::new(cmd).arg("--version").output() {
            if output.status.success() {
                return cmd.to_string();
            }
        }
    }
    "python3".to_string()
}

fn install_ytdlp(python: &str) {
    warn!("yt-dlp not found, attempting pip install");
    // Output is discarded so a chatty pip cannot block on a full pipe
    let child = Command::new(python)
        .args(["-m", "pip", "install", "--quiet", "--upgrade", "yt-dlp"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    match child {
        Ok(child) => match wait_with_deadline(child, INSTALL_TIMEOUT) {
            Ok(Some(status)) if status.success() => info!("installed yt-dlp via pip"),
            Ok(Some(status)) => warn!(%status, "pip install of yt-dlp failed"),
            Ok(None) => warn!(
                timeout_secs = INSTALL_TIMEOUT.as_secs(),
                "pip install of yt-dlp timed out"
            ),
            Err(e) => warn!(error = %e, "could not wait for pip"),
        },
        Err(e) => warn!(error = %e, "could not run pip"),
    }
}

/// Polls `child` until it exits or `limit` elapses. On expiry the child is
/// killed and reaped and `None` is returned.
fn wait_with_deadline(mut child: Child, limit: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        std::thread::sleep(INSTALL_POLL_INTERVAL);
    }
}
