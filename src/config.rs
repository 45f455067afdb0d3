use clap::Parser;

use crate::extractor::models::DEFAULT_TIMEOUT_SECONDS;

/// Runtime configuration, from flags or environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "stream-extractor", version, about)]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "EXTRACTOR_BIND", default_value = "0.0.0.0:8000")]
    pub bind: String,

    /// Path to the yt-dlp executable (skips discovery)
    #[arg(long = "yt-dlp", env = "EXTRACTOR_YTDLP_PATH")]
    pub ytdlp_path: Option<String>,

    /// Python interpreter used for the `-m yt_dlp` fallback
    #[arg(long, env = "YTDLP_PYTHON")]
    pub python: Option<String>,

    /// Timeout applied when a request does not specify one
    #[arg(long, env = "EXTRACTOR_DEFAULT_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub default_timeout: i64,

    /// Try `pip install yt-dlp` at startup when it cannot be found
    #[arg(long, env = "EXTRACTOR_AUTO_INSTALL", default_value_t = false)]
    pub auto_install: bool,
}
