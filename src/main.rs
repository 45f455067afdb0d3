use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stream_extractor::extractor::{ExtractionService, ExtractorTool, Invoker, TokioProcessRunner};
use stream_extractor::{router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    if config.default_timeout <= 0 {
        anyhow::bail!("--default-timeout must be greater than zero");
    }

    // Discovery may shell out to `which`/pip, keep it off the async workers
    let tool = {
        let (ytdlp, python, auto_install) = (
            config.ytdlp_path.clone(),
            config.python.clone(),
            config.auto_install,
        );
        tokio::task::spawn_blocking(move || ExtractorTool::resolve(ytdlp, python, auto_install))
            .await
            .context("tool discovery task failed")?
    };

    let invoker = Invoker::new(tool, Arc::new(TokioProcessRunner));
    let state = AppState::new(ExtractionService::new(invoker), config.default_timeout);
    let app = router(state);

    let addr: SocketAddr = config
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {:?}", config.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
