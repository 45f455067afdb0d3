// Subprocess execution with a wall-clock bound

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::errors::RunError;

/// Captured result of a finished process, decoded lossily as UTF-8.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs an external program. The seam the invoker is tested through.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout_secs: u64,
    ) -> Result<ProcessOutput, RunError>;
}

/// Runner backed by `tokio::process`. Kills the child when the timeout fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout_secs: u64,
    ) -> Result<ProcessOutput, RunError> {
        let mut child = TokioCommand::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RunError::Spawn {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        let mut stdout_pipe = child
            .stdout
            .take()
            .ok_or_else(|| RunError::Io(format!("Failed to capture stdout from {}", program)))?;
        let mut stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| RunError::Io(format!("Failed to capture stderr from {}", program)))?;

        let mut stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
        });
        let mut stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
        });

        // The pipes stay open while any descendant holds them, so the reads
        // share the deadline with the wait.
        let collected = timeout(Duration::from_secs(timeout_secs), async {
            let status = child
                .wait()
                .await
                .map_err(|e| RunError::Io(format!("Failed to wait for {}: {}", program, e)))?;
            let stdout = join_pipe(&mut stdout_task, "stdout").await?;
            let stderr = join_pipe(&mut stderr_task, "stderr").await?;
            Ok::<_, RunError>((status, stdout, stderr))
        })
        .await;

        match collected {
            Ok(res) => {
                let (status, stdout, stderr) = res?;
                Ok(ProcessOutput {
                    success: status.success(),
                    stdout: String::from_utf8_lossy(&stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                })
            }
            Err(_) => {
                debug!(program, timeout_secs, "killing timed out process");
                let _ = child.kill().await;
                stdout_task.abort();
                stderr_task.abort();
                Err(RunError::TimedOut(timeout_secs))
            }
        }
    }
}

async fn join_pipe(
    task: &mut tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
    name: &str,
) -> Result<Vec<u8>, RunError> {
    task.await
        .map_err(|e| RunError::Io(format!("{} task failed: {}", name, e)))?
        .map_err(|e| RunError::Io(format!("Failed to read {}: {}", name, e)))
}
