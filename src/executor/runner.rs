use crate::error::OuttakeError;
use crate::executor::ExecutionConfig;
use crate::models::outcome::SENTINEL_RETURN_CODE;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

/// Captured result of one subprocess run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub return_code: i32,
    pub timed_out: bool,
}

/// Launches a script as `[interpreter, script_path, *args]` in the
/// workspace directory, capturing both streams as text. The wall-clock
/// timeout is enforced with a hard kill; there is no cooperative
/// cancellation.
pub struct ScriptRunner {
    config: ExecutionConfig,
}

impl ScriptRunner {
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    pub async fn execute(&self) -> Result<RunOutput, OuttakeError> {
        let mut command = Command::new(&self.config.interpreter);
        command
            .arg(&self.config.script_path)
            .args(&self.config.args)
            .current_dir(&self.config.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|_| OuttakeError::InterpreterNotFound {
            command: self.config.interpreter.clone(),
        })?;

        // Drain both pipes concurrently with the wait so a chatty script
        // cannot deadlock on a full pipe buffer.
        let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
        let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

        let deadline = Duration::from_secs(self.config.timeout_seconds);
        let status = match timeout(deadline, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => return Err(OuttakeError::ExecutionFailed(e.to_string())),
            Err(_) => {
                // Deadline hit: kill, reap, and report whatever the script
                // managed to write before dying.
                let _ = child.start_kill();
                let _ = child.wait().await;
                let stdout = stdout_task.await.unwrap_or_default();
                let stderr = stderr_task.await.unwrap_or_default();
                debug!(timeout = self.config.timeout_seconds, "script run timed out");
                return Ok(RunOutput {
                    stdout,
                    stderr,
                    return_code: SENTINEL_RETURN_CODE,
                    timed_out: true,
                });
            }
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();
        let return_code = status.code().unwrap_or(SENTINEL_RETURN_CODE);
        debug!(return_code, "script run completed");

        Ok(RunOutput {
            stdout,
            stderr,
            return_code,
            timed_out: false,
        })
    }
}

async fn read_stream<R: AsyncRead + Unpin>(stream: Option<R>) -> String {
    let Some(mut stream) = stream else {
        return String::new();
    };
    let mut buffer = Vec::new();
    let _ = stream.read_to_end(&mut buffer).await;
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_missing_interpreter_maps_to_not_found() {
        let config = ExecutionConfig::new(PathBuf::from("demo.py"), PathBuf::from("."))
            .with_interpreter("/nonexistent/interpreter");
        let runner = ScriptRunner::new(config);

        let result = runner.execute().await;
        assert!(matches!(
            result,
            Err(OuttakeError::InterpreterNotFound { .. })
        ));
    }
}
