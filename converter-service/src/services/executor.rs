use service_core::error::AppError;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Runs an external command with piped stdout/stderr and a hard deadline.
///
/// Returns the raw `Output` whatever the exit status; interpreting a
/// non-zero exit is the caller's job, since callers need the captured
/// output for diagnostics either way.
#[derive(Clone)]
pub struct CommandExecutor {
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn execute(&self, program: &Path, args: &[&OsStr]) -> Result<Output, AppError> {
        let mut cmd = Command::new(program);
        cmd.args(args);

        cmd.stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());
        cmd.kill_on_drop(true);

        tracing::debug!(
            program = %program.display(),
            args = ?args,
            timeout_secs = %self.timeout.as_secs(),
            "Executing command"
        );

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                AppError::InternalError(anyhow::anyhow!(
                    "Command {} timed out after {} seconds",
                    program.display(),
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!(
                    "Failed to run {}: {}",
                    program.display(),
                    e
                ))
            })?;

        tracing::debug!(
            program = %program.display(),
            exit_status = %output.status,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "Command finished"
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_stderr() {
        let executor = CommandExecutor::new(Duration::from_secs(5));
        let output = executor
            .execute(
                Path::new("/bin/sh"),
                &[
                    OsStr::new("-c"),
                    OsStr::new("echo out; echo err >&2; exit 3"),
                ],
            )
            .await
            .expect("command should run");

        assert_eq!(output.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "out");
        assert_eq!(String::from_utf8_lossy(&output.stderr).trim(), "err");
    }

    #[tokio::test]
    async fn enforces_timeout() {
        let executor = CommandExecutor::new(Duration::from_millis(100));
        let err = executor
            .execute(Path::new("/bin/sh"), &[OsStr::new("-c"), OsStr::new("sleep 5")])
            .await
            .expect_err("command should time out");

        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let executor = CommandExecutor::new(Duration::from_secs(1));
        let result = executor
            .execute(Path::new("/nonexistent/not-a-binary"), &[])
            .await;

        assert!(result.is_err());
    }
}
