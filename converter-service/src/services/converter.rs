use crate::config::ToolConfig;
use crate::services::executor::CommandExecutor;
use service_core::error::AppError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Output format version passed to dwg2dxf.
const TARGET_VERSION_FLAG: &str = "-v2000";
/// Answer yes to any tool prompt; conversions must never block on input.
const BATCH_FLAG: &str = "-y";

/// Wrapper around the external dwg2dxf binary.
#[derive(Clone)]
pub struct DwgConverter {
    binary: PathBuf,
    executor: CommandExecutor,
}

impl DwgConverter {
    pub fn new(config: &ToolConfig) -> Self {
        Self {
            binary: PathBuf::from(&config.binary_path),
            executor: CommandExecutor::new(config.command_timeout()),
        }
    }

    /// Fail-fast startup check: the converter binary must exist before the
    /// service accepts traffic, otherwise every request would fail the same
    /// way.
    pub async fn preflight(&self) -> Result<(), AppError> {
        let metadata = tokio::fs::metadata(&self.binary).await.map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Converter binary {} not found: {}",
                self.binary.display(),
                e
            ))
        })?;

        if !metadata.is_file() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Converter binary {} is not a regular file",
                self.binary.display()
            )));
        }

        tracing::info!(binary = %self.binary.display(), "Converter preflight passed");
        Ok(())
    }

    /// Convert `input` to DXF at `output`.
    ///
    /// A non-zero exit reports the tool's combined stdout+stderr. The exit
    /// code alone is not trusted: a zero exit without an output file is a
    /// distinct anomaly.
    pub async fn convert(&self, input: &Path, output: &Path) -> Result<(), AppError> {
        let result = self
            .executor
            .execute(
                &self.binary,
                &[
                    input.as_os_str(),
                    OsStr::new(TARGET_VERSION_FLAG),
                    OsStr::new(BATCH_FLAG),
                    output.as_os_str(),
                ],
            )
            .await?;

        if !result.status.success() {
            let combined = combined_output(&result.stdout, &result.stderr);
            tracing::error!(
                input = %input.display(),
                exit_status = %result.status,
                output = %combined,
                "Conversion failed"
            );
            return Err(AppError::InternalError(anyhow::anyhow!(
                "Conversion failed ({}): {}",
                result.status,
                combined
            )));
        }

        if tokio::fs::metadata(output).await.is_err() {
            tracing::error!(
                input = %input.display(),
                expected_output = %output.display(),
                "Converter exited successfully but produced no output file"
            );
            return Err(AppError::InternalError(anyhow::anyhow!(
                "Conversion failed: converter exited successfully but the output file was not created"
            )));
        }

        Ok(())
    }
}

fn combined_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = String::from_utf8_lossy(stdout).into_owned();
    if !stderr.is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&String::from_utf8_lossy(stderr));
    }
    combined.trim_end().to_string()
}
