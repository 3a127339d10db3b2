use service_core::error::AppError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Request-scoped staging directory for one conversion.
///
/// Holds the uploaded input file and the converter's output file. The
/// directory is uniquely named, never shared across requests, and removed
/// recursively when this guard drops — on every exit path.
pub struct Staging {
    dir: TempDir,
    input_path: PathBuf,
    output_path: PathBuf,
}

impl Staging {
    pub fn create(safe_filename: &str) -> Result<Self, AppError> {
        let dir = tempfile::Builder::new()
            .prefix("dwg2dxf-")
            .tempdir()
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!(
                    "Failed to create staging directory: {}",
                    e
                ))
            })?;

        let input_path = dir.path().join(safe_filename);
        let output_path = input_path.with_extension("dxf");

        Ok(Self {
            dir,
            input_path,
            output_path,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}
