use crate::services::Staging;
use crate::startup::AppState;
use axum::{
    body::Body,
    extract::{Multipart, State, multipart::Field},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use service_core::error::AppError;
use std::path::Path;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

/// The only accepted upload extension, compared case-insensitively.
const SOURCE_EXTENSION: &str = "dwg";
const TARGET_EXTENSION: &str = "dxf";
const TARGET_CONTENT_TYPE: &str = "application/dxf";

/// Convert one uploaded DWG file and return the DXF in the same response.
///
/// The whole lifecycle is request-scoped: parse upload, stage the bytes in
/// a fresh temp directory, run the external converter, stream the result
/// back. The staging directory is removed on every exit path.
pub async fn convert_drawing(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let start = Instant::now();
    metrics::counter!("conversion_requests_total").increment(1);

    // The field-finding loop lives here rather than in `validate_upload`:
    // a `Field` borrowed from the multipart cannot be returned out of a
    // loop across a function boundary under current borrow-check rules.
    let field = loop {
        match multipart.next_field().await {
            Err(e) => {
                metrics::counter!("conversion_rejected_total").increment(1);
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Unable to parse form: {}",
                    e
                )));
            }
            Ok(Some(field)) if field.name() == Some("file") => break field,
            Ok(Some(_)) => continue,
            Ok(None) => {
                metrics::counter!("conversion_rejected_total").increment(1);
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "No `file` field in form"
                )));
            }
        }
    };

    let (original_name, safe_name) = match validate_upload(&field) {
        Ok(upload) => upload,
        Err(e) => {
            metrics::counter!("conversion_rejected_total").increment(1);
            return Err(e);
        }
    };

    let response = run_conversion(&state, field, &original_name, &safe_name)
        .await
        .map_err(|e| {
            metrics::counter!("conversion_failed_total").increment(1);
            e
        })?;

    metrics::counter!("conversion_success_total").increment(1);
    metrics::histogram!("conversion_duration_seconds").record(start.elapsed().as_secs_f64());

    tracing::info!(
        filename = %original_name,
        duration_ms = start.elapsed().as_millis(),
        "Conversion completed"
    );

    Ok(response)
}

/// Gate the `file` field on the expected extension. Anything wrong here is
/// the caller's fault, so every failure is a 400 — and nothing has touched
/// the filesystem yet.
fn validate_upload(field: &Field<'_>) -> Result<(String, String), AppError> {
    let original_name = field
        .file_name()
        .map(|name| name.to_string())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("The `file` field has no filename")))?;

    let extension = Path::new(&original_name)
        .extension()
        .and_then(|ext| ext.to_str());
    if !extension.is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION)) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "File must be a .{} file",
            SOURCE_EXTENSION
        )));
    }

    let safe_name = sanitize_filename(&original_name);
    Ok((original_name, safe_name))
}

/// Stage the upload, run the converter, and build the streamed response.
async fn run_conversion(
    state: &AppState,
    field: Field<'_>,
    original_name: &str,
    safe_name: &str,
) -> Result<Response, AppError> {
    let staging = Staging::create(safe_name)?;
    let size = stage_upload(field, staging.input_path()).await?;

    tracing::info!(
        filename = %original_name,
        size,
        staging_dir = %staging.path().display(),
        "Conversion started"
    );

    state
        .converter
        .convert(staging.input_path(), staging.output_path())
        .await?;

    let output_file = tokio::fs::File::open(staging.output_path())
        .await
        .map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to open converted file: {}", e))
        })?;

    // The staging directory is unlinked here; the open handle keeps the
    // converted bytes readable while they stream out to the client.
    drop(staging);

    let download_name = Path::new(safe_name)
        .with_extension(TARGET_EXTENSION)
        .to_string_lossy()
        .into_owned();

    let body = Body::from_stream(ReaderStream::new(output_file));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, TARGET_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", download_name),
            ),
        ],
        body,
    )
        .into_response())
}

/// Copy the upload into the staging file chunk by chunk, so large drawings
/// spill to disk instead of being buffered whole in memory or rejected.
async fn stage_upload(mut field: Field<'_>, path: &Path) -> Result<u64, AppError> {
    let mut file = tokio::fs::File::create(path).await.map_err(|e| {
        AppError::InternalError(anyhow::anyhow!("Failed to create staging file: {}", e))
    })?;

    let mut written: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Unable to read file from form: {}", e))
    })? {
        file.write_all(&chunk).await.map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to stage uploaded file: {}", e))
        })?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| {
        AppError::InternalError(anyhow::anyhow!("Failed to stage uploaded file: {}", e))
    })?;

    Ok(written)
}

/// Replace path separators and spaces so the uploaded name is safe to use
/// inside the staging directory and in the download filename.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ' ' => '_',
            _ => c,
        })
        .collect()
}
