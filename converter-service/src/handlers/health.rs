use axum::{http::StatusCode, response::IntoResponse};

/// Liveness probe. Responds unconditionally; deliberately does not
/// re-check the converter binary, which is verified once at startup.
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
