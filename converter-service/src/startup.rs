use crate::config::ConverterConfig;
use crate::handlers;
use crate::services::DwgConverter;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use service_core::error::AppError;
use std::future::IntoFuture;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: ConverterConfig,
    pub converter: DwgConverter,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: ConverterConfig) -> Result<Self, AppError> {
        let converter = DwgConverter::new(&config.converter);

        // Fail fast before binding the listener: a missing converter binary
        // would fail every request identically.
        converter.preflight().await.map_err(|e| {
            tracing::error!("Converter preflight failed: {}", e);
            e
        })?;

        let state = AppState {
            config: config.clone(),
            converter,
        };

        let app = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/metrics", get(handlers::metrics_endpoint))
            .route("/convert", post(handlers::convert_drawing))
            // Uploads are streamed to the staging file, not buffered, so no
            // body-size ceiling applies; large drawings spill to disk.
            .layer(DefaultBodyLimit::disable())
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
