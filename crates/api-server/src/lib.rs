//! REST API for the video-to-article service
//!
//! Accepts a video by upload or URL, runs it through the conversion
//! pipeline on a background task, and serves job status and results.

mod fetcher;
mod handlers;
mod types;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use video_article_orchestrator::Pipeline;

pub use fetcher::{validate_video_url, YtDlpFetcher};
pub use handlers::*;
pub use types::*;

/// Default cap on uploaded video size (500 MB)
pub const DEFAULT_MAX_VIDEO_SIZE: u64 = 500 * 1024 * 1024;

/// Boundary configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub addr: String,
    /// Where accepted uploads are persisted
    pub upload_dir: PathBuf,
    /// Upload size cap in bytes
    pub max_video_size: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            upload_dir: PathBuf::from("uploads"),
            max_video_size: DEFAULT_MAX_VIDEO_SIZE,
        }
    }
}

impl ServerConfig {
    /// Build the configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            addr: std::env::var("API_SERVER_ADDR").unwrap_or(defaults.addr),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_video_size: std::env::var("MAX_VIDEO_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_video_size),
        }
    }
}

/// API server state shared across handlers
#[derive(Clone)]
pub struct ApiState {
    /// The conversion pipeline, shared with every spawned job
    pub pipeline: Arc<Pipeline>,
    /// Boundary configuration
    pub config: Arc<ServerConfig>,
}

impl ApiState {
    #[must_use]
    pub fn new(pipeline: Arc<Pipeline>, config: ServerConfig) -> Self {
        Self {
            pipeline,
            config: Arc::new(config),
        }
    }
}

/// Build the API router with all endpoints
pub fn build_router(state: ApiState) -> Router {
    // Leave headroom over the video cap for multipart framing
    let body_limit = usize::try_from(state.config.max_video_size)
        .unwrap_or(usize::MAX)
        .saturating_add(1024 * 1024);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Job submission
        .route("/api/upload", post(upload_video))
        .route("/api/upload-url", post(submit_url))
        // Status and result endpoints
        .route("/api/jobs/{job_id}/status", get(get_job_status))
        .route("/api/jobs/{job_id}/result", get(get_job_result))
        .route("/api/jobs/{job_id}/download/{format}", get(download_export))
        .route("/api/jobs/{job_id}", delete(delete_job))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server
pub async fn start_server(state: ApiState) -> Result<(), std::io::Error> {
    std::fs::create_dir_all(&state.config.upload_dir)?;

    let addr = state.config.addr.clone();
    tracing::info!("Starting API server on {}", addr);

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.addr, "0.0.0.0:8080");
        assert_eq!(config.max_video_size, 500 * 1024 * 1024);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
    }
}
