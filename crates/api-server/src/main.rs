//! API Server Binary Entry Point

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use video_article_ai::AnthropicClient;
use video_article_api_server::{start_server, ApiState, ServerConfig, YtDlpFetcher};
use video_article_media::FfmpegMedia;
use video_article_orchestrator::{JobRegistry, Pipeline, PipelineConfig};
use video_article_transcription::{TranscriptionConfig, WhisperCli};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "video_article_api_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let server_config = ServerConfig::from_env();
    let pipeline_config = PipelineConfig::from_env();

    let ai_client = Arc::new(AnthropicClient::from_env()?);
    let pipeline = Pipeline::new(
        Arc::new(FfmpegMedia::new()),
        Arc::new(WhisperCli::new(TranscriptionConfig::from_env())),
        ai_client.clone(),
        ai_client,
        Arc::new(YtDlpFetcher::from_env()),
        JobRegistry::new(),
        pipeline_config,
    );

    let state = ApiState::new(Arc::new(pipeline), server_config);

    tracing::info!("Starting video-to-article API server");
    start_server(state).await?;

    Ok(())
}
