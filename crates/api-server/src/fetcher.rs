//! Remote video acquisition via yt-dlp

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;
use video_article_common::{PipelineError, Result, SourceFetcher};

/// Hosts accepted for remote submissions
const ALLOWED_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "youtu.be",
];

/// Fetches remote videos by shelling out to yt-dlp
#[derive(Debug, Default)]
pub struct YtDlpFetcher {
    binary: Option<String>,
}

impl YtDlpFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the binary override from `YT_DLP_BIN`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            binary: std::env::var("YT_DLP_BIN").ok(),
        }
    }

    fn binary(&self) -> &str {
        self.binary.as_deref().unwrap_or("yt-dlp")
    }
}

#[async_trait]
impl SourceFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, job_id: &str, output_dir: &Path) -> Result<PathBuf> {
        let url = url.to_string();
        let binary = self.binary().to_string();
        let output_path = output_dir.join(format!("{job_id}.mp4"));

        info!("Fetching {} to {}", url, output_path.display());

        let path = output_path.clone();
        tokio::task::spawn_blocking(move || fetch_blocking(&binary, &url, &path))
            .await
            .map_err(|_| PipelineError::Acquisition("download task panicked".to_string()))??;

        Ok(output_path)
    }
}

fn fetch_blocking(binary: &str, url: &str, output_path: &Path) -> Result<()> {
    let output = Command::new(binary)
        .args([
            "-f",
            "best[ext=mp4]/best",
            "--no-playlist",
            "-o",
        ])
        .arg(output_path)
        .arg(url)
        .output()
        .map_err(|e| PipelineError::Acquisition(format!("failed to launch {binary}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::Acquisition(format!(
            "yt-dlp failed: {}",
            stderr.trim()
        )));
    }

    if !output_path.exists() {
        return Err(PipelineError::Acquisition(
            "yt-dlp produced no output file".to_string(),
        ));
    }

    Ok(())
}

/// Validate a remote submission before a job is created
///
/// Accepts http/https URLs on a known video host only. Returns a
/// caller-facing description of what was wrong.
pub fn validate_video_url(url: &str) -> std::result::Result<(), String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| "URL must use http or https".to_string())?;

    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .split(':')
        .next()
        .unwrap_or_default();

    if host.is_empty() {
        return Err("URL has no host".to_string());
    }

    if !ALLOWED_HOSTS.contains(&host) {
        return Err(format!("Unsupported video host: {host}"));
    }

    Ok(())
}
