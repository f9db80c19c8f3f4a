//! Speech-to-text via the whisper.cpp CLI
//!
//! Runs the `whisper-cli` binary against the extracted 16 kHz mono WAV
//! and captures the transcript from stdout. Like the ffmpeg tooling,
//! the model runs behind a process boundary; the CPU-bound work happens
//! under `spawn_blocking` so concurrent jobs keep making progress.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;
use video_article_common::{PipelineError, Result, Transcriber};

/// Whisper model size selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhisperModel {
    /// 39M parameters, fastest
    Tiny,
    /// 74M parameters, balanced
    Base,
    /// 244M parameters
    Small,
    /// 769M parameters, most accurate of the practical sizes
    Medium,
}

impl WhisperModel {
    /// Get the ggml model filename
    #[must_use]
    pub fn filename(&self) -> &'static str {
        match self {
            Self::Tiny => "ggml-tiny.bin",
            Self::Base => "ggml-base.bin",
            Self::Small => "ggml-small.bin",
            Self::Medium => "ggml-medium.bin",
        }
    }
}

/// Transcription configuration
#[derive(Debug, Clone)]
pub struct TranscriptionConfig {
    /// Path to the whisper.cpp CLI binary
    pub binary: PathBuf,
    /// Path to the ggml model file
    pub model_path: PathBuf,
    /// Language code, e.g. "en"
    pub language: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("whisper-cli"),
            model_path: PathBuf::from("models").join(WhisperModel::Base.filename()),
            language: "en".to_string(),
        }
    }
}

impl TranscriptionConfig {
    /// Build the configuration from environment variables
    /// (`WHISPER_BIN`, `WHISPER_MODEL`, `WHISPER_LANGUAGE`), falling
    /// back to the defaults for anything unset
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            binary: std::env::var("WHISPER_BIN")
                .map(PathBuf::from)
                .unwrap_or(defaults.binary),
            model_path: std::env::var("WHISPER_MODEL")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            language: std::env::var("WHISPER_LANGUAGE").unwrap_or(defaults.language),
        }
    }
}

/// Whisper.cpp CLI implementation of the transcription collaborator
#[derive(Debug, Clone, Default)]
pub struct WhisperCli {
    config: TranscriptionConfig,
}

impl WhisperCli {
    #[must_use]
    pub fn new(config: TranscriptionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Transcriber for WhisperCli {
    async fn transcribe(&self, audio: &Path) -> Result<String> {
        let audio = audio.to_path_buf();
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || transcribe_blocking(&audio, &config))
            .await
            .map_err(|e| PipelineError::Transcription(format!("transcription task panicked: {e}")))?
    }
}

fn transcribe_blocking(audio: &Path, config: &TranscriptionConfig) -> Result<String> {
    info!(
        "Transcribing {} with model {}",
        audio.display(),
        config.model_path.display()
    );

    let output = Command::new(&config.binary)
        .arg("-m")
        .arg(&config.model_path)
        .args(["-l", &config.language, "--no-timestamps"])
        .arg("-f")
        .arg(audio)
        .output()
        .map_err(|e| {
            PipelineError::Transcription(format!(
                "failed to launch {}: {e}",
                config.binary.display()
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::Transcription(format!(
            "whisper exited with {}: {stderr}",
            output.status
        )));
    }

    let transcript = clean_transcript(&String::from_utf8_lossy(&output.stdout));
    if transcript.is_empty() {
        return Err(PipelineError::Transcription(
            "whisper produced an empty transcript".to_string(),
        ));
    }
    Ok(transcript)
}

/// Normalize CLI output into a single transcript string
///
/// whisper.cpp emits one segment per line; lines are trimmed and joined
/// with single spaces.
fn clean_transcript(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
