//! Collaborator interfaces consumed by the pipeline
//!
//! The orchestrator drives every external capability (media tooling,
//! speech-to-text, model calls, remote acquisition) through these
//! traits, so production implementations and test mocks are
//! interchangeable.

use crate::{Frame, Result, SelectedFrame};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Audio and frame extraction from a source video
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Extract the audio track into `output_dir`, returning the path to
    /// the audio file
    async fn extract_audio(&self, video: &Path, output_dir: &Path) -> Result<PathBuf>;

    /// Extract one frame every `interval_secs` seconds into
    /// `output_dir`, returning frames in strictly increasing timestamp
    /// order
    async fn extract_frames(
        &self,
        video: &Path,
        interval_secs: f64,
        output_dir: &Path,
    ) -> Result<Vec<Frame>>;
}

/// Speech-to-text over an extracted audio file
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<String>;
}

/// External frame selection over a bounded candidate set
///
/// Returns the raw selection payload for the sampler to reconcile.
/// Failures here are recoverable by design: the caller substitutes the
/// deterministic fallback selection instead of failing the job, so this
/// trait reports errors as plain `anyhow` diagnostics rather than a
/// fatal stage error.
#[async_trait]
pub trait FrameSelector: Send + Sync {
    async fn select_frames(&self, candidates: &[Frame], transcript: &str)
        -> anyhow::Result<String>;
}

/// Article prose generation from the transcript and selected frames
#[async_trait]
pub trait ArticleGenerator: Send + Sync {
    async fn generate_article(
        &self,
        transcript: &str,
        frames: &[SelectedFrame],
    ) -> Result<String>;
}

/// Remote video acquisition
///
/// URL validity is checked by the boundary before a job record exists;
/// implementations only deal with fetch mechanics.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Download `url` into `output_dir`, returning the path to the
    /// fetched video file
    async fn fetch(&self, url: &str, job_id: &str, output_dir: &Path) -> Result<PathBuf>;
}
