//! Media extraction via the ffmpeg CLI
//!
//! Extracts the audio track and uniformly spaced still frames from a
//! source video. Both operations shell out to `ffmpeg`; nonzero exit
//! turns the captured stderr into a `MediaExtraction` error. All
//! process invocations run under `spawn_blocking` so they cannot stall
//! other jobs on the async runtime.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};
use video_article_common::{Frame, MediaBackend, PipelineError, Result};

/// Audio extraction configuration
///
/// Defaults target speech-to-text: 16 kHz mono 16-bit PCM.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Target sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u8,
    /// FFmpeg codec name
    pub codec: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            codec: "pcm_s16le".to_string(),
        }
    }
}

/// FFmpeg-backed implementation of the media extraction collaborator
#[derive(Debug, Clone, Default)]
pub struct FfmpegMedia {
    pub audio: AudioConfig,
}

impl FfmpegMedia {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MediaBackend for FfmpegMedia {
    async fn extract_audio(&self, video: &Path, output_dir: &Path) -> Result<PathBuf> {
        let video = video.to_path_buf();
        let output_dir = output_dir.to_path_buf();
        let config = self.audio.clone();
        run_blocking(move || extract_audio_blocking(&video, &output_dir, &config)).await
    }

    async fn extract_frames(
        &self,
        video: &Path,
        interval_secs: f64,
        output_dir: &Path,
    ) -> Result<Vec<Frame>> {
        let video = video.to_path_buf();
        let output_dir = output_dir.to_path_buf();
        run_blocking(move || extract_frames_blocking(&video, interval_secs, &output_dir)).await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PipelineError::MediaExtraction(format!("extraction task panicked: {e}")))?
}

/// Extract the audio track into `<output_dir>/audio.wav`
fn extract_audio_blocking(
    video: &Path,
    output_dir: &Path,
    config: &AudioConfig,
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let audio_path = output_dir.join("audio.wav");

    info!(
        "Extracting audio from {} ({} Hz, {} ch)",
        video.display(),
        config.sample_rate,
        config.channels
    );

    let output = Command::new("ffmpeg")
        .arg("-i")
        .arg(video)
        .args([
            "-vn",
            "-acodec",
            &config.codec,
            "-ar",
            &config.sample_rate.to_string(),
            "-ac",
            &config.channels.to_string(),
            "-y",
        ])
        .arg(&audio_path)
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::MediaExtraction(format!(
            "ffmpeg audio extraction failed: {stderr}"
        )));
    }

    if !audio_path.exists() {
        return Err(PipelineError::MediaExtraction(format!(
            "ffmpeg reported success but produced no audio file: {}",
            audio_path.display()
        )));
    }

    Ok(audio_path)
}

/// Extract one frame every `interval_secs` seconds into `output_dir`
///
/// Frames are written as `frame_0001.jpg`, `frame_0002.jpg`, ... and
/// returned in strictly increasing timestamp order, where frame `i`
/// (0-based) carries timestamp `i * interval_secs`.
fn extract_frames_blocking(
    video: &Path,
    interval_secs: f64,
    output_dir: &Path,
) -> Result<Vec<Frame>> {
    std::fs::create_dir_all(output_dir)?;

    // A failed probe is not fatal; ffmpeg below gives the real error
    let duration = probe_duration(video).ok();
    info!(
        "Extracting frames from {} every {}s (duration: {})",
        video.display(),
        interval_secs,
        duration.map_or_else(|| "unknown".to_string(), |d| format!("{d:.1}s"))
    );

    let output = Command::new("ffmpeg")
        .arg("-i")
        .arg(video)
        .args([
            "-vf",
            &format!("fps=1/{interval_secs}"),
            "-q:v",
            "2",
            "-y",
        ])
        .arg(output_dir.join("frame_%04d.jpg"))
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::MediaExtraction(format!(
            "ffmpeg frame extraction failed: {stderr}"
        )));
    }

    let frames = collect_frames(output_dir, interval_secs)?;
    debug!("Extracted {} frames", frames.len());
    Ok(frames)
}

/// Collect extracted frame files in name order and assign timestamps
fn collect_frames(output_dir: &Path, interval_secs: f64) -> Result<Vec<Frame>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(output_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("frame_") && n.ends_with(".jpg"))
        })
        .collect();
    paths.sort();

    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(i, path)| Frame::new(i as f64 * interval_secs, path))
        .collect())
}

/// Probe a media file's duration in seconds via ffprobe
///
/// # Errors
/// Returns `MediaExtraction` when ffprobe fails or emits an unparsable
/// duration.
pub fn probe_duration(video: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(video)
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::MediaExtraction(format!(
            "ffprobe failed: {stderr}"
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout.trim().parse::<f64>().map_err(|e| {
        PipelineError::MediaExtraction(format!(
            "ffprobe produced unparsable duration {:?}: {e}",
            stdout.trim()
        ))
    })
}
