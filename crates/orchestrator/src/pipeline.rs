//! The stage-driving pipeline
//!
//! Runs one job through its ordered stages, updating the registry as
//! each stage is entered. Any fatal stage error transitions the job to
//! `failed` with the description captured verbatim; a selection failure
//! is absorbed by the deterministic fallback and never fails the job.
//! Intermediate artifacts are removed whether the job succeeds or
//! fails.

use crate::config::PipelineConfig;
use crate::job::JobStatus;
use crate::registry::JobRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use video_article_common::{
    ArticleGenerator, FrameSelector, MediaBackend, Result, SelectedFrame, SourceFetcher,
    Transcriber,
};
use video_article_exporter::ExportFormat;

/// Where a job's source video comes from
#[derive(Debug, Clone)]
pub enum JobSource {
    /// A file the boundary already persisted locally
    Upload(PathBuf),
    /// A validated remote reference to fetch first
    Remote(String),
}

/// Drives jobs through the conversion stages
pub struct Pipeline {
    media: Arc<dyn MediaBackend>,
    transcriber: Arc<dyn Transcriber>,
    selector: Arc<dyn FrameSelector>,
    generator: Arc<dyn ArticleGenerator>,
    fetcher: Arc<dyn SourceFetcher>,
    registry: JobRegistry,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        media: Arc<dyn MediaBackend>,
        transcriber: Arc<dyn Transcriber>,
        selector: Arc<dyn FrameSelector>,
        generator: Arc<dyn ArticleGenerator>,
        fetcher: Arc<dyn SourceFetcher>,
        registry: JobRegistry,
        config: PipelineConfig,
    ) -> Self {
        Self {
            media,
            transcriber,
            selector,
            generator,
            fetcher,
            registry,
            config,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one job end to end
    ///
    /// The caller is expected to have inserted a `queued` record for
    /// `job_id` and to invoke this from the job's own spawned task.
    pub async fn run(&self, job_id: &str, source: JobSource) {
        let work_dir = self.config.work_dir.join(job_id);

        match self.run_stages(job_id, &source, &work_dir).await {
            Ok(result_dir) => {
                info!("Job {} completed: {}", job_id, result_dir.display());
                self.registry.complete(job_id, result_dir).await;
            }
            Err(e) => {
                error!("Job {} failed: {}", job_id, e);
                self.registry.fail(job_id, e.to_string()).await;
            }
        }

        self.cleanup(job_id, &source, &work_dir).await;
    }

    async fn run_stages(
        &self,
        job_id: &str,
        source: &JobSource,
        work_dir: &Path,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(work_dir)?;

        let video = match source {
            JobSource::Upload(path) => path.clone(),
            JobSource::Remote(url) => {
                self.registry
                    .set_stage(job_id, JobStatus::Downloading, 5, "Downloading video")
                    .await;
                self.fetcher.fetch(url, job_id, work_dir).await?
            }
        };

        self.registry
            .set_stage(job_id, JobStatus::Processing, 10, "Extracting audio")
            .await;
        let audio = self.media.extract_audio(&video, work_dir).await?;

        self.registry
            .set_stage(job_id, JobStatus::Processing, 20, "Extracting frames")
            .await;
        let frames_dir = work_dir.join("frames");
        let frames = self
            .media
            .extract_frames(&video, self.config.frame_interval_secs, &frames_dir)
            .await?;

        self.registry
            .set_stage(job_id, JobStatus::Processing, 30, "Transcribing audio")
            .await;
        let transcript = self.transcriber.transcribe(&audio).await?;
        // The audio file is not needed past this point
        let _ = std::fs::remove_file(&audio);

        self.registry
            .set_stage(job_id, JobStatus::Processing, 50, "Selecting key frames")
            .await;
        let candidates = video_article_sampler::sample(&frames, self.config.candidate_cap);
        let selected = self.select_frames(job_id, &candidates, &transcript).await;

        self.registry
            .set_stage(job_id, JobStatus::Processing, 70, "Generating article")
            .await;
        let article = self
            .generator
            .generate_article(&transcript, &selected)
            .await?;

        self.registry
            .set_stage(job_id, JobStatus::Processing, 85, "Assembling document")
            .await;
        let result_dir = self.config.output_dir.join(job_id);
        let placed = persist_selected_frames(&selected, &result_dir)?;
        let paragraphs = video_article_assembler::split_paragraphs(&article);
        let document = video_article_assembler::assemble(&paragraphs, &placed);
        let markup = document.to_markup();
        std::fs::write(result_dir.join("article.md"), &markup)?;

        self.registry
            .set_stage(job_id, JobStatus::Processing, 95, "Rendering export formats")
            .await;
        let results = video_article_exporter::write_exports(
            &markup,
            &result_dir,
            &[ExportFormat::Html, ExportFormat::Text],
        );
        for (format, result) in &results {
            if result.is_err() {
                warn!("Job {}: {:?} export failed, continuing", job_id, format);
            }
        }

        Ok(result_dir)
    }

    /// Frame selection with fallback absorption
    ///
    /// A selector failure or an unparsable payload substitutes the
    /// deterministic fallback; only parse success is trusted, including
    /// a legitimately empty selection.
    async fn select_frames(
        &self,
        job_id: &str,
        candidates: &[video_article_common::Frame],
        transcript: &str,
    ) -> Vec<SelectedFrame> {
        let payload = match self.selector.select_frames(candidates, transcript).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Job {}: frame selection failed ({e:#}), using fallback", job_id);
                return video_article_sampler::fallback(candidates, self.config.fallback_target);
            }
        };

        match video_article_sampler::reconcile(candidates, &payload) {
            Ok(selected) => selected,
            Err(e) => {
                warn!(
                    "Job {}: selection payload unparsable ({e}), using fallback",
                    job_id
                );
                video_article_sampler::fallback(candidates, self.config.fallback_target)
            }
        }
    }

    /// Remove per-job intermediate artifacts
    ///
    /// Runs on success and on failure: the uploaded or downloaded
    /// source, the extracted audio, and the unselected frame files all
    /// live under the source path and the job's work dir.
    async fn cleanup(&self, job_id: &str, source: &JobSource, work_dir: &Path) {
        if let JobSource::Upload(path) = source {
            let _ = std::fs::remove_file(path);
        }
        if let Err(e) = std::fs::remove_dir_all(work_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Job {}: failed to clean work dir: {}", job_id, e);
            }
        }
    }
}

/// Copy selected frames into the result's image set
///
/// Returns the frames with paths rewritten to their document-relative
/// form, preserving selection order.
fn persist_selected_frames(
    selected: &[SelectedFrame],
    result_dir: &Path,
) -> Result<Vec<SelectedFrame>> {
    let images_dir = result_dir.join("images");
    std::fs::create_dir_all(&images_dir)?;

    let mut placed = Vec::with_capacity(selected.len());
    for (i, frame) in selected.iter().enumerate() {
        let file_name = format!("frame_{}.jpg", i + 1);
        std::fs::copy(&frame.path, images_dir.join(&file_name))?;
        let mut frame = frame.clone();
        frame.path = PathBuf::from("images").join(&file_name);
        placed.push(frame);
    }
    Ok(placed)
}
