//! Shared types for the video-to-article pipeline
//!
//! Defines the stage error taxonomy, the frame/document data model, and
//! the collaborator traits the orchestrator drives the pipeline through.

pub mod collaborators;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub use collaborators::{
    ArticleGenerator, FrameSelector, MediaBackend, SourceFetcher, Transcriber,
};

/// Fatal pipeline stage errors
///
/// Any of these ends the owning job in the `failed` state with the
/// description captured verbatim. Selection-payload failures are NOT
/// part of this taxonomy: they are absorbed locally by the fallback
/// selection and never reach the job.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Remote source could not be fetched
    #[error("Acquisition failed: {0}")]
    Acquisition(String),

    /// Audio or frame extraction tool failed
    #[error("Media extraction failed: {0}")]
    MediaExtraction(String),

    /// Speech-to-text failed
    #[error("Transcription failed: {0}")]
    Transcription(String),

    /// Article content generation failed
    #[error("Content generation failed: {0}")]
    Generation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// A single extracted still image with its capture timestamp
///
/// Frames are produced in strictly increasing timestamp order and are
/// immutable once produced. The `path` is an opaque reference to the
/// image data; image bytes are never copied until a frame is persisted
/// into the final document's image set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Capture timestamp in seconds from the start of the video
    pub timestamp: f64,
    /// Path to the extracted image file
    pub path: PathBuf,
}

impl Frame {
    pub fn new(timestamp: f64, path: impl Into<PathBuf>) -> Self {
        Self {
            timestamp,
            path: path.into(),
        }
    }
}

/// A frame chosen for inclusion in the final document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedFrame {
    /// Capture timestamp in seconds
    pub timestamp: f64,
    /// Path to the image file
    pub path: PathBuf,
    /// Caption shown under the image
    pub caption: String,
    /// Why this frame was chosen
    pub reason: String,
}

impl SelectedFrame {
    /// Build a selected frame from a candidate frame
    pub fn from_frame(frame: &Frame, caption: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            timestamp: frame.timestamp,
            path: frame.path.clone(),
            caption: caption.into(),
            reason: reason.into(),
        }
    }
}

/// One block of the assembled document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DocumentBlock {
    /// A paragraph of generated prose (may carry inline markup)
    Text { content: String },
    /// An image reference with its caption
    Image { path: String, caption: String },
}

/// The assembled article: an ordered sequence of text and image blocks
///
/// Image blocks preserve the relative order of the selected frames they
/// were built from; text blocks preserve the paragraph order of the
/// generated content. Built once per job, immutable once written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<DocumentBlock>,
}

impl Document {
    #[must_use]
    pub fn new(blocks: Vec<DocumentBlock>) -> Self {
        Self { blocks }
    }

    /// Number of image blocks in the document
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, DocumentBlock::Image { .. }))
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Render the document to its line-oriented markup form
    ///
    /// Text blocks are separated by blank lines. An image block renders
    /// as an image-reference line followed by a styled caption line,
    /// which the exporter consumes back as a single block.
    #[must_use]
    pub fn to_markup(&self) -> String {
        let mut parts = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            match block {
                DocumentBlock::Text { content } => parts.push(content.clone()),
                DocumentBlock::Image { path, caption } => {
                    parts.push(format!("![{caption}]({path})\n*{caption}*"));
                }
            }
        }
        let mut out = parts.join("\n\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}
