//! Job orchestration for the video-to-article pipeline
//!
//! Owns the job lifecycle: the job record and its state machine, the
//! concurrency-safe registry that status queries read from, and the
//! pipeline that drives one job through its ordered stages via the
//! collaborator interfaces.

mod config;
mod job;
mod pipeline;
mod registry;

pub use config::PipelineConfig;
pub use job::{JobRecord, JobStatus};
pub use pipeline::{JobSource, Pipeline};
pub use registry::JobRegistry;
