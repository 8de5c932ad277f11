//! Progress-callback trait for per-job pipeline events.
//!
//! Inject an [`Arc<dyn JobProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to observe jobs
//! as the queue drains them: when a job starts, as it enters each stage, and
//! how it ended.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doctitle::{JobProgressCallback, PipelineConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     finished: AtomicUsize,
//! }
//!
//! impl JobProgressCallback for CountingCallback {
//!     fn on_job_complete(&self, job_id: &str, title: Option<&str>) {
//!         self.finished.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{job_id}: {}", title.unwrap_or("-"));
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { finished: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// The five pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Seed,
    DetectType,
    ApproveType,
    Convert,
    ExtractTitle,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Seed => "seed",
            Stage::DetectType => "detect-type",
            Stage::ApproveType => "approve-type",
            Stage::Convert => "convert",
            Stage::ExtractTitle => "extract-title",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Called by the pipeline as it processes each job.
///
/// Jobs never overlap, so calls for one job always finish before the next
/// job's `on_job_start`. All methods default to no-ops.
pub trait JobProgressCallback: Send + Sync {
    /// Called when the queue hands a job to the pipeline.
    ///
    /// # Arguments
    /// * `job_id` : sanitised filename stem
    /// * `pending`: jobs still waiting behind this one
    fn on_job_start(&self, job_id: &str, pending: usize) {
        let _ = (job_id, pending);
    }

    /// Called before each stage runs.
    fn on_stage(&self, job_id: &str, stage: Stage) {
        let _ = (job_id, stage);
    }

    /// Called when a job finished successfully.
    ///
    /// `title` is the best title found, `None` when the fallback was used.
    fn on_job_complete(&self, job_id: &str, title: Option<&str>) {
        let _ = (job_id, title);
    }

    /// Called when a stage failed and the job was aborted.
    fn on_job_error(&self, job_id: &str, stage: Stage, error: &str) {
        let _ = (job_id, stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl JobProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn JobProgressCallback>;
