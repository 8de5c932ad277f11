//! Error type for the edgequake-doctitle library.
//!
//! Every pipeline stage returns `Result<_, DocTitleError>`. The first stage
//! that fails aborts the job and its error reaches the terminal handler
//! unchanged; there are no partial results and no automatic retries.
//!
//! "No title found" is not a variant: a rendered page without a usable title
//! is a successful job whose outcome falls back to the configured sentinel
//! title (see [`crate::config::PipelineConfig::fallback_title`]).

use crate::job::FormatCode;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-doctitle library.
#[derive(Debug, Error)]
pub enum DocTitleError {
    // ── Submission errors ─────────────────────────────────────────────────
    /// The submission did not carry a usable file.
    #[error("Malformed Request: {reason}")]
    MalformedSubmission { reason: String },

    // ── Type errors ───────────────────────────────────────────────────────
    /// The type sniffer could not read or classify the uploaded file.
    #[error("Failed to detect file type of '{path}': {reason}")]
    TypeDetectionFailed { path: PathBuf, reason: String },

    /// The sniffed label matched no whitelist entry.
    #[error("Invalid File Type!")]
    UnapprovedType { label: String },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The external converter failed, produced nothing, or no converter is
    /// registered for the format code.
    #[error("Conversion to HTML failed for {format} file: {reason}")]
    ConversionFailed { format: FormatCode, reason: String },

    /// The external converter did not finish in time.
    #[error("Conversion of {format} file timed out after {secs}s")]
    ConversionTimeout { format: FormatCode, secs: u64 },

    // ── Render errors ─────────────────────────────────────────────────────
    /// The converted page could not be loaded.
    #[error("Failed to load {url} - {reason}")]
    RenderFailed { url: String, reason: String },

    /// The renderer did not answer within the configured timeout.
    #[error("Rendering {url} timed out after {secs}s\nIncrease --render-timeout.")]
    RenderTimeout { url: String, secs: u64 },

    // ── Queue errors ──────────────────────────────────────────────────────
    /// The queue worker has stopped and no longer accepts jobs.
    #[error("Job queue is closed")]
    QueueClosed,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocTitleError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DocTitleError::MalformedSubmission { .. } => "malformed_submission",
            DocTitleError::TypeDetectionFailed { .. } => "type_detection_failed",
            DocTitleError::UnapprovedType { .. } => "unapproved_type",
            DocTitleError::ConversionFailed { .. } | DocTitleError::ConversionTimeout { .. } => {
                "conversion_failed"
            }
            DocTitleError::RenderFailed { .. } | DocTitleError::RenderTimeout { .. } => {
                "render_failed"
            }
            DocTitleError::QueueClosed => "queue_closed",
            DocTitleError::InvalidConfig(_) => "invalid_config",
            DocTitleError::Internal(_) => "internal",
        }
    }
}
