//! Job results and the envelope handed back to submitters.

use crate::error::DocTitleError;
use crate::job::FormatCode;
use crate::title::Detection;
use serde::{Deserialize, Serialize};

/// Title information of a finished job, shaped by
/// [`crate::config::ResultMode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TitleOutcome {
    /// Every heuristic's verdict, best-first.
    Detections(Vec<Detection>),
    /// The single best title (or the fallback title).
    Title(String),
}

/// A successfully processed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    /// Format the whitelist approved.
    pub format: FormatCode,
    /// Sanitised filename stem; also the artifact key.
    pub job_id: String,
    pub outcome: TitleOutcome,
    /// Best title with a signal, `None` when nothing qualified.
    pub best_title: Option<String>,
}

/// What the caller of a submission receives.
///
/// Either the error or the job fields are populated, never both.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResultEnvelope {
    Failure {
        status: &'static str,
        kind: &'static str,
        message: String,
    },
    Success {
        #[serde(rename = "fileType")]
        file_type: FormatCode,
        #[serde(rename = "fileId")]
        file_id: String,
        results: TitleOutcome,
    },
}

impl ResultEnvelope {
    pub fn is_success(&self) -> bool {
        matches!(self, ResultEnvelope::Success { .. })
    }
}

impl From<Result<JobReport, DocTitleError>> for ResultEnvelope {
    fn from(result: Result<JobReport, DocTitleError>) -> Self {
        match result {
            Ok(report) => ResultEnvelope::Success {
                file_type: report.format,
                file_id: report.job_id,
                results: report.outcome,
            },
            Err(e) => ResultEnvelope::Failure {
                status: "error",
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }
}
