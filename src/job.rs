//! Jobs: one upload under processing.
//!
//! A [`Job`] is created from a submission, owned by the queue while it waits
//! and by the pipeline while it runs, and dropped once the terminal handler
//! has produced the result envelope. There is no persistent job store.

use crate::error::DocTitleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Supported source formats, as approved by the whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatCode {
    /// Portable Document Format.
    Pdf,
    /// Microsoft Word document.
    Doc,
}

impl FormatCode {
    pub fn as_str(self) -> &'static str {
        match self {
            FormatCode::Pdf => "pdf",
            FormatCode::Doc => "doc",
        }
    }
}

impl fmt::Display for FormatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One uploaded file on its way through the pipeline.
///
/// Only the submission lives here. The detected type label, the approved
/// [`FormatCode`] and the artifact path are locals of the stage run in
/// [`crate::Pipeline::run`]: the format code comes back in
/// [`crate::JobReport`], and the path is always
/// [`crate::ArtifactStore::artifact_path`] of [`Job::id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Where the upload was stored on disk.
    pub source_path: PathBuf,
    /// The name the client declared for the file.
    pub original_name: String,
    /// Sanitised filename stem; keys the converted artifact and the view URL.
    pub id: String,
}

impl Job {
    /// Build a job from a stored upload.
    ///
    /// The id is the part of `original_name` before its first `.`, reduced to
    /// the identifier alphabet of [`sanitize_id`].
    pub fn new(source_path: impl Into<PathBuf>, original_name: impl Into<String>) -> Self {
        let original_name = original_name.into();
        let stem = original_name.split('.').next().unwrap_or_default();
        Self {
            source_path: source_path.into(),
            id: sanitize_id(stem),
            original_name,
        }
    }

    /// Validate a raw submission and turn it into a job.
    ///
    /// Rejects submissions without a file path or without a usable name
    /// before they ever reach the queue.
    pub fn from_upload(
        source_path: Option<&Path>,
        original_name: Option<&str>,
    ) -> Result<Self, DocTitleError> {
        let missing = || DocTitleError::MalformedSubmission {
            reason: "Missing File".to_string(),
        };

        let path = source_path
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(missing)?;
        let name = original_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(missing)?;

        let job = Job::new(path, name);
        if job.id.is_empty() {
            return Err(DocTitleError::MalformedSubmission {
                reason: format!("File name '{name}' yields an empty identifier"),
            });
        }
        Ok(job)
    }
}

/// Restrict an identifier to `[A-Za-z0-9_-]`.
///
/// Dots are stripped first so `../x` and `x.html` can never escape or alias
/// the workspace; every other character outside the alphabet is dropped.
pub fn sanitize_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_stem_before_first_dot() {
        let job = Job::new("/tmp/upload-1", "annual.report.pdf");
        assert_eq!(job.id, "annual");
        assert_eq!(job.original_name, "annual.report.pdf");
    }

    #[test]
    fn id_is_sanitised() {
        let job = Job::new("/tmp/u", "my report (final).docx");
        assert_eq!(job.id, "myreportfinal");
    }

    #[test]
    fn sanitize_strips_traversal() {
        assert_eq!(sanitize_id("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_id("abc.html"), "abchtml");
        assert_eq!(sanitize_id("Q3_summary-v2"), "Q3_summary-v2");
    }

    #[test]
    fn from_upload_rejects_missing_file() {
        let err = Job::from_upload(None, Some("a.pdf")).unwrap_err();
        assert_eq!(err.to_string(), "Malformed Request: Missing File");

        let err = Job::from_upload(Some(Path::new("/tmp/x")), None).unwrap_err();
        assert!(matches!(err, DocTitleError::MalformedSubmission { .. }));

        let err = Job::from_upload(Some(Path::new("")), Some("a.pdf")).unwrap_err();
        assert!(matches!(err, DocTitleError::MalformedSubmission { .. }));
    }

    #[test]
    fn from_upload_rejects_name_without_stem() {
        let err = Job::from_upload(Some(Path::new("/tmp/x")), Some(".pdf")).unwrap_err();
        assert!(matches!(err, DocTitleError::MalformedSubmission { .. }));
    }

    #[test]
    fn from_upload_accepts_valid_submission() {
        let job = Job::from_upload(Some(Path::new("/tmp/x")), Some("paper.pdf")).unwrap();
        assert_eq!(job.id, "paper");
        assert_eq!(job.source_path, PathBuf::from("/tmp/x"));
    }

    #[test]
    fn format_code_display() {
        assert_eq!(FormatCode::Pdf.to_string(), "pdf");
        assert_eq!(FormatCode::Doc.to_string(), "doc");
        assert_eq!(serde_json::to_string(&FormatCode::Doc).unwrap(), "\"doc\"");
    }
}
