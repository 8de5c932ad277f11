//! Converted-artifact storage, keyed by job id.
//!
//! The workspace directory is the only state shared between jobs. Each job
//! writes `<workspace>/<job_id>.html`, and jobs never overlap, so the store
//! needs no locking as long as job ids do not collide.

use crate::error::DocTitleError;
use crate::job::sanitize_id;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Answer to a view request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewResponse {
    /// The stored HTML.
    Html(String),
    /// Nothing is stored under the requested id.
    InvalidId,
}

/// JSON answer used by view endpoints when the id is unknown.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidIdBody {
    pub status: &'static str,
    pub message: &'static str,
}

impl ViewResponse {
    pub fn invalid_id_body() -> InvalidIdBody {
        InvalidIdBody {
            status: "error",
            message: "Invalid File Id.",
        }
    }
}

/// Filesystem store of converted HTML artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the artifact of `job_id` lives (or will live).
    pub fn artifact_path(&self, job_id: &str) -> PathBuf {
        self.root.join(format!("{}.html", sanitize_id(job_id)))
    }

    /// Create the workspace directory if needed.
    pub async fn ensure_root(&self) -> Result<(), DocTitleError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            DocTitleError::Internal(format!(
                "Failed to create workspace '{}': {}",
                self.root.display(),
                e
            ))
        })
    }

    /// Look up the artifact for an untrusted id.
    pub async fn view(&self, raw_id: &str) -> Result<ViewResponse, DocTitleError> {
        let id = sanitize_id(raw_id);
        if id.is_empty() {
            return Ok(ViewResponse::InvalidId);
        }

        let path = self.artifact_path(&id);
        match tokio::fs::read_to_string(&path).await {
            Ok(html) => {
                debug!("Serving artifact {} ({} bytes)", path.display(), html.len());
                Ok(ViewResponse::Html(html))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ViewResponse::InvalidId),
            Err(e) => Err(DocTitleError::Internal(format!(
                "Failed to read artifact '{}': {}",
                path.display(),
                e
            ))),
        }
    }
}
