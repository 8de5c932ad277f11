//! Rendering: load a converted page and hand back its snippets.
//!
//! Two renderers ship with the crate:
//!
//! * [`HttpRenderer`] fetches the page from the view URL, exactly as an
//!   external client of the artifact server would.
//! * [`StoreRenderer`] reads the artifact straight from the
//!   [`ArtifactStore`], for hosts that run without a view server.
//!
//! Both parse the HTML on the blocking pool: snippet extraction is CPU-bound
//! and documents can be large.

use crate::error::DocTitleError;
use crate::pipeline::extract::extract_snippets;
use crate::store::{ArtifactStore, ViewResponse};
use crate::title::Snippet;
use async_trait::async_trait;
use tracing::debug;

/// The page to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Job id the artifact is stored under.
    pub job_id: String,
    /// URL serving the artifact.
    pub url: String,
}

/// Loads a converted page and extracts its snippets.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Fails with [`DocTitleError::RenderFailed`] when the page cannot be loaded.
    async fn render(&self, request: &RenderRequest) -> Result<Vec<Snippet>, DocTitleError>;
}

/// Fetches pages over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: reqwest::Client,
}

impl HttpRenderer {
    pub fn new() -> Result<Self, DocTitleError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| DocTitleError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<Vec<Snippet>, DocTitleError> {
        let failed = |reason: String| DocTitleError::RenderFailed {
            url: request.url.clone(),
            reason,
        };

        let response = self
            .client
            .get(&request.url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("Status: HTTP {}", response.status())));
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("json"));
        let body = response.text().await.map_err(|e| failed(e.to_string()))?;

        // The view endpoint answers unknown ids with a JSON error, not a page.
        if is_json {
            return Err(failed("Invalid File Id.".to_string()));
        }

        debug!("Fetched {} ({} bytes)", request.url, body.len());
        parse_off_thread(body).await
    }
}

/// Reads pages from the artifact store.
#[derive(Debug, Clone)]
pub struct StoreRenderer {
    store: ArtifactStore,
}

impl StoreRenderer {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Renderer for StoreRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<Vec<Snippet>, DocTitleError> {
        match self.store.view(&request.job_id).await? {
            ViewResponse::Html(html) => parse_off_thread(html).await,
            ViewResponse::InvalidId => Err(DocTitleError::RenderFailed {
                url: request.url.clone(),
                reason: "Invalid File Id.".to_string(),
            }),
        }
    }
}

async fn parse_off_thread(html: String) -> Result<Vec<Snippet>, DocTitleError> {
    tokio::task::spawn_blocking(move || extract_snippets(&html))
        .await
        .map_err(|e| DocTitleError::Internal(format!("Snippet extraction panicked: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(job_id: &str) -> RenderRequest {
        RenderRequest {
            job_id: job_id.to_string(),
            url: format!("http://localhost:3000/view/{job_id}"),
        }
    }

    #[tokio::test]
    async fn store_renderer_extracts_snippets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("memo.html"),
            "<h1>Quarterly Memo Title</h1><p>some text below it</p>",
        )
        .unwrap();

        let renderer = StoreRenderer::new(ArtifactStore::new(dir.path()));
        let snippets = renderer.render(&request("memo")).await.unwrap();
        assert!(snippets.iter().any(|s| s.tag == "h1" && s.text == "Quarterly Memo Title"));
    }

    #[tokio::test]
    async fn store_renderer_unknown_id_is_render_failure() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = StoreRenderer::new(ArtifactStore::new(dir.path()));
        let err = renderer.render(&request("ghost")).await.unwrap_err();
        match err {
            DocTitleError::RenderFailed { url, reason } => {
                assert!(url.ends_with("/view/ghost"));
                assert_eq!(reason, "Invalid File Id.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_renderer_unreachable_host_fails() {
        let renderer = HttpRenderer::new().unwrap();
        let req = RenderRequest {
            job_id: "x".into(),
            // Port 9 (discard) on loopback is closed on test machines.
            url: "http://127.0.0.1:9/view/x".into(),
        };
        let err = renderer.render(&req).await.unwrap_err();
        assert!(matches!(err, DocTitleError::RenderFailed { .. }));
    }
}
