//! # edgequake-doctitle
//!
//! Convert uploaded PDF and Word documents to HTML and infer each document's
//! title from the rendered layout.
//!
//! ## Why this crate?
//!
//! Embedded document metadata is usually empty or wrong ("Microsoft Word -
//! Document1"). What a reader calls the title is the big, bold, Title Cased
//! line near the top of the first page. This crate converts the upload to
//! HTML, renders it, and lets three small heuristics vote on which snippet
//! looks like that line.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Seed     validate the submission, derive the job id
//!  ├─ 2. Detect   sniff a type label from the magic bytes
//!  ├─ 3. Approve  whitelist the label → pdf | doc
//!  ├─ 4. Convert  external converter → <workspace>/<job_id>.html
//!  └─ 5. Extract  render the page, infer and rank title candidates
//! ```
//!
//! Jobs go through a [`JobQueue`] that runs one job at a time, in
//! submission order.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doctitle::{Job, JobQueue, Pipeline, PipelineConfig, ResultEnvelope, ResultMode};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .workspace_dir("./workspace")
//!         .result_mode(ResultMode::BestTitle)
//!         .build()?;
//!     let queue = JobQueue::start(Arc::new(Pipeline::new(config)?));
//!
//!     let job = Job::from_upload(Some(Path::new("/tmp/upload-1")), Some("report.pdf"))?;
//!     let envelope = ResultEnvelope::from(queue.submit(job).await);
//!     println!("{}", serde_json::to_string_pretty(&envelope)?);
//!
//!     queue.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doctitle` binary (clap, anyhow, tracing-subscriber, indicatif, serde_json) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-doctitle = { version = "0.1", default-features = false }
//! ```
//!
//! ## External converters
//!
//! | Format | Default command |
//! |--------|-----------------|
//! | `pdf`  | `pdf2htmlEX --dest-dir {target_dir} {source} {target_name}` |
//! | `doc`  | `mammoth {source} {target}` |
//!
//! Both are configurable through [`ConverterCommand`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod job;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod queue;
pub mod store;
pub mod title;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConverterCommand, PipelineConfig, PipelineConfigBuilder, ResultMode};
pub use error::DocTitleError;
pub use job::{FormatCode, Job};
pub use output::{JobReport, ResultEnvelope, TitleOutcome};
pub use pipeline::convert::{CommandConverter, Converter, FormatDispatcher};
pub use pipeline::render::{HttpRenderer, RenderRequest, Renderer, StoreRenderer};
pub use pipeline::sniff::{MagicSniffer, TypeSniffer};
pub use pipeline::Pipeline;
pub use progress::{JobProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use queue::JobQueue;
pub use store::{ArtifactStore, ViewResponse};
pub use title::{infer, is_title_case, title_case, Detection, DetectionSource, Snippet};
