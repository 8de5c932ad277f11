//! The per-job processing pipeline.
//!
//! A job runs through five stages in a fixed order. Each stage hands its
//! output to the next, and the first failure ends the job: later stages do
//! not run and the error is returned unchanged.
//!
//! ```text
//! seed ──▶ detect-type ──▶ approve-type ──▶ convert ──▶ extract-title
//! (job)     (sniff label)   (whitelist)      (→ HTML)    (render + infer)
//! ```
//!
//! 1. [`sniff`]  : label the uploaded file by its magic bytes
//! 2. [`approve`]: map the label onto a [`FormatCode`] or reject it
//! 3. [`convert`]: run the external converter for that format code
//! 4. [`render`] : load the converted page, bounded by a timeout
//! 5. [`extract`]: turn the page into styled snippets for
//!    [`crate::title::infer`]

pub mod approve;
pub mod convert;
pub mod extract;
pub mod render;
pub mod sniff;

use crate::config::{PipelineConfig, ResultMode};
use crate::error::DocTitleError;
use crate::job::{FormatCode, Job};
use crate::output::{JobReport, TitleOutcome};
use crate::progress::Stage;
use crate::store::ArtifactStore;
use crate::title;
use convert::{Converter, FormatDispatcher};
use render::{HttpRenderer, RenderRequest, Renderer};
use sniff::{MagicSniffer, TypeSniffer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The job context threaded through the stages.
#[derive(Debug)]
pub struct JobContext {
    pub job: Job,
    started: Instant,
}

/// Sequential stage chain over one job at a time.
pub struct Pipeline {
    config: PipelineConfig,
    store: ArtifactStore,
    sniffer: Arc<dyn TypeSniffer>,
    dispatcher: FormatDispatcher,
    renderer: Arc<dyn Renderer>,
}

impl Pipeline {
    /// Pipeline with the default collaborators: magic-byte sniffing, the
    /// configured external converters, and an HTTP renderer on the view URL.
    pub fn new(config: PipelineConfig) -> Result<Self, DocTitleError> {
        let renderer = Arc::new(HttpRenderer::new()?);
        Ok(Self {
            store: ArtifactStore::new(&config.workspace_dir),
            dispatcher: FormatDispatcher::from_config(&config),
            sniffer: Arc::new(MagicSniffer),
            renderer,
            config,
        })
    }

    pub fn with_sniffer(mut self, sniffer: Arc<dyn TypeSniffer>) -> Self {
        self.sniffer = sniffer;
        self
    }

    /// Register (or replace) the converter of one format code.
    pub fn with_converter(mut self, format: FormatCode, converter: Arc<dyn Converter>) -> Self {
        self.dispatcher = self.dispatcher.with(format, converter);
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: FormatDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Run every stage for `job`, stopping at the first failure.
    pub async fn run(&self, job: Job) -> Result<JobReport, DocTitleError> {
        let mut stage = Stage::Seed;
        self.enter(&job.id, stage);
        let ctx = seed(job);

        let result = self.run_stages(&ctx, &mut stage).await;
        let elapsed_ms = ctx.started.elapsed().as_millis() as u64;

        match &result {
            Ok(report) => {
                info!(
                    "Job {} done in {}ms: {}",
                    ctx.job.id,
                    elapsed_ms,
                    report.best_title.as_deref().unwrap_or("<no title>")
                );
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_job_complete(&ctx.job.id, report.best_title.as_deref());
                }
            }
            Err(e) => {
                warn!("Job {} failed at {} after {}ms: {}", ctx.job.id, stage, elapsed_ms, e);
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_job_error(&ctx.job.id, stage, &e.to_string());
                }
            }
        }
        result
    }

    async fn run_stages(
        &self,
        ctx: &JobContext,
        stage: &mut Stage,
    ) -> Result<JobReport, DocTitleError> {
        *stage = self.enter(&ctx.job.id, Stage::DetectType);
        let label = self.detect_type(ctx).await?;

        *stage = self.enter(&ctx.job.id, Stage::ApproveType);
        let format = approve::approve_type(&label)?;

        *stage = self.enter(&ctx.job.id, Stage::Convert);
        self.convert(ctx, format).await?;

        *stage = self.enter(&ctx.job.id, Stage::ExtractTitle);
        let (outcome, best_title) = self.extract_title(ctx).await?;

        Ok(JobReport {
            format,
            job_id: ctx.job.id.clone(),
            outcome,
            best_title,
        })
    }

    fn enter(&self, job_id: &str, stage: Stage) -> Stage {
        debug!("Job {}: {}", job_id, stage);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage(job_id, stage);
        }
        stage
    }

    async fn detect_type(&self, ctx: &JobContext) -> Result<String, DocTitleError> {
        let label = self.sniffer.detect(&ctx.job.source_path).await?;
        info!("Job {}: detected type '{}'", ctx.job.id, label);
        Ok(label)
    }

    /// Convert the upload into `<workspace>/<job_id>.html`.
    ///
    /// A workspace that cannot be created fails the conversion.
    async fn convert(&self, ctx: &JobContext, format: FormatCode) -> Result<PathBuf, DocTitleError> {
        let target = self.store.artifact_path(&ctx.job.id);
        self.store.ensure_root().await.map_err(|e| match e {
            DocTitleError::Internal(reason) => DocTitleError::ConversionFailed { format, reason },
            other => other,
        })?;
        info!("Job {}: converting {} → {}", ctx.job.id, format, target.display());

        self.dispatcher
            .dispatch(format, &ctx.job.source_path, &target)
            .await?;
        Ok(target)
    }

    /// Render the artifact and infer its title.
    ///
    /// A page that renders but yields no usable title is still a success:
    /// the outcome then carries the fallback title (or silent detections).
    async fn extract_title(
        &self,
        ctx: &JobContext,
    ) -> Result<(TitleOutcome, Option<String>), DocTitleError> {
        let request = RenderRequest {
            job_id: ctx.job.id.clone(),
            url: self.config.view_url(&ctx.job.id),
        };
        let secs = self.config.render_timeout_secs;

        let snippets =
            tokio::time::timeout(Duration::from_secs(secs), self.renderer.render(&request))
                .await
                .map_err(|_| DocTitleError::RenderTimeout {
                    url: request.url.clone(),
                    secs,
                })??;
        debug!("Job {}: {} snippets from {}", ctx.job.id, snippets.len(), request.url);

        let detections = title::infer(&snippets);
        let best = title::best_title(&detections).map(str::to_string);
        if best.is_none() {
            info!("Job {}: no title found, using fallback", ctx.job.id);
        }

        let outcome = match self.config.result_mode {
            ResultMode::Detections => TitleOutcome::Detections(detections),
            ResultMode::BestTitle => TitleOutcome::Title(
                best.clone()
                    .unwrap_or_else(|| self.config.fallback_title.clone()),
            ),
        };
        Ok((outcome, best))
    }
}

/// Stage 1: wrap the submitted job as the initial context.
fn seed(job: Job) -> JobContext {
    JobContext {
        job,
        started: Instant::now(),
    }
}
