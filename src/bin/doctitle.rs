//! CLI binary for edgequake-doctitle.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig`, pushes every input through the job queue and prints
//! one result envelope per input.

use anyhow::{bail, Context, Result};
use clap::Parser;
use edgequake_doctitle::{
    ArtifactStore, ConverterCommand, Job, JobProgressCallback, JobReport, JobQueue, Pipeline, PipelineConfig,
    ProgressCallback, ResultEnvelope, ResultMode, Stage, StoreRenderer, TitleOutcome, ViewResponse,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over all documents plus a log line
/// per finished job.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-job wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<String, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new(total: usize) -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(total as u64);
        bar.set_style(style);
        bar.set_prefix("Titling");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, job_id: &str) -> f64 {
        self.start_times
            .lock()
            .map(|mut times| times.remove(job_id))
            .ok()
            .flatten()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
        let total = self.bar.length().unwrap_or(0) as usize;
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!("{} {} documents titled", green("✔"), bold(&total.to_string()));
        } else {
            eprintln!(
                "{} {}/{} documents titled  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&total.saturating_sub(failed).to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

impl JobProgressCallback for CliProgressCallback {
    fn on_job_start(&self, job_id: &str, pending: usize) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(job_id.to_string(), Instant::now());
        }
        self.bar.set_message(format!("{job_id}  {}", dim(&format!("{pending} queued"))));
    }

    fn on_stage(&self, job_id: &str, stage: Stage) {
        self.bar.set_message(format!("{job_id}  {}", dim(stage.as_str())));
    }

    fn on_job_complete(&self, job_id: &str, title: Option<&str>) {
        let secs = self.elapsed_secs(job_id);
        self.bar.println(format!(
            "  {} {:<24}  {}  {}",
            green("✓"),
            job_id,
            title.unwrap_or("(no title)"),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_job_error(&self, job_id: &str, stage: Stage, error: &str) {
        let secs = self.elapsed_secs(job_id);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Keep the log line on one row.
        let first_line = error.lines().next().unwrap_or_default();
        let msg = if first_line.chars().count() > 80 {
            let cut: String = first_line.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            first_line.to_string()
        };

        self.bar.println(format!(
            "  {} {:<24}  {} {}  {}",
            red("✗"),
            job_id,
            dim(&format!("[{stage}]")),
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Best title of one document
  doctitle --mode title report.pdf

  # Ranked detections of several documents, as JSON
  doctitle --json *.pdf *.docx > titles.json

  # Render through a running view server instead of the workspace
  doctitle --view-url http://localhost:3000/view/ report.pdf

  # Print a stored artifact
  doctitle --view report

  # Custom converter (placeholders: {source} {target} {target_dir} {target_name})
  doctitle --doc-converter "pandoc -s -o {target} {source}" memo.docx

SUPPORTED TYPES:
  Sniffed label contains   Format   Default converter
  ──────────────────────   ──────   ──────────────────────────────────────────
  PDF                      pdf      pdf2htmlEX --dest-dir {target_dir} {source} {target_name}
  Microsoft Word           doc      mammoth {source} {target}

ENVIRONMENT VARIABLES:
  DOCTITLE_WORKSPACE        Artifact directory (default ./workspace)
  DOCTITLE_VIEW_URL         Render through this view URL base
  DOCTITLE_PDF_CONVERTER    PDF → HTML command line
  DOCTITLE_DOC_CONVERTER    Word → HTML command line
  RUST_LOG                  tracing filter, overrides -v / -q
"#;

/// Infer document titles from their rendered layout.
#[derive(Parser, Debug)]
#[command(
    name = "doctitle",
    version,
    about = "Infer the titles of PDF and Word documents from their rendered layout",
    long_about = "Convert PDF and Word documents to HTML with external converters, render \
them, and rank title candidates by font size and Title Case. Documents are processed one at a \
time, in the order given.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Documents to title.
    #[arg(required_unless_present = "view")]
    inputs: Vec<PathBuf>,

    /// Directory for converted HTML artifacts.
    #[arg(short, long, env = "DOCTITLE_WORKSPACE", default_value = "./workspace")]
    workspace: PathBuf,

    /// Result shape: ranked detections or the single best title.
    #[arg(long, env = "DOCTITLE_MODE", value_enum, default_value = "detections")]
    mode: ModeArg,

    /// Title reported when nothing qualifies (title mode).
    #[arg(long, env = "DOCTITLE_FALLBACK_TITLE", default_value = "Untitled")]
    fallback_title: String,

    /// Render through this view URL base instead of reading the workspace.
    #[arg(long, env = "DOCTITLE_VIEW_URL")]
    view_url: Option<String>,

    /// Render timeout in seconds.
    #[arg(long, env = "DOCTITLE_RENDER_TIMEOUT", default_value_t = 30)]
    render_timeout: u64,

    /// External converter timeout in seconds.
    #[arg(long, env = "DOCTITLE_CONVERT_TIMEOUT", default_value_t = 300)]
    convert_timeout: u64,

    /// PDF → HTML command line.
    #[arg(long, env = "DOCTITLE_PDF_CONVERTER")]
    pdf_converter: Option<String>,

    /// Word → HTML command line.
    #[arg(long, env = "DOCTITLE_DOC_CONVERTER")]
    doc_converter: Option<String>,

    /// Print the stored artifact of this id and exit.
    #[arg(long, value_name = "ID", conflicts_with = "inputs")]
    view: Option<String>,

    /// Output result envelopes as JSON.
    #[arg(long, env = "DOCTITLE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCTITLE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCTITLE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCTITLE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ModeArg {
    Detections,
    Title,
}

impl From<ModeArg> for ResultMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Detections => ResultMode::Detections,
            ModeArg::Title => ResultMode::BestTitle,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless --verbose asks for them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && cli.view.is_none();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── View mode ────────────────────────────────────────────────────────
    if let Some(ref id) = cli.view {
        let store = ArtifactStore::new(&cli.workspace);
        let response = store.view(id).await.context("Failed to read artifact")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        match response {
            ViewResponse::Html(html) => handle
                .write_all(html.as_bytes())
                .context("Failed to write to stdout")?,
            ViewResponse::InvalidId => {
                let body = serde_json::to_string(&ViewResponse::invalid_id_body())
                    .context("Failed to serialise response")?;
                writeln!(handle, "{body}").context("Failed to write to stdout")?;
            }
        }
        return Ok(());
    }

    // ── Build pipeline ───────────────────────────────────────────────────
    let progress = if show_progress {
        Some(CliProgressCallback::new(cli.inputs.len()))
    } else {
        None
    };
    let config = build_config(&cli, progress.clone().map(|cb| cb as ProgressCallback))?;

    let mut pipeline = Pipeline::new(config).context("Failed to set up pipeline")?;
    if cli.view_url.is_none() {
        let store = pipeline.store().clone();
        pipeline = pipeline.with_renderer(Arc::new(StoreRenderer::new(store)));
    }
    let queue = JobQueue::start(Arc::new(pipeline));

    // ── Run jobs ─────────────────────────────────────────────────────────
    // Submitted together; the queue runs them one by one in this order.
    let started = Instant::now();
    let envelopes: Vec<ResultEnvelope> =
        futures::future::join_all(cli.inputs.iter().map(|path| submit(&queue, path)))
            .await;
    queue.shutdown().await;

    if let Some(ref cb) = progress {
        cb.finish();
    }

    print_results(&cli, &envelopes)?;

    let failed = envelopes.iter().filter(|e| !e.is_success()).count();
    if !cli.quiet && !show_progress {
        eprintln!(
            "Titled {}/{} documents in {}ms",
            envelopes.len() - failed,
            envelopes.len(),
            started.elapsed().as_millis()
        );
    }
    if failed > 0 {
        bail!("{failed} of {} documents failed", envelopes.len());
    }
    Ok(())
}

async fn submit(queue: &JobQueue, path: &Path) -> ResultEnvelope {
    let name = path.file_name().and_then(|n| n.to_str());
    match Job::from_upload(Some(path), name) {
        Ok(job) => ResultEnvelope::from(queue.submit(job).await),
        Err(e) => ResultEnvelope::from(Err::<JobReport, _>(e)),
    }
}

fn print_results(cli: &Cli, envelopes: &[ResultEnvelope]) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if cli.json {
        let json = serde_json::to_string_pretty(envelopes).context("Failed to serialise output")?;
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
        return Ok(());
    }

    for (path, envelope) in cli.inputs.iter().zip(envelopes) {
        let line = match envelope {
            ResultEnvelope::Success { results, .. } => match results {
                TitleOutcome::Title(title) => title.clone(),
                TitleOutcome::Detections(list) => list
                    .iter()
                    .map(|d| format!("{}={} {:?}", d.source, d.confidence, d.title().unwrap_or("")))
                    .collect::<Vec<_>>()
                    .join("  "),
            },
            ResultEnvelope::Failure { message, .. } => format!("error: {message}"),
        };
        writeln!(handle, "{}\t{}", path.display(), line).context("Failed to write to stdout")?;
    }
    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .workspace_dir(&cli.workspace)
        .result_mode(cli.mode.clone().into())
        .fallback_title(&cli.fallback_title)
        .render_timeout_secs(cli.render_timeout)
        .convert_timeout_secs(cli.convert_timeout);

    if let Some(ref url) = cli.view_url {
        builder = builder.view_base_url(url);
    }
    if let Some(ref line) = cli.pdf_converter {
        builder = builder.pdf_converter(
            ConverterCommand::parse(line).context("Invalid --pdf-converter")?,
        );
    }
    if let Some(ref line) = cli.doc_converter {
        builder = builder.doc_converter(
            ConverterCommand::parse(line).context("Invalid --doc-converter")?,
        );
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
