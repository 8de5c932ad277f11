//! Configuration types for document processing.
//!
//! Every knob the pipeline and queue read lives in [`PipelineConfig`], built
//! through [`PipelineConfigBuilder`]. The workspace directory in particular is
//! injected here rather than fixed in code, so tests and multi-tenant hosts
//! can point each pipeline at its own artifact store.

use crate::error::DocTitleError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration for the processing pipeline and its queue.
///
/// # Example
/// ```rust
/// use edgequake_doctitle::{PipelineConfig, ResultMode};
///
/// let config = PipelineConfig::builder()
///     .workspace_dir("/var/lib/doctitle")
///     .result_mode(ResultMode::BestTitle)
///     .render_timeout_secs(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.fallback_title, "Untitled");
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Directory holding converted HTML artifacts, one `<job_id>.html` each.
    /// Default: `./workspace`.
    pub workspace_dir: PathBuf,

    /// Base of the URL the renderer loads; the job id is appended.
    /// Default: `http://localhost:3000/view/`.
    pub view_base_url: String,

    /// Upper bound on one render call, in seconds. Default: 30.
    ///
    /// Jobs are serialised, so a renderer that never answers would stall
    /// every job queued behind it.
    pub render_timeout_secs: u64,

    /// Upper bound on one external converter run, in seconds. Default: 300.
    pub convert_timeout_secs: u64,

    /// Shape of a successful result. Default: [`ResultMode::Detections`].
    pub result_mode: ResultMode,

    /// Title reported when no heuristic has a signal. Default: `Untitled`.
    pub fallback_title: String,

    /// Capacity of the submission channel. Default: 64.
    ///
    /// Submitters wait (in order) once this many jobs are pending.
    pub queue_capacity: usize,

    /// External PDF → HTML converter.
    pub pdf_converter: ConverterCommand,

    /// External Word → HTML converter.
    pub doc_converter: ConverterCommand,

    /// Optional per-job progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::from("./workspace"),
            view_base_url: "http://localhost:3000/view/".to_string(),
            render_timeout_secs: 30,
            convert_timeout_secs: 300,
            result_mode: ResultMode::default(),
            fallback_title: "Untitled".to_string(),
            queue_capacity: 64,
            pdf_converter: ConverterCommand::default_pdf(),
            doc_converter: ConverterCommand::default_doc(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("workspace_dir", &self.workspace_dir)
            .field("view_base_url", &self.view_base_url)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("convert_timeout_secs", &self.convert_timeout_secs)
            .field("result_mode", &self.result_mode)
            .field("fallback_title", &self.fallback_title)
            .field("queue_capacity", &self.queue_capacity)
            .field("pdf_converter", &self.pdf_converter)
            .field("doc_converter", &self.doc_converter)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn JobProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// URL the renderer loads for `job_id`.
    pub fn view_url(&self, job_id: &str) -> String {
        if self.view_base_url.ends_with('/') {
            format!("{}{}", self.view_base_url, job_id)
        } else {
            format!("{}/{}", self.view_base_url, job_id)
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn workspace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.workspace_dir = dir.into();
        self
    }

    pub fn view_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.view_base_url = url.into();
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs;
        self
    }

    pub fn convert_timeout_secs(mut self, secs: u64) -> Self {
        self.config.convert_timeout_secs = secs;
        self
    }

    pub fn result_mode(mut self, mode: ResultMode) -> Self {
        self.config.result_mode = mode;
        self
    }

    pub fn fallback_title(mut self, title: impl Into<String>) -> Self {
        self.config.fallback_title = title.into();
        self
    }

    pub fn queue_capacity(mut self, n: usize) -> Self {
        self.config.queue_capacity = n.max(1);
        self
    }

    pub fn pdf_converter(mut self, cmd: ConverterCommand) -> Self {
        self.config.pdf_converter = cmd;
        self
    }

    pub fn doc_converter(mut self, cmd: ConverterCommand) -> Self {
        self.config.doc_converter = cmd;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, DocTitleError> {
        let c = &self.config;
        if c.workspace_dir.as_os_str().is_empty() {
            return Err(DocTitleError::InvalidConfig(
                "Workspace directory must not be empty".into(),
            ));
        }
        if !(c.view_base_url.starts_with("http://") || c.view_base_url.starts_with("https://")) {
            return Err(DocTitleError::InvalidConfig(format!(
                "View base URL must be http(s), got '{}'",
                c.view_base_url
            )));
        }
        if c.render_timeout_secs == 0 {
            return Err(DocTitleError::InvalidConfig(
                "Render timeout must be ≥ 1s".into(),
            ));
        }
        if c.convert_timeout_secs == 0 {
            return Err(DocTitleError::InvalidConfig(
                "Conversion timeout must be ≥ 1s".into(),
            ));
        }
        if c.pdf_converter.program.is_empty() || c.doc_converter.program.is_empty() {
            return Err(DocTitleError::InvalidConfig(
                "Converter commands need a program".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What a successful job reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultMode {
    /// Every heuristic's verdict, best-first. (default)
    #[default]
    Detections,
    /// Only the best title, or the fallback title.
    BestTitle,
}

/// An external converter invocation.
///
/// Arguments may reference the job's paths through placeholders:
///
/// | Placeholder     | Expands to |
/// |-----------------|------------|
/// | `{source}`      | uploaded file |
/// | `{target}`      | full artifact path |
/// | `{target_dir}`  | artifact directory |
/// | `{target_name}` | artifact file name |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ConverterCommand {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a whitespace-separated command line, e.g. `mammoth {source} {target}`.
    pub fn parse(line: &str) -> Result<Self, DocTitleError> {
        let mut parts = line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| DocTitleError::InvalidConfig("Converter command is empty".into()))?;
        Ok(Self::new(program, parts))
    }

    /// `pdf2htmlEX --dest-dir {target_dir} {source} {target_name}`
    pub fn default_pdf() -> Self {
        Self::new(
            "pdf2htmlEX",
            ["--dest-dir", "{target_dir}", "{source}", "{target_name}"],
        )
    }

    /// `mammoth {source} {target}`
    pub fn default_doc() -> Self {
        Self::new("mammoth", ["{source}", "{target}"])
    }

    /// Arguments with every placeholder expanded.
    pub fn expand_args(&self, source: &Path, target: &Path) -> Vec<String> {
        let source = source.to_string_lossy();
        let target_str = target.to_string_lossy();
        let target_dir = target
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| ".".to_string());
        let target_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.args
            .iter()
            .map(|arg| {
                arg.replace("{source}", &source)
                    .replace("{target_dir}", &target_dir)
                    .replace("{target_name}", &target_name)
                    .replace("{target}", &target_str)
            })
            .collect()
    }
}

impl fmt::Display for ConverterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.workspace_dir, PathBuf::from("./workspace"));
        assert_eq!(c.result_mode, ResultMode::Detections);
        assert_eq!(c.render_timeout_secs, 30);
        assert_eq!(c.queue_capacity, 64);
    }

    #[test]
    fn view_url_joins_job_id() {
        let c = PipelineConfig::default();
        assert_eq!(c.view_url("report"), "http://localhost:3000/view/report");

        let c = PipelineConfig::builder()
            .view_base_url("http://127.0.0.1:8080/view")
            .build()
            .unwrap();
        assert_eq!(c.view_url("a"), "http://127.0.0.1:8080/view/a");
    }

    #[test]
    fn build_rejects_zero_timeouts() {
        let err = PipelineConfig::builder().render_timeout_secs(0).build().unwrap_err();
        assert!(matches!(err, DocTitleError::InvalidConfig(_)));
        let err = PipelineConfig::builder().convert_timeout_secs(0).build().unwrap_err();
        assert!(matches!(err, DocTitleError::InvalidConfig(_)));
    }

    #[test]
    fn build_rejects_non_http_view_url() {
        let err = PipelineConfig::builder()
            .view_base_url("file:///tmp")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("file:///tmp"));
    }

    #[test]
    fn queue_capacity_is_at_least_one() {
        let c = PipelineConfig::builder().queue_capacity(0).build().unwrap();
        assert_eq!(c.queue_capacity, 1);
    }

    #[test]
    fn converter_command_parse_and_expand() {
        let cmd = ConverterCommand::parse("pdf2htmlEX --dest-dir {target_dir} {source} {target_name}")
            .unwrap();
        assert_eq!(cmd, ConverterCommand::default_pdf());

        let args = cmd.expand_args(Path::new("/up/abc"), Path::new("/ws/report.html"));
        assert_eq!(args, vec!["--dest-dir", "/ws", "/up/abc", "report.html"]);

        let doc = ConverterCommand::default_doc();
        let args = doc.expand_args(Path::new("/up/abc"), Path::new("/ws/report.html"));
        assert_eq!(args, vec!["/up/abc", "/ws/report.html"]);
    }

    #[test]
    fn converter_command_parse_rejects_empty() {
        assert!(ConverterCommand::parse("   ").is_err());
    }

    #[test]
    fn converter_command_display() {
        assert_eq!(ConverterCommand::default_doc().to_string(), "mammoth {source} {target}");
    }

    #[test]
    fn debug_hides_callback() {
        let dbg = format!("{:?}", PipelineConfig::default());
        assert!(dbg.contains("progress_callback: None"), "got: {dbg}");
    }
}
