//! Format dispatch and external HTML converters.
//!
//! Conversion itself is delegated to command-line tools (pdf2htmlEX for PDF,
//! mammoth for Word by default); this module only decides which tool runs,
//! bounds how long it may run, and checks that it really produced the
//! artifact.

use crate::config::{ConverterCommand, PipelineConfig};
use crate::error::DocTitleError;
use crate::job::FormatCode;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Converts one source file into an HTML file at `target`.
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(&self, source: &Path, target: &Path) -> Result<(), DocTitleError>;
}

/// Runs an external program to convert a file.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    format: FormatCode,
    command: ConverterCommand,
    timeout_secs: u64,
}

impl CommandConverter {
    pub fn new(format: FormatCode, command: ConverterCommand, timeout_secs: u64) -> Self {
        Self {
            format,
            command,
            timeout_secs,
        }
    }
}

#[async_trait]
impl Converter for CommandConverter {
    async fn convert(&self, source: &Path, target: &Path) -> Result<(), DocTitleError> {
        let args = self.command.expand_args(source, target);
        debug!("Running {} {:?}", self.command.program, args);

        let mut cmd = Command::new(&self.command.program);
        cmd.args(&args).kill_on_drop(true);

        let output = tokio::time::timeout(Duration::from_secs(self.timeout_secs), cmd.output())
            .await
            .map_err(|_| DocTitleError::ConversionTimeout {
                format: self.format,
                secs: self.timeout_secs,
            })?
            .map_err(|e| DocTitleError::ConversionFailed {
                format: self.format,
                reason: format!("Failed to execute '{}': {}", self.command.program, e),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(DocTitleError::ConversionFailed {
                format: self.format,
                reason: format!("{} ({}): {}", self.command.program, output.status, stderr.trim()),
            });
        }
        if !stderr.trim().is_empty() {
            warn!("{} messages: {}", self.command.program, stderr.trim());
        }
        Ok(())
    }
}

/// Looks up the converter for an approved format code.
#[derive(Clone, Default)]
pub struct FormatDispatcher {
    converters: HashMap<FormatCode, Arc<dyn Converter>>,
}

impl FormatDispatcher {
    /// Dispatcher with no converters registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Dispatcher wired to the external commands of `config`.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let timeout = config.convert_timeout_secs;
        Self::empty()
            .with(
                FormatCode::Pdf,
                Arc::new(CommandConverter::new(FormatCode::Pdf, config.pdf_converter.clone(), timeout)),
            )
            .with(
                FormatCode::Doc,
                Arc::new(CommandConverter::new(FormatCode::Doc, config.doc_converter.clone(), timeout)),
            )
    }

    /// Register (or replace) the converter for `format`.
    pub fn with(mut self, format: FormatCode, converter: Arc<dyn Converter>) -> Self {
        self.converters.insert(format, converter);
        self
    }

    pub fn supports(&self, format: FormatCode) -> bool {
        self.converters.contains_key(&format)
    }

    /// Convert `source` into `target` with the converter for `format`.
    ///
    /// Any file already at `target` is removed first. Fails when no converter
    /// is registered, when the converter fails, and when it reports success
    /// without leaving a file at `target`.
    pub async fn dispatch(
        &self,
        format: FormatCode,
        source: &Path,
        target: &Path,
    ) -> Result<(), DocTitleError> {
        let converter = self
            .converters
            .get(&format)
            .ok_or_else(|| DocTitleError::ConversionFailed {
                format,
                reason: format!("Unable to convert unknown file type: {format}"),
            })?;

        match tokio::fs::remove_file(target).await {
            Ok(()) => debug!("Removed stale artifact {}", target.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(DocTitleError::ConversionFailed {
                    format,
                    reason: format!("cannot remove stale artifact '{}': {e}", target.display()),
                })
            }
        }

        converter.convert(source, target).await?;

        match tokio::fs::metadata(target).await {
            Ok(meta) if meta.is_file() => {
                info!("Converted {} → {} ({} bytes)", source.display(), target.display(), meta.len());
                Ok(())
            }
            _ => Err(DocTitleError::ConversionFailed {
                format,
                reason: format!("converter produced no file at '{}'", target.display()),
            }),
        }
    }
}

impl std::fmt::Debug for FormatDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut formats: Vec<_> = self.converters.keys().map(|k| k.as_str()).collect();
        formats.sort_unstable();
        f.debug_struct("FormatDispatcher")
            .field("formats", &formats)
            .finish()
    }
}
