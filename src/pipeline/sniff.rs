//! File-type sniffing: turn an uploaded file into a human-readable type label.
//!
//! The approval stage only substring-matches the label, so the exact wording
//! matters: labels follow libmagic's phrasing (`PDF document, version 1.4`,
//! `Microsoft Word 2007+`, `ASCII text`) so that a label produced by any
//! libmagic-backed sniffer is interchangeable with ours.

use crate::error::DocTitleError;
use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// How many leading bytes are inspected. OOXML containers need more than
/// the first local header to be told apart from a plain zip.
const SNIFF_BYTES: u64 = 64 * 1024;

/// Classifies a file on disk.
#[async_trait]
pub trait TypeSniffer: Send + Sync {
    /// Return a human-readable type label for the file at `path`.
    async fn detect(&self, path: &Path) -> Result<String, DocTitleError>;
}

/// Magic-byte sniffer backed by the `infer` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct MagicSniffer;

#[async_trait]
impl TypeSniffer for MagicSniffer {
    async fn detect(&self, path: &Path) -> Result<String, DocTitleError> {
        let failed = |e: std::io::Error| DocTitleError::TypeDetectionFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let file = tokio::fs::File::open(path).await.map_err(failed)?;
        let mut head = Vec::with_capacity(8192);
        file.take(SNIFF_BYTES)
            .read_to_end(&mut head)
            .await
            .map_err(failed)?;

        let label = describe(&head);
        debug!("Sniffed {}: {}", path.display(), label);
        Ok(label)
    }
}

/// Describe leading file bytes the way libmagic would.
pub fn describe(head: &[u8]) -> String {
    if head.is_empty() {
        return "empty".to_string();
    }

    if let Some(kind) = infer::get(head) {
        return match kind.mime_type() {
            "application/pdf" => pdf_label(head),
            "application/msword" => {
                "Composite Document File V2 Document, Microsoft Word".to_string()
            }
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                "Microsoft Word 2007+".to_string()
            }
            "application/rtf" => "Rich Text Format data".to_string(),
            other => format!("{} data ({})", kind.extension().to_uppercase(), other),
        };
    }

    match std::str::from_utf8(head) {
        Ok(text) => text_label(text),
        // A multi-byte character cut off by the sniff window is still text.
        Err(e) if e.error_len().is_none() => text_label(&String::from_utf8_lossy(head)),
        Err(_) => "data".to_string(),
    }
}

fn pdf_label(head: &[u8]) -> String {
    let version: String = head
        .strip_prefix(b"%PDF-")
        .unwrap_or_default()
        .iter()
        .take_while(|b| b.is_ascii_digit() || **b == b'.')
        .map(|b| *b as char)
        .collect();

    if version.is_empty() {
        "PDF document".to_string()
    } else {
        format!("PDF document, version {version}")
    }
}

fn text_label(text: &str) -> String {
    if text.is_ascii() {
        "ASCII text".to_string()
    } else {
        "UTF-8 Unicode text".to_string()
    }
}
