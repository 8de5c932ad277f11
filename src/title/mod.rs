//! Title inference: rendered snippets in, ranked title guesses out.
//!
//! Three independent heuristics each look at the same snippet sequence and
//! emit one scored [`Detection`]; the ranker then orders them best-first.
//!
//! ```text
//! snippets ──┬─▶ font-size    (A) ──┐
//!            ├─▶ title-case   (B) ──┼─▶ rank ──▶ Vec<Detection>
//!            └─▶ first-title  (C) ──┘
//! ```
//!
//! Everything here is synchronous and pure, so the engine can be exercised
//! with hand-written snippet fixtures and no renderer at all.

pub mod case;
pub mod detect;
pub mod rank;

pub use case::{is_title_case, title_case};
pub use detect::{candidate_snippets, detect_by_first_title, detect_by_font_size, detect_by_title_case};
pub use rank::{best_title, rank};

use serde::{Deserialize, Serialize};
use std::fmt;

/// One text fragment of a rendered page, with the style facts the
/// heuristics look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    /// Lower-cased element name, e.g. `h1`, `p`, `span`.
    pub tag: String,
    /// Computed font weight is one of `bold, bolder, 600 … 900`.
    pub bold: bool,
    /// Computed font size in whole pixels.
    pub size: u32,
    /// Trimmed, whitespace-collapsed text content.
    pub text: String,
}

impl Snippet {
    pub fn new(tag: impl Into<String>, bold: bool, size: u32, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            bold,
            size,
            text: text.into(),
        }
    }
}

/// Which heuristic produced a [`Detection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionSource {
    #[serde(rename = "font-size")]
    FontSize,
    #[serde(rename = "title-case")]
    TitleCase,
    #[serde(rename = "first-title")]
    FirstTitle,
}

impl DetectionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DetectionSource::FontSize => "font-size",
            DetectionSource::TitleCase => "title-case",
            DetectionSource::FirstTitle => "first-title",
        }
    }
}

impl fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single heuristic's verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// 0–100; 0 means the heuristic found no usable signal.
    pub confidence: u8,
    /// The winning snippet, if any.
    pub snippet: Option<Snippet>,
    pub source: DetectionSource,
}

impl Detection {
    /// A verdict with no usable signal.
    pub fn none(source: DetectionSource) -> Self {
        Self {
            confidence: 0,
            snippet: None,
            source,
        }
    }

    /// Text of the winning snippet, if any.
    pub fn title(&self) -> Option<&str> {
        self.snippet.as_ref().map(|s| s.text.as_str())
    }
}

/// Run every heuristic over `snippets` and rank the verdicts best-first.
///
/// Heuristics run in a fixed order (font size, unique Title Case, first
/// Title Case), and that order decides ties.
pub fn infer(snippets: &[Snippet]) -> Vec<Detection> {
    rank(vec![
        detect_by_font_size(snippets),
        detect_by_title_case(snippets),
        detect_by_first_title(snippets),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fox_fixture() -> Vec<Snippet> {
        vec![
            Snippet::new("h1", false, 24, "The Quick Brown Fox"),
            Snippet::new("p", false, 12, "some body text here now"),
        ]
    }

    #[test]
    fn fox_fixture_scores() {
        let ranked = infer(&fox_fixture());
        let by = |src| ranked.iter().find(|d| d.source == src).unwrap();

        assert_eq!(by(DetectionSource::FontSize).confidence, 100);
        assert_eq!(by(DetectionSource::TitleCase).confidence, 100);
        assert_eq!(by(DetectionSource::FirstTitle).confidence, 90);
        assert_eq!(best_title(&ranked), Some("The Quick Brown Fox"));
    }

    #[test]
    fn fox_fixture_order_is_stable() {
        let ranked = infer(&fox_fixture());
        let sources: Vec<_> = ranked.iter().map(|d| d.source).collect();
        assert_eq!(
            sources,
            vec![
                DetectionSource::FontSize,
                DetectionSource::TitleCase,
                DetectionSource::FirstTitle
            ]
        );
    }

    #[test]
    fn empty_input_yields_three_silent_detections() {
        let ranked = infer(&[]);
        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|d| d.confidence == 0 && d.snippet.is_none()));
        assert_eq!(best_title(&ranked), None);
    }

    #[test]
    fn detection_serialises_with_source_tag() {
        let d = Detection {
            confidence: 80,
            snippet: Some(Snippet::new("h2", true, 18, "Getting Started")),
            source: DetectionSource::FontSize,
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["source"], "font-size");
        assert_eq!(json["snippet"]["text"], "Getting Started");
        assert_eq!(json["confidence"], 80);
    }
}
