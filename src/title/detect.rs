//! The three title heuristics.
//!
//! Each detector applies [`candidate_snippets`] on its own; nothing is cached
//! between them so each one can be reasoned about (and tested) in isolation.

use super::case::is_title_case;
use super::{Detection, DetectionSource, Snippet};
use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;

/// Accepted title length, in characters.
pub const TITLE_CHAR_RANGE: RangeInclusive<usize> = 1..=80;

/// Accepted title length, in whitespace-delimited words.
pub const TITLE_WORD_RANGE: RangeInclusive<usize> = 2..=30;

/// Snippets short enough, and wordy enough, to be a title.
pub fn candidate_snippets(snippets: &[Snippet]) -> Vec<&Snippet> {
    snippets
        .iter()
        .filter(|s| {
            let chars = s.text.chars().count();
            let words = s.text.split_whitespace().count();
            TITLE_CHAR_RANGE.contains(&chars) && TITLE_WORD_RANGE.contains(&words)
        })
        .collect()
}

/// Heuristic A: the snippet furthest above the mean font size.
///
/// | Largest size is… | Title Case | Otherwise |
/// |------------------|-----------:|----------:|
/// | unique           | 100        | 80        |
/// | shared by `n`    | 80         | `min(80 − 2n, 20)`, floored at 0 |
pub fn detect_by_font_size(snippets: &[Snippet]) -> Detection {
    let mut candidates = candidate_snippets(snippets);
    if candidates.is_empty() {
        return Detection::none(DetectionSource::FontSize);
    }

    let mut frequency: HashMap<u32, usize> = HashMap::new();
    for s in &candidates {
        *frequency.entry(s.size).or_default() += 1;
    }
    let mean = candidates.iter().map(|s| f64::from(s.size)).sum::<f64>() / candidates.len() as f64;

    // Stable: equal sizes keep document order, so the earliest wins.
    let distance = |s: &Snippet| f64::from(s.size) - mean;
    candidates.sort_by(|a, b| distance(b).total_cmp(&distance(a)));
    let top = candidates[0];

    let shared_by = frequency.get(&top.size).copied().unwrap_or(1);
    let title_cased = is_title_case(&top.text);

    let confidence = match (shared_by, title_cased) {
        (1, true) => 100,
        (1, false) => 80,
        (_, true) => 80,
        (n, false) => {
            let score = 80_i64 - 2 * n as i64;
            score.min(20).max(0) as u8
        }
    };

    Detection {
        confidence,
        snippet: Some(top.clone()),
        source: DetectionSource::FontSize,
    }
}

/// Heuristic B: full confidence when exactly one distinct Title Case text
/// exists, no signal otherwise.
pub fn detect_by_title_case(snippets: &[Snippet]) -> Detection {
    let titles = distinct_title_case(snippets);
    match titles.as_slice() {
        [only] => Detection {
            confidence: 100,
            snippet: Some((*only).clone()),
            source: DetectionSource::TitleCase,
        },
        _ => Detection::none(DetectionSource::TitleCase),
    }
}

/// Heuristic C: the first Title Case text, less trusted the more
/// competitors it has: `max(100 − 10n, 10)`.
pub fn detect_by_first_title(snippets: &[Snippet]) -> Detection {
    let titles = distinct_title_case(snippets);
    let Some(first) = titles.first() else {
        return Detection::none(DetectionSource::FirstTitle);
    };

    let penalty = titles.len().saturating_mul(10);
    let confidence = 100_usize.saturating_sub(penalty).max(10) as u8;

    Detection {
        confidence,
        snippet: Some((*first).clone()),
        source: DetectionSource::FirstTitle,
    }
}

/// Title Case candidates, one per distinct text, in first-seen order.
fn distinct_title_case(snippets: &[Snippet]) -> Vec<&Snippet> {
    let mut seen: HashSet<&str> = HashSet::new();
    candidate_snippets(snippets)
        .into_iter()
        .filter(|s| is_title_case(&s.text))
        .filter(|s| seen.insert(s.text.as_str()))
        .collect()
}
