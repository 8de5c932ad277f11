//! Ranking of heuristic verdicts.

use super::Detection;

/// Order detections by descending confidence.
///
/// The sort is stable: detections with equal confidence keep the order in
/// which they were produced.
pub fn rank(mut detections: Vec<Detection>) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    detections
}

/// Text of the first ranked detection that carries a signal.
pub fn best_title(ranked: &[Detection]) -> Option<&str> {
    ranked
        .iter()
        .filter(|d| d.confidence > 0)
        .find_map(Detection::title)
}
