use serde::{Deserialize, Serialize};

use crate::definitions::{DEFAULT_SIMILAR_R, DEFAULT_SIMILAR_THETA_DEGREES};
use crate::Line;

/// Decides whether two detected lines are detections of the same edge.
pub trait SimilarityTest: Send + Sync {
    fn is_similar(&self, a: &Line, b: &Line) -> bool;
}

/// Lines are similar when both their angles and their distances are strictly closer than the
/// given thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighbourSimilarity {
    /// Unit: Radians
    pub max_theta_diff: f64,
    /// Unit: Pixels
    pub max_r_diff: f64,
}

impl Default for NeighbourSimilarity {
    fn default() -> Self {
        Self {
            max_theta_diff: DEFAULT_SIMILAR_THETA_DEGREES.to_radians(),
            max_r_diff: DEFAULT_SIMILAR_R,
        }
    }
}

impl SimilarityTest for NeighbourSimilarity {
    fn is_similar(&self, a: &Line, b: &Line) -> bool {
        (a.theta() - b.theta()).abs() < self.max_theta_diff && (a.r() - b.r()).abs() < self.max_r_diff
    }
}

/// Remove lines that were only detected once.
///
/// A real border edge shows up in every sampled frame, and usually more than once per frame,
/// whereas edges of foreground objects that happen to be key-colored tend to be one-offs.
/// Lines are sorted by `r` (stably, so equal `r` keep their input order) and a line survives
/// when it is similar to the line immediately before or after it.
pub fn filter_lines<S: SimilarityTest + ?Sized>(lines: &[Line], test: &S) -> Vec<Line> {
    let mut sorted = lines.to_vec();
    sorted.sort_by(|a, b| a.r().total_cmp(&b.r()));

    let has_similar_neighbour = |idx: usize| {
        let line = &sorted[idx];
        let prev = idx.checked_sub(1).and_then(|prev_idx| sorted.get(prev_idx));
        let next = sorted.get(idx + 1);

        prev.is_some_and(|prev| test.is_similar(line, prev))
            || next.is_some_and(|next| test.is_similar(line, next))
    };

    let ret = (0..sorted.len())
        .filter(|&idx| has_similar_neighbour(idx))
        .map(|idx| sorted[idx])
        .collect();

    ret
}
