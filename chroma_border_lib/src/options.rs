use serde::{Deserialize, Serialize};

use crate::definitions::DEFAULT_DECODE_TIMEOUT_SECS;
use crate::{BorderSegmenter, CannyEdges, Error, HoughLines, LineClassifier, NeighbourSimilarity};

/// Everything that can be tuned about border detection. The defaults suit a green key color
/// and videos of at least a few hundred pixels in each dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionOptions {
    /// Which colors count as border.
    pub segmenter: BorderSegmenter,

    /// Edge detection on the border mask.
    pub edges: CannyEdges,

    /// Line detection on the edges. `vote_threshold` is roughly the minimum length in pixels of
    /// a border edge, so lower it for small videos.
    pub hough: HoughLines,

    /// How far from the axes lines may be tilted.
    pub classifier: LineClassifier,

    /// When two detected lines count as the same edge.
    pub similarity: NeighbourSimilarity,

    /// Give up decoding the video after this long.
    ///
    /// Unit: Seconds
    pub decode_timeout_secs: u64,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            segmenter: BorderSegmenter::default(),
            edges: CannyEdges::default(),
            hough: HoughLines::default(),
            classifier: LineClassifier::default(),
            similarity: NeighbourSimilarity::default(),
            decode_timeout_secs: DEFAULT_DECODE_TIMEOUT_SECS,
        }
    }
}

impl DetectionOptions {
    /// Reject options that would make detection meaningless, or would need an absurd amount of
    /// memory.
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |msg: &str| Err(Error::InvalidOptions(msg.to_string()));

        if !self.segmenter.normalized.is_satisfiable() || !self.segmenter.raw.is_satisfiable() {
            return invalid("a color range has a low bound above its high bound");
        }

        let edges = &self.edges;
        if !edges.low_threshold.is_finite() || !edges.high_threshold.is_finite() {
            return invalid("edge thresholds must be finite");
        }

        //one accumulator cell per pixel of distance and per hundredth of a degree at most.
        let hough = &self.hough;
        if !(hough.rho_resolution.is_finite() && hough.rho_resolution >= 0.01) {
            return invalid("rho resolution must be at least 0.01 pixels");
        }
        if !(hough.theta_resolution.is_finite() && hough.theta_resolution >= 0.01f64.to_radians()) {
            return invalid("theta resolution must be at least 0.01 degrees");
        }

        let eps = self.classifier.eps;
        if !(eps > 0.0 && eps <= 45f64.to_radians()) {
            return invalid("classifier eps must be in (0, 45] degrees");
        }

        let sim = &self.similarity;
        if sim.max_theta_diff.is_nan() || sim.max_r_diff.is_nan() {
            return invalid("similarity thresholds must be numbers");
        }

        Ok(())
    }
}
