//! Turning a border mask into candidate lines.
//!
//! Both stages sit behind a trait so that they can be swapped out, e.g for a different edge
//! detector or a probabilistic line transform.

mod canny;
mod hough;

use image::GrayImage;

use crate::{BorderMask, Line};

pub use canny::CannyEdges;
pub use hough::HoughLines;

/// A binary image where edge pixels are 255 and everything else is 0.
pub type EdgeMap = GrayImage;

pub trait EdgeExtractor: Send + Sync {
    fn edges(&self, mask: &BorderMask) -> EdgeMap;
}

pub trait LineExtractor: Send + Sync {
    /// Lines supported by the edge pixels, strongest first.
    fn lines(&self, edges: &EdgeMap) -> Vec<Line>;
}
