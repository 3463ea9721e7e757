use serde::{Deserialize, Serialize};

use super::{EdgeExtractor, EdgeMap};
use crate::definitions::{DEFAULT_CANNY_HIGH, DEFAULT_CANNY_LOW};
use crate::BorderMask;

/// Canny edge detection using a 3x3 sobel kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CannyEdges {
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl Default for CannyEdges {
    fn default() -> Self {
        Self {
            low_threshold: DEFAULT_CANNY_LOW,
            high_threshold: DEFAULT_CANNY_HIGH,
        }
    }
}

impl EdgeExtractor for CannyEdges {
    fn edges(&self, mask: &BorderMask) -> EdgeMap {
        let (width, height) = mask.dimensions();

        //non-maximum suppression needs at least one interior pixel.
        if width < 3 || height < 3 {
            return EdgeMap::new(width, height);
        }

        //imageproc asserts on the ordering of the thresholds.
        let low = self.low_threshold.min(self.high_threshold);
        let high = self.low_threshold.max(self.high_threshold);

        imageproc::edges::canny(mask.as_gray(), low, high)
    }
}

#[cfg(test)]
mod test {
    use image::{Luma, Rgb, RgbImage};

    use super::*;
    use crate::{BorderSegmenter, CropRect};

    fn mask_with_hole(orig_res: (u32, u32), hole: CropRect) -> BorderMask {
        let (width, height) = orig_res;
        let mut frame = RgbImage::from_pixel(width, height, Rgb([40, 220, 150]));
        for (x, y) in hole.enumerate_coords() {
            frame.put_pixel(x, y, Rgb([200, 40, 40]));
        }
        BorderSegmenter::default().segment(&frame)
    }

    #[test]
    fn test_uniform_mask_has_no_edges() {
        let mask = mask_with_hole((40, 40), CropRect::from_corners((40, 40), 0, 0, 0, 0).unwrap());
        assert_eq!(mask.border_pixel_count(), 40 * 40);

        let edges = CannyEdges::default().edges(&mask);
        assert_eq!(edges.dimensions(), (40, 40));
        assert!(edges.pixels().all(|Luma([p])| *p == 0));
    }

    #[test]
    fn test_edges_follow_the_hole() {
        let hole = CropRect::from_corners((40, 40), 10, 10, 30, 30).unwrap();
        let mask = mask_with_hole((40, 40), hole);

        let edges = CannyEdges::default().edges(&mask);

        let edge_pixels = edges
            .enumerate_pixels()
            .filter(|(_, _, Luma([p]))| *p > 0)
            .map(|(x, y, _)| (i64::from(x), i64::from(y)))
            .collect::<Vec<_>>();
        assert!(edge_pixels.len() > 40);

        //every edge pixel is within a couple of pixels of the boundary of the hole
        let dist_from_boundary = |(x, y): (i64, i64)| {
            let dx = (x - 10).abs().min((x - 29).abs());
            let dy = (y - 10).abs().min((y - 29).abs());
            let inside_x = (8..=31).contains(&x);
            let inside_y = (8..=31).contains(&y);
            match (inside_x, inside_y) {
                (true, true) => dx.min(dy),
                _ => i64::MAX,
            }
        };
        for px in edge_pixels {
            assert!(dist_from_boundary(px) <= 2, "stray edge pixel at {px:?}");
        }
    }

    #[test]
    fn test_tiny_mask() {
        let mask = mask_with_hole((2, 2), CropRect::full_frame((2, 2)));
        let edges = CannyEdges::default().edges(&mask);
        assert_eq!(edges.dimensions(), (2, 2));
    }

    #[test]
    fn test_swapped_thresholds() {
        let hole = CropRect::from_corners((20, 20), 5, 5, 15, 15).unwrap();
        let mask = mask_with_hole((20, 20), hole);

        let normal = CannyEdges::default().edges(&mask);
        let swapped = CannyEdges {
            low_threshold: DEFAULT_CANNY_HIGH,
            high_threshold: DEFAULT_CANNY_LOW,
        }
        .edges(&mask);
        assert_eq!(normal, swapped);
    }
}
