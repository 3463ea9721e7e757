use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::definitions::{DEFAULT_NORMALIZED_RANGE, DEFAULT_RAW_RANGE};

/// An inclusive, channel-wise range of RGB values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRange {
    pub low: [u8; 3],
    pub high: [u8; 3],
}

impl ChannelRange {
    pub const fn new(low: [u8; 3], high: [u8; 3]) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, Rgb(pix): Rgb<u8>) -> bool {
        pix.iter()
            .zip(self.low.iter().zip(self.high.iter()))
            .all(|(val, (low, high))| (*low..=*high).contains(val))
    }

    /// False when a low bound exceeds its high bound, as nothing can ever match.
    pub fn is_satisfiable(&self) -> bool {
        self.low.iter().zip(self.high.iter()).all(|(low, high)| low <= high)
    }
}

/// Divide a pixel by its euclidean norm and rescale to 0-255, truncating each channel.
/// This removes brightness so that a key color can be matched however well it is lit.
/// Black has no direction, so it maps to black.
pub fn normalize_chromaticity(Rgb(pix): Rgb<u8>) -> Rgb<u8> {
    let norm = pix
        .iter()
        .map(|&c| f64::from(c) * f64::from(c))
        .sum::<f64>()
        .sqrt();

    if norm == 0.0 {
        return Rgb([0, 0, 0]);
    }

    //always within 0.0..=255.0
    Rgb(pix.map(|c| (f64::from(c) / norm * 255.0) as u8))
}

/// A binary image with the dimensions of the frame it came from. Border pixels are 255 and
/// everything else is 0.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderMask(GrayImage);

impl BorderMask {
    pub const BORDER: u8 = 255;
    pub const CONTENT: u8 = 0;

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    /// Panics if (x, y) is out of bounds, like [`GrayImage::get_pixel`].
    pub fn is_border(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y).0[0] == Self::BORDER
    }

    pub fn border_pixel_count(&self) -> usize {
        self.0.pixels().filter(|Luma([p])| *p == Self::BORDER).count()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_inner(self) -> GrayImage {
        self.0
    }
}

/// Decides which pixels of a frame belong to the border. A pixel is part of the border when
/// either its normalized color falls in `normalized`, or its raw value falls in `raw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderSegmenter {
    pub normalized: ChannelRange,
    pub raw: ChannelRange,
}

impl Default for BorderSegmenter {
    fn default() -> Self {
        Self {
            normalized: DEFAULT_NORMALIZED_RANGE,
            raw: DEFAULT_RAW_RANGE,
        }
    }
}

impl BorderSegmenter {
    pub fn is_border(&self, pix: Rgb<u8>) -> bool {
        self.normalized.contains(normalize_chromaticity(pix)) || self.raw.contains(pix)
    }

    pub fn segment(&self, frame: &RgbImage) -> BorderMask {
        let (width, height) = frame.dimensions();
        let mut mask = GrayImage::new(width, height);

        for (Luma([dst]), src) in mask.pixels_mut().zip(frame.pixels()) {
            *dst = if self.is_border(*src) {
                BorderMask::BORDER
            } else {
                BorderMask::CONTENT
            };
        }

        BorderMask(mask)
    }
}
