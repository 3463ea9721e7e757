use std::f64::consts::PI;

use crate::ChannelRange;

/// Border pixels after each pixel has been divided by its euclidean norm and rescaled to 0-255.
/// This matches a saturated green key color regardless of how brightly it is lit.
///
/// Channel order: R, G, B. Bounds are inclusive.
pub const DEFAULT_NORMALIZED_RANGE: ChannelRange = ChannelRange::new([0, 180, 100], [80, 255, 200]);

/// Border pixels matched on their raw value. Catches brightly lit key color whose normalized
/// value drifts out of [`DEFAULT_NORMALIZED_RANGE`].
///
/// Channel order: R, G, B. Bounds are inclusive.
pub const DEFAULT_RAW_RANGE: ChannelRange = ChannelRange::new([60, 150, 90], [150, 255, 200]);

/// Hysteresis thresholds for the canny edge detector. Because the border mask is binary, any real
/// mask boundary comfortably exceeds both.
pub const DEFAULT_CANNY_LOW: f32 = 150.0;
pub const DEFAULT_CANNY_HIGH: f32 = 200.0;

/// Distance resolution of the hough accumulator.
///
/// Unit: Pixels
pub const DEFAULT_RHO_RESOLUTION: f64 = 1.0;

/// Angle resolution of the hough accumulator (a quarter of a degree)
///
/// Unit: Radians
pub const DEFAULT_THETA_RESOLUTION: f64 = PI / 180.0 / 4.0;

/// Minimum number of edge pixels that must vote for a line before it is reported. Lines shorter
/// than this (roughly, in pixels) are never detected, so very small videos may need a lower value.
pub const DEFAULT_VOTE_THRESHOLD: u32 = 180;

/// Lines within this angle of the vertical (or horizontal) axis are considered vertical (or
/// horizontal). Everything else is discarded.
///
/// Unit: Degrees
pub const DEFAULT_CLASSIFY_EPS_DEGREES: f64 = 5.0;

/// Two lines are near-duplicates when their angles differ by less than this...
///
/// Unit: Degrees
pub const DEFAULT_SIMILAR_THETA_DEGREES: f64 = 1.0;

/// ...and their distances from the origin differ by less than this.
///
/// Unit: Pixels
pub const DEFAULT_SIMILAR_R: f64 = 5.0;

/// Upper bound on the time spent decoding a video before the decoder is killed.
///
/// Unit: Seconds
pub const DEFAULT_DECODE_TIMEOUT_SECS: u64 = 600;

//Every (frame_count / SAMPLES_PER_VIDEO)th frame is sampled, so 4 or 5 frames per video.
pub const SAMPLES_PER_VIDEO: u64 = 4;

//cos/sin below this makes an intercept meaningless.
pub(crate) const DEGENERATE_DIVISOR: f64 = 1e-9;

//intercepts within this distance of an integer are rounded to it before truncation.
pub(crate) const INTERCEPT_SNAP: f64 = 1e-6;
