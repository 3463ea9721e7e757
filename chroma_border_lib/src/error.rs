use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Orientation;

/// Errors occurring while detecting a border or cropping a video.
///
/// [`Error::FrameDecode`], [`Error::ResolutionMismatch`] and [`Error::DegenerateLine`] are
/// recovered from during detection. They are never returned from
/// [`BorderCropDetector::detect`](crate::BorderCropDetector::detect), but are collected into
/// [`Detection::failures`](crate::Detection::failures) so callers can inspect them.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Error {
    /// Ffprobe could not read the file, or it has no video stream.
    #[error("File is not a video: {0}")]
    NotVideo(String),

    /// The video could not be processed for some other reason, e.g ffmpeg is not installed.
    #[error("Video processing error: {0}")]
    VidProc(String),

    /// The container does not declare a frame count and it could not be estimated.
    #[error("Unable to determine the number of frames in the video")]
    UnknownFrameCount,

    /// A sampled frame failed to decode, or the video ended before it was reached.
    #[error("Failed to decode frame {index}: {reason}")]
    FrameDecode { index: u64, reason: String },

    /// A decoded frame did not have the resolution that ffprobe declared for the video.
    #[error("Frame {index} has resolution {actual:?}, expected {expected:?}")]
    ResolutionMismatch {
        index: u64,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Not a single sampled frame could be decoded.
    #[error("No sampled frames could be decoded")]
    NoFramesDecoded,

    /// A line is (numerically) parallel to the frame edge it was to be intersected with.
    #[error("{orientation} line (r: {r}, theta: {theta}) has no usable intercept with the frame edge")]
    DegenerateLine {
        orientation: Orientation,
        r: f64,
        theta: f64,
    },

    /// The supplied [`DetectionOptions`](crate::DetectionOptions) cannot be used.
    #[error("Invalid detection options: {0}")]
    InvalidOptions(String),

    /// Ffmpeg failed to write the cropped video.
    #[error("Failed to crop video: {0}")]
    CropExecution(String),
}

impl Error {
    /// True for conditions that only cost a single sample or line during detection.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FrameDecode { .. } | Self::ResolutionMismatch { .. } | Self::DegenerateLine { .. }
        )
    }
}
