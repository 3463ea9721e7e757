#![allow(clippy::let_and_return)]
#![allow(clippy::len_without_is_empty)]
#![warn(clippy::cast_lossless)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::todo)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::unimplemented)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::panic)]
#![allow(clippy::doc_markdown)]

//! # Overview
//! `chroma_border_lib` finds the rectangle of real video content inside a solid-colored border,
//! such as a green-screen frame around a clip, so that the border can be cropped away.
//!
//! Borders that are not a roughly uniform color, or that are not axis-aligned rectangles, are
//! not detected.
//!
//! # High Level API
//! ```rust,no_run
//! use chroma_border_lib::{execute_crop, BorderCropDetector};
//!
//! let detector = BorderCropDetector::default();
//! let detection = detector.detect("keyed_clip.mp4").unwrap();
//!
//! // ffmpeg's crop filter arguments
//! let (x, y, width, height) = detection.rect.as_view_args();
//! println!("crop={width}:{height}:{x}:{y}");
//!
//! if detection.border_detected() {
//!     execute_crop("keyed_clip.mp4", "cropped.mp4", &detection.rect, false).unwrap();
//! }
//! ```
//!
//! Frames that are already in memory can be searched with
//! [`BorderCropDetector::detect_source`] and a [`FrameSeq`].
//!
//! # Prerequisites
//! Videos are decoded by calling Ffmpeg and Ffprobe from the command line, so both must be
//! installed and visible on the command line.
//!
//! # How it works
//! A handful of frames (every `frame_count / 4`th frame) are sampled from the video. For each
//! sampled frame:
//!
//! 1. Every pixel whose color matches the key color is marked as border ([`BorderSegmenter`]).
//!    A pixel matches if either its brightness-normalized color or its raw color falls within
//!    a range.
//! 2. Canny edge detection is run over the border mask ([`CannyEdges`]).
//! 3. A hough transform finds straight lines along the edges ([`HoughLines`]).
//! 4. Lines are sorted into vertical and horizontal, and diagonal lines are thrown away
//!    ([`LineClassifier`]).
//!
//! Lines from all sampled frames are then pooled. Any line that does not have a near-duplicate
//! (in practice, the same edge detected in another frame or twice in the same frame) is
//! assumed to come from the content rather than the border and is dropped ([`filter_lines`]).
//!
//! Finally each remaining line is intersected with the frame edges. Lines in the left half of
//! the frame push the left edge of the crop inwards, and so on ([`resolve_crop`]). If no border
//! is found, the crop covers the whole frame.
//!
//! # Parallelism
//! With the default `parallel` feature, sampled frames are analysed on the rayon thread pool.

mod crop_exec;
mod crop_rect;
mod definitions;
mod detector;
mod error;
mod extract;
mod frame_source;
mod geometry;
mod line;
mod options;
mod outliers;
mod sampler;
mod segment;

pub use crop_exec::execute_crop;
pub use crop_rect::CropRect;
pub use definitions::*;
pub use detector::{BorderCropDetector, Detection};
pub use error::Error;
pub use extract::{CannyEdges, EdgeExtractor, EdgeMap, HoughLines, LineExtractor};
pub use frame_source::{FfmpegFrameSource, FrameSeq, FrameSource};
pub use geometry::{resolve_crop, x_intercept, y_intercept, Resolved};
pub use line::{Line, LineBuckets, LineClassifier, Orientation};
pub use options::DetectionOptions;
pub use outliers::{filter_lines, NeighbourSimilarity, SimilarityTest};
pub use sampler::{SampleSchedule, Sampler};
pub use segment::{normalize_chromaticity, BorderMask, BorderSegmenter, ChannelRange};
