#![allow(clippy::let_and_return)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::unwrap_used)]

//! A thin wrapper around the `ffmpeg` and `ffprobe` command line tools.
//!
//! * [`VideoInfo`] reads the resolution, duration and frame count of a video with ffprobe.
//! * [`FfmpegFrameReaderBuilder`] spawns ffmpeg and yields decoded frames as
//!   [`image::RgbImage`].
//! * [`crop_video`] runs ffmpeg's `crop` filter to write a cropped copy of a video.
//!
//! Ffmpeg and Ffprobe must be installed and visible on the command line.

mod ffmpeg_error_kind;
mod ffmpeg_ops;
mod ffmpeg_stats;

pub use ffmpeg_error_kind::FfmpegError;
pub use ffmpeg_ops::{
    crop_filter_args, crop_video, ffmpeg_and_ffprobe_are_callable, get_video_stats,
    FfmpegFrameIterRgb, FfmpegFrameReaderBuilder,
};
pub use ffmpeg_stats::{VideoInfo, VideoInfoError};
