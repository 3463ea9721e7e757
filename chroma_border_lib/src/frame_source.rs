use std::path::Path;

use ffmpeg_cmdline_utils::{FfmpegError, FfmpegFrameIterRgb, FfmpegFrameReaderBuilder, VideoInfo};
use image::RgbImage;

use crate::sampler::SampleSchedule;
use crate::Error;

/// A finite, ordered sequence of decoded frames together with what is known about it up front.
pub trait FrameSource {
    type Frames: Iterator<Item = Result<RgbImage, Error>>;

    /// The number of frames the video claims to contain. The actual stream may be shorter
    /// or longer.
    fn frame_count(&self) -> u64;

    /// (width, height) of every frame.
    fn resolution(&self) -> (u32, u32);

    fn into_frames(self) -> Self::Frames;
}

/// Frames decoded by an ffmpeg subprocess.
pub struct FfmpegFrameSource {
    info: VideoInfo,
    frame_count: u64,
    frames: FfmpegFrameIterRgb,
}

impl FfmpegFrameSource {
    /// Probe the video with ffprobe and start decoding it with ffmpeg. Decoding stops after
    /// the last frame that [`SampleSchedule`] will sample.
    ///
    /// # errors
    /// * [`Error::NotVideo`] if ffprobe does not recognise the file or finds no video stream.
    /// * [`Error::UnknownFrameCount`] if the frame count can neither be read nor estimated.
    /// * [`Error::VidProc`] if ffmpeg could not be started.
    pub fn open(src_path: impl AsRef<Path>, timeout_secs: u64) -> Result<Self, Error> {
        let src_path = src_path.as_ref();
        let info = VideoInfo::new(src_path).map_err(vid_proc_err)?;
        if matches!(info.resolution(), (0, _) | (_, 0)) {
            return Err(vid_proc_err(FfmpegError::InvalidResolution));
        }
        let frame_count = info.frame_count().ok_or(Error::UnknownFrameCount)?;

        let frames_to_decode = SampleSchedule::for_frame_count(frame_count).frames_to_decode();

        let mut builder = FfmpegFrameReaderBuilder::new(src_path);
        builder.timeout_secs(timeout_secs);
        if let Ok(num_frames) = u32::try_from(frames_to_decode) {
            builder.num_frames(num_frames);
        }
        let frames = builder.spawn_rgb(&info).map_err(vid_proc_err)?;

        Ok(Self {
            info,
            frame_count,
            frames,
        })
    }
}

fn vid_proc_err(e: FfmpegError) -> Error {
    match e {
        FfmpegError::Info(_) | FfmpegError::InvalidResolution | FfmpegError::FfmpegInternal(_) => {
            Error::NotVideo(e.to_string())
        }
        e => Error::VidProc(e.to_string()),
    }
}

type FfmpegFrame = Result<RgbImage, FfmpegError>;

fn lib_frame(frame: FfmpegFrame) -> Result<RgbImage, Error> {
    frame.map_err(|e| Error::VidProc(e.to_string()))
}

impl FrameSource for FfmpegFrameSource {
    type Frames = std::iter::Map<FfmpegFrameIterRgb, fn(FfmpegFrame) -> Result<RgbImage, Error>>;

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn resolution(&self) -> (u32, u32) {
        self.info.resolution()
    }

    fn into_frames(self) -> Self::Frames {
        self.frames.map(lib_frame as fn(_) -> _)
    }
}

/// Frames that are already in memory. Frames may be errors, to stand in for a video that
/// fails part way through decoding.
#[derive(Debug, Clone)]
pub struct FrameSeq {
    resolution: (u32, u32),
    frame_count: u64,
    frames: Vec<Result<RgbImage, Error>>,
}

impl FrameSeq {
    /// Returns None if there are no images, or they are not all the same resolution.
    pub fn from_images(images: impl IntoIterator<Item = RgbImage>) -> Option<Self> {
        let frames = images.into_iter().map(Ok).collect::<Vec<_>>();
        let resolution = frames.first()?.as_ref().ok()?.dimensions();

        let all_same_res = frames
            .iter()
            .flatten()
            .all(|frame| frame.dimensions() == resolution);
        if !all_same_res {
            return None;
        }

        Some(Self {
            resolution,
            frame_count: frames.len() as u64,
            frames,
        })
    }

    /// A sequence whose declared frame count and resolution need not agree with its contents.
    pub fn new(
        resolution: (u32, u32),
        frame_count: u64,
        frames: impl IntoIterator<Item = Result<RgbImage, Error>>,
    ) -> Self {
        Self {
            resolution,
            frame_count,
            frames: frames.into_iter().collect(),
        }
    }
}

impl FrameSource for FrameSeq {
    type Frames = std::vec::IntoIter<Result<RgbImage, Error>>;

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    fn into_frames(self) -> Self::Frames {
        self.frames.into_iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_images() {
        let seq = FrameSeq::from_images(vec![RgbImage::new(4, 3); 5]).unwrap();
        assert_eq!(seq.frame_count(), 5);
        assert_eq!(seq.resolution(), (4, 3));
        assert_eq!(seq.into_frames().count(), 5);
    }

    #[test]
    fn test_from_images_rejects_bad_input() {
        assert!(FrameSeq::from_images(vec![]).is_none());
        assert!(FrameSeq::from_images(vec![RgbImage::new(4, 3), RgbImage::new(3, 4)]).is_none());
    }
}
