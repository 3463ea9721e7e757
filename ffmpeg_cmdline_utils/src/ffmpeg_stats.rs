use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::*;

#[derive(Debug, Deserialize, Serialize, Clone, Error)]
pub enum VideoInfoError {
    #[error("Error parsing stats: {0}")]
    JsonError(String),
    #[error("Error parsing stats: {0}")]
    ParseIntError(String),
    #[error("Error parsing stats: {0}")]
    ParseFloatError(String),
    #[error("Unexpected video rotation: {0}")]
    Rotation(String),
}

impl From<serde_json::Error> for VideoInfoError {
    fn from(e: serde_json::Error) -> Self {
        //limit maximum number of characters
        let error_string = format!("{e}").chars().take(500).collect::<String>();
        VideoInfoError::JsonError(error_string)
    }
}

impl From<std::num::ParseIntError> for VideoInfoError {
    fn from(e: std::num::ParseIntError) -> Self {
        VideoInfoError::ParseIntError(format!("{e}"))
    }
}

impl From<std::num::ParseFloatError> for VideoInfoError {
    fn from(e: std::num::ParseFloatError) -> Self {
        VideoInfoError::ParseFloatError(format!("{e}"))
    }
}

// There is a slighty gotcha in ffmpeg where if the video metadata declares a rotation,
// raw (x, y) resolution in that metadata refers to the "unrotated" resolution. we must
// therefore swap the x and y values if the rotation is 90 or 270
#[derive(PartialEq, Eq, Clone, Debug, Copy, Default)]
enum FfmpegVideoRotation {
    #[default]
    Rot0,
    Rot90,
    Rot180,
    Rot270,
}
use FfmpegVideoRotation::*;

/// Some of the video metadata that can be obtained by using ffprobe.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize, Default)]
pub struct VideoInfo {
    duration: std::time::Duration,
    file_size: u64,
    resolution: (u32, u32),
    frame_count: Option<u64>,
}

impl VideoInfo {
    /// Use ffprobe to get the duration, resolution and frame count of a video. If the video contains
    /// multiple streams then only information about the first video stream will be returned.
    ///
    /// # errors
    /// * The file cannot be read or is not recognized as a video by ffprobe
    /// * The output from ffprobe could not be parsed as JSON
    /// * The output from ffprobe contained malformed fields.
    pub fn new<P>(src_path: P) -> Result<Self, FfmpegError>
    where
        P: AsRef<Path>,
    {
        let stats_string = get_video_stats(&src_path)?;
        let ret = Self::from_ffprobe_json(&stats_string)?;
        Ok(ret)
    }

    /// Parse the JSON printed by `ffprobe -show_format -show_streams -print_format json`.
    pub fn from_ffprobe_json(stats_string: &str) -> Result<Self, VideoInfoError> {
        let stats_parsed: Value = serde_json::from_str(stats_string)?;

        let duration = if let Value::String(d) = &stats_parsed["format"]["duration"] {
            std::time::Duration::from_secs_f64(d.parse()?)
        } else {
            std::time::Duration::from_secs_f64(0.0)
        };

        let file_size = if let Value::String(s) = &stats_parsed["format"]["size"] {
            s.parse()?
        } else {
            0
        };

        let first_video = Self::first_video(&stats_parsed);

        // If the video metadata declares that a video is rotated, then FFMPEG will conveniently autorotate
        // each frame for us, however we will have to remember to swap around x and y axis if the rotation is
        // 90 or 270
        let rotation = {
            //extract the rotation from the JSON
            let rotation = first_video.and_then(|video_stream| {
                video_stream
                    .get("side_data_list")
                    .and_then(|y| y.get(0).and_then(|x| x.get("rotation").cloned()))
            });

            //if the rotation is found, it may either be a JSON String or JSON number, so unify
            //them here.
            let rotation = match rotation {
                None => None,
                Some(Value::Number(val)) => Some(
                    val.as_i64()
                        .ok_or_else(|| VideoInfoError::Rotation(val.to_string()))?,
                ),
                Some(Value::String(val)) => Some(val.parse::<i64>()?),
                Some(other) => return Err(VideoInfoError::Rotation(other.to_string())),
            };

            //now make sure that the value is one of the four cardinal directions and return it
            //(or if no rotation is specified, return 0/360)
            match rotation {
                None | Some(0) => Rot0,
                Some(90) | Some(-270) => Rot90,
                Some(180) | Some(-180) => Rot180,
                Some(-90) | Some(270) => Rot270,
                Some(other) => return Err(VideoInfoError::Rotation(other.to_string())),
            }
        };

        let resolution = {
            let first_width = first_video.and_then(|v| Self::u32_field(v, "width")).unwrap_or(0);
            let first_height = first_video.and_then(|v| Self::u32_field(v, "height")).unwrap_or(0);

            if matches!(rotation, Rot0 | Rot180) {
                (first_width, first_height)
            } else {
                (first_height, first_width)
            }
        };

        let frame_count = match first_video {
            Some(video_stream) => Self::frame_count_of(video_stream, duration)?,
            None => None,
        };

        Ok(VideoInfo {
            duration,
            file_size,
            resolution,
            frame_count,
        })
    }

    /// The duration of the video in seconds
    pub fn duration(&self) -> std::time::Duration {
        self.duration
    }

    /// The size of the video in bytes
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// The resolution of the video in pixels.
    /// Note the returned value is correct for the orientation that the video is intended
    /// to be viewed. (Ffprobe returns a surprising value by default if the video is stored rotated)
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// The number of frames in the first video stream. Taken from the container's `nb_frames`
    /// when present, otherwise estimated from the duration and the average frame rate.
    pub fn frame_count(&self) -> Option<u64> {
        self.frame_count
    }

    // nb_frames is missing for many containers (mkv, webm), in which case fall back
    // to an estimate, as the container-level frame count is only ever an estimate anyway.
    fn frame_count_of(
        video_stream: &Value,
        format_duration: std::time::Duration,
    ) -> Result<Option<u64>, VideoInfoError> {
        if let Value::String(nb_frames) = &video_stream["nb_frames"] {
            let nb_frames = nb_frames.parse::<u64>()?;
            if nb_frames > 0 {
                return Ok(Some(nb_frames));
            }
        }

        let duration_secs = match &video_stream["duration"] {
            Value::String(d) => d.parse::<f64>()?,
            _ => format_duration.as_secs_f64(),
        };

        let fps = match &video_stream["avg_frame_rate"] {
            Value::String(rate) => parse_rational(rate)?,
            _ => None,
        };

        let ret = fps
            .map(|fps| (duration_secs * fps).round())
            .filter(|frames| frames.is_finite() && *frames >= 1.0)
            .map(|frames| frames as u64);

        Ok(ret)
    }

    fn first_video(stats_parsed: &Value) -> Option<&Value> {
        Self::streams_of_type(stats_parsed, "video").and_then(|mut videos| videos.drain(..).next())
    }

    fn streams_of_type<'a>(stats_parsed: &'a Value, stream_type: &str) -> Option<Vec<&'a Value>> {
        if let Value::Array(streams) = &stats_parsed["streams"] {
            let ret = streams
                .iter()
                .filter(|s| match &s["codec_type"] {
                    Value::String(codec_type) => codec_type == stream_type,
                    _ => false,
                })
                .collect();

            Some(ret)
        } else {
            None
        }
    }

    fn u32_field(stream: &Value, field_name: &str) -> Option<u32> {
        match &stream[field_name] {
            Value::Number(v) => u32::try_from(v.as_u64()?).ok(),
            _ => None,
        }
    }
}

// ffprobe writes frame rates as "num/den", with "0/0" for unknown.
fn parse_rational(rate: &str) -> Result<Option<f64>, VideoInfoError> {
    let Some((num, den)) = rate.split_once('/') else {
        let rate = rate.trim().parse::<f64>()?;
        return Ok(Some(rate).filter(|r| *r > 0.0));
    };

    let num = num.trim().parse::<f64>()?;
    let den = den.trim().parse::<f64>()?;

    if num <= 0.0 || den <= 0.0 {
        return Ok(None);
    }

    Ok(Some(num / den))
}

#[cfg(test)]
mod test {
    use super::*;

    fn probe_json(stream: &str) -> String {
        format!(
            r#"{{
                "streams": [
                    {{ "codec_type": "audio", "codec_name": "aac" }},
                    {stream}
                ],
                "format": {{ "duration": "10.000000", "size": "123456" }}
            }}"#
        )
    }

    #[test]
    fn test_frame_count_from_nb_frames() {
        let json = probe_json(
            r#"{ "codec_type": "video", "width": 1920, "height": 1080, "nb_frames": "250", "avg_frame_rate": "25/1" }"#,
        );
        let info = VideoInfo::from_ffprobe_json(&json).unwrap();

        assert_eq!(info.resolution(), (1920, 1080));
        assert_eq!(info.frame_count(), Some(250));
        assert_eq!(info.file_size(), 123456);
    }

    #[test]
    fn test_frame_count_estimated_from_rate() {
        let json = probe_json(
            r#"{ "codec_type": "video", "width": 640, "height": 480, "avg_frame_rate": "30000/1001" }"#,
        );
        let info = VideoInfo::from_ffprobe_json(&json).unwrap();

        // 10s at 29.97fps
        assert_eq!(info.frame_count(), Some(300));
    }

    #[test]
    fn test_frame_count_unknown_rate() {
        let json = probe_json(
            r#"{ "codec_type": "video", "width": 640, "height": 480, "avg_frame_rate": "0/0" }"#,
        );
        let info = VideoInfo::from_ffprobe_json(&json).unwrap();

        assert_eq!(info.frame_count(), None);
    }

    #[test]
    fn test_rotated_resolution_is_swapped() {
        let json = probe_json(
            r#"{ "codec_type": "video", "width": 1920, "height": 1080, "nb_frames": "10",
                 "side_data_list": [ { "rotation": -90 } ] }"#,
        );
        let info = VideoInfo::from_ffprobe_json(&json).unwrap();

        assert_eq!(info.resolution(), (1080, 1920));
    }

    #[test]
    fn test_odd_rotation_is_an_error() {
        let json = probe_json(
            r#"{ "codec_type": "video", "width": 1920, "height": 1080,
                 "side_data_list": [ { "rotation": 45 } ] }"#,
        );

        assert!(matches!(
            VideoInfo::from_ffprobe_json(&json),
            Err(VideoInfoError::Rotation(_))
        ));
    }

    #[test]
    fn test_no_video_stream() {
        let json = r#"{ "streams": [ { "codec_type": "audio" } ], "format": { "duration": "3.0" } }"#;
        let info = VideoInfo::from_ffprobe_json(json).unwrap();

        assert_eq!(info.resolution(), (0, 0));
        assert_eq!(info.frame_count(), None);
    }
}
