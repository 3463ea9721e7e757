use std::{
    ffi::{OsStr, OsString},
    io::prelude::*,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    time::{Duration, SystemTime},
};

#[cfg(target_family = "windows")]
use std::os::windows::process::CommandExt;

use image::RgbImage;
use wait_timeout::ChildExt;
use FfmpegCommandName::*;
use FfmpegError::*;

use crate::*;

const FFPROBE_TIMEOUT_SECS: u64 = 60;

#[derive(Debug)]
struct FfmpegFrameIter {
    x: u32,
    y: u32,
    frame_bytes: usize,
    child: std::process::Child,
    num_frames: u32,
    frames_read: u32,
    timeout_secs: u64,
    timeout_time: SystemTime,
    finished: bool,
}

impl FfmpegFrameIter {
    fn finish(&mut self) {
        self.finished = true;
        let _kill_error = self.child.kill();
        let _wait_error = self.child.wait();
    }
}

impl Iterator for FfmpegFrameIter {
    type Item = Result<RgbImage, FfmpegError>;

    fn next(&mut self) -> Option<Self::Item> {
        //Check exit conditions
        if self.finished || self.frames_read >= self.num_frames {
            self.finish();
            return None;
        }

        if SystemTime::now() > self.timeout_time {
            self.finish();
            return Some(Err(Timeout(self.timeout_secs)));
        }

        let Some(stdout) = self.child.stdout.as_mut() else {
            self.finish();
            return None;
        };

        let mut raw_buf = vec![0u8; self.frame_bytes];
        let mut buf_head = 0;
        while buf_head < raw_buf.len() {
            match stdout.read(&mut raw_buf[buf_head..]) {
                Ok(0) => break,
                Ok(bytes_read) => buf_head += bytes_read,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.finish();
                    return Some(Err(Io(format!("{:?}", e.kind()))));
                }
            }
        }

        // a clean end of stream lands exactly on a frame boundary.
        if buf_head == 0 {
            self.finish();
            return None;
        }

        let index = self.frames_read;
        self.frames_read += 1;

        if buf_head < self.frame_bytes {
            self.finish();
            return Some(Err(TruncatedFrame {
                index,
                got: buf_head,
                expected: self.frame_bytes,
            }));
        }

        Some(RgbImage::from_raw(self.x, self.y, raw_buf).ok_or(InvalidResolution))
    }
}

// to prevent accumulation of zombie processes, reap the return code of
// ffmpeg subcommands (if nothing else has done so already) here
impl Drop for FfmpegFrameIter {
    fn drop(&mut self) {
        let _kill_error = self.child.kill();
        let _wait_error = self.child.wait();
    }
}

#[derive(Clone, Debug)]
pub struct FfmpegFrameReaderBuilder {
    src_path: PathBuf,
    num_frames: Option<u32>,
    timeout_secs: Option<u64>,
}

impl FfmpegFrameReaderBuilder {
    pub fn new(src_path: impl AsRef<Path>) -> Self {
        Self {
            src_path: src_path.as_ref().to_path_buf(),
            num_frames: None,
            timeout_secs: None,
        }
    }

    /// Stop after this many frames have been decoded.
    pub fn num_frames(&mut self, num_frames: u32) -> &mut Self {
        self.num_frames = Some(num_frames);
        self
    }

    /// Give up reading frames once this much time has passed since spawning ffmpeg.
    pub fn timeout_secs(&mut self, timeout_secs: u64) -> &mut Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Spawn ffmpeg to decode the video as packed rgb24. `stats` must come from
    /// [`VideoInfo::new`] on the same file, as it gives the size of each frame.
    pub fn spawn_rgb(&self, stats: &VideoInfo) -> Result<FfmpegFrameIterRgb, FfmpegError> {
        //bail out if we get invalid dimensions.
        let (x, y) = stats.resolution();
        if x == 0 || y == 0 {
            return Err(InvalidResolution);
        }

        let frame_bytes = usize::try_from(x)
            .ok()
            .zip(usize::try_from(y).ok())
            .and_then(|(x, y)| x.checked_mul(y))
            .and_then(|pix| pix.checked_mul(3))
            .ok_or(InvalidResolution)?;

        // Attempt to prevent OOM on very implausible sizes
        let five_gigabytes = 5368709120usize;
        if frame_bytes > five_gigabytes {
            return Err(InvalidResolution);
        }

        let args = self.decode_args();
        let args = args.iter().map(OsString::as_os_str).collect::<Vec<_>>();
        let mut child = spawn_ffmpeg_command(Ffmpeg, &args, true)?;

        //Prevent possible lockup if stderr gets full by dropping the
        //handle from our side
        std::mem::drop(child.stderr.take());

        // (u32::MAX rather than u64::MAX to stay clear of SystemTime overflow)
        let timeout_secs = self.timeout_secs.unwrap_or(u64::from(u32::MAX));

        let base_iter = FfmpegFrameIter {
            x,
            y,
            frame_bytes,
            child,
            num_frames: self.num_frames.unwrap_or(u32::MAX),
            frames_read: 0,
            timeout_secs,
            timeout_time: SystemTime::now() + Duration::from_secs(timeout_secs),
            finished: false,
        };

        Ok(FfmpegFrameIterRgb { base_iter })
    }

    fn decode_args(&self) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("-hide_banner"),
            OsString::from("-loglevel"),
            OsString::from("warning"),
            OsString::from("-nostats"),
            OsString::from("-nostdin"),
            OsString::from("-i"),
            self.src_path.as_os_str().to_os_string(),
        ];

        if let Some(num_frames) = self.num_frames {
            args.extend([OsString::from("-vframes"), OsString::from(num_frames.to_string())]);
        }

        #[rustfmt::skip]
        args.extend([
            OsString::from("-pix_fmt"), OsString::from("rgb24"),
            OsString::from("-c:v"),     OsString::from("rawvideo"),
            OsString::from("-f"),       OsString::from("image2pipe"),
            OsString::from("-"),
        ]);

        args
    }
}

/// Decoded frames of a video, in presentation order.
#[derive(Debug)]
pub struct FfmpegFrameIterRgb {
    base_iter: FfmpegFrameIter,
}

impl Iterator for FfmpegFrameIterRgb {
    type Item = Result<RgbImage, FfmpegError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.base_iter.next()
    }
}

pub fn get_video_stats<P: AsRef<Path>>(src_path: P) -> Result<String, FfmpegError> {
    let args = &[
        OsStr::new("-v"),
        OsStr::new("quiet"),
        OsStr::new("-show_format"),
        OsStr::new("-show_streams"),
        OsStr::new("-print_format"),
        OsStr::new("json"),
        OsStr::new(src_path.as_ref()),
    ];

    let timeout = Some(Duration::from_secs(FFPROBE_TIMEOUT_SECS));
    let stdout = run_ffmpeg_command(Ffprobe, args, timeout)?.stdout;

    String::from_utf8(stdout).map_err(|_| Utf8Conversion)
}

/// The arguments given to ffmpeg to crop `src_path` into `dst_path`. `view` is
/// `(x, y, width, height)` of the region to keep.
pub fn crop_filter_args(
    src_path: &Path,
    dst_path: &Path,
    (x, y, width, height): (u32, u32, u32, u32),
    overwrite: bool,
) -> Vec<OsString> {
    let overwrite_arg = if overwrite { "-y" } else { "-n" };

    #[rustfmt::skip]
    let ret = vec![
        OsString::from("-hide_banner"),
        OsString::from("-loglevel"), OsString::from("error"),
        OsString::from("-nostats"),
        OsString::from("-nostdin"),
        OsString::from(overwrite_arg),
        OsString::from("-i"),        src_path.as_os_str().to_os_string(),
        OsString::from("-filter:v"), OsString::from(format!("crop={width}:{height}:{x}:{y}")),
        dst_path.as_os_str().to_os_string(),
    ];
    ret
}

/// Run ffmpeg's crop filter over `src_path`, writing the result to `dst_path`.
///
/// # errors
/// * ffmpeg is not installed
/// * ffmpeg exits with a nonzero code (including when `dst_path` exists and `overwrite` is false)
/// * ffmpeg does not finish within `timeout`
pub fn crop_video(
    src_path: &Path,
    dst_path: &Path,
    view: (u32, u32, u32, u32),
    overwrite: bool,
    timeout: Option<Duration>,
) -> Result<(), FfmpegError> {
    let args = crop_filter_args(src_path, dst_path, view, overwrite);
    let args = args.iter().map(OsString::as_os_str).collect::<Vec<_>>();

    log::debug!(
        "running: ffmpeg {}",
        args.iter()
            .map(|arg| arg.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    run_ffmpeg_command(Ffmpeg, &args, timeout).map(|_output| ())
}

pub fn ffmpeg_and_ffprobe_are_callable() -> bool {
    let timeout = Some(Duration::from_secs(FFPROBE_TIMEOUT_SECS));

    //check ffprobe is callable.
    if run_ffmpeg_command(Ffprobe, &[OsStr::new("-version")], timeout).is_err() {
        return false;
    }

    //now ffmpeg.
    if run_ffmpeg_command(Ffmpeg, &[OsStr::new("-version")], timeout).is_err() {
        return false;
    }

    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FfmpegCommandName {
    Ffprobe,
    Ffmpeg,
}

impl FfmpegCommandName {
    pub fn as_os_str(&self) -> &'static OsStr {
        match self {
            Self::Ffprobe => OsStr::new("ffprobe"),
            Self::Ffmpeg => OsStr::new("ffmpeg"),
        }
    }
}

fn spawn_ffmpeg_command(
    name: FfmpegCommandName,
    args: &[&OsStr],
    stderr_null: bool,
) -> Result<Child, FfmpegError> {
    let stderr_cfg = if stderr_null {
        Stdio::null()
    } else {
        Stdio::piped()
    };

    let mut command = Command::new(name.as_os_str());
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(stderr_cfg);

    //do not spawn a command window on windows when when in a gui application
    #[cfg(target_family = "windows")]
    command.creation_flags(winapi::um::winbase::CREATE_NO_WINDOW);

    command.spawn().map_err(|e| match e.kind() {
        //shell failed to execute the command. Separate out FileNotFound from all other errors
        //as by far the most likely cause is ffmpeg is not installed.
        std::io::ErrorKind::NotFound => FfmpegNotFound,
        _ => Io(format!("{:?}", e.kind())),
    })
}

struct FfmpegOutput {
    _stderr: Vec<u8>,
    stdout: Vec<u8>,
}

type FfmpegCmdResult = Result<FfmpegOutput, FfmpegError>;

fn run_ffmpeg_command(
    name: FfmpegCommandName,
    args: &[&OsStr],
    timeout: Option<Duration>,
) -> FfmpegCmdResult {
    fn truncate_ffmpeg_err_msg(stderr: Vec<u8>) -> FfmpegError {
        match std::str::from_utf8(&stderr) {
            Ok(error_text) => FfmpegInternal(error_text.chars().take(500).collect::<String>()),
            Err(_) => Utf8Conversion,
        }
    }

    fn drain(mut pipe: impl Read + Send + 'static) -> std::thread::JoinHandle<Vec<u8>> {
        std::thread::spawn(move || {
            let mut acc = vec![];
            let _read_error = pipe.read_to_end(&mut acc);
            acc
        })
    }

    let mut child = spawn_ffmpeg_command(name, args, false)?;

    //Both pipes are drained on their own threads so that a chatty stderr can never
    //block the process while we wait on it.
    let stdout_thread = child.stdout.take().map(drain);
    let stderr_thread = child.stderr.take().map(drain);

    let exit_status = match timeout {
        Some(timeout) => match child.wait_timeout(timeout) {
            Ok(Some(status)) => Ok(status),
            Ok(None) => {
                let _kill_error = child.kill();
                let _wait_error = child.wait();
                Err(Timeout(timeout.as_secs()))
            }
            Err(e) => Err(Io(format!("{:?}", e.kind()))),
        },
        None => child.wait().map_err(|e| Io(format!("{:?}", e.kind()))),
    };

    let stdout_acc = stdout_thread
        .and_then(|t| t.join().ok())
        .unwrap_or_default();
    let stderr_acc = stderr_thread
        .and_then(|t| t.join().ok())
        .unwrap_or_default();

    //The shell successfully executed it, but maybe it returned an error code
    let status = exit_status?;
    if status.success() {
        Ok(FfmpegOutput {
            stdout: stdout_acc,
            _stderr: stderr_acc,
        })
    } else {
        //sometimes ffmpeg creates very long error messages. Limit them to the first 500 characters
        Err(truncate_ffmpeg_err_msg(stderr_acc))
    }
}
