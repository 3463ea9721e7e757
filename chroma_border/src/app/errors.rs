use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("ffmpeg/ffprobe not found. Make sure ffmpeg/ffprobe are installed and visible on the command line")]
    FfmpegNotFound,

    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Border detection error: {0}")]
    Detection(#[source] chroma_border_lib::Error),

    #[error("Crop error: {0}")]
    Crop(#[source] chroma_border_lib::Error),

    #[error("Failed to write results: {0}")]
    Output(#[from] std::io::Error),
}
