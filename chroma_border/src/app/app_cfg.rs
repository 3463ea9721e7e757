use std::path::PathBuf;

use chroma_border_lib::DetectionOptions;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportVerbosity {
    Quiet,
    Default,
    Verbose,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputFormat {
    Normal,
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CropCfg {
    /// Only report the crop.
    NoCrop,

    /// Write a cropped copy of the input.
    Crop { dst_path: PathBuf, overwrite: bool },
}

#[derive(Debug, Clone, Copy)]
pub struct OutputCfg {
    pub format: OutputFormat,
    pub verbosity: ReportVerbosity,
}

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub src_path: PathBuf,
    pub crop_cfg: CropCfg,
    pub output_cfg: OutputCfg,
    pub detection_options: DetectionOptions,
}
