use std::error::Error;

use chroma_border_lib::{execute_crop, BorderCropDetector};
use eyre::WrapErr;

use crate::app::*;

// * read cfg
// * check inputs
// * detect the border
// * output results
// * crop

pub fn run_app() -> i32 {
    let cfg = arg_parse::parse_args();
    configure_logs(cfg.output_cfg.verbosity);

    let ret = match run_app_inner(&cfg) {
        Ok(()) => 0,
        Err(fatal_error) => {
            print_fatal_err(fatal_error, cfg.output_cfg.verbosity);
            1
        }
    };

    ret
}

fn run_app_inner(cfg: &AppCfg) -> eyre::Result<()> {
    let src_path = &cfg.src_path;

    if !src_path.is_file() {
        return Err(AppError::InputNotFound(src_path.to_string_lossy().to_string()).into());
    }

    if !ffmpeg_cmdline_utils::ffmpeg_and_ffprobe_are_callable() {
        return Err(AppError::FfmpegNotFound.into());
    }

    if let CropCfg::Crop { dst_path, overwrite } = &cfg.crop_cfg {
        if dst_path == src_path {
            return Err(eyre::Report::msg(format!(
                "output path is the same as the input: {}",
                dst_path.display()
            )));
        }

        if dst_path.exists() && !overwrite {
            return Err(eyre::Report::msg(format!(
                "output already exists (use --overwrite to replace it): {}",
                dst_path.display()
            )));
        }
    }

    let detector = BorderCropDetector::from_options(cfg.detection_options);
    let detection = detector
        .detect(src_path)
        .map_err(AppError::Detection)
        .wrap_err_with(|| format!("failed to analyse {}", src_path.display()))?;

    if detection.frames_decoded < detection.frames_sampled {
        warn!(
            "Only {} of {} sampled frames could be analysed",
            detection.frames_decoded, detection.frames_sampled
        );
    }

    let rect = detection.rect;
    let output = DetectionOutput::new(src_path, detection);
    output.print(cfg.output_cfg.format)?;

    if let CropCfg::Crop { dst_path, overwrite } = &cfg.crop_cfg {
        info!("Writing {} to {}", rect, dst_path.display());

        execute_crop(src_path, dst_path, &rect, *overwrite)
            .map_err(AppError::Crop)
            .wrap_err_with(|| format!("failed to write {}", dst_path.display()))?;
    }

    Ok(())
}

fn print_fatal_err(fatal_err: eyre::Report, verbosity: ReportVerbosity) {
    error!(target: "app-errorlog", "{}", fatal_err);

    if verbosity == ReportVerbosity::Verbose {
        let mut source: Option<&(dyn Error + 'static)> = fatal_err.source();
        while let Some(e) = source {
            error!(target: "app-errorlog", "    caused by: {}", e);
            source = e.source();
        }
    }
}

pub fn configure_logs(verbosity: ReportVerbosity) {
    use simplelog::*;

    let mut cfg = simplelog::ConfigBuilder::new();
    cfg.set_target_level(LevelFilter::Off);
    cfg.set_thread_level(LevelFilter::Off);

    let min_loglevel = match verbosity {
        ReportVerbosity::Quiet => LevelFilter::Warn,
        ReportVerbosity::Default => LevelFilter::Info,
        ReportVerbosity::Verbose => LevelFilter::Trace,
    };

    //a logger can only be installed once per process. If one is already present, keep using it.
    let _ = TermLogger::init(
        min_loglevel,
        cfg.build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}
