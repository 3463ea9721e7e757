use std::path::{Path, PathBuf};

use chroma_border_lib::{ChannelRange, DetectionOptions};
use clap::{value_parser, ArgAction::*};

use crate::app::*;

// file specification
const SRC_PATH: &str = "Input video";
const DST_PATH: &str = "Output video";
const OVERWRITE: &str = "Overwrite output";

// border color
const KEY_RANGE: &str = "Normalized color range";
const RAW_RANGE: &str = "Raw color range";

// line detection
const CANNY_LOW: &str = "Canny low threshold";
const CANNY_HIGH: &str = "Canny high threshold";
const VOTE_THRESHOLD: &str = "Vote threshold";
const CLASSIFY_EPS: &str = "Max tilt";
const SIMILAR_THETA: &str = "Similar angle";
const SIMILAR_R: &str = "Similar distance";

// decoding
const TIMEOUT: &str = "Decode timeout";

//output settings
const OUTPUT_FORMAT: &str = "Format";

//Verbosity
const VERBOSITY_QUIET: &str = "Quiet";
const VERBOSITY_VERBOSE: &str = "Verbose";

const DISPLAY_ORDERING: [&str; 15] = [
    //
    // file specification
    SRC_PATH,
    DST_PATH,
    OVERWRITE,
    //
    //border color
    KEY_RANGE,
    RAW_RANGE,
    //
    //line detection
    CANNY_LOW,
    CANNY_HIGH,
    VOTE_THRESHOLD,
    CLASSIFY_EPS,
    SIMILAR_THETA,
    SIMILAR_R,
    //
    //decoding
    TIMEOUT,
    //
    //outputs
    OUTPUT_FORMAT,
    //
    //verbosity
    VERBOSITY_QUIET,
    VERBOSITY_VERBOSE,
];

fn build_app() -> clap::Command {
    let get_ordering = |arg_name: &str| -> usize {
        match DISPLAY_ORDERING.iter().position(|x| *x == arg_name) {
            Some(idx) => idx,
            None => {
                panic!("argument not assigned a display order: {arg_name:?}");
            }
        }
    };

    let defaults = DetectionOptions::default();

    //args are not added through method chaining because rustfmt struggles with very long expressions.
    let mut clap_app = clap::Command::new("chroma_border")
        .version(clap::crate_version!())
        .about("Find (and optionally crop away) a solid-colored border around a video");

    clap_app = clap_app.arg(
        clap::Arg::new(SRC_PATH)
            .index(1)
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("The video to search for a border")
            .display_order(get_ordering(SRC_PATH)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(DST_PATH)
            .index(2)
            .value_parser(value_parser!(PathBuf))
            .help("If given, write a copy of the input with the border cropped away to this path")
            .display_order(get_ordering(DST_PATH)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(OVERWRITE)
            .short('y')
            .long("overwrite")
            .requires(DST_PATH)
            .action(SetTrue)
            .help("Replace the output video if it already exists")
            .display_order(get_ordering(OVERWRITE)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(KEY_RANGE)
            .long("key-range")
            .value_parser(parse_channel_range)
            .num_args(1)
            .help(format!(
                "Border color after brightness normalization, as R,G,B:R,G,B (inclusive low and high bounds) [default: {}]",
                format_channel_range(&defaults.segmenter.normalized)
            ))
            .display_order(get_ordering(KEY_RANGE)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(RAW_RANGE)
            .long("raw-range")
            .value_parser(parse_channel_range)
            .num_args(1)
            .help(format!(
                "Border color without normalization, as R,G,B:R,G,B [default: {}]",
                format_channel_range(&defaults.segmenter.raw)
            ))
            .display_order(get_ordering(RAW_RANGE)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(CANNY_LOW)
            .long("canny-low")
            .value_parser(value_parser!(f32))
            .num_args(1)
            .default_value(defaults.edges.low_threshold.to_string())
            .help("Low hysteresis threshold for edge detection")
            .display_order(get_ordering(CANNY_LOW)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(CANNY_HIGH)
            .long("canny-high")
            .value_parser(value_parser!(f32))
            .num_args(1)
            .default_value(defaults.edges.high_threshold.to_string())
            .help("High hysteresis threshold for edge detection")
            .display_order(get_ordering(CANNY_HIGH)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(VOTE_THRESHOLD)
            .long("vote-threshold")
            .value_parser(value_parser!(u32))
            .num_args(1)
            .default_value(defaults.hough.vote_threshold.to_string())
            .help("Minimum number of edge pixels on a line. Lower this for small videos.")
            .display_order(get_ordering(VOTE_THRESHOLD)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(CLASSIFY_EPS)
            .long("max-tilt")
            .value_parser(value_parser!(f64))
            .num_args(1)
            .default_value(defaults.classifier.eps.to_degrees().round().to_string())
            .help("Lines tilted further than this from vertical/horizontal are ignored (degrees)")
            .display_order(get_ordering(CLASSIFY_EPS)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(SIMILAR_THETA)
            .long("similar-angle")
            .value_parser(value_parser!(f64))
            .num_args(1)
            .default_value(defaults.similarity.max_theta_diff.to_degrees().round().to_string())
            .help("Lines closer than this angle (degrees) and distance may be the same edge")
            .display_order(get_ordering(SIMILAR_THETA)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(SIMILAR_R)
            .long("similar-distance")
            .value_parser(value_parser!(f64))
            .num_args(1)
            .default_value(defaults.similarity.max_r_diff.to_string())
            .help("Lines closer than this distance (pixels) and angle may be the same edge")
            .display_order(get_ordering(SIMILAR_R)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(TIMEOUT)
            .long("timeout")
            .value_parser(value_parser!(u64))
            .num_args(1)
            .default_value(defaults.decode_timeout_secs.to_string())
            .help("Give up decoding the video after this many seconds")
            .display_order(get_ordering(TIMEOUT)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(OUTPUT_FORMAT)
            .long("format")
            .value_parser(value_parser!(OutputFormat))
            .num_args(1)
            .default_value("normal")
            .help("Print the crop as text or as JSON")
            .display_order(get_ordering(OUTPUT_FORMAT)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_QUIET)
            .short('q')
            .long("quiet")
            .conflicts_with(VERBOSITY_VERBOSE)
            .action(SetTrue)
            .help("Only print warnings and errors")
            .display_order(get_ordering(VERBOSITY_QUIET)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_VERBOSE)
            .short('v')
            .long("verbose")
            .action(SetTrue)
            .help("Print debug information, including the causes of errors")
            .display_order(get_ordering(VERBOSITY_VERBOSE)),
    );

    clap_app
}

pub fn parse_args() -> AppCfg {
    //capture the cwd once, to minimize the risk of working with two values if it is changed by the OS at runtime.
    let cwd = std::env::current_dir().unwrap_or_default();

    cfg_from_matches(&build_app().get_matches(), &cwd)
}

fn cfg_from_matches(args: &clap::ArgMatches, cwd: &Path) -> AppCfg {
    let defaults = DetectionOptions::default();

    //every argument is either required or has a default value, so these lookups never fall back in practice.
    let src_path = args
        .get_one::<PathBuf>(SRC_PATH)
        .map(|p| absolutify_path(cwd, p))
        .unwrap_or_default();

    let crop_cfg = match args.get_one::<PathBuf>(DST_PATH) {
        Some(dst_path) => CropCfg::Crop {
            dst_path: absolutify_path(cwd, dst_path),
            overwrite: args.get_flag(OVERWRITE),
        },
        None => CropCfg::NoCrop,
    };

    let verbosity = if args.get_flag(VERBOSITY_QUIET) {
        ReportVerbosity::Quiet
    } else if args.get_flag(VERBOSITY_VERBOSE) {
        ReportVerbosity::Verbose
    } else {
        ReportVerbosity::Default
    };

    let output_cfg = OutputCfg {
        format: args
            .get_one::<OutputFormat>(OUTPUT_FORMAT)
            .copied()
            .unwrap_or(OutputFormat::Normal),
        verbosity,
    };

    let mut detection_options = defaults;
    if let Some(range) = args.get_one::<ChannelRange>(KEY_RANGE) {
        detection_options.segmenter.normalized = *range;
    }
    if let Some(range) = args.get_one::<ChannelRange>(RAW_RANGE) {
        detection_options.segmenter.raw = *range;
    }
    if let Some(low) = args.get_one::<f32>(CANNY_LOW) {
        detection_options.edges.low_threshold = *low;
    }
    if let Some(high) = args.get_one::<f32>(CANNY_HIGH) {
        detection_options.edges.high_threshold = *high;
    }
    if let Some(threshold) = args.get_one::<u32>(VOTE_THRESHOLD) {
        detection_options.hough.vote_threshold = *threshold;
    }
    if let Some(eps) = args.get_one::<f64>(CLASSIFY_EPS) {
        detection_options.classifier.eps = eps.to_radians();
    }
    if let Some(theta) = args.get_one::<f64>(SIMILAR_THETA) {
        detection_options.similarity.max_theta_diff = theta.to_radians();
    }
    if let Some(r) = args.get_one::<f64>(SIMILAR_R) {
        detection_options.similarity.max_r_diff = *r;
    }
    if let Some(timeout) = args.get_one::<u64>(TIMEOUT) {
        detection_options.decode_timeout_secs = *timeout;
    }

    let ret = AppCfg {
        src_path,
        crop_cfg,
        output_cfg,
        detection_options,
    };

    ret
}

// "R,G,B:R,G,B", low bounds then high bounds.
fn parse_channel_range(s: &str) -> Result<ChannelRange, String> {
    let parse_rgb = |rgb: &str| -> Result<[u8; 3], String> {
        let channels = rgb
            .split(',')
            .map(|c| c.trim().parse::<u8>().map_err(|e| format!("{c:?}: {e}")))
            .collect::<Result<Vec<_>, _>>()?;

        <[u8; 3]>::try_from(channels)
            .map_err(|channels| format!("expected 3 channels, got {}", channels.len()))
    };

    let (low, high) = s
        .split_once(':')
        .ok_or_else(|| String::from("expected low and high bounds separated by ':'"))?;

    let ret = ChannelRange::new(parse_rgb(low)?, parse_rgb(high)?);
    if !ret.is_satisfiable() {
        return Err(String::from("a low bound is above its high bound"));
    }

    Ok(ret)
}

fn format_channel_range(range: &ChannelRange) -> String {
    let [lr, lg, lb] = range.low;
    let [hr, hg, hb] = range.high;
    format!("{lr},{lg},{lb}:{hr},{hg},{hb}")
}

fn absolutify_path(cwd: &Path, path: &Path) -> PathBuf {
    //get the absolute path if it is not absolute, by prepending the cwd.
    let path = if path.is_relative() {
        cwd.join(path)
    } else {
        path.to_path_buf()
    };

    //now try canonicalizing the path. If that fails (e.g the output does not exist yet) carry on.
    let p = path.canonicalize().unwrap_or(path);

    p
}
