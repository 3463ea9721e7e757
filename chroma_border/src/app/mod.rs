mod app_cfg;
mod app_fns;
mod arg_parse;
mod detection_output;
mod errors;

pub(crate) use app_cfg::*;
pub(crate) use errors::*;

use detection_output::DetectionOutput;

pub use app_fns::run_app;
