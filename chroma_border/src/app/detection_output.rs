use std::{
    io::{prelude::*, BufWriter},
    path::{Path, PathBuf},
};

use chroma_border_lib::Detection;
use serde_json::{json, Value};

use crate::app::*;

#[derive(Debug, Clone)]
pub struct DetectionOutput {
    src_path: PathBuf,
    detection: Detection,
}

impl DetectionOutput {
    pub fn new(src_path: impl AsRef<Path>, detection: Detection) -> Self {
        Self {
            src_path: src_path.as_ref().to_path_buf(),
            detection,
        }
    }

    pub fn print(&self, format: OutputFormat) -> Result<(), AppError> {
        let stdout = std::io::stdout();
        let mut stdout = BufWriter::new(stdout.lock());

        match format {
            OutputFormat::Normal => writeln!(stdout, "{}", self.detection.rect)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut stdout, &self.to_json())
                    .map_err(std::io::Error::from)?;
                writeln!(stdout)?;
            }
        }

        stdout.flush()?;
        Ok(())
    }

    fn to_json(&self) -> Value {
        let d = &self.detection;
        let (x, y, width, height) = d.rect.as_view_args();
        let (x1, y1, x2, y2) = d.rect.corners();

        json!({
            "src_path": self.src_path.to_string_lossy(),
            "border_detected": d.border_detected(),
            "crop": { "x": x, "y": y, "width": width, "height": height },
            "rect": { "x1": x1, "y1": y1, "x2": x2, "y2": y2 },
            "resolution": { "width": d.resolution.0, "height": d.resolution.1 },
            "frames_sampled": d.frames_sampled,
            "frames_decoded": d.frames_decoded,
            "vertical_lines": d.vertical_lines,
            "horizontal_lines": d.horizontal_lines,
            "failures": d.failures.iter().map(ToString::to_string).collect::<Vec<_>>(),
        })
    }
}
