use std::path::Path;

use ffmpeg_cmdline_utils::crop_video;
use log::info;

use crate::{CropRect, Error};

/// Write a copy of `src_path` cropped to `rect` into `dst_path`, using ffmpeg.
///
/// If `dst_path` already exists it is only replaced when `overwrite` is set.
///
/// # errors
/// [`Error::CropExecution`] if ffmpeg is missing, fails, or refuses to overwrite `dst_path`.
pub fn execute_crop(
    src_path: impl AsRef<Path>,
    dst_path: impl AsRef<Path>,
    rect: &CropRect,
    overwrite: bool,
) -> Result<(), Error> {
    let (src_path, dst_path) = (src_path.as_ref(), dst_path.as_ref());

    if rect.area() == 0 {
        return Err(Error::CropExecution(format!("nothing left to keep after {rect}")));
    }

    info!(
        "Cropping {} to {}: {rect}",
        src_path.display(),
        dst_path.display()
    );

    crop_video(src_path, dst_path, rect.as_view_args(), overwrite, None)
        .map_err(|e| Error::CropExecution(e.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_rect_is_refused() {
        let mut rect = CropRect::full_frame((100, 100));
        rect.tighten_left(60);
        rect.tighten_right(40);

        let act = execute_crop("in.mp4", "out.mp4", &rect, false);
        assert!(matches!(act, Err(Error::CropExecution(_))));

        let mut rect = CropRect::full_frame((100, 100));
        rect.tighten_bottom(0);
        assert_eq!(rect.area(), 0);

        let act = execute_crop("in.mp4", "out.mp4", &rect, true);
        assert!(matches!(act, Err(Error::CropExecution(_))));
    }
}
