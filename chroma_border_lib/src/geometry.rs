use crate::definitions::{DEGENERATE_DIVISOR, INTERCEPT_SNAP};
use crate::{CropRect, Error, Line, Orientation};

/// The x coordinate at which `line` crosses the horizontal line at `y`:
/// `x = (r - y·sin θ) / cos θ`.
pub fn x_intercept(line: &Line, y: f64) -> Result<f64, Error> {
    let (sin, cos) = line.theta().sin_cos();
    intercept(line, Orientation::Vertical, line.r() - y * sin, cos)
}

/// The y coordinate at which `line` crosses the vertical line at `x`:
/// `y = (r - x·cos θ) / sin θ`.
pub fn y_intercept(line: &Line, x: f64) -> Result<f64, Error> {
    let (sin, cos) = line.theta().sin_cos();
    intercept(line, Orientation::Horizontal, line.r() - x * cos, sin)
}

fn intercept(line: &Line, orientation: Orientation, num: f64, denom: f64) -> Result<f64, Error> {
    let degenerate = || Error::DegenerateLine {
        orientation,
        r: line.r(),
        theta: line.theta(),
    };

    if !denom.is_finite() || denom.abs() < DEGENERATE_DIVISOR {
        return Err(degenerate());
    }

    let ret = num / denom;
    if ret.is_finite() {
        Ok(ret)
    } else {
        Err(degenerate())
    }
}

// Truncate toward zero, except that values a rounding error away from an integer
// are taken to be that integer. (Otherwise a horizontal line at y=10 can intercept
// at 9.999999999999995 and lose a pixel.)
fn truncate(val: f64) -> f64 {
    let nearest = val.round();
    if (val - nearest).abs() < INTERCEPT_SNAP {
        nearest
    } else {
        val.trunc()
    }
}

/// The outcome of reducing every surviving line into a single rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub rect: CropRect,
    /// Lines that were skipped because they had no usable intercept.
    pub degenerate: Vec<Error>,
}

/// Intersect each line with the frame edges and tighten a full-frame rectangle onto it.
///
/// Vertical lines are intersected with the top and bottom of the frame. Intercepts in the left
/// half of the frame raise x1, those in the right half lower x2. Horizontal lines are then
/// intersected with the left and right edges of the rectangle found so far, and tighten y1 and
/// y2 in the same way. Intercepts are truncated toward zero.
///
/// An axis with no lines keeps its full-frame extent.
pub fn resolve_crop(vertical: &[Line], horizontal: &[Line], orig_res: (u32, u32)) -> Resolved {
    let (width, height) = orig_res;
    let mut rect = CropRect::full_frame(orig_res);
    let mut degenerate = vec![];

    let half_width = f64::from(width) / 2.0;
    for line in vertical {
        let intercepts = [0.0, f64::from(height)].map(|y| x_intercept(line, y));
        match intercepts {
            [Ok(top_x), Ok(bottom_x)] => {
                for x in [top_x, bottom_x].map(truncate) {
                    if x < half_width {
                        rect.tighten_left(x as i64);
                    } else {
                        rect.tighten_right(x as i64);
                    }
                }
            }
            [Err(e), _] | [_, Err(e)] => degenerate.push(e),
        }
    }

    let half_height = f64::from(height) / 2.0;
    let (left, right) = (f64::from(rect.x1()), f64::from(rect.x2()));
    for line in horizontal {
        let intercepts = [left, right].map(|x| y_intercept(line, x));
        match intercepts {
            [Ok(left_y), Ok(right_y)] => {
                for y in [left_y, right_y].map(truncate) {
                    if y < half_height {
                        rect.tighten_top(y as i64);
                    } else {
                        rect.tighten_bottom(y as i64);
                    }
                }
            }
            [Err(e), _] | [_, Err(e)] => degenerate.push(e),
        }
    }

    Resolved { rect, degenerate }
}
