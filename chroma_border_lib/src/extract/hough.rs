use std::f64::consts::PI;

use image::Luma;
use serde::{Deserialize, Serialize};

use super::{EdgeMap, LineExtractor};
use crate::definitions::{DEFAULT_RHO_RESOLUTION, DEFAULT_THETA_RESOLUTION, DEFAULT_VOTE_THRESHOLD};
use crate::Line;

/// The standard hough transform.
///
/// Every edge pixel votes for all lines through it in a (theta, r) accumulator. Cells with
/// more than `vote_threshold` votes that are also a local maximum against their four
/// neighbours are reported, strongest first.
///
/// Reported lines have theta in `[0, π)` and r in `[-(w + h), w + h]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoughLines {
    /// Unit: Pixels
    pub rho_resolution: f64,
    /// Unit: Radians
    pub theta_resolution: f64,
    pub vote_threshold: u32,
}

impl Default for HoughLines {
    fn default() -> Self {
        Self {
            rho_resolution: DEFAULT_RHO_RESOLUTION,
            theta_resolution: DEFAULT_THETA_RESOLUTION,
            vote_threshold: DEFAULT_VOTE_THRESHOLD,
        }
    }
}

impl HoughLines {
    fn num_angles(&self) -> usize {
        if self.theta_resolution.is_nan() || self.theta_resolution <= 0.0 {
            return 0;
        }

        //Do not include an angle of (approximately) π, which is the same line as 0 with r negated.
        let mut ret = (PI / self.theta_resolution).floor() as usize + 1;
        let last_angle = (ret - 1) as f64 * self.theta_resolution;
        if ret > 1 && (PI - last_angle).abs() < self.theta_resolution / 2.0 {
            ret -= 1;
        }
        ret
    }

    fn num_rhos(&self, (width, height): (u32, u32)) -> usize {
        if self.rho_resolution.is_nan() || self.rho_resolution <= 0.0 {
            return 0;
        }

        let max_dist = (u64::from(width) + u64::from(height)) * 2 + 1;
        (max_dist as f64 / self.rho_resolution).round() as usize
    }
}

impl LineExtractor for HoughLines {
    fn lines(&self, edges: &EdgeMap) -> Vec<Line> {
        let num_angles = self.num_angles();
        let num_rhos = self.num_rhos(edges.dimensions());
        if num_angles == 0 || num_rhos == 0 {
            return vec![];
        }

        let inv_rho = 1.0 / self.rho_resolution;
        let trig = (0..num_angles)
            .map(|n| {
                let (sin, cos) = (n as f64 * self.theta_resolution).sin_cos();
                (cos * inv_rho, sin * inv_rho)
            })
            .collect::<Vec<_>>();

        // The accumulator has a one cell border on every side so that the
        // neighbour comparisons below never need bounds checks.
        let stride = num_rhos + 2;
        let mut acc = vec![0u32; (num_angles + 2) * stride];
        let rho_offset = (num_rhos - 1) / 2;

        for (x, y, Luma([p])) in edges.enumerate_pixels() {
            if *p == 0 {
                continue;
            }
            let (x, y) = (f64::from(x), f64::from(y));

            for (n, (cos, sin)) in trig.iter().enumerate() {
                let r = (x * cos + y * sin).round() as i64 + rho_offset as i64;
                if let Ok(r) = usize::try_from(r) {
                    if r < num_rhos {
                        acc[(n + 1) * stride + r + 1] += 1;
                    }
                }
            }
        }

        let mut peaks = vec![];
        for n in 0..num_angles {
            for r in 0..num_rhos {
                let base = (n + 1) * stride + r + 1;
                let votes = acc[base];

                if votes > self.vote_threshold
                    && votes > acc[base - 1]
                    && votes >= acc[base + 1]
                    && votes > acc[base - stride]
                    && votes >= acc[base + stride]
                {
                    peaks.push((votes, n, r));
                }
            }
        }

        //strongest first. Equal votes keep their accumulator order.
        peaks.sort_by(|(a, ..), (b, ..)| b.cmp(a));

        let ret = peaks
            .into_iter()
            .map(|(_votes, n, r)| {
                let rho = (r as f64 - rho_offset as f64) * self.rho_resolution;
                let theta = n as f64 * self.theta_resolution;
                Line::new(rho, theta)
            })
            .collect();

        ret
    }
}
