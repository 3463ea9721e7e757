use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::definitions::DEFAULT_CLASSIFY_EPS_DEGREES;
use crate::outliers::{filter_lines, SimilarityTest};

/// A straight line in polar form: the set of points (x, y) with `x·cos(theta) + y·sin(theta) = r`.
///
/// `theta` is the angle of the line's normal in radians, and `r` is the signed distance of the
/// line from the top-left corner of the frame along that normal. A line with theta == 0 is
/// therefore vertical, and one with theta == π/2 is horizontal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    r: f64,
    theta: f64,
}

impl Line {
    pub fn new(r: f64, theta: f64) -> Self {
        Self { r, theta }
    }

    pub fn r(&self) -> f64 {
        self.r
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(r: {:.1}, theta: {:.2}°)", self.r, self.theta.to_degrees())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Vertical,
    Horizontal,
    Discard,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Orientation::Vertical => "vertical",
            Orientation::Horizontal => "horizontal",
            Orientation::Discard => "discarded",
        };
        f.write_str(name)
    }
}

/// Sorts lines into vertical and horizontal ones, discarding lines that are neither.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineClassifier {
    /// Maximum angle between a line and the axis it is assigned to.
    ///
    /// Unit: Radians
    pub eps: f64,
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self {
            eps: DEFAULT_CLASSIFY_EPS_DEGREES.to_radians(),
        }
    }
}

impl LineClassifier {
    pub fn classify(&self, line: &Line) -> Orientation {
        //A line and its normal repeat every π radians, and θ and π - θ are
        //equally far from either axis, so fold θ into [0, π/2].
        let theta = line.theta().rem_euclid(PI);
        let theta = if theta > FRAC_PI_2 { PI - theta } else { theta };

        if theta < self.eps {
            Orientation::Vertical
        } else if theta > FRAC_PI_2 - self.eps {
            Orientation::Horizontal
        } else {
            Orientation::Discard
        }
    }
}

/// Lines grouped by orientation, pooled across every sampled frame. Lines are kept in the order
/// that they were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineBuckets {
    pub vertical: Vec<Line>,
    pub horizontal: Vec<Line>,
    pub discarded: usize,
}

impl LineBuckets {
    pub fn classify(lines: impl IntoIterator<Item = Line>, classifier: &LineClassifier) -> Self {
        let mut ret = Self::default();
        for line in lines {
            ret.push(line, classifier.classify(&line));
        }
        ret
    }

    pub fn push(&mut self, line: Line, orientation: Orientation) {
        match orientation {
            Orientation::Vertical => self.vertical.push(line),
            Orientation::Horizontal => self.horizontal.push(line),
            Orientation::Discard => self.discarded += 1,
        }
    }

    /// Append the lines found in a later frame.
    pub fn extend(&mut self, other: LineBuckets) {
        self.vertical.extend(other.vertical);
        self.horizontal.extend(other.horizontal);
        self.discarded += other.discarded;
    }

    /// Remove isolated lines from both buckets. See [`filter_lines`].
    #[must_use]
    pub fn filtered<S: SimilarityTest + ?Sized>(&self, test: &S) -> Self {
        Self {
            vertical: filter_lines(&self.vertical, test),
            horizontal: filter_lines(&self.horizontal, test),
            discarded: self.discarded,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertical.is_empty() && self.horizontal.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use Orientation::*;

    fn deg(theta: f64) -> Line {
        Line::new(10.0, theta.to_radians())
    }

    #[test]
    fn test_axis_aligned() {
        let classifier = LineClassifier::default();

        assert_eq!(classifier.classify(&deg(0.0)), Vertical);
        assert_eq!(classifier.classify(&deg(4.9)), Vertical);
        assert_eq!(classifier.classify(&deg(179.5)), Vertical);
        assert_eq!(classifier.classify(&deg(180.0)), Vertical);

        assert_eq!(classifier.classify(&deg(90.0)), Horizontal);
        assert_eq!(classifier.classify(&deg(85.1)), Horizontal);
        assert_eq!(classifier.classify(&deg(94.9)), Horizontal);
    }

    #[test]
    fn test_diagonal_is_discarded() {
        let classifier = LineClassifier::default();

        assert_eq!(classifier.classify(&deg(45.0)), Discard);
        assert_eq!(classifier.classify(&deg(135.0)), Discard);
        assert_eq!(classifier.classify(&deg(5.1)), Discard);
        assert_eq!(classifier.classify(&deg(84.9)), Discard);
    }

    #[test]
    fn test_nan_is_discarded() {
        let classifier = LineClassifier::default();
        assert_eq!(classifier.classify(&Line::new(0.0, f64::NAN)), Discard);
    }

    // every angle in [0, π] lands in exactly one class, and θ and π - θ
    // always land in the same one.
    #[test]
    fn test_total_and_reflection_consistent() {
        let classifier = LineClassifier::default();
        let steps = 7199;

        for i in 0..=steps {
            let theta = PI * f64::from(i) / f64::from(steps);
            let class = classifier.classify(&Line::new(0.0, theta));
            let reflected = classifier.classify(&Line::new(0.0, PI - theta));
            assert_eq!(class, reflected, "theta: {theta}");

            let folded = theta.min(PI - theta);
            let exp = if folded < classifier.eps {
                Vertical
            } else if folded > FRAC_PI_2 - classifier.eps {
                Horizontal
            } else {
                Discard
            };
            assert_eq!(exp, class, "theta: {theta}");
        }
    }

    #[test]
    fn test_buckets_keep_frame_order() {
        let classifier = LineClassifier::default();

        let frame_1 = [deg(0.0), deg(90.0), deg(45.0)];
        let frame_2 = [deg(1.0), deg(91.0)];

        let mut pooled = LineBuckets::classify(frame_1, &classifier);
        pooled.extend(LineBuckets::classify(frame_2, &classifier));

        assert_eq!(pooled.vertical, vec![deg(0.0), deg(1.0)]);
        assert_eq!(pooled.horizontal, vec![deg(90.0), deg(91.0)]);
        assert_eq!(pooled.discarded, 1);
        assert!(!pooled.is_empty());
        assert!(LineBuckets::default().is_empty());
    }
}
