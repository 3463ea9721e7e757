use std::path::Path;

use cfg_if::cfg_if;
use image::RgbImage;
use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::geometry::{resolve_crop, Resolved};
use crate::sampler::{SampleSchedule, Sampler};
use crate::{
    CropRect, DetectionOptions, EdgeExtractor, Error, FfmpegFrameSource, FrameSource, LineBuckets,
    LineExtractor, SimilarityTest,
};

/// The result of border detection on one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// The region of the video to keep. Covers the whole frame when no border was found.
    pub rect: CropRect,

    /// (width, height) of the video.
    pub resolution: (u32, u32),

    /// How many frames were scheduled for sampling.
    pub frames_sampled: u64,

    /// How many of the scheduled frames were successfully decoded and analysed.
    pub frames_decoded: u64,

    /// Number of vertical lines that survived outlier filtering.
    pub vertical_lines: usize,

    /// Number of horizontal lines that survived outlier filtering.
    pub horizontal_lines: usize,

    /// Frames and lines that were skipped, see [`Error::is_recoverable`].
    pub failures: Vec<Error>,
}

impl Detection {
    pub fn border_detected(&self) -> bool {
        !self.rect.is_uncropped()
    }
}

/// Finds the rectangle inside a solid-colored border.
///
/// Use the default constructor unless supplying custom options.
pub struct BorderCropDetector {
    options: DetectionOptions,
    edges: Box<dyn EdgeExtractor>,
    lines: Box<dyn LineExtractor>,
    similarity: Box<dyn SimilarityTest>,
}

impl Default for BorderCropDetector {
    fn default() -> Self {
        Self::from_options(DetectionOptions::default())
    }
}

impl BorderCropDetector {
    /// Create a detector with the selected [`DetectionOptions`]
    pub fn from_options(options: DetectionOptions) -> Self {
        Self {
            options,
            edges: Box::new(options.edges),
            lines: Box::new(options.hough),
            similarity: Box::new(options.similarity),
        }
    }

    /// Replace the edge detector. The edge thresholds in the options are then unused.
    #[must_use]
    pub fn with_edge_extractor(mut self, edges: impl EdgeExtractor + 'static) -> Self {
        self.edges = Box::new(edges);
        self
    }

    /// Replace the line detector. The hough options are then unused.
    #[must_use]
    pub fn with_line_extractor(mut self, lines: impl LineExtractor + 'static) -> Self {
        self.lines = Box::new(lines);
        self
    }

    /// Replace the test used to reject isolated lines. The similarity options are then unused.
    #[must_use]
    pub fn with_similarity_test(mut self, similarity: impl SimilarityTest + 'static) -> Self {
        self.similarity = Box::new(similarity);
        self
    }

    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    /// Decode a video with ffmpeg and find the border around it.
    ///
    /// # errors
    /// * The options are invalid
    /// * The file cannot be opened as a video, or its length is unknown
    /// * None of the sampled frames could be decoded
    pub fn detect(&self, src_path: impl AsRef<Path>) -> Result<Detection, Error> {
        self.options.validate()?;

        let src_path = src_path.as_ref();
        let source = FfmpegFrameSource::open(src_path, self.options.decode_timeout_secs)?;
        debug!(
            "{}: {:?}, {} frames",
            src_path.display(),
            source.resolution(),
            source.frame_count()
        );

        self.detect_validated(source)
    }

    /// Find the border in frames from any source.
    ///
    /// # errors
    /// * The options are invalid
    /// * The source has a zero width or height
    /// * None of the sampled frames could be decoded
    pub fn detect_source<S: FrameSource>(&self, source: S) -> Result<Detection, Error> {
        self.options.validate()?;
        self.detect_validated(source)
    }

    fn detect_validated<S: FrameSource>(&self, source: S) -> Result<Detection, Error> {
        let resolution = source.resolution();
        if resolution.0 == 0 || resolution.1 == 0 {
            return Err(Error::NotVideo(format!("invalid resolution {resolution:?}")));
        }

        let schedule = SampleSchedule::for_frame_count(source.frame_count());
        debug!(
            "sampling {} of {} frames (every {})",
            schedule.len(),
            schedule.frame_count(),
            schedule.step()
        );

        let samples = Sampler::new(source.into_frames(), schedule, resolution);
        let per_frame = self.process_samples(samples);

        //Fold in sample order, so that pooled lines are in the same order no
        //matter how the frames were processed.
        let mut pooled = LineBuckets::default();
        let mut failures = vec![];
        let mut frames_sampled = 0;
        let mut frames_decoded = 0;
        for (index, frame_lines) in per_frame {
            frames_sampled += 1;
            match frame_lines {
                Ok(frame_lines) => {
                    frames_decoded += 1;
                    pooled.extend(frame_lines);
                }
                Err(e) => {
                    warn!("Skipping frame {index}: {e}");
                    failures.push(e);
                }
            }
        }

        if frames_decoded == 0 {
            return Err(Error::NoFramesDecoded);
        }

        let filtered = pooled.filtered(self.similarity.as_ref());
        debug!(
            "kept {} of {} vertical lines: [{}]",
            filtered.vertical.len(),
            pooled.vertical.len(),
            filtered.vertical.iter().join(", ")
        );
        debug!(
            "kept {} of {} horizontal lines: [{}]",
            filtered.horizontal.len(),
            pooled.horizontal.len(),
            filtered.horizontal.iter().join(", ")
        );

        if filtered.vertical.is_empty() {
            info!("No left or right border found");
        }
        if filtered.horizontal.is_empty() {
            info!("No top or bottom border found");
        }

        let Resolved { rect, degenerate } =
            resolve_crop(&filtered.vertical, &filtered.horizontal, resolution);
        for e in &degenerate {
            warn!("Skipping line: {e}");
        }
        failures.extend(degenerate);

        info!("Detected {rect}");

        Ok(Detection {
            rect,
            resolution,
            frames_sampled,
            frames_decoded,
            vertical_lines: filtered.vertical.len(),
            horizontal_lines: filtered.horizontal.len(),
            failures,
        })
    }

    /// Segment a single frame and find the border lines in it.
    pub fn frame_lines(&self, frame: &RgbImage) -> LineBuckets {
        let mask = self.options.segmenter.segment(frame);
        let edges = self.edges.edges(&mask);
        let lines = self.lines.lines(&edges);

        let ret = LineBuckets::classify(lines, &self.options.classifier);
        ret
    }

    fn process_samples<I>(&self, samples: Sampler<I>) -> Vec<(u64, Result<LineBuckets, Error>)>
    where
        I: Iterator<Item = Result<RgbImage, Error>>,
    {
        let process = |(index, frame): (u64, Result<RgbImage, Error>)| {
            let frame_lines = frame.map(|frame| self.frame_lines(&frame));
            if let Ok(frame_lines) = &frame_lines {
                debug!(
                    "frame {index}: {} vertical, {} horizontal, {} discarded lines",
                    frame_lines.vertical.len(),
                    frame_lines.horizontal.len(),
                    frame_lines.discarded
                );
            }
            (index, frame_lines)
        };

        cfg_if! {
            if #[cfg(feature = "parallel")] {
                use rayon::prelude::*;

                //At most a handful of frames are sampled, so holding them all is fine.
                let frames = samples.collect::<Vec<_>>();
                frames.into_par_iter().map(process).collect()
            } else {
                samples.map(process).collect()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use image::Rgb;

    use super::*;
    use crate::{FrameSeq, Line};

    const BORDER: Rgb<u8> = Rgb([40, 220, 150]);
    const CONTENT: Rgb<u8> = Rgb([200, 40, 40]);

    //Returns the same lines for every frame.
    struct FixedLines(Vec<Line>);

    impl LineExtractor for FixedLines {
        fn lines(&self, _edges: &crate::EdgeMap) -> Vec<Line> {
            self.0.clone()
        }
    }

    fn frames(n: usize) -> FrameSeq {
        FrameSeq::from_images(vec![RgbImage::from_pixel(100, 100, CONTENT); n]).unwrap()
    }

    #[test]
    fn test_lines_are_pooled_and_filtered() {
        let detector = BorderCropDetector::default().with_line_extractor(FixedLines(vec![
            Line::new(12.0, 0.0),
            Line::new(88.0, 0.0),
            Line::new(20.0, std::f64::consts::FRAC_PI_2),
            Line::new(50.0, 45f64.to_radians()),
        ]));

        //Each line appears once per frame, so with two frames every line has a twin.
        let act = detector.detect_source(frames(2)).unwrap();
        assert_eq!(act.rect.corners(), (12, 20, 88, 100));
        assert_eq!(act.frames_sampled, 2);
        assert_eq!(act.frames_decoded, 2);
        assert_eq!(act.vertical_lines, 4);
        assert_eq!(act.horizontal_lines, 2);
        assert!(act.failures.is_empty());
        assert!(act.border_detected());

        //These lines are far apart, so from a single frame none has a neighbour.
        let act = detector.detect_source(frames(1)).unwrap();
        assert!(act.rect.is_uncropped());
        assert!(!act.border_detected());
    }

    //Passes the border mask straight through as the edge map.
    struct MaskEdges;

    impl EdgeExtractor for MaskEdges {
        fn edges(&self, mask: &crate::BorderMask) -> crate::EdgeMap {
            mask.as_gray().clone()
        }
    }

    //A line at x = 10 for all-border frames and at x = 13 otherwise.
    struct ShiftedLines;

    impl LineExtractor for ShiftedLines {
        fn lines(&self, edges: &crate::EdgeMap) -> Vec<Line> {
            let r = if edges.get_pixel(0, 0)[0] > 0 { 10.0 } else { 13.0 };
            vec![Line::new(r, 0.0)]
        }
    }

    #[test]
    fn test_nearby_lines_from_different_frames() {
        let seq = FrameSeq::from_images(vec![
            RgbImage::from_pixel(100, 100, BORDER),
            RgbImage::from_pixel(100, 100, CONTENT),
        ])
        .unwrap();

        let detector = BorderCropDetector::default()
            .with_edge_extractor(MaskEdges)
            .with_line_extractor(ShiftedLines);

        let act = detector.detect_source(seq).unwrap();
        assert_eq!(act.frames_decoded, 2);
        assert_eq!(act.vertical_lines, 2);
        assert_eq!(act.horizontal_lines, 0);
        assert_eq!(act.rect.corners(), (13, 0, 100, 100));
    }

    #[test]
    fn test_degenerate_lines_are_reported() {
        struct Always;
        impl SimilarityTest for Always {
            fn is_similar(&self, _a: &Line, _b: &Line) -> bool {
                true
            }
        }

        let bad = Line::new(f64::INFINITY, 0.0);
        let detector = BorderCropDetector::default()
            .with_line_extractor(FixedLines(vec![Line::new(10.0, 0.0), bad]))
            .with_similarity_test(Always);

        let act = detector.detect_source(frames(1)).unwrap();
        assert_eq!(act.rect.corners(), (10, 0, 100, 100));
        assert_eq!(act.vertical_lines, 2);
        assert!(matches!(
            act.failures.as_slice(),
            [Error::DegenerateLine {
                orientation: crate::Orientation::Vertical,
                ..
            }]
        ));
    }

    #[test]
    fn test_no_border_pixels() {
        let act = BorderCropDetector::default().detect_source(frames(4)).unwrap();
        assert!(act.rect.is_uncropped());
        assert_eq!(act.vertical_lines, 0);
        assert_eq!(act.horizontal_lines, 0);
    }

    #[test]
    fn test_all_frames_fail() {
        let seq = FrameSeq::new(
            (100, 100),
            8,
            (0..8).map(|_| Err(Error::VidProc(String::from("bad")))),
        );
        let act = BorderCropDetector::default().detect_source(seq);
        assert_eq!(act, Err(Error::NoFramesDecoded));

        let empty = FrameSeq::new((100, 100), 0, vec![]);
        let act = BorderCropDetector::default().detect_source(empty);
        assert_eq!(act, Err(Error::NoFramesDecoded));
    }

    #[test]
    fn test_zero_resolution() {
        let seq = FrameSeq::new((0, 100), 1, vec![Ok(RgbImage::new(0, 100))]);
        let act = BorderCropDetector::default().detect_source(seq);
        assert!(matches!(act, Err(Error::NotVideo(_))));
    }

    #[test]
    fn test_invalid_options() {
        let mut opts = DetectionOptions::default();
        opts.hough.theta_resolution = -1.0;

        let act = BorderCropDetector::from_options(opts).detect_source(frames(1));
        assert!(matches!(act, Err(Error::InvalidOptions(_))));
    }

    #[test]
    fn test_frame_lines() {
        //a 10 pixel border around a 100x100 frame, with a low enough threshold for
        //the 80 pixel long inner edges.
        let mut opts = DetectionOptions::default();
        opts.hough.vote_threshold = 60;
        let detector = BorderCropDetector::from_options(opts);

        let inner = CropRect::from_corners((100, 100), 10, 10, 90, 90).unwrap();
        let mut frame = RgbImage::from_pixel(100, 100, BORDER);
        for (x, y) in inner.enumerate_coords() {
            frame.put_pixel(x, y, CONTENT);
        }

        let act = detector.frame_lines(&frame);
        assert!(!act.vertical.is_empty());
        assert!(!act.horizontal.is_empty());

        for line in &act.vertical {
            let x = crate::geometry::x_intercept(line, 50.0).unwrap();
            assert!((x - 10.0).abs() < 3.0 || (x - 90.0).abs() < 3.0, "{line}");
        }
        for line in &act.horizontal {
            let y = crate::geometry::y_intercept(line, 50.0).unwrap();
            assert!((y - 10.0).abs() < 3.0 || (y - 90.0).abs() < 3.0, "{line}");
        }
    }
}
