use image::RgbImage;

use crate::definitions::SAMPLES_PER_VIDEO;
use crate::Error;

/// Which frames of a video are analysed: every `step`th frame starting from the first, where
/// `step = frame_count / 4`. Videos shorter than 4 frames have every frame sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSchedule {
    frame_count: u64,
    step: u64,
}

impl SampleSchedule {
    pub fn for_frame_count(frame_count: u64) -> Self {
        Self {
            frame_count,
            step: (frame_count / SAMPLES_PER_VIDEO).max(1),
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn contains(&self, index: u64) -> bool {
        index < self.frame_count && index % self.step == 0
    }

    pub fn indices(&self) -> impl Iterator<Item = u64> {
        (0..self.frame_count).step_by(self.step as usize)
    }

    pub fn len(&self) -> u64 {
        self.frame_count.div_ceil(self.step)
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    /// How many frames from the start of the video must be decoded to reach every sample.
    pub fn frames_to_decode(&self) -> u64 {
        self.last().map_or(0, |last| last + 1)
    }

    fn last(&self) -> Option<u64> {
        let last_frame = self.frame_count.checked_sub(1)?;
        Some(last_frame - last_frame % self.step)
    }

    //the first scheduled index at or after `index`
    fn next_from(&self, index: u64) -> Option<u64> {
        let ret = index.div_ceil(self.step).checked_mul(self.step)?;
        (ret < self.frame_count).then_some(ret)
    }
}

/// Picks the scheduled frames out of a stream of decoded frames.
///
/// Yields `(index, frame)` for every scheduled index, in order. Frames that failed to decode, or
/// that have the wrong resolution, are yielded as errors. If the stream ends early, every
/// scheduled index that was never reached is yielded as an [`Error::FrameDecode`].
///
/// The underlying stream is not read past the last scheduled frame.
pub struct Sampler<I> {
    frames: I,
    schedule: SampleSchedule,
    resolution: (u32, u32),
    next_index: u64,
    exhausted: bool,
}

impl<I> Sampler<I>
where
    I: Iterator<Item = Result<RgbImage, Error>>,
{
    pub fn new(frames: I, schedule: SampleSchedule, resolution: (u32, u32)) -> Self {
        Self {
            frames,
            schedule,
            resolution,
            next_index: 0,
            exhausted: false,
        }
    }

    fn check(&self, index: u64, frame: Result<RgbImage, Error>) -> Result<RgbImage, Error> {
        let frame = frame.map_err(|e| Error::FrameDecode {
            index,
            reason: e.to_string(),
        })?;

        if frame.dimensions() != self.resolution {
            return Err(Error::ResolutionMismatch {
                index,
                expected: self.resolution,
                actual: frame.dimensions(),
            });
        }

        Ok(frame)
    }
}

impl<I> Iterator for Sampler<I>
where
    I: Iterator<Item = Result<RgbImage, Error>>,
{
    type Item = (u64, Result<RgbImage, Error>);

    fn next(&mut self) -> Option<Self::Item> {
        while !self.exhausted {
            let index = self.next_index;
            if self.schedule.last().is_none_or(|last| index > last) {
                self.exhausted = true;
                break;
            }

            let Some(frame) = self.frames.next() else {
                self.exhausted = true;
                break;
            };
            self.next_index += 1;

            if self.schedule.contains(index) {
                return Some((index, self.check(index, frame)));
            }
        }

        let missing = self.schedule.next_from(self.next_index)?;
        self.next_index = missing + 1;
        let err = Error::FrameDecode {
            index: missing,
            reason: String::from("the video ended before this frame"),
        };
        Some((missing, Err(err)))
    }
}

#[cfg(test)]
mod test {
    use itertools::Itertools;

    use super::*;

    fn frames(n: usize) -> impl Iterator<Item = Result<RgbImage, Error>> {
        std::iter::repeat_with(|| Ok(RgbImage::new(4, 4))).take(n)
    }

    #[test]
    fn test_schedule() {
        let sched = SampleSchedule::for_frame_count(100);
        assert_eq!(sched.step(), 25);
        assert_eq!(sched.indices().collect_vec(), vec![0, 25, 50, 75]);
        assert_eq!(sched.len(), 4);

        let sched = SampleSchedule::for_frame_count(101);
        assert_eq!(sched.indices().collect_vec(), vec![0, 25, 50, 75, 100]);
        assert_eq!(sched.len(), 5);

        let sched = SampleSchedule::for_frame_count(7);
        assert_eq!(sched.step(), 1);
        assert_eq!(sched.len(), 7);
    }

    #[test]
    fn test_frames_to_decode() {
        //the tail after the last sample is never needed
        assert_eq!(SampleSchedule::for_frame_count(100).frames_to_decode(), 76);
        assert_eq!(SampleSchedule::for_frame_count(101).frames_to_decode(), 101);
        assert_eq!(SampleSchedule::for_frame_count(3).frames_to_decode(), 3);
        assert_eq!(SampleSchedule::for_frame_count(0).frames_to_decode(), 0);

        //a source cut off at the limit still yields every sample
        let sched = SampleSchedule::for_frame_count(100);
        let limit = sched.frames_to_decode() as usize;
        let samples = Sampler::new(frames(limit), sched, (4, 4)).collect_vec();
        assert_eq!(samples.iter().map(|(i, _)| *i).collect_vec(), vec![0, 25, 50, 75]);
        assert!(samples.iter().all(|(_, f)| f.is_ok()));
    }

    #[test]
    fn test_short_videos_sample_every_frame() {
        for n in 1..4 {
            let sched = SampleSchedule::for_frame_count(n);
            assert_eq!(sched.step(), 1);
            assert_eq!(sched.indices().collect_vec(), (0..n).collect_vec());
        }

        let sched = SampleSchedule::for_frame_count(0);
        assert!(sched.is_empty());
        assert_eq!(sched.indices().count(), 0);
        assert!(!sched.contains(0));
    }

    #[test]
    fn test_samples_scheduled_frames() {
        let sched = SampleSchedule::for_frame_count(100);
        let sampled = Sampler::new(frames(100), sched, (4, 4)).collect_vec();

        assert_eq!(sampled.iter().map(|(i, _)| *i).collect_vec(), vec![0, 25, 50, 75]);
        assert!(sampled.iter().all(|(_, frame)| frame.is_ok()));
    }

    #[test]
    fn test_stops_reading_after_last_sample() {
        let sched = SampleSchedule::for_frame_count(100);
        let mut read = 0;
        let counted = frames(100).inspect(|_| read += 1);

        let sampled = Sampler::new(counted, sched, (4, 4)).count();
        assert_eq!(sampled, 4);
        assert_eq!(read, 76);
    }

    #[test]
    fn test_frames_beyond_frame_count_are_ignored() {
        let sched = SampleSchedule::for_frame_count(8);
        let sampled = Sampler::new(frames(20), sched, (4, 4)).collect_vec();
        assert_eq!(sampled.iter().map(|(i, _)| *i).collect_vec(), vec![0, 2, 4, 6]);
    }

    #[test]
    fn test_missing_frames_are_reported() {
        //container claims 100 frames but the stream ends after 30.
        let sched = SampleSchedule::for_frame_count(100);
        let sampled = Sampler::new(frames(30), sched, (4, 4)).collect_vec();

        assert_eq!(sampled.iter().map(|(i, _)| *i).collect_vec(), vec![0, 25, 50, 75]);
        assert!(sampled[0].1.is_ok());
        assert!(sampled[1].1.is_ok());
        assert!(matches!(sampled[2].1, Err(Error::FrameDecode { index: 50, .. })));
        assert!(matches!(sampled[3].1, Err(Error::FrameDecode { index: 75, .. })));
    }

    #[test]
    fn test_bad_frames_are_reported() {
        let sched = SampleSchedule::for_frame_count(8);
        let stream = (0..8).map(|i| match i {
            2 => Err(Error::VidProc(String::from("corrupt packet"))),
            4 => Ok(RgbImage::new(3, 4)),
            //not sampled, so the error is never seen
            5 => Err(Error::VidProc(String::from("corrupt packet"))),
            _ => Ok(RgbImage::new(4, 4)),
        });

        let sampled = Sampler::new(stream, sched, (4, 4)).collect_vec();
        assert_eq!(sampled.len(), 4);
        assert!(sampled[0].1.is_ok());
        assert!(matches!(&sampled[1].1, Err(Error::FrameDecode { index: 2, reason }) if reason.contains("corrupt")));
        assert!(matches!(
            sampled[2].1,
            Err(Error::ResolutionMismatch {
                index: 4,
                expected: (4, 4),
                actual: (3, 4)
            })
        ));
        assert!(sampled[3].1.is_ok());
    }
}
