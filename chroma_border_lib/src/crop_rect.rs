use serde::{Deserialize, Serialize};

/// The region of a frame to keep, as inclusive-exclusive pixel offsets from the top left corner.
///
/// Always satisfies `0 <= x1 <= x2 <= width` and `0 <= y1 <= y2 <= height`. A rectangle starts out
/// covering the whole frame and can only ever be tightened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropRect {
    orig_res: (u32, u32),
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
}

impl CropRect {
    /// A rectangle covering an entire frame of the given resolution.
    #[must_use]
    pub fn full_frame(orig_res: (u32, u32)) -> Self {
        Self {
            orig_res,
            x1: 0,
            y1: 0,
            x2: orig_res.0,
            y2: orig_res.1,
        }
    }

    /// Returns None if the corners do not describe a rectangle inside the frame.
    pub fn from_corners(orig_res: (u32, u32), x1: u32, y1: u32, x2: u32, y2: u32) -> Option<Self> {
        let (width, height) = orig_res;
        if x1 > x2 || x2 > width || y1 > y2 || y2 > height {
            return None;
        }

        Some(Self {
            orig_res,
            x1,
            y1,
            x2,
            y2,
        })
    }

    /// Returns None if the offsets overlap.
    pub fn from_edge_offsets(
        orig_res: (u32, u32),
        left: u32,
        right: u32,
        top: u32,
        bottom: u32,
    ) -> Option<Self> {
        let (orig_width, orig_height) = orig_res;
        let x2 = orig_width.checked_sub(right)?;
        let y2 = orig_height.checked_sub(bottom)?;
        Self::from_corners(orig_res, left, top, x2, y2)
    }

    pub fn orig_res(&self) -> (u32, u32) {
        self.orig_res
    }

    pub fn x1(&self) -> u32 {
        self.x1
    }

    pub fn y1(&self) -> u32 {
        self.y1
    }

    pub fn x2(&self) -> u32 {
        self.x2
    }

    pub fn y2(&self) -> u32 {
        self.y2
    }

    /// (x1, y1, x2, y2)
    pub fn corners(&self) -> (u32, u32, u32, u32) {
        (self.x1, self.y1, self.x2, self.y2)
    }

    // The tighten_* functions take signed values because intercepts of lines
    // that leave the frame can be negative. Values are clamped into the frame and
    // against the opposite edge.

    /// Raise x1 to x, unless it is already further right.
    pub fn tighten_left(&mut self, x: i64) {
        let x = clamp_to(x, self.x2);
        self.x1 = self.x1.max(x);
    }

    /// Lower x2 to x, unless it is already further left.
    pub fn tighten_right(&mut self, x: i64) {
        let x = clamp_to(x, self.x2).max(self.x1);
        self.x2 = self.x2.min(x);
    }

    /// Raise y1 to y, unless it is already further down.
    pub fn tighten_top(&mut self, y: i64) {
        let y = clamp_to(y, self.y2);
        self.y1 = self.y1.max(y);
    }

    /// Lower y2 to y, unless it is already further up.
    pub fn tighten_bottom(&mut self, y: i64) {
        let y = clamp_to(y, self.y2).max(self.y1);
        self.y2 = self.y2.min(y);
    }

    /// (x, y, width, height), the argument order of ffmpeg's crop filter.
    #[must_use]
    pub fn as_view_args(&self) -> (u32, u32, u32, u32) {
        (self.x1, self.y1, self.width(), self.height())
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// Every pixel inside the rectangle
    pub fn enumerate_coords(&self) -> impl Iterator<Item = (u32, u32)> {
        let xs = self.x1..self.x2;
        let ys = self.y1..self.y2;

        xs.flat_map(move |x| ys.clone().map(move |y| (x, y)))
    }

    /// Every pixel of the frame outside the rectangle
    pub fn enumerate_coords_excluded(&self) -> impl Iterator<Item = (u32, u32)> {
        let (orig_x, orig_y) = self.orig_res;

        let (x0, x1, x2, x3) = (0, self.x1, self.x2, orig_x);
        let (y0, y1, y2, y3) = (0, self.y1, self.y2, orig_y);

        //clockwise starting at topleft (tl)
        let tl = (x0..x1).flat_map(move |x| (y0..y1).map(move |y| (x, y)));
        let tm = (x1..x2).flat_map(move |x| (y0..y1).map(move |y| (x, y)));
        let tr = (x2..x3).flat_map(move |x| (y0..y1).map(move |y| (x, y)));
        let mr = (x2..x3).flat_map(move |x| (y1..y2).map(move |y| (x, y)));
        let br = (x2..x3).flat_map(move |x| (y2..y3).map(move |y| (x, y)));
        let bm = (x1..x2).flat_map(move |x| (y2..y3).map(move |y| (x, y)));
        let bl = (x0..x1).flat_map(move |x| (y2..y3).map(move |y| (x, y)));
        let ml = (x0..x1).flat_map(move |x| (y1..y2).map(move |y| (x, y)));

        tl.chain(tm.chain(tr.chain(mr.chain(br.chain(bm.chain(bl.chain(ml)))))))
    }

    pub fn is_uncropped(&self) -> bool {
        *self == Self::full_frame(self.orig_res)
    }
}

fn clamp_to(val: i64, max: u32) -> u32 {
    //clamp guarantees the value fits.
    val.clamp(0, i64::from(max)) as u32
}

impl std::fmt::Display for CropRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (x, y, w, h) = self.as_view_args();
        write!(
            f,
            "crop={w}:{h}:{x}:{y} ({}, {}, {}, {})",
            self.x1, self.y1, self.x2, self.y2
        )
    }
}

#[cfg(test)]
mod test {
    use itertools::Itertools;

    use super::*;

    #[test]
    fn test_as_view_args_nocrop() {
        let crop = CropRect::full_frame((100, 100));
        let exp: (u32, u32, u32, u32) = (0, 0, 100, 100);
        let act = crop.as_view_args();
        assert_eq!(exp, act);
        assert!(crop.is_uncropped());
    }

    #[test]
    fn test_as_view_args_1pix_left() {
        let crop = CropRect::from_edge_offsets((100, 100), 1, 0, 0, 0).unwrap();
        let exp: (u32, u32, u32, u32) = (1, 0, 99, 100);
        let act = crop.as_view_args();
        assert_eq!(exp, act);
    }

    #[test]
    fn test_as_view_args_1pix_right() {
        let crop = CropRect::from_edge_offsets((100, 100), 0, 1, 0, 0).unwrap();
        let exp: (u32, u32, u32, u32) = (0, 0, 99, 100);
        let act = crop.as_view_args();
        assert_eq!(exp, act);
    }

    #[test]
    fn test_as_view_args_1pix_top() {
        let crop = CropRect::from_edge_offsets((100, 100), 0, 0, 1, 0).unwrap();
        let exp: (u32, u32, u32, u32) = (0, 1, 100, 99);
        let act = crop.as_view_args();
        assert_eq!(exp, act);
    }

    #[test]
    fn test_as_view_args_1pix_bot() {
        let crop = CropRect::from_edge_offsets((100, 100), 0, 0, 0, 1).unwrap();
        let exp: (u32, u32, u32, u32) = (0, 0, 100, 99);
        let act = crop.as_view_args();
        assert_eq!(exp, act);
    }

    #[test]
    fn test_as_view_args_four_more() {
        let crop = CropRect::from_edge_offsets((768, 432), 96, 96, 0, 0).unwrap();
        let exp: (u32, u32, u32, u32) = (96, 0, 576, 432);
        let act = crop.as_view_args();
        assert_eq!(exp, act);
    }

    #[test]
    fn test_invalid_corners() {
        assert_eq!(CropRect::from_corners((100, 100), 60, 0, 40, 100), None);
        assert_eq!(CropRect::from_corners((100, 100), 0, 0, 101, 100), None);
        assert_eq!(CropRect::from_edge_offsets((100, 100), 0, 0, 0, 101), None);
    }

    #[test]
    fn test_tighten_only_moves_inwards() {
        let mut crop = CropRect::full_frame((100, 50));

        crop.tighten_left(10);
        crop.tighten_left(5);
        assert_eq!(crop.x1(), 10);

        crop.tighten_right(90);
        crop.tighten_right(95);
        assert_eq!(crop.x2(), 90);

        crop.tighten_top(3);
        crop.tighten_top(1);
        assert_eq!(crop.y1(), 3);

        crop.tighten_bottom(40);
        crop.tighten_bottom(45);
        assert_eq!(crop.y2(), 40);

        assert_eq!(crop.to_string(), "crop=80:37:10:3 (10, 3, 90, 40)");
    }

    #[test]
    fn test_tighten_is_clamped() {
        let mut crop = CropRect::full_frame((100, 50));

        crop.tighten_left(-20);
        crop.tighten_right(1000);
        crop.tighten_top(i64::MIN);
        crop.tighten_bottom(i64::MAX);
        assert!(crop.is_uncropped());

        //crossing edges collapse onto each other rather than inverting.
        crop.tighten_left(70);
        crop.tighten_right(30);
        assert_eq!((crop.x1(), crop.x2()), (70, 70));

        crop.tighten_bottom(10);
        crop.tighten_top(20);
        assert_eq!((crop.y1(), crop.y2()), (10, 10));
        assert_eq!(crop.area(), 0);
    }

    #[test]
    fn test_enumerate_coords_nocrop() {
        let crop = CropRect::full_frame((3, 3));
        assert_eq!(crop.enumerate_coords().count(), 9);
        assert_eq!(crop.enumerate_coords_excluded().count(), 0);
    }

    #[test]
    fn test_enumerate_coords_1pixinthemiddle() {
        let crop = CropRect::from_edge_offsets((3, 3), 1, 1, 1, 1).unwrap();

        //test included
        {
            let exp = vec![(1, 1)];
            let act = crop.enumerate_coords().collect::<Vec<_>>();
            assert_eq!(exp, act);
        }

        //test excluded
        {
            #[rustfmt::skip]
            let exp = vec![
                (0, 0), (1, 0), (2, 0),
                (0, 1),         (2, 1),
                (0, 2), (1, 2), (2, 2),
            ].into_iter().sorted().collect::<Vec<_>>();
            let act = crop
                .enumerate_coords_excluded()
                .sorted()
                .collect::<Vec<_>>();

            assert_eq!(exp, act);
        }
    }

    #[test]
    fn test_enumerate_coords_1pixintheright() {
        let crop = CropRect::from_edge_offsets((3, 3), 2, 0, 2, 0).unwrap();

        assert_eq!(crop.as_view_args(), (2, 2, 1, 1));

        let exp = vec![(2, 2)];
        let act = crop.enumerate_coords().collect::<Vec<_>>();
        assert_eq!(exp, act);

        #[rustfmt::skip]
        let exp = vec![
            (0, 0), (1, 0), (2, 0),
            (0, 1), (1, 1), (2, 1),
            (0, 2), (1, 2),
        ].into_iter().sorted().collect::<Vec<_>>();
        let act = crop
            .enumerate_coords_excluded()
            .sorted()
            .collect::<Vec<_>>();

        assert_eq!(exp, act);
    }
}
