/// Integer axis-aligned rectangle in screen coordinates (TOP / LEFT corner is 0/0)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle of size `(w, h)` with its top-left corner at the truncated position `(x, y)`
    pub fn at(x: f32, y: f32, (w, h): (i32, i32)) -> Self {
        Self::new(x as i32, y as i32, w, h)
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Grows (or shrinks, for negative values) the rectangle around its center.
    /// Half of the delta moves the origin, truncated towards zero.
    pub fn inflate(&self, dw: i32, dh: i32) -> Self {
        Self {
            x: self.x - dw / 2,
            y: self.y - dh / 2,
            w: self.w + dw,
            h: self.h + dh,
        }
    }

    /// Same size, moved vertically so that its bottom edge lies at `bottom`
    pub fn with_bottom(&self, bottom: i32) -> Self {
        Self {
            y: bottom - self.h,
            ..*self
        }
    }

    /// Shrinks by `dw`/`dh` and keeps the bottom edge in place
    pub fn inset_bottom_aligned(&self, dw: i32, dh: i32) -> Self {
        self.inflate(-dw, -dh).with_bottom(self.bottom())
    }

    /// Strict overlap test: touching edges do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.w > 0
            && self.h > 0
            && other.w > 0
            && other.h > 0
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Rect::new(80, 310, 88, 94), -20, -10, Rect::new(90, 315, 68, 84))]
    #[case(Rect::new(0, 0, 99, 95), -60, -30, Rect::new(30, 15, 39, 65))]
    // odd deltas truncate towards zero
    #[case(Rect::new(10, 10, 48, 95), -26, -13, Rect::new(23, 16, 22, 82))]
    #[case(Rect::new(5, 5, 10, 10), 3, 3, Rect::new(4, 4, 13, 13))]
    fn test_inflate(#[case] rect: Rect, #[case] dw: i32, #[case] dh: i32, #[case] expected: Rect) {
        assert_eq!(rect.inflate(dw, dh), expected);
    }

    #[test]
    fn test_inset_bottom_aligned() {
        let full = Rect::new(1200, 300, 48, 95);
        let hitbox = full.inset_bottom_aligned(26, 13);
        assert_eq!(hitbox.bottom(), full.bottom());
        assert_eq!(hitbox.w, 22);
        assert_eq!(hitbox.h, 82);
        assert_eq!(hitbox.x, 1213);
    }

    #[rstest]
    #[case(Rect::new(0, 0, 10, 10), Rect::new(5, 5, 10, 10), true)]
    #[case(Rect::new(0, 0, 10, 10), Rect::new(10, 0, 10, 10), false)]
    #[case(Rect::new(0, 0, 10, 10), Rect::new(0, 10, 10, 10), false)]
    #[case(Rect::new(0, 0, 10, 10), Rect::new(9, 9, 10, 10), true)]
    #[case(Rect::new(0, 0, 10, 10), Rect::new(2, 2, 3, 3), true)]
    #[case(Rect::new(0, 0, 10, 10), Rect::new(2, 2, 0, 3), false)]
    fn test_intersects(#[case] a: Rect, #[case] b: Rect, #[case] expected: bool) {
        assert_eq!(a.intersects(&b), expected);
        assert_eq!(b.intersects(&a), expected);
    }

    #[rstest]
    #[case(12.9, 3.2, 12, 3)]
    #[case(-5.7, 0.0, -5, 0)]
    fn test_at_truncates(#[case] x: f32, #[case] y: f32, #[case] ex: i32, #[case] ey: i32) {
        let r = Rect::at(x, y, (4, 4));
        assert_eq!((r.x, r.y), (ex, ey));
    }
}
