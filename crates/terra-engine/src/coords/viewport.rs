/// Rectangle of the framebuffer that draws are mapped to, in physical pixels.
///
/// Origin is the top-left corner of the framebuffer, +Y down, matching wgpu's
/// viewport convention. `bottom()` is therefore the larger Y edge.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Viewport covering a whole framebuffer of the given size.
    #[inline]
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width.min(i32::MAX as u32) as i32, height.min(i32::MAX as u32) as i32)
    }

    #[inline]
    pub const fn left(self) -> i32 {
        self.x
    }

    #[inline]
    pub const fn right(self) -> i32 {
        self.x + self.width
    }

    #[inline]
    pub const fn top(self) -> i32 {
        self.y
    }

    #[inline]
    pub const fn bottom(self) -> i32 {
        self.y + self.height
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Width over height; 1.0 for degenerate viewports.
    pub fn aspect_ratio(self) -> f64 {
        if self.is_valid() {
            self.width as f64 / self.height as f64
        } else {
            1.0
        }
    }

    /// Clamps the viewport to a `(width, height)` framebuffer.
    ///
    /// Returns `None` when nothing of the viewport lies inside it.
    pub fn clamped_to(self, fb_width: u32, fb_height: u32) -> Option<Self> {
        let fb = Self::from_size(fb_width, fb_height);
        let left = self.left().max(fb.left());
        let top = self.top().max(fb.top());
        let right = self.right().min(fb.right());
        let bottom = self.bottom().min(fb.bottom());

        let clamped = Self::new(left, top, right - left, bottom - top);
        clamped.is_valid().then_some(clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges() {
        let v = Viewport::new(10, 20, 300, 200);
        assert_eq!(v.left(), 10);
        assert_eq!(v.right(), 310);
        assert_eq!(v.top(), 20);
        assert_eq!(v.bottom(), 220);
    }

    #[test]
    fn aspect_ratio_of_degenerate_viewport_is_one() {
        assert_eq!(Viewport::new(0, 0, 0, 100).aspect_ratio(), 1.0);
        assert_eq!(Viewport::from_size(1600, 800).aspect_ratio(), 2.0);
    }

    #[test]
    fn clamped_to_framebuffer() {
        let v = Viewport::new(-10, 50, 200, 100);
        assert_eq!(v.clamped_to(100, 100), Some(Viewport::new(0, 50, 100, 50)));
    }

    #[test]
    fn clamped_outside_framebuffer_is_none() {
        assert_eq!(Viewport::new(500, 500, 10, 10).clamped_to(100, 100), None);
    }
}
