use std::fmt;

/// An axis-aligned rectangle in pixel coordinates, as requested by the caller.
///
/// No bounds are enforced at construction: coordinates may be negative or
/// extend past the frame. [`Region::clamp_to`] resolves the visible part.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Half-open pixel bounds `[left, right) × [top, bottom)` guaranteed to lie
/// inside a frame and to be non-empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelBounds {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a region from real-valued coordinates, truncating toward zero.
    ///
    /// NaN maps to 0 and out-of-range values saturate at the `i32` limits.
    pub fn from_coordinates(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x as i32, y as i32, width as i32, height as i32)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// True when `(px, py)` lies inside `[x, x+width) × [y, y+height)`.
    pub fn contains(&self, px: i64, py: i64) -> bool {
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        px >= x && px < x + i64::from(self.width) && py >= y && py < y + i64::from(self.height)
    }

    /// Intersects the region with a `frame_width × frame_height` frame.
    ///
    /// Returns `None` when nothing of the region is visible.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<PixelBounds> {
        if self.is_empty() {
            return None;
        }
        let (fw, fh) = (i64::from(frame_width), i64::from(frame_height));
        let left = i64::from(self.x).clamp(0, fw);
        let top = i64::from(self.y).clamp(0, fh);
        let right = (i64::from(self.x) + i64::from(self.width)).clamp(0, fw);
        let bottom = (i64::from(self.y) + i64::from(self.height)).clamp(0, fh);

        if right <= left || bottom <= top {
            return None;
        }
        Some(PixelBounds {
            left: left as usize,
            top: top as usize,
            right: right as usize,
            bottom: bottom as usize,
        })
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) {}x{}", self.x, self.y, self.width, self.height)
    }
}

impl PixelBounds {
    pub fn width(&self) -> usize {
        self.right - self.left
    }

    pub fn height(&self) -> usize {
        self.bottom - self.top
    }

    pub fn contains(&self, col: usize, row: usize) -> bool {
        (self.left..self.right).contains(&col) && (self.top..self.bottom).contains(&row)
    }
}
