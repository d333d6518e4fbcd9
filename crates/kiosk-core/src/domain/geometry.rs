//! Rectangles in the shared logical coordinate space.

/// An axis-aligned rectangle.
///
/// Used both for output bounds in layout space and for surface geometry in
/// output-local space.  Bounds are half-open: a point on the right or bottom
/// edge belongs to the neighbour, not to this rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate of the top-left corner (may be negative).
    pub x: i32,
    /// Y coordinate of the top-left corner (may be negative).
    pub y: i32,
    /// Width in logical pixels.
    pub width: u32,
    /// Height in logical pixels.
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the rightmost X coordinate (exclusive), saturating at `i32::MAX`.
    pub fn right(&self) -> i32 {
        self.x.saturating_add_unsigned(self.width)
    }

    /// Returns the bottommost Y coordinate (exclusive), saturating at `i32::MAX`.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add_unsigned(self.height)
    }

    /// Returns `true` if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if this rectangle shares any area with `other`.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Returns `true` if the point lies inside the rectangle.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= f64::from(self.x)
            && x < f64::from(self.right())
            && y >= f64::from(self.y)
            && y < f64::from(self.bottom())
    }

    /// Returns the rectangle with the same size placed at the origin.
    pub fn at_origin(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }
}

/// A width/height pair, e.g. an output mode or a surface size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}
