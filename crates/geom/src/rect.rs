use super::Point;

/// An axis-aligned rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// X coordinate of the top-left corner.
    pub x: f32,
    /// Y coordinate of the top-left corner.
    pub y: f32,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

impl Rect {
    /// Construct a rectangle from its top-left corner and size.
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Does this rect have a zero (or negative) size?
    pub fn is_zero(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Left edge coordinate.
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Right edge coordinate.
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// Top edge coordinate.
    pub fn top(&self) -> f32 {
        self.y
    }

    /// Bottom edge coordinate.
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.w / 2.0,
            y: self.y + self.h / 2.0,
        }
    }

    /// Does this rectangle contain the point?
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
    }

    /// Return a copy translated by the given offsets.
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            w: self.w,
            h: self.h,
        }
    }

    /// Return a copy with the top-left corner moved to the given coordinates.
    pub fn at(&self, x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            w: self.w,
            h: self.h,
        }
    }
}

impl From<(f32, f32, f32, f32)> for Rect {
    #[inline]
    fn from(v: (f32, f32, f32, f32)) -> Self {
        Self {
            x: v.0,
            y: v.1,
            w: v.2,
            h: v.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.left(), 10.0);
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.top(), 20.0);
        assert_eq!(r.bottom(), 60.0);
        assert_eq!(r.center(), Point::new(25.0, 40.0));
    }

    #[test]
    fn contains_excludes_far_edges() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(!r.contains(Point::new(10.0, 10.0)));
    }
}
