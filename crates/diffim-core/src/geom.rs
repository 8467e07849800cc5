use std::fmt;

/// Integer pixel box in parent coordinates.
///
/// `(x0, y0)` is the parent coordinate of local pixel `[0, 0]`; the box covers
/// `x0..x0 + width` and `y0..y0 + height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct BoundingBox {
    pub x0: i32,
    pub y0: i32,
    pub width: usize,
    pub height: usize,
}

impl BoundingBox {
    pub fn new(x0: i32, y0: i32, width: usize, height: usize) -> Self {
        Self {
            x0,
            y0,
            width,
            height,
        }
    }

    /// One past the last column, in parent coordinates.
    pub fn x_end(&self) -> i64 {
        self.x0 as i64 + self.width as i64
    }

    /// One past the last row, in parent coordinates.
    pub fn y_end(&self) -> i64 {
        self.y0 as i64 + self.height as i64
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Overlap of two boxes, or `None` when they are disjoint.
    pub fn intersect(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        let x1 = self.x_end().min(other.x_end());
        let y1 = self.y_end().min(other.y_end());
        if x1 <= x0 as i64 || y1 <= y0 as i64 {
            return None;
        }
        Some(BoundingBox::new(
            x0,
            y0,
            (x1 - x0 as i64) as usize,
            (y1 - y0 as i64) as usize,
        ))
    }

    /// Geometric centre in parent coordinates (pixel centres at integers).
    pub fn center(&self) -> (f64, f64) {
        (
            self.x0 as f64 + (self.width as f64 - 1.0) / 2.0,
            self.y0 as f64 + (self.height as f64 - 1.0) / 2.0,
        )
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}) x [{}, {})",
            self.x0,
            self.x_end(),
            self.y0,
            self.y_end()
        )
    }
}
