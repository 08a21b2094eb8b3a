use serde::{Deserialize, Serialize};

/// Bounding box of a detected blob; `x + w` and `y + h` are exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub pixel_count: u32,
}

impl Region {
    pub fn new(x: i32, y: i32, w: i32, h: i32, pixel_count: u32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            pixel_count,
        }
    }

    /// Bounding-box area in pixels
    pub fn area(&self) -> i64 {
        self.w as i64 * self.h as i64
    }

    /// Centre of the bounding box
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.w as f64 / 2.0,
            self.y as f64 + self.h as f64 / 2.0,
        )
    }

    /// Euclidean distance between two bounding-box centres
    pub fn center_distance(&self, other: &Region) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).hypot(ay - by)
    }

    /// Grow this region to the union of both boxes and add the other's pixels
    pub fn absorb(&mut self, other: &Region) {
        let right = (self.x + self.w).max(other.x + other.w);
        let bottom = (self.y + self.h).max(other.y + other.h);
        self.x = self.x.min(other.x);
        self.y = self.y.min(other.y);
        self.w = right - self.x;
        self.h = bottom - self.y;
        self.pixel_count += other.pixel_count;
    }
}
