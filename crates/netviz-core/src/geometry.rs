use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Sub};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    pub fn distance_sq(self, other: Vec2) -> f32 {
        (self - other).length_sq()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;
    fn div(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

/// Axis-aligned rectangle, edges inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.min.x + self.width() * 0.5,
            self.min.y + self.height() * 0.5,
        )
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// The four border segments, clockwise from the top edge.
    pub fn borders(&self) -> [LineSegment; 4] {
        let top_right = Vec2::new(self.max.x, self.min.y);
        let bottom_left = Vec2::new(self.min.x, self.max.y);
        [
            LineSegment::new(self.min, top_right),
            LineSegment::new(top_right, self.max),
            LineSegment::new(self.max, bottom_left),
            LineSegment::new(bottom_left, self.min),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub a: Vec2,
    pub b: Vec2,
}

impl LineSegment {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    pub fn length(&self) -> f32 {
        (self.b - self.a).length()
    }

    /// Perpendicular distance from `point` to the infinite line through the segment.
    ///
    /// Returns `None` for a zero-length segment.
    pub fn line_distance(&self, point: Vec2) -> Option<f32> {
        let d = self.b - self.a;
        let len = d.length();
        if len == 0.0 || !len.is_finite() {
            return None;
        }
        let cross = d.x * (self.a.y - point.y) - (self.a.x - point.x) * d.y;
        Some(cross.abs() / len)
    }

    /// Whether `x` lies strictly inside the segment's horizontal extent.
    pub fn spans_x(&self, x: f32) -> bool {
        self.a.x.min(self.b.x) < x && x < self.a.x.max(self.b.x)
    }

    /// Bounded intersection: both segments must contain the crossing point.
    ///
    /// Parallel and collinear segments do not intersect.
    pub fn intersects(&self, other: &LineSegment) -> bool {
        let r = self.b - self.a;
        let s = other.b - other.a;
        let denom = r.x * s.y - r.y * s.x;
        if denom == 0.0 {
            return false;
        }
        let qp = other.a - self.a;
        let t = (qp.x * s.y - qp.y * s.x) / denom;
        let u = (qp.x * r.y - qp.y * r.x) / denom;
        (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
    }
}
