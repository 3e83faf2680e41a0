//! 2D geometry for table-space positions.
//!
//! Positions and sizes live in an abstract "table space" (the play surface
//! coordinate system of the embedding renderer). Rotation replicates as a
//! single z-axis angle in degrees; playables on a flat table never rotate
//! about any other axis.

use serde::{Deserialize, Serialize};

/// A 2D point or extent in table space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    /// Create a vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Arithmetic mean of a set of points. Zero for an empty set.
    #[must_use]
    pub fn mean<I: IntoIterator<Item = Vec2>>(points: I) -> Vec2 {
        let mut sum = Vec2::ZERO;
        let mut count = 0u32;
        for p in points {
            sum = sum + p;
            count += 1;
        }
        if count == 0 {
            return Vec2::ZERO;
        }
        sum * (1.0 / count as f32)
    }

    /// Step from `self` toward `target` by at most `max_step`.
    ///
    /// Never overshoots: if `target` is within `max_step`, returns `target`.
    #[must_use]
    pub fn move_toward(self, target: Vec2, max_step: f32) -> Vec2 {
        let dist = self.distance(target);
        if dist <= max_step || dist <= f32::EPSILON {
            return target;
        }
        let t = max_step / dist;
        Vec2::new(
            self.x + (target.x - self.x) * t,
            self.y + (target.y - self.y) * t,
        )
    }

    /// Round each axis to the nearest multiple of `cell`.
    ///
    /// A non-positive cell size disables snapping.
    #[must_use]
    pub fn snap_to_grid(self, cell: f32) -> Vec2 {
        if cell <= 0.0 {
            return self;
        }
        Vec2::new((self.x / cell).round() * cell, (self.y / cell).round() * cell)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// An axis-aligned rectangle, stored as center + size.
///
/// Zone bounds use this for pointer hit-testing during drags.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub center: Vec2,
    pub size: Vec2,
}

impl Rect {
    /// Create a rect from center and size.
    #[must_use]
    pub const fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    /// Does this rect contain `point`? Edges count as inside.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let hx = self.size.x * 0.5;
        let hy = self.size.y * 0.5;
        point.x >= self.center.x - hx
            && point.x <= self.center.x + hx
            && point.y >= self.center.y - hy
            && point.y <= self.center.y + hy
    }
}
