//! 2D vector arithmetic for world-space geometry.
//!
//! Every consumer owns its own `Vector` — unlike the source, nothing here
//! mutates a shared point in place.

use std::ops::{Add, Mul, Neg, Sub};

/// A point or direction in world units.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn distance(self, other: Vector) -> f64 {
        (self - other).length()
    }

    pub fn distance_squared(self, other: Vector) -> f64 {
        (self - other).length_squared()
    }

    pub fn dot(self, other: Vector) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Unit vector, or `Vector::ZERO` if this vector is (near) zero length.
    pub fn normalize_or_zero(self) -> Vector {
        let len = self.length();
        if len < 1e-12 {
            Vector::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    /// Rotate by `theta` radians counter-clockwise.
    pub fn rotate(self, theta: f64) -> Vector {
        let (s, c) = theta.sin_cos();
        Vector::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    /// Perpendicular vector, rotated 90 degrees CCW.
    pub fn perp(self) -> Vector {
        Vector::new(-self.y, self.x)
    }

    /// Angle from +x axis, in `(-pi, pi]`.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn lerp(self, other: Vector, t: f64) -> Vector {
        self + (other - self) * t
    }
}

impl Add for Vector {
    type Output = Vector;
    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector {
    type Output = Vector;
    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;
    fn mul(self, rhs: f64) -> Vector {
        Vector::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vector {
    type Output = Vector;
    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y)
    }
}

/// Axis-aligned world rectangle, origin at `min`.
#[derive(Clone, Copy, Debug)]
pub struct Rect {
    pub min: Vector,
    pub max: Vector,
}

impl Rect {
    pub fn new(min: Vector, max: Vector) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, p: Vector) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// The four corners, in CCW order starting at `min`.
    pub fn corners(&self) -> [Vector; 4] {
        [
            self.min,
            Vector::new(self.max.x, self.min.y),
            self.max,
            Vector::new(self.min.x, self.max.y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_preserves_length() {
        let v = Vector::new(3.0, 4.0);
        let r = v.rotate(1.234);
        assert!((r.length() - v.length()).abs() < 1e-9);
    }

    #[test]
    fn perp_is_90_degrees() {
        let v = Vector::new(1.0, 0.0);
        let p = v.perp();
        assert!((p.dot(v)).abs() < 1e-12);
    }

    #[test]
    fn rect_contains_boundary() {
        let r = Rect::new(Vector::ZERO, Vector::new(10.0, 10.0));
        assert!(r.contains(Vector::new(0.0, 0.0)));
        assert!(r.contains(Vector::new(10.0, 10.0)));
        assert!(!r.contains(Vector::new(10.1, 5.0)));
    }
}
