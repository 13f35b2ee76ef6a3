use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

/// Analytic curve representations carried by edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Curve {
    Line(Line3d),
    Circle(Circle3d),
}

/// An infinite line defined by a point and a unit direction.
/// Edges bound it with a parameter range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Line3d {
    pub origin: Point3d,
    pub direction: Vec3,
}

impl Line3d {
    /// `None` when `direction` has no usable length.
    pub fn new(origin: Point3d, direction: Vec3) -> Option<Self> {
        Some(Self {
            origin,
            direction: direction.normalized()?,
        })
    }

    /// Line through `a` heading towards `b`; `None` when the points coincide.
    pub fn from_points(a: Point3d, b: Point3d) -> Option<Self> {
        Self::new(a, b - a)
    }

    pub fn evaluate(&self, t: f64) -> Point3d {
        self.origin + self.direction * t
    }

    pub fn closest_point(&self, p: &Point3d) -> (Point3d, f64) {
        let v = *p - self.origin;
        let t = v.dot(&self.direction);
        (self.evaluate(t), t)
    }

    pub fn distance_to_point(&self, p: &Point3d) -> f64 {
        let (closest, _) = self.closest_point(p);
        p.distance_to(&closest)
    }
}

/// A circle in 3D space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Circle3d {
    pub center: Point3d,
    pub normal: Vec3,
    pub radius: f64,
    /// Reference direction in the plane (x-axis of the local frame).
    pub x_axis: Vec3,
}

impl Circle3d {
    pub fn new(center: Point3d, normal: Vec3, radius: f64) -> Option<Self> {
        if !(radius > 0.0 && radius.is_finite()) {
            return None;
        }
        let normal = normal.normalized()?;
        Some(Self {
            center,
            normal,
            radius,
            x_axis: normal.any_perpendicular(),
        })
    }

    fn y_axis(&self) -> Vec3 {
        self.normal.cross(&self.x_axis)
    }

    /// Evaluate at angle t (radians).
    pub fn evaluate(&self, t: f64) -> Point3d {
        let y_axis = self.y_axis();
        self.center + self.x_axis * (self.radius * t.cos()) + y_axis * (self.radius * t.sin())
    }
}

impl Curve {
    /// Evaluate the curve at parameter t.
    pub fn evaluate(&self, t: f64) -> Point3d {
        match self {
            Curve::Line(l) => l.evaluate(t),
            Curve::Circle(c) => c.evaluate(t),
        }
    }

    /// Classify the curve type for logging/debugging.
    pub fn curve_type_name(&self) -> &'static str {
        match self {
            Curve::Line(_) => "Line",
            Curve::Circle(_) => "Circle",
        }
    }
}
