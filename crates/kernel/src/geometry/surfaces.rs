use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

/// Surface types carried by faces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Surface {
    Plane(Plane),
    Cylinder(Cylinder),
}

/// An infinite plane with an orthonormal (u, v) frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3d,
    pub normal: Vec3,
    pub u_axis: Vec3,
    pub v_axis: Vec3,
}

impl Plane {
    /// `None` when `normal` has no usable length.
    pub fn new(origin: Point3d, normal: Vec3) -> Option<Self> {
        let normal = normal.normalized()?;
        let u_axis = normal.any_perpendicular();
        let v_axis = normal.cross(&u_axis);
        Some(Self {
            origin,
            normal,
            u_axis,
            v_axis,
        })
    }

    /// Plane from an orthonormal frame; the normal is `u_axis x v_axis`.
    pub fn from_frame(origin: Point3d, u_axis: Vec3, v_axis: Vec3) -> Self {
        Self {
            origin,
            normal: u_axis.cross(&v_axis),
            u_axis,
            v_axis,
        }
    }

    pub fn xy() -> Self {
        Self::from_frame(Point3d::ORIGIN, Vec3::X, Vec3::Y)
    }

    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        self.origin + self.u_axis * u + self.v_axis * v
    }

    /// Signed distance along the normal.
    pub fn distance_to_point(&self, p: &Point3d) -> f64 {
        let v = *p - self.origin;
        v.dot(&self.normal)
    }

    pub fn project_point(&self, p: &Point3d) -> Point3d {
        let dist = self.distance_to_point(p);
        *p - self.normal * dist
    }

    /// Get (u, v) parameters for a point projected onto the plane.
    pub fn parameters_of(&self, p: &Point3d) -> (f64, f64) {
        let v = *p - self.origin;
        (v.dot(&self.u_axis), v.dot(&self.v_axis))
    }
}

/// A cylinder surface (infinite along axis).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Cylinder {
    pub origin: Point3d,
    pub axis: Vec3,
    pub radius: f64,
    pub ref_dir: Vec3,
}

impl Cylinder {
    pub fn new(origin: Point3d, axis: Vec3, radius: f64) -> Option<Self> {
        if !(radius > 0.0 && radius.is_finite()) {
            return None;
        }
        let axis = axis.normalized()?;
        Some(Self {
            origin,
            axis,
            radius,
            ref_dir: axis.any_perpendicular(),
        })
    }

    /// Evaluate at (u=angle, v=height along axis).
    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        let y_dir = self.axis.cross(&self.ref_dir);
        self.origin
            + self.ref_dir * (self.radius * u.cos())
            + y_dir * (self.radius * u.sin())
            + self.axis * v
    }
}

impl Surface {
    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        match self {
            Surface::Plane(p) => p.evaluate(u, v),
            Surface::Cylinder(c) => c.evaluate(u, v),
        }
    }

    pub fn as_plane(&self) -> Option<&Plane> {
        match self {
            Surface::Plane(p) => Some(p),
            _ => None,
        }
    }

    pub fn surface_type_name(&self) -> &'static str {
        match self {
            Surface::Plane(_) => "Plane",
            Surface::Cylinder(_) => "Cylinder",
        }
    }
}
