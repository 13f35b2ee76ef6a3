use crate::Tolerance;

use super::curves::Line3d;
use super::point::Point3d;
use super::surfaces::Plane;

/// Result of intersecting two planes.
#[derive(Debug, Clone, Copy)]
pub enum SurfaceIntersection {
    /// Parallel and apart.
    None,
    /// Transverse planes meet along a line.
    Line(Line3d),
    /// Same geometric locus.
    Coincident,
}

// ─── Plane–Plane ─────────────────────────────────────────────────────────────

/// Intersect two infinite planes.
///
/// - Parallel, non-coincident -> `None`
/// - Coincident -> `Coincident`
/// - Transverse -> `Line`, directed along `n1 x n2`
pub fn plane_plane(p1: &Plane, p2: &Plane, tol: &Tolerance) -> SurfaceIntersection {
    let cross = p1.normal.cross(&p2.normal);
    let cross_len = cross.length();

    if cross_len < tol.angular {
        let dist = p1.distance_to_point(&p2.origin).abs();
        if dist < tol.coincidence {
            return SurfaceIntersection::Coincident;
        }
        return SurfaceIntersection::None;
    }

    let direction = cross / cross_len;

    // Plane i: n_i . P = d_i; the point is a combination of both normals.
    let d1 = p1.origin.to_vec3().dot(&p1.normal);
    let d2 = p2.origin.to_vec3().dot(&p2.normal);

    let n1n2 = p1.normal.dot(&p2.normal);
    let denom = 1.0 - n1n2 * n1n2;
    let c1 = (d1 - d2 * n1n2) / denom;
    let c2 = (d2 - d1 * n1n2) / denom;
    let origin = Point3d::ORIGIN + p1.normal * c1 + p2.normal * c2;

    SurfaceIntersection::Line(Line3d { origin, direction })
}
