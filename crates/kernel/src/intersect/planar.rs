//! Planar polygon views of faces and straight-segment views of edges.

use approx::abs_diff_eq;
use serde::Serialize;

use crate::geometry::curves::{Curve, Line3d};
use crate::geometry::point::{Point2d, Point3d};
use crate::geometry::surfaces::Plane;
use crate::topology::{EdgeId, EntityStore, FaceId};

/// Where a point lies relative to a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Containment {
    Inside,
    /// Within tolerance of a boundary edge.
    Boundary,
    Outside,
}

/// A planar face bounded by straight edges, flattened into its plane frame.
#[derive(Debug, Clone)]
pub struct FacePolygon {
    pub plane: Plane,
    rings: Vec<Vec<Point3d>>,
    flat: Vec<Vec<Point2d>>,
}

impl FacePolygon {
    /// `None` unless the face is a plane bounded only by line edges with an
    /// outer ring of at least three vertices.
    pub fn from_face(store: &EntityStore, face_id: FaceId) -> Option<Self> {
        let face = store.faces.get(face_id)?;
        let plane = *face.surface.as_plane()?;
        let mut rings = Vec::new();
        for loop_id in face.loops() {
            let all_lines = store
                .loop_edges(loop_id)
                .all(|e| matches!(store.edges.get(e).map(|e| &e.curve), Some(Curve::Line(_))));
            if !all_lines {
                return None;
            }
            rings.push(store.loop_points(loop_id)?);
        }
        if rings.first().is_none_or(|outer| outer.len() < 3) {
            return None;
        }
        let flat = rings.iter().map(|ring| flatten(&plane, ring)).collect();
        Some(Self { plane, rings, flat })
    }

    pub fn rings(&self) -> &[Vec<Point3d>] {
        &self.rings
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Point3d> {
        self.rings.iter().flatten()
    }

    /// Smallest and largest signed distance of the vertices from `plane`.
    pub fn signed_extent(&self, plane: &Plane) -> (f64, f64) {
        self.vertices()
            .map(|p| plane.distance_to_point(p))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| (lo.min(d), hi.max(d)))
    }

    /// Classify `p` (assumed near the plane) against the polygon.
    pub fn classify(&self, p: &Point3d, tol: f64) -> Containment {
        if self.plane.distance_to_point(p).abs() > tol {
            return Containment::Outside;
        }
        let (u, v) = self.plane.parameters_of(p);
        classify_flat(&self.flat, Point2d::new(u, v), tol)
    }

    /// Parameters along `line` (lying in the plane) where it meets the
    /// boundary: proper crossings plus vertices within `tol` of the line.
    /// Unsorted, may hold near-duplicates.
    pub fn line_breakpoints(&self, line: &Line3d, tol: f64) -> Vec<f64> {
        let (ou, ov) = self.plane.parameters_of(&line.origin);
        let o = Point2d::new(ou, ov);
        let d = Point2d::new(line.direction.dot(&self.plane.u_axis), line.direction.dot(&self.plane.v_axis));
        let dd = d.x * d.x + d.y * d.y;
        if dd <= f64::EPSILON {
            return Vec::new();
        }
        let mut params = Vec::new();
        for (a, b) in ring_segments(&self.flat) {
            let ao = Point2d::new(a.x - o.x, a.y - o.y);
            let along = (ao.x * d.x + ao.y * d.y) / dd;
            if cross(ao, d).abs() / dd.sqrt() <= tol {
                params.push(along);
            }
            let e = Point2d::new(b.x - a.x, b.y - a.y);
            let denom = cross(d, e);
            if denom.abs() <= 1e-12 * (e.x.hypot(e.y) * dd.sqrt()) {
                continue;
            }
            let w = cross(ao, d) / denom;
            if (0.0..=1.0).contains(&w) {
                params.push(cross(ao, e) / denom);
            }
        }
        params
    }

    /// Whether two coplanar polygons share area or touch.
    pub fn interferes(&self, other: &FacePolygon, tol: f64) -> bool {
        if other.vertices().any(|p| self.classify(&self.plane.project_point(p), tol) != Containment::Outside)
            || self.vertices().any(|p| other.classify(&other.plane.project_point(p), tol) != Containment::Outside)
        {
            return true;
        }
        let theirs: Vec<Vec<Point2d>> = other.rings.iter().map(|ring| flatten(&self.plane, ring)).collect();
        ring_segments(&self.flat).any(|(a, b)| ring_segments(&theirs).any(|(c, d)| segments_cross(a, b, c, d)))
    }
}

/// A straight edge with its curve-parameter range.
#[derive(Debug, Clone, Copy)]
pub struct EdgeSegment {
    pub line: Line3d,
    pub t_start: f64,
    pub t_end: f64,
    pub tolerance: f64,
}

impl EdgeSegment {
    /// `None` for missing or non-straight edges.
    pub fn from_edge(store: &EntityStore, edge_id: EdgeId) -> Option<Self> {
        let edge = store.edges.get(edge_id)?;
        match &edge.curve {
            Curve::Line(line) => Some(Self {
                line: *line,
                t_start: edge.t_start.min(edge.t_end),
                t_end: edge.t_start.max(edge.t_end),
                tolerance: edge.tolerance,
            }),
            Curve::Circle(_) => None,
        }
    }

    pub fn start(&self) -> Point3d {
        self.line.evaluate(self.t_start)
    }

    pub fn end(&self) -> Point3d {
        self.line.evaluate(self.t_end)
    }

    pub fn length(&self) -> f64 {
        self.t_end - self.t_start
    }

    pub fn point_at(&self, t: f64) -> Point3d {
        self.line.evaluate(t)
    }

    /// Curve parameter of the projection of `p`, clamped to the range.
    pub fn project(&self, p: &Point3d) -> f64 {
        self.line.closest_point(p).1.clamp(self.t_start, self.t_end)
    }

    pub fn distance_to_point(&self, p: &Point3d) -> f64 {
        p.distance_to(&self.point_at(self.project(p)))
    }
}

/// Sort and collapse parameters closer than `tol`, keeping the first of each run.
/// Curve type of an edge for log events.
pub(crate) fn curve_kind(store: &EntityStore, edge: EdgeId) -> &'static str {
    store.edges.get(edge).map_or("missing", |e| e.curve.curve_type_name())
}

/// Surface type of a face for log events.
pub(crate) fn surface_kind(store: &EntityStore, face: FaceId) -> &'static str {
    store.faces.get(face).map_or("missing", |f| f.surface.surface_type_name())
}

pub fn sorted_breakpoints(mut params: Vec<f64>, tol: f64) -> Vec<f64> {
    params.retain(|t| t.is_finite());
    params.sort_by(f64::total_cmp);
    params.dedup_by(|later, kept| abs_diff_eq!(*later, *kept, epsilon = tol));
    params
}

fn flatten(plane: &Plane, ring: &[Point3d]) -> Vec<Point2d> {
    ring.iter()
        .map(|p| {
            let (u, v) = plane.parameters_of(p);
            Point2d::new(u, v)
        })
        .collect()
}

fn ring_segments(rings: &[Vec<Point2d>]) -> impl Iterator<Item = (Point2d, Point2d)> + '_ {
    rings
        .iter()
        .flat_map(|ring| (0..ring.len()).map(move |i| (ring[i], ring[(i + 1) % ring.len()])))
}

fn cross(a: Point2d, b: Point2d) -> f64 {
    a.x * b.y - a.y * b.x
}

fn segment_distance(p: Point2d, a: Point2d, b: Point2d) -> f64 {
    let e = Point2d::new(b.x - a.x, b.y - a.y);
    let len2 = e.x * e.x + e.y * e.y;
    let t = if len2 > 0.0 {
        (((p.x - a.x) * e.x + (p.y - a.y) * e.y) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    p.distance_to(&a.lerp(&b, t))
}

fn classify_flat(rings: &[Vec<Point2d>], p: Point2d, tol: f64) -> Containment {
    if ring_segments(rings).any(|(a, b)| segment_distance(p, a, b) <= tol) {
        return Containment::Boundary;
    }
    // Even-odd rule over all rings, so holes subtract.
    let mut inside = false;
    for (a, b) in ring_segments(rings) {
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    if inside {
        Containment::Inside
    } else {
        Containment::Outside
    }
}

fn segments_cross(a: Point2d, b: Point2d, c: Point2d, d: Point2d) -> bool {
    let side = |p: Point2d, q: Point2d, r: Point2d| cross(Point2d::new(q.x - p.x, q.y - p.y), Point2d::new(r.x - p.x, r.y - p.y));
    let (d1, d2) = (side(c, d, a), side(c, d, b));
    let (d3, d4) = (side(a, b, c), side(a, b, d));
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vector::Vec3;
    use crate::topology::primitives::{make_circle_edge, make_line_edge, make_planar_face};

    fn square_with_hole(store: &mut EntityStore) -> FaceId {
        let outer = [
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(4.0, 0.0, 0.0),
            Point3d::new(4.0, 4.0, 0.0),
            Point3d::new(0.0, 4.0, 0.0),
        ];
        let hole = vec![
            Point3d::new(1.0, 1.0, 0.0),
            Point3d::new(1.0, 3.0, 0.0),
            Point3d::new(3.0, 3.0, 0.0),
            Point3d::new(3.0, 1.0, 0.0),
        ];
        make_planar_face(store, &outer, &[hole]).unwrap()
    }

    #[test]
    fn test_classify_respects_holes_and_boundary() {
        let mut store = EntityStore::new();
        let face = square_with_hole(&mut store);
        let poly = FacePolygon::from_face(&store, face).unwrap();
        let tol = 1e-7;
        assert_eq!(poly.classify(&Point3d::new(0.5, 0.5, 0.0), tol), Containment::Inside);
        assert_eq!(poly.classify(&Point3d::new(2.0, 2.0, 0.0), tol), Containment::Outside);
        assert_eq!(poly.classify(&Point3d::new(1.0, 2.0, 0.0), tol), Containment::Boundary);
        assert_eq!(poly.classify(&Point3d::new(5.0, 2.0, 0.0), tol), Containment::Outside);
        assert_eq!(poly.classify(&Point3d::new(0.5, 0.5, 1.0), tol), Containment::Outside);
    }

    #[test]
    fn test_line_breakpoints_across_hole() {
        let mut store = EntityStore::new();
        let face = square_with_hole(&mut store);
        let poly = FacePolygon::from_face(&store, face).unwrap();
        let line = Line3d::new(Point3d::new(-1.0, 2.0, 0.0), Vec3::X).unwrap();
        let params = sorted_breakpoints(poly.line_breakpoints(&line, 1e-7), 1e-7);
        let expected = [1.0, 2.0, 4.0, 5.0];
        assert_eq!(params.len(), expected.len());
        for (got, want) in params.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{got} vs {want}");
        }
    }

    #[test]
    fn test_signed_extent() {
        let mut store = EntityStore::new();
        let face = square_with_hole(&mut store);
        let poly = FacePolygon::from_face(&store, face).unwrap();
        let plane = Plane::new(Point3d::new(2.0, 0.0, 0.0), Vec3::X).unwrap();
        let (lo, hi) = poly.signed_extent(&plane);
        assert!((lo + 2.0).abs() < 1e-12);
        assert!((hi - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_interference_of_coplanar_polygons() {
        let mut store = EntityStore::new();
        let base = square_with_hole(&mut store);
        let inside_hole = make_planar_face(
            &mut store,
            &[
                Point3d::new(1.5, 1.5, 0.0),
                Point3d::new(2.5, 1.5, 0.0),
                Point3d::new(2.5, 2.5, 0.0),
            ],
            &[],
        )
        .unwrap();
        let crossing = make_planar_face(
            &mut store,
            &[
                Point3d::new(-1.0, 1.5, 0.0),
                Point3d::new(5.0, 1.5, 0.0),
                Point3d::new(5.0, 2.5, 0.0),
                Point3d::new(-1.0, 2.5, 0.0),
            ],
            &[],
        )
        .unwrap();
        let base = FacePolygon::from_face(&store, base).unwrap();
        let inside_hole = FacePolygon::from_face(&store, inside_hole).unwrap();
        let crossing = FacePolygon::from_face(&store, crossing).unwrap();
        assert!(!base.interferes(&inside_hole, 1e-7));
        assert!(base.interferes(&crossing, 1e-7));
        assert!(crossing.interferes(&base, 1e-7));
    }

    #[test]
    fn test_edge_segment_views() {
        let mut store = EntityStore::new();
        let line = make_line_edge(&mut store, Point3d::new(1.0, 0.0, 0.0), Point3d::new(4.0, 0.0, 0.0)).unwrap();
        let seg = EdgeSegment::from_edge(&store, line).unwrap();
        assert!((seg.length() - 3.0).abs() < 1e-12);
        assert!(seg.end().distance_to(&Point3d::new(4.0, 0.0, 0.0)) < 1e-12);
        assert!((seg.distance_to_point(&Point3d::new(6.0, 0.0, 0.0)) - 2.0).abs() < 1e-12);

        let circle = make_circle_edge(&mut store, Point3d::ORIGIN, Vec3::Z, 1.0).unwrap();
        assert!(EdgeSegment::from_edge(&store, circle).is_none());
    }

    #[test]
    fn test_sorted_breakpoints_collapse_near_duplicates() {
        let params = sorted_breakpoints(vec![2.0, 1.0, 1.0 + 1e-9, f64::NAN, 2.0 - 1e-9], 1e-7);
        assert_eq!(params, vec![1.0, 2.0 - 1e-9]);
    }

    #[test]
    fn test_geometry_kinds_for_logging() {
        let mut store = EntityStore::new();
        let face = square_with_hole(&mut store);
        let circle = make_circle_edge(&mut store, Point3d::ORIGIN, Vec3::Z, 1.0).unwrap();
        assert_eq!(surface_kind(&store, face), "Plane");
        assert_eq!(curve_kind(&store, circle), "Circle");
        store.edges.remove(circle);
        assert_eq!(curve_kind(&store, circle), "missing");
    }
}
