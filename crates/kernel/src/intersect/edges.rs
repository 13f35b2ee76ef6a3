//! Edge/edge intersection.

use approx::abs_diff_eq;
use nalgebra::{Matrix2, Vector2};
use serde::Serialize;
use tracing::debug;

use crate::geometry::point::Point3d;
use crate::topology::{EdgeId, EntityStore};

use super::config::ToleranceConfig;
use super::outcome::{Attempt, CoupleResult, Outcome};
use super::planar::{EdgeSegment, curve_kind};
use super::tolerance::ToleranceModel;

/// Where two edges meet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum EdgeContact {
    /// Isolated contact with the curve parameter on each edge.
    Point { point: Point3d, t1: f64, t2: f64 },
    /// Collinear overlap covering part of at least one edge.
    Overlap {
        range1: (f64, f64),
        range2: (f64, f64),
        start: Point3d,
        end: Point3d,
    },
}

/// Computes the intersection of two edges and holds the last result.
pub trait EdgesIntersector {
    fn perform(
        &mut self,
        store: &EntityStore,
        edge1: EdgeId,
        edge2: EdgeId,
        model: &ToleranceModel,
    ) -> &CoupleResult<EdgeContact>;

    fn result(&self) -> &CoupleResult<EdgeContact>;
}

/// Edge/edge intersector for straight edges; curved edges yield `Empty`.
#[derive(Debug, Clone, Default)]
pub struct LinearEdgesIntersector {
    result: CoupleResult<EdgeContact>,
}

impl EdgesIntersector for LinearEdgesIntersector {
    fn perform(
        &mut self,
        store: &EntityStore,
        edge1: EdgeId,
        edge2: EdgeId,
        model: &ToleranceModel,
    ) -> &CoupleResult<EdgeContact> {
        let segments = EdgeSegment::from_edge(store, edge1).zip(EdgeSegment::from_edge(store, edge2));
        self.result = match segments {
            Some((s1, s2)) => {
                let tols = model.working(s1.tolerance, s2.tolerance);
                let config = model.config();
                model.run_with_widening(tols, |tol| intersect_segments(&s1, &s2, tol, config))
            }
            None => {
                debug!(
                    ?edge1,
                    ?edge2,
                    curve1 = curve_kind(store, edge1),
                    curve2 = curve_kind(store, edge2),
                    "unsupported edge geometry"
                );
                CoupleResult::new(Outcome::Empty, model.working(0.0, 0.0))
            }
        };
        &self.result
    }

    fn result(&self) -> &CoupleResult<EdgeContact> {
        &self.result
    }
}

fn intersect_segments(s1: &EdgeSegment, s2: &EdgeSegment, tol: f64, config: &ToleranceConfig) -> Attempt<EdgeContact> {
    let ends1 = [s1.start(), s1.end()];
    let ends2 = [s2.start(), s2.end()];
    let collinear = ends2.iter().all(|p| s1.line.distance_to_point(p) <= tol)
        && ends1.iter().all(|p| s2.line.distance_to_point(p) <= tol);
    if collinear {
        return Attempt::Settled(collinear_contact(s1, s2, tol));
    }

    let sine = s1.line.direction.sine_to(&s2.line.direction);
    if sine < config.angular {
        let touching = ends2.iter().any(|p| s1.distance_to_point(p) <= tol)
            || ends1.iter().any(|p| s2.distance_to_point(p) <= tol);
        return if touching {
            Attempt::Diverged { ambiguous_domain: true }
        } else {
            Attempt::Settled(Outcome::Empty)
        };
    }
    if sine < config.ill_conditioned_sine {
        return Attempt::Diverged { ambiguous_domain: false };
    }

    // Closest points of the supporting lines, from the normal equations.
    let (d1, d2) = (s1.line.direction, s2.line.direction);
    let r = s1.line.origin - s2.line.origin;
    let b = d1.dot(&d2);
    let system = Matrix2::new(d1.dot(&d1), -b, b, -d2.dot(&d2));
    let Some(inverse) = system.try_inverse() else {
        return Attempt::Diverged { ambiguous_domain: false };
    };
    let solution = inverse * Vector2::new(-d1.dot(&r), -d2.dot(&r));

    let t1 = solution[0].clamp(s1.t_start, s1.t_end);
    let t2 = s2.project(&s1.point_at(t1));
    let t1 = s1.project(&s2.point_at(t2));
    let (p1, p2) = (s1.point_at(t1), s2.point_at(t2));
    if p1.distance_to(&p2) > tol {
        return Attempt::Settled(Outcome::Empty);
    }
    Attempt::Settled(Outcome::Loci(vec![EdgeContact::Point {
        point: p1.midpoint(&p2),
        t1,
        t2,
    }]))
}

fn collinear_contact(s1: &EdgeSegment, s2: &EdgeSegment, tol: f64) -> Outcome<EdgeContact> {
    let a = s1.line.closest_point(&s2.start()).1;
    let b = s1.line.closest_point(&s2.end()).1;
    let (lo2, hi2) = (a.min(b), a.max(b));
    let lo = s1.t_start.max(lo2);
    let hi = s1.t_end.min(hi2);

    if hi - lo > tol {
        if abs_diff_eq!(s1.t_start, lo2, epsilon = tol) && abs_diff_eq!(s1.t_end, hi2, epsilon = tol) {
            return Outcome::SameDomain;
        }
        let (start, end) = (s1.point_at(lo), s1.point_at(hi));
        let (u, v) = (s2.project(&start), s2.project(&end));
        return Outcome::Loci(vec![EdgeContact::Overlap {
            range1: (lo, hi),
            range2: (u.min(v), u.max(v)),
            start,
            end,
        }]);
    }
    if hi - lo >= -tol {
        let t1 = (0.5 * (lo + hi)).clamp(s1.t_start, s1.t_end);
        let point = s1.point_at(t1);
        return Outcome::Loci(vec![EdgeContact::Point {
            point,
            t1,
            t2: s2.project(&point),
        }]);
    }
    Outcome::Empty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vector::Vec3;
    use crate::intersect::config::IntersectorConfig;
    use crate::topology::primitives::{make_circle_edge, make_line_edge};

    fn edge(store: &mut EntityStore, a: [f64; 3], b: [f64; 3]) -> EdgeId {
        make_line_edge(store, Point3d::new(a[0], a[1], a[2]), Point3d::new(b[0], b[1], b[2])).unwrap()
    }

    fn run(store: &EntityStore, e1: EdgeId, e2: EdgeId) -> CoupleResult<EdgeContact> {
        let model = ToleranceModel::new(&IntersectorConfig::default());
        LinearEdgesIntersector::default().perform(store, e1, e2, &model).clone()
    }

    #[test]
    fn test_crossing_edges_meet_at_a_point() {
        let mut store = EntityStore::new();
        let e1 = edge(&mut store, [0.0, 0.0, 0.0], [2.0, 0.0, 0.0]);
        let e2 = edge(&mut store, [1.0, -1.0, 0.0], [1.0, 1.0, 0.0]);
        let result = run(&store, e1, e2);
        let [EdgeContact::Point { point, t1, t2 }] = result.outcome.loci() else {
            panic!("expected one point, got {:?}", result.outcome);
        };
        assert!(point.distance_to(&Point3d::new(1.0, 0.0, 0.0)) < 1e-12);
        assert!((t1 - 1.0).abs() < 1e-12);
        assert!((t2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_skew_edges_miss() {
        let mut store = EntityStore::new();
        let e1 = edge(&mut store, [0.0, 0.0, 0.0], [2.0, 0.0, 0.0]);
        let e2 = edge(&mut store, [1.0, -1.0, 0.5], [1.0, 1.0, 0.5]);
        assert_eq!(run(&store, e1, e2).outcome, Outcome::Empty);
    }

    #[test]
    fn test_lines_cross_beyond_the_edges() {
        let mut store = EntityStore::new();
        let e1 = edge(&mut store, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let e2 = edge(&mut store, [3.0, -1.0, 0.0], [3.0, 1.0, 0.0]);
        assert_eq!(run(&store, e1, e2).outcome, Outcome::Empty);
    }

    #[test]
    fn test_shared_corner() {
        let mut store = EntityStore::new();
        let e1 = edge(&mut store, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let e2 = edge(&mut store, [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]);
        let result = run(&store, e1, e2);
        let [EdgeContact::Point { point, .. }] = result.outcome.loci() else {
            panic!("expected one point, got {:?}", result.outcome);
        };
        assert!(point.distance_to(&Point3d::new(1.0, 0.0, 0.0)) < 1e-12);
    }

    #[test]
    fn test_coincident_edges_are_same_domain() {
        let mut store = EntityStore::new();
        let e1 = edge(&mut store, [0.0, 0.0, 0.0], [1.0, 1.0, 0.0]);
        let e2 = edge(&mut store, [1.0, 1.0, 0.0], [0.0, 0.0, 0.0]);
        assert_eq!(run(&store, e1, e2).outcome, Outcome::SameDomain);
    }

    #[test]
    fn test_partial_collinear_overlap() {
        let mut store = EntityStore::new();
        let e1 = edge(&mut store, [0.0, 0.0, 0.0], [2.0, 0.0, 0.0]);
        let e2 = edge(&mut store, [3.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let result = run(&store, e1, e2);
        let [EdgeContact::Overlap { range1, range2, .. }] = result.outcome.loci() else {
            panic!("expected an overlap, got {:?}", result.outcome);
        };
        assert!((range1.0 - 1.0).abs() < 1e-12 && (range1.1 - 2.0).abs() < 1e-12);
        assert!((range2.0 - 1.0).abs() < 1e-12 && (range2.1 - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_collinear_end_to_end_touch() {
        let mut store = EntityStore::new();
        let e1 = edge(&mut store, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let e2 = edge(&mut store, [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]);
        let result = run(&store, e1, e2);
        assert!(matches!(result.outcome.loci(), [EdgeContact::Point { .. }]));
    }

    #[test]
    fn test_parallel_touching_edges_are_unresolved() {
        let mut store = EntityStore::new();
        // Parallel, 5e-8 apart: within tolerance at the shared end but
        // not collinear over the far end of the longer edge.
        let e1 = edge(&mut store, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let e2 = edge(&mut store, [1.0, 5e-8, 0.0], [1.0e6, 5e-8 + 5e-5, 0.0]);
        let result = run(&store, e1, e2);
        assert_eq!(result.outcome, Outcome::Unresolved);
    }

    #[test]
    fn test_circle_edges_are_unsupported() {
        let mut store = EntityStore::new();
        let line = edge(&mut store, [-2.0, 0.0, 0.0], [2.0, 0.0, 0.0]);
        let circle = make_circle_edge(&mut store, Point3d::ORIGIN, Vec3::Z, 1.0).unwrap();
        assert_eq!(run(&store, line, circle).outcome, Outcome::Empty);
    }
}
