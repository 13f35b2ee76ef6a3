//! Face/face intersection.

use serde::Serialize;
use tracing::debug;

use crate::Tolerance;
use crate::geometry::point::Point3d;
use crate::geometry::surface_intersection::{SurfaceIntersection, plane_plane};
use crate::topology::{EntityStore, FaceId};

use super::config::ToleranceConfig;
use super::outcome::{Attempt, CoupleResult, Outcome};
use super::planar::{Containment, FacePolygon, sorted_breakpoints, surface_kind};
use super::tolerance::ToleranceModel;

/// A piece of the section curve shared by both faces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectionSegment {
    pub start: Point3d,
    pub end: Point3d,
}

impl SectionSegment {
    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }
}

/// Computes the intersection of two faces and holds the last result.
pub trait FacesIntersector {
    fn perform(
        &mut self,
        store: &EntityStore,
        face1: FaceId,
        face2: FaceId,
        model: &ToleranceModel,
    ) -> &CoupleResult<SectionSegment>;

    fn result(&self) -> &CoupleResult<SectionSegment>;
}

/// Face/face intersector for planar faces with straight boundaries.
///
/// Faces with any other geometry yield `Empty`.
#[derive(Debug, Clone, Default)]
pub struct PlanarFacesIntersector {
    result: CoupleResult<SectionSegment>,
}

impl FacesIntersector for PlanarFacesIntersector {
    fn perform(
        &mut self,
        store: &EntityStore,
        face1: FaceId,
        face2: FaceId,
        model: &ToleranceModel,
    ) -> &CoupleResult<SectionSegment> {
        let tols = match (store.faces.get(face1), store.faces.get(face2)) {
            (Some(a), Some(b)) => model.working(a.tolerance, b.tolerance),
            _ => model.working(0.0, 0.0),
        };
        let polygons = FacePolygon::from_face(store, face1).zip(FacePolygon::from_face(store, face2));
        self.result = match polygons {
            Some((p1, p2)) => {
                let config = model.config();
                model.run_with_widening(tols, |tol| intersect_polygons(&p1, &p2, tol, config))
            }
            None => {
                debug!(
                    ?face1,
                    ?face2,
                    surface1 = surface_kind(store, face1),
                    surface2 = surface_kind(store, face2),
                    "unsupported face geometry"
                );
                CoupleResult::new(Outcome::Empty, tols)
            }
        };
        &self.result
    }

    fn result(&self) -> &CoupleResult<SectionSegment> {
        &self.result
    }
}

fn intersect_polygons(p1: &FacePolygon, p2: &FacePolygon, tol: f64, config: &ToleranceConfig) -> Attempt<SectionSegment> {
    let (lo2, hi2) = p2.signed_extent(&p1.plane);
    let (lo1, hi1) = p1.signed_extent(&p2.plane);

    if [lo1, hi1, lo2, hi2].iter().all(|d| d.abs() <= tol) {
        let outcome = if p1.interferes(p2, tol) {
            Outcome::SameDomain
        } else {
            Outcome::Empty
        };
        return Attempt::Settled(outcome);
    }
    if lo2 > tol || hi2 < -tol || lo1 > tol || hi1 < -tol {
        return Attempt::Settled(Outcome::Empty);
    }

    let sine = p1.plane.normal.sine_to(&p2.plane.normal);
    if sine < config.ill_conditioned_sine {
        return Attempt::Diverged {
            ambiguous_domain: sine < config.angular,
        };
    }

    let planes_tol = Tolerance {
        coincidence: tol,
        angular: config.angular,
    };
    let SurfaceIntersection::Line(line) = plane_plane(&p1.plane, &p2.plane, &planes_tol) else {
        return Attempt::Settled(Outcome::Empty);
    };

    let mut params = p1.line_breakpoints(&line, tol);
    params.extend(p2.line_breakpoints(&line, tol));
    let params = sorted_breakpoints(params, tol);

    // Maximal runs of consecutive intervals lying on both faces.
    let mut segments = Vec::new();
    let mut run: Option<(f64, f64)> = None;
    for window in params.windows(2) {
        let (a, b) = (window[0], window[1]);
        let mid = line.evaluate(0.5 * (a + b));
        let shared =
            p1.classify(&mid, tol) != Containment::Outside && p2.classify(&mid, tol) != Containment::Outside;
        run = match (run, shared) {
            (Some((start, _)), true) => Some((start, b)),
            (None, true) => Some((a, b)),
            (Some(done), false) => {
                segments.push(done);
                None
            }
            (None, false) => None,
        };
    }
    segments.extend(run);

    let loci = segments
        .into_iter()
        .filter(|(a, b)| b - a > tol)
        .map(|(a, b)| SectionSegment {
            start: line.evaluate(a),
            end: line.evaluate(b),
        })
        .collect();
    Attempt::Settled(Outcome::from_loci(loci))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intersect::config::IntersectorConfig;
    use crate::intersect::outcome::DomainRelation;
    use crate::topology::primitives::make_planar_face;

    fn rect(store: &mut EntityStore, corners: [[f64; 3]; 4]) -> FaceId {
        let points: Vec<Point3d> = corners.iter().map(|c| Point3d::new(c[0], c[1], c[2])).collect();
        make_planar_face(store, &points, &[]).unwrap()
    }

    fn model() -> ToleranceModel {
        ToleranceModel::new(&IntersectorConfig::default())
    }

    #[test]
    fn test_crossing_squares_meet_on_segment() {
        let mut store = EntityStore::new();
        let floor = rect(&mut store, [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 2.0, 0.0], [0.0, 2.0, 0.0]]);
        let wall = rect(&mut store, [[1.0, -1.0, -1.0], [1.0, 3.0, -1.0], [1.0, 3.0, 1.0], [1.0, -1.0, 1.0]]);
        let mut fi = PlanarFacesIntersector::default();
        let result = fi.perform(&store, floor, wall, &model());
        let Outcome::Loci(segments) = &result.outcome else {
            panic!("expected a section, got {:?}", result.outcome);
        };
        assert_eq!(segments.len(), 1);
        assert!((segments[0].length() - 2.0).abs() < 1e-9);
        for p in [segments[0].start, segments[0].end] {
            assert!((p.x - 1.0).abs() < 1e-9 && p.z.abs() < 1e-9);
        }
        assert_eq!(result.tolerances, (1e-7, 1e-7));
    }

    #[test]
    fn test_faces_on_one_side_are_empty() {
        let mut store = EntityStore::new();
        let floor = rect(&mut store, [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 2.0, 0.0], [0.0, 2.0, 0.0]]);
        let wall = rect(&mut store, [[1.0, 0.0, 0.5], [1.0, 2.0, 0.5], [1.0, 2.0, 1.0], [1.0, 0.0, 1.0]]);
        let mut fi = PlanarFacesIntersector::default();
        assert_eq!(fi.perform(&store, floor, wall, &model()).outcome, Outcome::Empty);
    }

    #[test]
    fn test_section_outside_one_face_is_empty() {
        let mut store = EntityStore::new();
        let floor = rect(&mut store, [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 2.0, 0.0], [0.0, 2.0, 0.0]]);
        let wall = rect(&mut store, [[5.0, 0.0, -1.0], [5.0, 2.0, -1.0], [5.0, 2.0, 1.0], [5.0, 0.0, 1.0]]);
        let mut fi = PlanarFacesIntersector::default();
        assert_eq!(fi.perform(&store, floor, wall, &model()).outcome, Outcome::Empty);
    }

    #[test]
    fn test_overlapping_coplanar_faces_are_same_domain() {
        let mut store = EntityStore::new();
        let a = rect(&mut store, [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 2.0, 0.0], [0.0, 2.0, 0.0]]);
        let b = rect(&mut store, [[1.0, 1.0, 0.0], [3.0, 1.0, 0.0], [3.0, 3.0, 0.0], [1.0, 3.0, 0.0]]);
        let c = rect(&mut store, [[5.0, 5.0, 0.0], [6.0, 5.0, 0.0], [6.0, 6.0, 0.0], [5.0, 6.0, 0.0]]);
        let mut fi = PlanarFacesIntersector::default();
        assert_eq!(fi.perform(&store, a, b, &model()).outcome, Outcome::SameDomain);
        assert_eq!(fi.result().outcome.relation(), DomainRelation::Same);
        assert_eq!(fi.perform(&store, a, c, &model()).outcome, Outcome::Empty);
    }

    #[test]
    fn test_nearly_parallel_faces_are_not_solved() {
        let mut store = EntityStore::new();
        let a = rect(&mut store, [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 2.0, 0.0], [0.0, 2.0, 0.0]]);
        // Tilted by ~5e-7 rad about the y axis, crossing z = 0 at x = 1.
        let slope = 5e-7;
        let b = rect(
            &mut store,
            [[-10.0, 0.0, -11.0 * slope], [10.0, 0.0, 9.0 * slope], [10.0, 2.0, 9.0 * slope], [-10.0, 2.0, -11.0 * slope]],
        );
        let mut fi = PlanarFacesIntersector::default();
        let result = fi.perform(&store, a, b, &model());
        assert_eq!(result.outcome, Outcome::Inconclusive);
        assert!(result.tolerances.0 > 1e-7);
    }
}
