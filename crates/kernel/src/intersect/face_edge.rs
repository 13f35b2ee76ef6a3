//! Face/edge intersection.

use serde::Serialize;
use tracing::debug;

use crate::geometry::point::Point3d;
use crate::topology::{EdgeId, EntityStore, FaceId};

use super::config::ToleranceConfig;
use super::outcome::{Attempt, CoupleResult, Outcome};
use super::planar::{Containment, EdgeSegment, FacePolygon, curve_kind, sorted_breakpoints, surface_kind};
use super::tolerance::ToleranceModel;

/// How an edge meets a face. Ranges are edge curve parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum FaceEdgeContact {
    /// The edge crosses the face interior.
    Pierce { point: Point3d, parameter: f64 },
    /// Contact with the face boundary only; a single point has `start == end`.
    Touch {
        start: Point3d,
        end: Point3d,
        range: (f64, f64),
    },
    /// The edge lies in the face over `range`.
    Embedded {
        start: Point3d,
        end: Point3d,
        range: (f64, f64),
    },
}

impl FaceEdgeContact {
    fn touch_at(segment: &EdgeSegment, t: f64) -> Self {
        let p = segment.point_at(t);
        FaceEdgeContact::Touch {
            start: p,
            end: p,
            range: (t, t),
        }
    }
}

/// Computes the intersection of a face and an edge and holds the last result.
pub trait FaceEdgeIntersector {
    fn perform(
        &mut self,
        store: &EntityStore,
        face: FaceId,
        edge: EdgeId,
        model: &ToleranceModel,
    ) -> &CoupleResult<FaceEdgeContact>;

    fn result(&self) -> &CoupleResult<FaceEdgeContact>;
}

/// Intersector for a planar, straight-bounded face and a straight edge.
#[derive(Debug, Clone, Default)]
pub struct PlanarFaceEdgeIntersector {
    result: CoupleResult<FaceEdgeContact>,
}

impl FaceEdgeIntersector for PlanarFaceEdgeIntersector {
    fn perform(
        &mut self,
        store: &EntityStore,
        face: FaceId,
        edge: EdgeId,
        model: &ToleranceModel,
    ) -> &CoupleResult<FaceEdgeContact> {
        let face_tol = store.faces.get(face).map_or(0.0, |f| f.tolerance);
        let inputs = FacePolygon::from_face(store, face).zip(EdgeSegment::from_edge(store, edge));
        self.result = match inputs {
            Some((polygon, segment)) => {
                let tols = model.working(face_tol, segment.tolerance);
                let config = model.config();
                model.run_with_widening(tols, |tol| intersect(&polygon, &segment, tol, config))
            }
            None => {
                debug!(
                    ?face,
                    ?edge,
                    surface = surface_kind(store, face),
                    curve = curve_kind(store, edge),
                    "unsupported face or edge geometry"
                );
                CoupleResult::new(Outcome::Empty, model.working(face_tol, 0.0))
            }
        };
        &self.result
    }

    fn result(&self) -> &CoupleResult<FaceEdgeContact> {
        &self.result
    }
}

fn intersect(
    polygon: &FacePolygon,
    segment: &EdgeSegment,
    tol: f64,
    config: &ToleranceConfig,
) -> Attempt<FaceEdgeContact> {
    let d_start = polygon.plane.distance_to_point(&segment.start());
    let d_end = polygon.plane.distance_to_point(&segment.end());

    if d_start.abs() <= tol && d_end.abs() <= tol {
        return Attempt::Settled(Outcome::from_loci(in_plane_contacts(polygon, segment, tol)));
    }
    if (d_start > tol && d_end > tol) || (d_start < -tol && d_end < -tol) {
        return Attempt::Settled(Outcome::Empty);
    }

    // One end resting on the plane is the only crossing.
    let resting = [(d_start, segment.t_start), (d_end, segment.t_end)]
        .into_iter()
        .find(|(d, _)| d.abs() <= tol);
    if let Some((_, t)) = resting {
        let loci = match polygon.classify(&segment.point_at(t), tol) {
            Containment::Outside => vec![],
            _ => vec![FaceEdgeContact::touch_at(segment, t)],
        };
        return Attempt::Settled(Outcome::from_loci(loci));
    }

    let rate = segment.line.direction.dot(&polygon.plane.normal);
    if rate.abs() < config.ill_conditioned_sine {
        return Attempt::Diverged { ambiguous_domain: false };
    }
    let t = (segment.t_start - d_start / rate).clamp(segment.t_start, segment.t_end);
    let point = segment.point_at(t);
    let loci = match polygon.classify(&point, tol) {
        Containment::Inside => vec![FaceEdgeContact::Pierce { point, parameter: t }],
        Containment::Boundary => vec![FaceEdgeContact::touch_at(segment, t)],
        Containment::Outside => vec![],
    };
    Attempt::Settled(Outcome::from_loci(loci))
}

/// Contacts of an edge lying in the face plane.
fn in_plane_contacts(polygon: &FacePolygon, segment: &EdgeSegment, tol: f64) -> Vec<FaceEdgeContact> {
    let (t0, t1) = (segment.t_start, segment.t_end);
    let mut params: Vec<f64> = polygon
        .line_breakpoints(&segment.line, tol)
        .into_iter()
        .filter(|t| *t > t0 && *t < t1)
        .collect();
    params.extend([t0, t1]);
    let params = sorted_breakpoints(params, tol);

    // Runs of consecutive intervals on the face, with whether any is interior.
    let mut runs: Vec<(f64, f64, bool)> = Vec::new();
    for window in params.windows(2) {
        let (a, b) = (window[0], window[1]);
        let state = polygon.classify(&segment.point_at(0.5 * (a + b)), tol);
        if state == Containment::Outside {
            continue;
        }
        let interior = state == Containment::Inside;
        match runs.last_mut() {
            Some(run) if (run.1 - a).abs() <= tol => {
                run.1 = b;
                run.2 |= interior;
            }
            _ => runs.push((a, b, interior)),
        }
    }

    let mut contacts: Vec<FaceEdgeContact> = runs
        .iter()
        .map(|&(a, b, interior)| {
            let (start, end) = (segment.point_at(a), segment.point_at(b));
            if interior {
                FaceEdgeContact::Embedded { start, end, range: (a, b) }
            } else {
                FaceEdgeContact::Touch { start, end, range: (a, b) }
            }
        })
        .collect();

    // Isolated boundary points between outside intervals.
    for &t in &params {
        let covered = runs.iter().any(|&(a, b, _)| t >= a - tol && t <= b + tol);
        if !covered && polygon.classify(&segment.point_at(t), tol) != Containment::Outside {
            contacts.push(FaceEdgeContact::touch_at(segment, t));
        }
    }
    contacts.sort_by(|a, b| start_of(a).total_cmp(&start_of(b)));
    contacts
}

fn start_of(contact: &FaceEdgeContact) -> f64 {
    match contact {
        FaceEdgeContact::Pierce { parameter, .. } => *parameter,
        FaceEdgeContact::Touch { range, .. } | FaceEdgeContact::Embedded { range, .. } => range.0,
    }
}
