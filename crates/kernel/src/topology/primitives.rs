use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info, instrument};

use super::brep::*;
use crate::geometry::curves::{Circle3d, Curve, Line3d};
use crate::geometry::point::Point3d;
use crate::geometry::surfaces::{Plane, Surface};
use crate::geometry::vector::Vec3;

/// Why a primitive could not be built.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("edge endpoints coincide at {point:?}")]
    DegenerateEdge { point: Point3d },

    #[error("polygon needs at least three distinct vertices, got {count}")]
    TooFewVertices { count: usize },

    #[error("polygon vertices span no plane")]
    DegeneratePolygon,

    #[error("polygon vertex deviates {deviation} from its plane")]
    NonPlanar { deviation: f64 },

    #[error("circle needs a positive radius and a non-zero normal")]
    DegenerateCircle,
}

fn insert_vertex(store: &mut EntityStore, point: Point3d) -> VertexId {
    store.vertices.insert(Vertex {
        point,
        tolerance: crate::default_tolerance().coincidence,
    })
}

/// Straight edge between two existing vertices, parameterised by arc length.
fn insert_line_edge(store: &mut EntityStore, start: VertexId, end: VertexId) -> Result<EdgeId, BuildError> {
    let a = store.vertices[start].point;
    let b = store.vertices[end].point;
    let line = Line3d::from_points(a, b).ok_or(BuildError::DegenerateEdge { point: a })?;
    Ok(store.edges.insert(Edge {
        curve: Curve::Line(line),
        t_start: 0.0,
        t_end: a.distance_to(&b),
        start_vertex: start,
        end_vertex: end,
        tolerance: crate::default_tolerance().coincidence,
    }))
}

/// Chain vertices into a loop of fresh line edges.
fn insert_loop(
    store: &mut EntityStore,
    vertices: &[VertexId],
    closed: bool,
    face: Option<FaceId>,
) -> Result<LoopId, BuildError> {
    let loop_id = store.loops.insert(Loop {
        half_edges: vec![],
        face,
    });
    let segment_count = if closed { vertices.len() } else { vertices.len().saturating_sub(1) };
    for i in 0..segment_count {
        let start = vertices[i];
        let end = vertices[(i + 1) % vertices.len()];
        let edge = insert_line_edge(store, start, end)?;
        let he = store.half_edges.insert(HalfEdge {
            edge,
            loop_id,
            start_vertex: start,
            end_vertex: end,
            forward: true,
        });
        store.loops[loop_id].half_edges.push(he);
    }
    Ok(loop_id)
}

/// Build a box solid directly from corner coordinates.
/// The box is axis-aligned with one corner at (x0,y0,z0) and opposite at (x1,y1,z1).
#[instrument(skip(store))]
pub fn make_box(store: &mut EntityStore, x0: f64, y0: f64, z0: f64, x1: f64, y1: f64, z1: f64) -> SolidId {
    info!(
        min = ?[x0, y0, z0],
        max = ?[x1, y1, z1],
        "creating box primitive"
    );
    let v = [
        Point3d::new(x0, y0, z0),
        Point3d::new(x1, y0, z0),
        Point3d::new(x1, y1, z0),
        Point3d::new(x0, y1, z0),
        Point3d::new(x0, y0, z1),
        Point3d::new(x1, y0, z1),
        Point3d::new(x1, y1, z1),
        Point3d::new(x0, y1, z1),
    ];

    let vertex_ids: Vec<VertexId> = v.iter().map(|p| insert_vertex(store, *p)).collect();

    let solid_id = store.solids.insert(Solid { shells: vec![] });
    let shell_id = store.shells.insert(Shell {
        faces: vec![],
        orientation: ShellOrientation::Outward,
        solid: Some(solid_id),
    });
    store.solids[solid_id].shells.push(shell_id);

    // Each face: CCW vertex indices seen from outside, then the plane frame (u, v)
    // with u x v pointing outward.
    let face_defs: [([usize; 4], Vec3, Vec3); 6] = [
        ([0, 3, 2, 1], Vec3::Y, Vec3::X), // z = z0
        ([4, 5, 6, 7], Vec3::X, Vec3::Y), // z = z1
        ([0, 4, 7, 3], Vec3::Z, Vec3::Y), // x = x0
        ([1, 2, 6, 5], Vec3::Y, Vec3::Z), // x = x1
        ([0, 1, 5, 4], Vec3::X, Vec3::Z), // y = y0
        ([3, 7, 6, 2], Vec3::Z, Vec3::X), // y = y1
    ];

    // Canonical vertex pair -> shared edge.
    let mut edge_map: HashMap<(usize, usize), EdgeId> = HashMap::new();

    for (face_verts, u_axis, v_axis) in face_defs {
        let center = v[face_verts[0]].midpoint(&v[face_verts[2]]);
        let loop_id = store.loops.insert(Loop {
            half_edges: vec![],
            face: None,
        });
        let face_id = store.faces.insert(Face {
            surface: Surface::Plane(Plane::from_frame(center, u_axis, v_axis)),
            outer_loop: loop_id,
            inner_loops: vec![],
            same_sense: true,
            tolerance: crate::default_tolerance().coincidence,
            shell: Some(shell_id),
        });
        store.loops[loop_id].face = Some(face_id);
        store.shells[shell_id].faces.push(face_id);

        for k in 0..4 {
            let a = face_verts[k];
            let b = face_verts[(k + 1) % 4];
            let key = (a.min(b), a.max(b));
            let forward = a < b;

            let edge_id = match edge_map.get(&key) {
                Some(&edge_id) => edge_id,
                None => {
                    let line = Line3d {
                        origin: v[key.0],
                        direction: (v[key.1] - v[key.0]) / v[key.0].distance_to(&v[key.1]),
                    };
                    let edge_id = store.edges.insert(Edge {
                        curve: Curve::Line(line),
                        t_start: 0.0,
                        t_end: v[key.0].distance_to(&v[key.1]),
                        start_vertex: vertex_ids[key.0],
                        end_vertex: vertex_ids[key.1],
                        tolerance: crate::default_tolerance().coincidence,
                    });
                    edge_map.insert(key, edge_id);
                    edge_id
                }
            };

            let he_id = store.half_edges.insert(HalfEdge {
                edge: edge_id,
                loop_id,
                start_vertex: vertex_ids[a],
                end_vertex: vertex_ids[b],
                forward,
            });
            store.loops[loop_id].half_edges.push(he_id);
        }
    }

    solid_id
}

/// Build a free planar face bounded by straight edges.
///
/// `outer` and every hole are vertex rings (closing edge implied). The face
/// plane passes through the outer centroid with the Newell normal of `outer`.
#[instrument(skip_all, fields(vertices = outer.len(), holes = holes.len()))]
pub fn make_planar_face(
    store: &mut EntityStore,
    outer: &[Point3d],
    holes: &[Vec<Point3d>],
) -> Result<FaceId, BuildError> {
    if outer.len() < 3 {
        return Err(BuildError::TooFewVertices { count: outer.len() });
    }

    let mut normal = Vec3::ZERO;
    for (i, a) in outer.iter().enumerate() {
        let b = &outer[(i + 1) % outer.len()];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    let n = outer.len() as f64;
    let centroid = Point3d::new(
        outer.iter().map(|p| p.x).sum::<f64>() / n,
        outer.iter().map(|p| p.y).sum::<f64>() / n,
        outer.iter().map(|p| p.z).sum::<f64>() / n,
    );
    let plane = Plane::new(centroid, normal).ok_or(BuildError::DegeneratePolygon)?;

    let tolerance = crate::default_tolerance().coincidence;
    let deviation = outer
        .iter()
        .chain(holes.iter().flatten())
        .map(|p| plane.distance_to_point(p).abs())
        .fold(0.0, f64::max);
    if deviation > tolerance {
        return Err(BuildError::NonPlanar { deviation });
    }

    let mut rings = Vec::with_capacity(holes.len() + 1);
    for ring in std::iter::once(outer).chain(holes.iter().map(|h| h.as_slice())) {
        if ring.len() < 3 {
            return Err(BuildError::TooFewVertices { count: ring.len() });
        }
        let ids: Vec<VertexId> = ring.iter().map(|p| insert_vertex(store, *p)).collect();
        rings.push(insert_loop(store, &ids, true, None)?);
    }

    let face_id = store.faces.insert(Face {
        surface: Surface::Plane(plane),
        outer_loop: rings[0],
        inner_loops: rings[1..].to_vec(),
        same_sense: true,
        tolerance,
        shell: None,
    });
    for &loop_id in &rings {
        store.loops[loop_id].face = Some(face_id);
    }
    debug!(?face_id, "created planar face");
    Ok(face_id)
}

/// Build an isolated straight edge from `a` to `b`.
pub fn make_line_edge(store: &mut EntityStore, a: Point3d, b: Point3d) -> Result<EdgeId, BuildError> {
    let start = insert_vertex(store, a);
    let end = insert_vertex(store, b);
    insert_line_edge(store, start, end)
}

/// Build a full-circle edge; its single vertex is both start and end.
pub fn make_circle_edge(
    store: &mut EntityStore,
    center: Point3d,
    normal: Vec3,
    radius: f64,
) -> Result<EdgeId, BuildError> {
    let circle = Circle3d::new(center, normal, radius).ok_or(BuildError::DegenerateCircle)?;
    let seam = insert_vertex(store, circle.evaluate(0.0));
    Ok(store.edges.insert(Edge {
        curve: Curve::Circle(circle),
        t_start: 0.0,
        t_end: 2.0 * std::f64::consts::PI,
        start_vertex: seam,
        end_vertex: seam,
        tolerance: crate::default_tolerance().coincidence,
    }))
}

/// Build a free wire (a polyline, closed back to the first point if `closed`).
pub fn make_wire(store: &mut EntityStore, points: &[Point3d], closed: bool) -> Result<LoopId, BuildError> {
    let ids: Vec<VertexId> = points.iter().map(|p| insert_vertex(store, *p)).collect();
    insert_loop(store, &ids, closed, None)
}
