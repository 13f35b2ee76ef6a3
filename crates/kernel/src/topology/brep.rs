use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::geometry::curves::Curve;
use crate::geometry::point::Point3d;
use crate::geometry::surfaces::Surface;

// ─── Entity Keys ─────────────────────────────────────────────────────────────

new_key_type! {
    pub struct VertexId;
    pub struct EdgeId;
    pub struct HalfEdgeId;
    pub struct LoopId;
    pub struct FaceId;
    pub struct ShellId;
    pub struct SolidId;
}

// ─── Topological Entities ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    pub point: Point3d,
    pub tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub curve: Curve,
    /// Parameter range on `curve`, `t_start <= t_end`.
    pub t_start: f64,
    pub t_end: f64,
    pub start_vertex: VertexId,
    pub end_vertex: VertexId,
    pub tolerance: f64,
}

/// One use of an edge by a loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HalfEdge {
    pub edge: EdgeId,
    pub loop_id: LoopId,
    pub start_vertex: VertexId,
    pub end_vertex: VertexId,
    /// true if this half-edge traverses the curve in the forward direction.
    pub forward: bool,
}

/// An ordered chain of half-edges: a face boundary or a free wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loop {
    pub half_edges: Vec<HalfEdgeId>,
    /// Owning face; `None` for a free wire.
    pub face: Option<FaceId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Face {
    pub surface: Surface,
    pub outer_loop: LoopId,
    pub inner_loops: Vec<LoopId>,
    /// true if the face normal agrees with the surface normal.
    pub same_sense: bool,
    pub tolerance: f64,
    pub shell: Option<ShellId>,
}

impl Face {
    /// Outer loop first, then holes.
    pub fn loops(&self) -> impl Iterator<Item = LoopId> + '_ {
        std::iter::once(self.outer_loop).chain(self.inner_loops.iter().copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShellOrientation {
    /// Outer shell (normals point outward).
    Outward,
    /// Void shell (normals point inward, represents a cavity).
    Inward,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shell {
    pub faces: Vec<FaceId>,
    pub orientation: ShellOrientation,
    pub solid: Option<SolidId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solid {
    pub shells: Vec<ShellId>,
}

// ─── Entity Store ────────────────────────────────────────────────────────────

/// Arena-based storage for all topological entities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStore {
    pub vertices: SlotMap<VertexId, Vertex>,
    pub edges: SlotMap<EdgeId, Edge>,
    pub half_edges: SlotMap<HalfEdgeId, HalfEdge>,
    pub loops: SlotMap<LoopId, Loop>,
    pub faces: SlotMap<FaceId, Face>,
    pub shells: SlotMap<ShellId, Shell>,
    pub solids: SlotMap<SolidId, Solid>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edges of a loop in traversal order.
    pub fn loop_edges(&self, loop_id: LoopId) -> impl Iterator<Item = EdgeId> + '_ {
        self.loops
            .get(loop_id)
            .into_iter()
            .flat_map(|l| l.half_edges.iter())
            .filter_map(|&he_id| self.half_edges.get(he_id).map(|he| he.edge))
    }

    /// Vertex positions of a loop, one per half-edge (its start vertex).
    /// `None` if the loop references a missing entity.
    pub fn loop_points(&self, loop_id: LoopId) -> Option<Vec<Point3d>> {
        let loop_data = self.loops.get(loop_id)?;
        loop_data
            .half_edges
            .iter()
            .map(|&he_id| {
                let he = self.half_edges.get(he_id)?;
                self.vertices.get(he.start_vertex).map(|v| v.point)
            })
            .collect()
    }
}
