use std::fmt;

use serde::{Deserialize, Serialize};

use super::brep::*;

/// Handle to a topological hierarchy living in an [`EntityStore`].
///
/// Descent order is fixed: compound > solid > shell > face > wire > edge > vertex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Compound(Vec<Shape>),
    Solid(SolidId),
    Shell(ShellId),
    Face(FaceId),
    Wire(LoopId),
    Edge(EdgeId),
    Vertex(VertexId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShapeKind {
    Compound,
    Solid,
    Shell,
    Face,
    Wire,
    Edge,
    Vertex,
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Compound(_) => ShapeKind::Compound,
            Shape::Solid(_) => ShapeKind::Solid,
            Shape::Shell(_) => ShapeKind::Shell,
            Shape::Face(_) => ShapeKind::Face,
            Shape::Wire(_) => ShapeKind::Wire,
            Shape::Edge(_) => ShapeKind::Edge,
            Shape::Vertex(_) => ShapeKind::Vertex,
        }
    }

    /// Direct children in canonical order. Missing entities have no children.
    pub fn children(&self, store: &EntityStore) -> Vec<Shape> {
        match self {
            Shape::Compound(items) => items.clone(),
            Shape::Solid(id) => store
                .solids
                .get(*id)
                .map(|s| s.shells.iter().map(|&sh| Shape::Shell(sh)).collect())
                .unwrap_or_default(),
            Shape::Shell(id) => store
                .shells
                .get(*id)
                .map(|s| s.faces.iter().map(|&f| Shape::Face(f)).collect())
                .unwrap_or_default(),
            Shape::Face(id) => store
                .faces
                .get(*id)
                .map(|f| f.loops().map(Shape::Wire).collect())
                .unwrap_or_default(),
            Shape::Wire(id) => store.loop_edges(*id).map(Shape::Edge).collect(),
            Shape::Edge(id) => store
                .edges
                .get(*id)
                .map(|e| vec![Shape::Vertex(e.start_vertex), Shape::Vertex(e.end_vertex)])
                .unwrap_or_default(),
            Shape::Vertex(_) => Vec::new(),
        }
    }
}

/// A geometric sub-shape that takes part in intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubShape {
    Face(FaceId),
    Edge(EdgeId),
}

impl SubShape {
    pub fn as_face(&self) -> Option<FaceId> {
        match self {
            SubShape::Face(f) => Some(*f),
            SubShape::Edge(_) => None,
        }
    }

    pub fn as_edge(&self) -> Option<EdgeId> {
        match self {
            SubShape::Edge(e) => Some(*e),
            SubShape::Face(_) => None,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            SubShape::Face(_) => ShapeKind::Face,
            SubShape::Edge(_) => ShapeKind::Edge,
        }
    }

    /// The entity's own tolerance, `None` if it is missing from the store.
    pub fn tolerance(&self, store: &EntityStore) -> Option<f64> {
        match self {
            SubShape::Face(f) => store.faces.get(*f).map(|f| f.tolerance),
            SubShape::Edge(e) => store.edges.get(*e).map(|e| e.tolerance),
        }
    }
}

impl fmt::Display for SubShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use slotmap::Key;
        match self {
            SubShape::Face(id) => write!(f, "face#{}", id.data().as_ffi()),
            SubShape::Edge(id) => write!(f, "edge#{}", id.data().as_ffi()),
        }
    }
}

impl EntityStore {
    /// true when every entity reachable from `shape` exists in the store.
    pub fn contains_shape(&self, shape: &Shape) -> bool {
        let present = match shape {
            Shape::Compound(_) => true,
            Shape::Solid(id) => self.solids.contains_key(*id),
            Shape::Shell(id) => self.shells.contains_key(*id),
            Shape::Face(id) => self
                .faces
                .get(*id)
                .is_some_and(|f| f.loops().all(|l| self.loops.contains_key(l))),
            Shape::Wire(id) => self.loops.get(*id).is_some_and(|l| {
                l.half_edges
                    .iter()
                    .all(|&he| self.half_edges.get(he).is_some_and(|h| self.edges.contains_key(h.edge)))
            }),
            Shape::Edge(id) => self.edges.get(*id).is_some_and(|e| {
                self.vertices.contains_key(e.start_vertex) && self.vertices.contains_key(e.end_vertex)
            }),
            Shape::Vertex(id) => self.vertices.contains_key(*id),
        };
        present && shape.children(self).iter().all(|c| self.contains_shape(c))
    }
}
