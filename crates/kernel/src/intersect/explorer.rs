//! Ordered, restartable traversal of a shape's faces or edges.

use std::collections::HashSet;

use serde::Serialize;

use crate::topology::{EntityStore, FaceId, LoopId, Shape, ShapeKind, ShellId, SubShape};

/// The entity an explored sub-shape was reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Parent {
    Shell(ShellId),
    Face(FaceId),
    Wire(LoopId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExploredItem {
    pub sub: SubShape,
    /// `None` when the sub-shape is the explored shape itself or a direct
    /// member of a compound.
    pub parent: Option<Parent>,
}

/// The kind of sub-shape an explorer yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SubShapeKind {
    Face,
    Edge,
}

impl SubShapeKind {
    fn shape_kind(self) -> ShapeKind {
        match self {
            SubShapeKind::Face => ShapeKind::Face,
            SubShapeKind::Edge => ShapeKind::Edge,
        }
    }
}

/// Depth-first explorer over the sub-shapes of one kind.
///
/// Shared sub-shapes are visited once. With `avoid` set, the traversal does
/// not descend into shapes of that kind: exploring edges while avoiding
/// faces yields only the free edges.
///
/// ```ignore
/// let mut explorer = SubShapeExplorer::new(&store, &shape, SubShapeKind::Face, None);
/// while explorer.more() {
///     let item = explorer.current();
///     explorer.next();
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SubShapeExplorer {
    items: Vec<ExploredItem>,
    cursor: usize,
}

impl SubShapeExplorer {
    pub fn new(store: &EntityStore, shape: &Shape, find: SubShapeKind, avoid: Option<ShapeKind>) -> Self {
        let mut walk = Walk {
            store,
            find: find.shape_kind(),
            avoid,
            seen: HashSet::new(),
            items: Vec::new(),
        };
        walk.visit(shape, None);
        Self {
            items: walk.items,
            cursor: 0,
        }
    }

    pub fn more(&self) -> bool {
        self.cursor < self.items.len()
    }

    pub fn current(&self) -> Option<&ExploredItem> {
        self.items.get(self.cursor)
    }

    pub fn next(&mut self) {
        if self.more() {
            self.cursor += 1;
        }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every item in traversal order, independent of the cursor.
    pub fn items(&self) -> &[ExploredItem] {
        &self.items
    }
}

struct Walk<'a> {
    store: &'a EntityStore,
    find: ShapeKind,
    avoid: Option<ShapeKind>,
    seen: HashSet<SubShape>,
    items: Vec<ExploredItem>,
}

impl Walk<'_> {
    fn visit(&mut self, shape: &Shape, parent: Option<Parent>) {
        if self.avoid == Some(shape.kind()) {
            return;
        }
        if shape.kind() == self.find {
            let sub = match shape {
                Shape::Face(f) => SubShape::Face(*f),
                Shape::Edge(e) => SubShape::Edge(*e),
                _ => return,
            };
            if self.seen.insert(sub) {
                self.items.push(ExploredItem { sub, parent });
            }
            return;
        }
        // Below the target kind nothing can match.
        if shape.kind() > self.find {
            return;
        }
        let child_parent = match shape {
            Shape::Compound(_) | Shape::Solid(_) => None,
            Shape::Shell(id) => Some(Parent::Shell(*id)),
            Shape::Face(id) => Some(Parent::Face(*id)),
            Shape::Wire(id) => Some(match self.store.loops.get(*id).and_then(|l| l.face) {
                Some(face) => Parent::Face(face),
                None => Parent::Wire(*id),
            }),
            Shape::Edge(_) | Shape::Vertex(_) => return,
        };
        for child in shape.children(self.store) {
            self.visit(&child, child_parent);
        }
    }
}
