use std::fmt;

use serde::Serialize;

use crate::topology::SubShape;

/// Which input shape a sub-shape comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Rank {
    /// The scanned (indexed) shape.
    First,
    /// The explored shape.
    Second,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::First => f.write_str("1"),
            Rank::Second => f.write_str("2"),
        }
    }
}

/// The five intersection categories, declared in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    /// Faces of shape 1 against faces of shape 2.
    FaceFace,
    /// Edges of face pairs found same-domain during `FaceFace`.
    EdgeEdgeSameDomain,
    /// Free edges of shape 1 against faces of shape 2.
    EdgeFace,
    /// Faces of shape 1 against free edges of shape 2.
    FaceEdge,
    /// Free edges of both shapes.
    EdgeEdge,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::FaceFace,
        Category::EdgeEdgeSameDomain,
        Category::EdgeFace,
        Category::FaceEdge,
        Category::EdgeEdge,
    ];

    /// The category processed after this one, `None` after the last.
    pub fn next(self) -> Option<Category> {
        match self {
            Category::FaceFace => Some(Category::EdgeEdgeSameDomain),
            Category::EdgeEdgeSameDomain => Some(Category::EdgeFace),
            Category::EdgeFace => Some(Category::FaceEdge),
            Category::FaceEdge => Some(Category::EdgeEdge),
            Category::EdgeEdge => None,
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Category::FaceFace => "FF",
            Category::EdgeEdgeSameDomain => "EEFF",
            Category::EdgeFace => "EF",
            Category::FaceEdge => "FE",
            Category::EdgeEdge => "EE",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A candidate pair: `first` from shape 1, `second` from shape 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Couple {
    pub category: Category,
    pub first: SubShape,
    pub second: SubShape,
}

impl Couple {
    pub fn get(&self, rank: Rank) -> SubShape {
        match rank {
            Rank::First => self.first,
            Rank::Second => self.second,
        }
    }
}

impl fmt::Display for Couple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} x {}", self.category, self.first, self.second)
    }
}
