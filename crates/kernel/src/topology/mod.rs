pub mod brep;
pub mod primitives;
pub mod shape;

pub use brep::*;
pub use shape::{Shape, ShapeKind, SubShape};
