pub mod geometry;
pub mod intersect;
pub mod topology;

// Re-export the intersection entry points at crate root for convenience.
pub use intersect::{IntersectionError, IntersectorConfig, ShapeIntersector};
pub use topology::{EntityStore, Shape, SubShape};

/// Global tolerance configuration for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Points closer than this are considered coincident (meters).
    pub coincidence: f64,
    /// Sines smaller than this are considered zero.
    pub angular: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            coincidence: 1e-7,
            angular: 1e-10,
        }
    }
}

/// Process-wide default tolerance.
pub fn default_tolerance() -> Tolerance {
    Tolerance::default()
}
