//! Shape-to-shape intersection: enumerates the face and edge couples of two
//! shapes that really intersect, with the result of each couple.

pub mod box_cache;
pub mod config;
pub mod couple;
pub mod edges;
pub mod error;
pub mod explorer;
pub mod face_edge;
pub mod faces;
pub mod outcome;
pub mod planar;
pub mod report;
pub mod scanner;
pub mod shape_intersector;
pub mod tolerance;

pub use box_cache::{BoxBuilder, BoxCache, Bounds, CacheStats, SampledBoxBuilder};
pub use config::{IntersectorConfig, ToleranceConfig};
pub use couple::{Category, Couple, Rank};
pub use edges::{EdgeContact, EdgesIntersector, LinearEdgesIntersector};
pub use error::{ConfigError, IntersectionError, ShapeDefect};
pub use explorer::{ExploredItem, Parent, SubShapeExplorer, SubShapeKind};
pub use face_edge::{FaceEdgeContact, FaceEdgeIntersector, PlanarFaceEdgeIntersector};
pub use faces::{FacesIntersector, PlanarFacesIntersector, SectionSegment};
pub use outcome::{CoupleResult, DomainRelation, Outcome};
pub use report::{IntersectionRecord, IntersectionReport, IntersectorStats, RecordedOutcome};
pub use scanner::{Candidates, Scanner};
pub use shape_intersector::ShapeIntersector;
pub use tolerance::ToleranceModel;
