//! Per-sub-shape bounding boxes, computed once and memoized.

use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use crate::geometry::bounds::BoundingBox;
use crate::geometry::curves::Curve;
use crate::topology::{EdgeId, EntityStore, FaceId, SubShape};

/// A cached box. `Open` stands for geometry that could not be bounded; it
/// overlaps everything so it never causes a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Bounds {
    Finite(BoundingBox),
    Open,
}

impl Bounds {
    pub fn overlaps(&self, other: &Bounds) -> bool {
        match (self, other) {
            (Bounds::Finite(a), Bounds::Finite(b)) => a.intersects(b),
            _ => true,
        }
    }

    pub fn finite(&self) -> Option<&BoundingBox> {
        match self {
            Bounds::Finite(bb) => Some(bb),
            Bounds::Open => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Bounds::Open)
    }
}

/// Computes the raw (not yet tolerance-enlarged) box of a sub-shape.
pub trait BoxBuilder {
    /// `None` when the sub-shape cannot be bounded.
    fn bound(&self, store: &EntityStore, sub: SubShape) -> Option<BoundingBox>;
}

/// Bounds lines exactly and circles by sampling plus the chord sagitta.
/// A face is bounded by its boundary edges.
#[derive(Debug, Clone, Copy)]
pub struct SampledBoxBuilder {
    pub curve_samples: usize,
}

impl Default for SampledBoxBuilder {
    fn default() -> Self {
        Self { curve_samples: 16 }
    }
}

impl SampledBoxBuilder {
    fn bound_edge(&self, store: &EntityStore, edge_id: EdgeId) -> Option<BoundingBox> {
        let edge = store.edges.get(edge_id)?;
        let (t0, t1) = (edge.t_start, edge.t_end);
        let bb = match &edge.curve {
            Curve::Line(line) => BoundingBox::from_points(&[line.evaluate(t0), line.evaluate(t1)]),
            Curve::Circle(circle) => {
                let n = self.curve_samples.max(1);
                let points: Vec<_> = (0..=n)
                    .map(|i| circle.evaluate(t0 + (t1 - t0) * (i as f64 / n as f64)))
                    .collect();
                let step = (t1 - t0).abs() / n as f64;
                let sagitta = circle.radius * (1.0 - (step.min(std::f64::consts::PI) / 2.0).cos());
                BoundingBox::from_points(&points).expanded(sagitta)
            }
        };
        bb.is_finite().then_some(bb)
    }

    fn bound_face(&self, store: &EntityStore, face_id: FaceId) -> Option<BoundingBox> {
        let face = store.faces.get(face_id)?;
        let mut bb: Option<BoundingBox> = None;
        for loop_id in face.loops() {
            for edge_id in store.loop_edges(loop_id) {
                let edge_box = self.bound_edge(store, edge_id)?;
                bb = Some(bb.map_or(edge_box, |b| b.union(&edge_box)));
            }
        }
        bb
    }
}

impl BoxBuilder for SampledBoxBuilder {
    fn bound(&self, store: &EntityStore, sub: SubShape) -> Option<BoundingBox> {
        match sub {
            SubShape::Face(f) => self.bound_face(store, f),
            SubShape::Edge(e) => self.bound_edge(store, e),
        }
    }
}

/// Counters for cache effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Memoized sub-shape boxes, enlarged by each sub-shape's own tolerance and
/// never by less than `min_margin`.
pub struct BoxCache {
    builder: Box<dyn BoxBuilder + Send + Sync>,
    boxes: HashMap<SubShape, Bounds>,
    min_margin: f64,
    stats: CacheStats,
}

impl std::fmt::Debug for BoxCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxCache")
            .field("entries", &self.boxes.len())
            .field("min_margin", &self.min_margin)
            .field("stats", &self.stats)
            .finish()
    }
}

impl BoxCache {
    pub fn new(builder: impl BoxBuilder + Send + Sync + 'static) -> Self {
        Self {
            builder: Box::new(builder),
            boxes: HashMap::new(),
            min_margin: 0.0,
            stats: CacheStats::default(),
        }
    }

    /// Enlarge every box by at least `margin`, so a box never rejects a
    /// couple the intersectors would accept at their working tolerance.
    pub fn with_min_margin(mut self, margin: f64) -> Self {
        self.min_margin = if margin.is_finite() { margin.max(0.0) } else { 0.0 };
        self
    }

    pub fn min_margin(&self) -> f64 {
        self.min_margin
    }

    /// The box of `sub`, computing it on first request.
    pub fn get(&mut self, store: &EntityStore, sub: SubShape) -> Bounds {
        if let Some(bounds) = self.boxes.get(&sub) {
            self.stats.hits += 1;
            return *bounds;
        }
        self.stats.misses += 1;
        let bounds = match (self.builder.bound(store, sub), sub.tolerance(store)) {
            (Some(bb), Some(tol)) if tol.is_finite() => {
                let enlarged = bb.expanded(tol.max(self.min_margin));
                if enlarged.is_finite() {
                    Bounds::Finite(enlarged)
                } else {
                    Bounds::Open
                }
            }
            _ => Bounds::Open,
        };
        trace!(%sub, open = bounds.is_open(), "computed box");
        self.boxes.insert(sub, bounds);
        bounds
    }

    /// The cached box, without computing or counting.
    pub fn peek(&self, sub: SubShape) -> Option<Bounds> {
        self.boxes.get(&sub).copied()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point3d;
    use crate::geometry::vector::Vec3;
    use crate::topology::primitives::{make_circle_edge, make_line_edge, make_planar_face};

    fn cache() -> BoxCache {
        BoxCache::new(SampledBoxBuilder::default())
    }

    #[test]
    fn test_line_box_is_enlarged_by_tolerance() {
        let mut store = EntityStore::new();
        let e = make_line_edge(&mut store, Point3d::new(0.0, 0.0, 0.0), Point3d::new(2.0, 1.0, 0.0)).unwrap();
        store.edges[e].tolerance = 0.25;
        let Bounds::Finite(bb) = cache().get(&store, SubShape::Edge(e)) else {
            panic!("line edge must be bounded");
        };
        let expected_min = Point3d::new(-0.25, -0.25, -0.25);
        let expected_max = Point3d::new(2.25, 1.25, 0.25);
        assert!(bb.min.distance_to(&expected_min) < 1e-12);
        assert!(bb.max.distance_to(&expected_max) < 1e-12);
    }

    #[test]
    fn test_min_margin_applies_below_entity_tolerance() {
        let mut store = EntityStore::new();
        let e = make_line_edge(&mut store, Point3d::ORIGIN, Point3d::new(1.0, 0.0, 0.0)).unwrap();
        store.edges[e].tolerance = 1e-9;
        let mut cache = cache().with_min_margin(1e-3);
        let Bounds::Finite(bb) = cache.get(&store, SubShape::Edge(e)) else {
            panic!("line edge must be bounded");
        };
        assert!(bb.min.distance_to(&Point3d::new(-1e-3, -1e-3, -1e-3)) < 1e-15);

        // A larger entity tolerance still wins.
        store.edges[e].tolerance = 0.5;
        let Bounds::Finite(bb) = BoxCache::new(SampledBoxBuilder::default())
            .with_min_margin(1e-3)
            .get(&store, SubShape::Edge(e))
        else {
            panic!("line edge must be bounded");
        };
        assert!((bb.max.x - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_circle_box_contains_whole_circle() {
        let mut store = EntityStore::new();
        let e = make_circle_edge(&mut store, Point3d::ORIGIN, Vec3::Z, 1.0).unwrap();
        let mut cache = BoxCache::new(SampledBoxBuilder { curve_samples: 5 });
        let Bounds::Finite(bb) = cache.get(&store, SubShape::Edge(e)) else {
            panic!("circle edge must be bounded");
        };
        for i in 0..360 {
            let t = (i as f64).to_radians();
            assert!(bb.contains_point(&Point3d::new(t.cos(), t.sin(), 0.0)));
        }
    }

    #[test]
    fn test_memoized_with_hit_counter() {
        let mut store = EntityStore::new();
        let e = make_line_edge(&mut store, Point3d::ORIGIN, Point3d::new(1.0, 0.0, 0.0)).unwrap();
        let mut cache = cache();
        let first = cache.get(&store, SubShape::Edge(e));
        let second = cache.get(&store, SubShape::Edge(e));
        assert_eq!(first, second);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
        assert_eq!(cache.peek(SubShape::Edge(e)), Some(first));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_face_without_boundary_is_open() {
        let mut store = EntityStore::new();
        let square = [
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(1.0, 1.0, 0.0),
        ];
        let f = make_planar_face(&mut store, &square, &[]).unwrap();
        let outer = store.faces[f].outer_loop;
        store.loops[outer].half_edges.clear();
        assert_eq!(cache().get(&store, SubShape::Face(f)), Bounds::Open);
    }

    #[test]
    fn test_missing_sub_shape_is_open() {
        let mut store = EntityStore::new();
        let e = make_line_edge(&mut store, Point3d::ORIGIN, Point3d::new(1.0, 0.0, 0.0)).unwrap();
        store.edges.remove(e);
        assert!(cache().get(&store, SubShape::Edge(e)).is_open());
    }

    #[test]
    fn test_open_overlaps_everything() {
        let bb = BoundingBox::new(Point3d::new(5.0, 5.0, 5.0), Point3d::new(6.0, 6.0, 6.0));
        let far = BoundingBox::new(Point3d::new(-6.0, -6.0, -6.0), Point3d::new(-5.0, -5.0, -5.0));
        assert!(Bounds::Open.overlaps(&Bounds::Finite(bb)));
        assert!(Bounds::Finite(bb).overlaps(&Bounds::Open));
        assert!(!Bounds::Finite(bb).overlaps(&Bounds::Finite(far)));
    }

    #[test]
    fn test_custom_builder() {
        struct Nothing;
        impl BoxBuilder for Nothing {
            fn bound(&self, _: &EntityStore, _: SubShape) -> Option<BoundingBox> {
                None
            }
        }
        let mut store = EntityStore::new();
        let e = make_line_edge(&mut store, Point3d::ORIGIN, Point3d::new(1.0, 0.0, 0.0)).unwrap();
        assert!(BoxCache::new(Nothing).get(&store, SubShape::Edge(e)).is_open());
    }
}
