//! Sweep-and-prune index over the sub-shapes of the scanned shape.

use tracing::{debug, instrument};

use crate::geometry::bounds::BoundingBox;
use crate::topology::{EntityStore, SubShape};

use super::box_cache::{BoxCache, Bounds};

#[derive(Debug, Clone)]
struct ScanEntry {
    order: usize,
    sub: SubShape,
    bbox: BoundingBox,
}

/// Box index answering "which indexed sub-shapes may touch this box".
///
/// Finite entries are sorted by `min.x`; a query walks only the prefix that
/// can reach it. Open entries are always candidates.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    entries: Vec<ScanEntry>,
    open: Vec<(usize, SubShape)>,
    hull: Option<BoundingBox>,
}

impl Scanner {
    /// Index `items`, pulling their boxes through `cache`.
    #[instrument(skip_all)]
    pub fn build(
        items: impl IntoIterator<Item = SubShape>,
        cache: &mut BoxCache,
        store: &EntityStore,
    ) -> Self {
        let mut scanner = Scanner::default();
        for (order, sub) in items.into_iter().enumerate() {
            match cache.get(store, sub) {
                Bounds::Finite(bbox) => {
                    scanner.hull = Some(scanner.hull.map_or(bbox, |h| h.union(&bbox)));
                    scanner.entries.push(ScanEntry { order, sub, bbox });
                }
                Bounds::Open => scanner.open.push((order, sub)),
            }
        }
        scanner
            .entries
            .sort_by(|a, b| a.bbox.min.x.total_cmp(&b.bbox.min.x).then(a.order.cmp(&b.order)));
        debug!(finite = scanner.entries.len(), open = scanner.open.len(), "built scanner");
        scanner
    }

    /// Indexed sub-shapes whose box overlaps `bounds`, in indexing order.
    pub fn query(&self, bounds: &Bounds) -> Candidates {
        let mut hits: Vec<(usize, SubShape)> = self.open.clone();
        match bounds {
            Bounds::Open => hits.extend(self.entries.iter().map(|e| (e.order, e.sub))),
            Bounds::Finite(q) => {
                if self.hull.is_some_and(|h| h.intersects(q)) {
                    let reach = self.entries.partition_point(|e| e.bbox.min.x <= q.max.x);
                    hits.extend(
                        self.entries[..reach]
                            .iter()
                            .filter(|e| e.bbox.intersects(q))
                            .map(|e| (e.order, e.sub)),
                    );
                }
            }
        }
        hits.sort_by_key(|(order, _)| *order);
        Candidates {
            items: hits.into_iter().map(|(_, sub)| sub).collect(),
            cursor: 0,
        }
    }

    /// Union of every finite entry box, `None` if there is none.
    pub fn hull(&self) -> Option<&BoundingBox> {
        self.hull.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resumable cursor over the result of one query.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    items: Vec<SubShape>,
    cursor: usize,
}

impl Candidates {
    pub fn more(&self) -> bool {
        self.cursor < self.items.len()
    }

    pub fn current(&self) -> Option<SubShape> {
        self.items.get(self.cursor).copied()
    }

    pub fn next(&mut self) {
        if self.more() {
            self.cursor += 1;
        }
    }

    /// Return the current candidate and step past it.
    pub fn advance(&mut self) -> Option<SubShape> {
        let current = self.current()?;
        self.cursor += 1;
        Some(current)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[SubShape] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point3d;
    use crate::intersect::box_cache::SampledBoxBuilder;
    use crate::topology::primitives::make_line_edge;
    use crate::topology::EdgeId;

    fn edges_along_x(store: &mut EntityStore, starts: &[f64]) -> Vec<EdgeId> {
        starts
            .iter()
            .map(|&x| make_line_edge(store, Point3d::new(x, 0.0, 0.0), Point3d::new(x + 1.0, 0.0, 0.0)).unwrap())
            .collect()
    }

    fn query_box(x0: f64, x1: f64) -> Bounds {
        Bounds::Finite(BoundingBox::new(Point3d::new(x0, -1.0, -1.0), Point3d::new(x1, 1.0, 1.0)))
    }

    #[test]
    fn test_query_returns_overlaps_in_indexing_order() {
        let mut store = EntityStore::new();
        let edges = edges_along_x(&mut store, &[5.0, 0.0, 10.0, 2.0]);
        let mut cache = BoxCache::new(SampledBoxBuilder::default());
        let scanner = Scanner::build(edges.iter().map(|&e| SubShape::Edge(e)), &mut cache, &store);

        let hits = scanner.query(&query_box(0.5, 5.5));
        assert_eq!(
            hits.as_slice(),
            &[SubShape::Edge(edges[0]), SubShape::Edge(edges[1]), SubShape::Edge(edges[3])]
        );
    }

    #[test]
    fn test_query_outside_hull_is_empty() {
        let mut store = EntityStore::new();
        let edges = edges_along_x(&mut store, &[0.0, 1.0]);
        let mut cache = BoxCache::new(SampledBoxBuilder::default());
        let scanner = Scanner::build(edges.iter().map(|&e| SubShape::Edge(e)), &mut cache, &store);
        assert!(scanner.query(&query_box(50.0, 60.0)).is_empty());
        assert!(scanner.hull().is_some());
        assert_eq!(scanner.len(), 2);
    }

    #[test]
    fn test_open_entries_are_always_candidates() {
        let mut store = EntityStore::new();
        let edges = edges_along_x(&mut store, &[0.0, 20.0]);
        store.edges[edges[1]].tolerance = f64::INFINITY;
        let mut cache = BoxCache::new(SampledBoxBuilder::default());
        let scanner = Scanner::build(edges.iter().map(|&e| SubShape::Edge(e)), &mut cache, &store);

        let hits = scanner.query(&query_box(100.0, 101.0));
        assert_eq!(hits.as_slice(), &[SubShape::Edge(edges[1])]);
    }

    #[test]
    fn test_open_query_returns_everything() {
        let mut store = EntityStore::new();
        let edges = edges_along_x(&mut store, &[3.0, -7.0, 12.0]);
        let mut cache = BoxCache::new(SampledBoxBuilder::default());
        let scanner = Scanner::build(edges.iter().map(|&e| SubShape::Edge(e)), &mut cache, &store);
        let all: Vec<SubShape> = edges.iter().map(|&e| SubShape::Edge(e)).collect();
        assert_eq!(scanner.query(&Bounds::Open).as_slice(), all.as_slice());
    }

    #[test]
    fn test_candidates_cursor() {
        let mut store = EntityStore::new();
        let edges = edges_along_x(&mut store, &[0.0, 0.5]);
        let mut cache = BoxCache::new(SampledBoxBuilder::default());
        let scanner = Scanner::build(edges.iter().map(|&e| SubShape::Edge(e)), &mut cache, &store);

        let mut hits = scanner.query(&query_box(0.0, 1.0));
        assert_eq!(hits.len(), 2);
        assert!(hits.more());
        assert_eq!(hits.advance(), Some(SubShape::Edge(edges[0])));
        assert_eq!(hits.current(), Some(SubShape::Edge(edges[1])));
        hits.next();
        assert!(!hits.more());
        assert_eq!(hits.advance(), None);
    }
}
