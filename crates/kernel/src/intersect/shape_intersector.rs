//! Pull-based enumeration of the intersecting sub-shape couples of two shapes.
//!
//! Couples are produced category by category (FF, EEFF, EF, FE, EE). Within
//! a category, sub-shapes of shape 2 are explored in order and each one is
//! queried against a box index over shape 1, so the same inputs always yield
//! the same couples in the same order.

use std::collections::{HashMap, HashSet};
use std::mem;

use tracing::{debug, info, instrument, warn};

use crate::topology::{EdgeId, EntityStore, FaceId, Shape, ShapeKind, SubShape};

use super::box_cache::{BoxCache, Bounds, CacheStats, SampledBoxBuilder};
use super::config::IntersectorConfig;
use super::couple::{Category, Couple, Rank};
use super::edges::{EdgesIntersector, LinearEdgesIntersector};
use super::error::{IntersectionError, ShapeDefect};
use super::explorer::{SubShapeExplorer, SubShapeKind};
use super::face_edge::{FaceEdgeIntersector, PlanarFaceEdgeIntersector};
use super::faces::{FacesIntersector, PlanarFacesIntersector};
use super::outcome::{CoupleResult, DomainRelation, Outcome};
use super::report::{IntersectionRecord, IntersectionReport, IntersectorStats, RecordedOutcome};
use super::scanner::{Candidates, Scanner};
use super::tolerance::ToleranceModel;

/// Which sub-shapes of a shape take part in a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ScanKind {
    Faces,
    /// Edges not bounding any face.
    FreeEdges,
}

impl ScanKind {
    fn explorer(self, store: &EntityStore, shape: &Shape) -> SubShapeExplorer {
        match self {
            ScanKind::Faces => SubShapeExplorer::new(store, shape, SubShapeKind::Face, None),
            ScanKind::FreeEdges => SubShapeExplorer::new(store, shape, SubShapeKind::Edge, Some(ShapeKind::Face)),
        }
    }

    /// (indexed in shape 1, explored in shape 2); `None` for EEFF.
    fn layers(category: Category) -> Option<(ScanKind, ScanKind)> {
        match category {
            Category::FaceFace => Some((ScanKind::Faces, ScanKind::Faces)),
            Category::EdgeFace => Some((ScanKind::FreeEdges, ScanKind::Faces)),
            Category::FaceEdge => Some((ScanKind::Faces, ScanKind::FreeEdges)),
            Category::EdgeEdge => Some((ScanKind::FreeEdges, ScanKind::FreeEdges)),
            Category::EdgeEdgeSameDomain => None,
        }
    }
}

#[derive(Debug)]
enum ScannerRef {
    /// A shape 1 index kept across categories.
    Shared(ScanKind),
    /// An index over one face's edges, dropped with the sweep.
    Owned(Scanner),
}

#[derive(Debug)]
struct Probe {
    explored: SubShape,
    candidates: Candidates,
}

/// Cursor state of one explorer-against-index sweep.
#[derive(Debug)]
struct Sweep {
    explorer: SubShapeExplorer,
    scanner: ScannerRef,
    probe: Option<Probe>,
}

impl Sweep {
    fn new(explorer: SubShapeExplorer, scanner: ScannerRef) -> Self {
        Self {
            explorer,
            scanner,
            probe: None,
        }
    }
}

/// EEFF cursor: one sweep per same-domain face pair, couples de-duplicated
/// across pairs that share edges.
#[derive(Debug)]
struct SameDomainSweep {
    pairs: Vec<(FaceId, FaceId)>,
    next_pair: usize,
    sweep: Option<Sweep>,
    seen: HashSet<(EdgeId, EdgeId)>,
}

#[derive(Debug)]
enum Phase {
    Uninitialized,
    Sweeping { category: Category, sweep: Sweep },
    SameDomainEdges(SameDomainSweep),
    Terminal,
}

/// Enumerates the couples of sub-shapes of two shapes that really intersect.
///
/// ```ignore
/// let mut si = ShapeIntersector::new(&store, shape1, shape2)?;
/// while si.more_intersection() {
///     let couple = si.current_couple();
///     si.next_intersection();
/// }
/// ```
pub struct ShapeIntersector<
    's,
    F = PlanarFacesIntersector,
    E = LinearEdgesIntersector,
    X = PlanarFaceEdgeIntersector,
> {
    store: &'s EntityStore,
    shapes: [Shape; 2],
    config: IntersectorConfig,
    tolerance: ToleranceModel,
    cache: BoxCache,
    scanners: HashMap<ScanKind, Scanner>,
    phase: Phase,
    current: Option<Couple>,
    faces: F,
    edges: E,
    face_edge: X,
    same_domain_faces: Vec<(FaceId, FaceId)>,
    stats: IntersectorStats,
}

impl<'s> ShapeIntersector<'s> {
    pub fn new(store: &'s EntityStore, shape1: Shape, shape2: Shape) -> Result<Self, IntersectionError> {
        Self::with_config(store, shape1, shape2, IntersectorConfig::default())
    }

    pub fn with_config(
        store: &'s EntityStore,
        shape1: Shape,
        shape2: Shape,
        config: IntersectorConfig,
    ) -> Result<Self, IntersectionError> {
        Self::with_intersectors(
            store,
            shape1,
            shape2,
            config,
            PlanarFacesIntersector::default(),
            LinearEdgesIntersector::default(),
            PlanarFaceEdgeIntersector::default(),
        )
    }
}

impl<'s, F, E, X> ShapeIntersector<'s, F, E, X>
where
    F: FacesIntersector,
    E: EdgesIntersector,
    X: FaceEdgeIntersector,
{
    /// Build an intersector with caller-supplied category intersectors and
    /// position it on the first intersecting couple.
    #[instrument(skip_all)]
    pub fn with_intersectors(
        store: &'s EntityStore,
        shape1: Shape,
        shape2: Shape,
        config: IntersectorConfig,
        faces: F,
        edges: E,
        face_edge: X,
    ) -> Result<Self, IntersectionError> {
        config.validate()?;
        validate_shape(store, &shape1, Rank::First)?;
        validate_shape(store, &shape2, Rank::Second)?;

        let tolerance = ToleranceModel::new(&config);
        let cache = BoxCache::new(SampledBoxBuilder {
            curve_samples: config.curve_samples as usize,
        })
        .with_min_margin(tolerance.box_margin());
        let mut intersector = Self {
            store,
            shapes: [shape1, shape2],
            tolerance,
            config,
            cache,
            scanners: HashMap::new(),
            phase: Phase::Uninitialized,
            current: None,
            faces,
            edges,
            face_edge,
            same_domain_faces: Vec::new(),
            stats: IntersectorStats::default(),
        };
        intersector.init_intersection();
        Ok(intersector)
    }

    /// Restart the enumeration from the first category. Boxes and indexes
    /// built by a previous pass are reused.
    #[instrument(skip_all)]
    pub fn init_intersection(&mut self) {
        self.current = None;
        self.same_domain_faces.clear();
        self.stats = IntersectorStats::default();
        self.phase = self.enter(Some(Category::FaceFace));
        self.advance();
    }

    /// Whether a current couple is available.
    pub fn more_intersection(&self) -> bool {
        self.current.is_some()
    }

    /// Move to the next intersecting couple. No effect once exhausted.
    pub fn next_intersection(&mut self) {
        if self.current.is_some() {
            self.advance();
        }
    }

    /// Drop all cursors and shape indexes; `init_intersection` must be called
    /// before enumerating again. Cached boxes survive.
    pub fn reset(&mut self) {
        self.scanners.clear();
        self.phase = Phase::Uninitialized;
        self.current = None;
    }

    pub fn shape(&self, rank: Rank) -> &Shape {
        match rank {
            Rank::First => &self.shapes[0],
            Rank::Second => &self.shapes[1],
        }
    }

    pub fn config(&self) -> &IntersectorConfig {
        &self.config
    }

    pub fn current_couple(&self) -> Option<&Couple> {
        self.current.as_ref()
    }

    pub fn current_category(&self) -> Option<Category> {
        self.current.map(|c| c.category)
    }

    /// The current sub-shape of `rank`.
    pub fn current_geom_shape(&self, rank: Rank) -> Option<SubShape> {
        self.current.map(|c| c.get(rank))
    }

    /// Working tolerances applied to the current couple, in rank order.
    /// Forced tolerances are rank-ordered already and unforced ones are
    /// equal, so the pair needs no reordering for EF couples.
    pub fn tolerances(&self) -> Option<(f64, f64)> {
        self.current_record().map(|r| match r {
            RecordedOutcome::Faces(res) => res.tolerances,
            RecordedOutcome::Edges(res) => res.tolerances,
            RecordedOutcome::FaceEdge(res) => res.tolerances,
        })
    }

    /// Whether the current couple's domains coincide.
    pub fn current_relation(&self) -> Option<DomainRelation> {
        let category = self.current_category()?;
        Some(match category {
            Category::FaceFace => self.faces.result().outcome.relation(),
            Category::EdgeEdgeSameDomain | Category::EdgeEdge => self.edges.result().outcome.relation(),
            Category::EdgeFace | Category::FaceEdge => self.face_edge.result().outcome.relation(),
        })
    }

    /// The current couple with a copy of its intersector result.
    pub fn current_record(&self) -> Option<RecordedOutcome> {
        let category = self.current_category()?;
        Some(match category {
            Category::FaceFace => RecordedOutcome::Faces(self.faces.result().clone()),
            Category::EdgeEdgeSameDomain | Category::EdgeEdge => RecordedOutcome::Edges(self.edges.result().clone()),
            Category::EdgeFace | Category::FaceEdge => RecordedOutcome::FaceEdge(self.face_edge.result().clone()),
        })
    }

    pub fn faces_intersector(&self) -> &F {
        &self.faces
    }

    pub fn faces_intersector_mut(&mut self) -> &mut F {
        &mut self.faces
    }

    pub fn edges_intersector(&self) -> &E {
        &self.edges
    }

    pub fn edges_intersector_mut(&mut self) -> &mut E {
        &mut self.edges
    }

    pub fn face_edge_intersector(&self) -> &X {
        &self.face_edge
    }

    pub fn face_edge_intersector_mut(&mut self) -> &mut X {
        &mut self.face_edge
    }

    /// The tolerance-enlarged box of a sub-shape, computed on demand.
    pub fn box_of(&mut self, sub: SubShape) -> Bounds {
        self.cache.get(self.store, sub)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn stats(&self) -> &IntersectorStats {
        &self.stats
    }

    /// Face pairs found same-domain so far in this pass.
    pub fn same_domain_faces(&self) -> &[(FaceId, FaceId)] {
        &self.same_domain_faces
    }

    /// Run a full pass from the start and collect every reported couple.
    pub fn collect_records(&mut self) -> Vec<IntersectionRecord> {
        self.init_intersection();
        let mut records = Vec::new();
        while let (Some(couple), Some(result)) = (self.current, self.current_record()) {
            records.push(IntersectionRecord { couple, result });
            self.next_intersection();
        }
        records
    }

    /// Full pass with counters, ready for serialization.
    pub fn report(&mut self) -> IntersectionReport {
        let records = self.collect_records();
        IntersectionReport {
            records,
            stats: self.stats.clone(),
            cache: self.cache.stats(),
        }
    }

    // ─── Enumeration ─────────────────────────────────────────────────────────

    fn advance(&mut self) {
        self.current = None;
        loop {
            match mem::replace(&mut self.phase, Phase::Terminal) {
                phase @ (Phase::Uninitialized | Phase::Terminal) => {
                    self.phase = phase;
                    return;
                }
                Phase::Sweeping { category, mut sweep } => match self.next_candidate(category, &mut sweep) {
                    Some(couple) => {
                        self.phase = Phase::Sweeping { category, sweep };
                        if self.try_couple(couple) {
                            self.current = Some(couple);
                            return;
                        }
                    }
                    None => self.phase = self.enter(category.next()),
                },
                Phase::SameDomainEdges(mut sd) => match self.next_same_domain_candidate(&mut sd) {
                    Some(couple) => {
                        self.phase = Phase::SameDomainEdges(sd);
                        if self.try_couple(couple) {
                            self.current = Some(couple);
                            return;
                        }
                    }
                    None => self.phase = self.enter(Category::EdgeEdgeSameDomain.next()),
                },
            }
        }
    }

    fn enter(&mut self, category: Option<Category>) -> Phase {
        let Some(category) = category else {
            info!(
                tested = self.stats.tested,
                reported = self.stats.reported,
                unresolved = self.stats.unresolved,
                "intersection exhausted"
            );
            return Phase::Terminal;
        };
        info!(%category, "entering category");
        match ScanKind::layers(category) {
            Some((indexed, explored)) => {
                self.ensure_scanner(indexed);
                let explorer = explored.explorer(self.store, &self.shapes[1]);
                Phase::Sweeping {
                    category,
                    sweep: Sweep::new(explorer, ScannerRef::Shared(indexed)),
                }
            }
            None => Phase::SameDomainEdges(SameDomainSweep {
                pairs: self.same_domain_faces.clone(),
                next_pair: 0,
                sweep: None,
                seen: HashSet::new(),
            }),
        }
    }

    fn ensure_scanner(&mut self, kind: ScanKind) {
        if self.scanners.contains_key(&kind) {
            return;
        }
        let explorer = kind.explorer(self.store, &self.shapes[0]);
        let scanner = Scanner::build(explorer.items().iter().map(|i| i.sub), &mut self.cache, self.store);
        self.scanners.insert(kind, scanner);
    }

    /// Next box-overlapping couple of a sweep, `None` once it is exhausted.
    fn next_candidate(&mut self, category: Category, sweep: &mut Sweep) -> Option<Couple> {
        loop {
            if let Some(probe) = sweep.probe.as_mut() {
                if let Some(indexed) = probe.candidates.advance() {
                    return Some(Couple {
                        category,
                        first: indexed,
                        second: probe.explored,
                    });
                }
                sweep.probe = None;
            }
            let explored = sweep.explorer.current()?.sub;
            sweep.explorer.next();
            let bounds = self.cache.get(self.store, explored);
            let candidates = match &sweep.scanner {
                ScannerRef::Shared(kind) => self.scanners.get(kind).map(|s| s.query(&bounds)).unwrap_or_default(),
                ScannerRef::Owned(scanner) => scanner.query(&bounds),
            };
            sweep.probe = Some(Probe { explored, candidates });
        }
    }

    fn next_same_domain_candidate(&mut self, sd: &mut SameDomainSweep) -> Option<Couple> {
        loop {
            if let Some(sweep) = sd.sweep.as_mut() {
                while let Some(couple) = self.next_candidate(Category::EdgeEdgeSameDomain, sweep) {
                    if let (SubShape::Edge(e1), SubShape::Edge(e2)) = (couple.first, couple.second) {
                        if sd.seen.insert((e1, e2)) {
                            return Some(couple);
                        }
                    }
                }
                sd.sweep = None;
            }
            let (face1, face2) = *sd.pairs.get(sd.next_pair)?;
            sd.next_pair += 1;
            let edges1 = SubShapeExplorer::new(self.store, &Shape::Face(face1), SubShapeKind::Edge, None);
            let scanner = Scanner::build(edges1.items().iter().map(|i| i.sub), &mut self.cache, self.store);
            let edges2 = SubShapeExplorer::new(self.store, &Shape::Face(face2), SubShapeKind::Edge, None);
            sd.sweep = Some(Sweep::new(edges2, ScannerRef::Owned(scanner)));
        }
    }

    /// Run the category intersector on `couple`; true when it is reported.
    fn try_couple(&mut self, couple: Couple) -> bool {
        let store = self.store;
        let model = &self.tolerance;
        let stats = &mut self.stats;
        match (couple.first, couple.second) {
            (SubShape::Face(f1), SubShape::Face(f2)) => {
                let result = self.faces.perform(store, f1, f2, model);
                if result.outcome == Outcome::SameDomain {
                    self.same_domain_faces.push((f1, f2));
                }
                note(stats, &couple, result)
            }
            (SubShape::Edge(e1), SubShape::Face(f2)) => {
                let result = self.face_edge.perform(store, f2, e1, model);
                note(stats, &couple, result)
            }
            (SubShape::Face(f1), SubShape::Edge(e2)) => {
                let result = self.face_edge.perform(store, f1, e2, model);
                note(stats, &couple, result)
            }
            (SubShape::Edge(e1), SubShape::Edge(e2)) => {
                let result = self.edges.perform(store, e1, e2, model);
                note(stats, &couple, result)
            }
        }
    }
}

fn note<L>(stats: &mut IntersectorStats, couple: &Couple, result: &CoupleResult<L>) -> bool {
    let reported = stats.record(couple.category, &result.outcome);
    match &result.outcome {
        Outcome::Unresolved => warn!(%couple, tolerances = ?result.tolerances, "same-domain status unresolved"),
        Outcome::Inconclusive => warn!(%couple, tolerances = ?result.tolerances, "intersection inconclusive, skipped"),
        outcome if reported => debug!(%couple, loci = outcome.loci().len(), "intersecting couple"),
        _ => {}
    }
    reported
}

fn validate_shape(store: &EntityStore, shape: &Shape, rank: Rank) -> Result<(), IntersectionError> {
    let defect = if !store.contains_shape(shape) {
        Some(ShapeDefect::Null)
    } else if SubShapeExplorer::new(store, shape, SubShapeKind::Face, None).is_empty()
        && SubShapeExplorer::new(store, shape, SubShapeKind::Edge, None).is_empty()
    {
        Some(ShapeDefect::Empty)
    } else {
        None
    };
    match defect {
        Some(defect) => Err(IntersectionError::NotInitialized { rank, defect }),
        None => Ok(()),
    }
}
