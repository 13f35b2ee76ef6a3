//! Serializable records of an intersection run.

use std::collections::BTreeMap;

use serde::Serialize;

use super::box_cache::CacheStats;
use super::couple::{Category, Couple};
use super::edges::EdgeContact;
use super::error::IntersectionError;
use super::face_edge::FaceEdgeContact;
use super::faces::SectionSegment;
use super::outcome::{CoupleResult, Outcome};

/// The intersector result attached to a reported couple.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum RecordedOutcome {
    Faces(CoupleResult<SectionSegment>),
    Edges(CoupleResult<EdgeContact>),
    FaceEdge(CoupleResult<FaceEdgeContact>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntersectionRecord {
    pub couple: Couple,
    pub result: RecordedOutcome,
}

/// Counters over the couples tested since the last initialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntersectorStats {
    /// Couples that passed the box prefilter and reached an intersector.
    pub tested: usize,
    pub reported: usize,
    pub skipped_empty: usize,
    pub skipped_inconclusive: usize,
    /// Reported couples whose domain relation stayed unknown.
    pub unresolved: usize,
    pub per_category: BTreeMap<Category, usize>,
}

impl IntersectorStats {
    /// Count one tested couple; returns whether it is reported.
    pub(crate) fn record<L>(&mut self, category: Category, outcome: &Outcome<L>) -> bool {
        self.tested += 1;
        match outcome {
            Outcome::Empty => self.skipped_empty += 1,
            Outcome::Inconclusive => self.skipped_inconclusive += 1,
            Outcome::Unresolved => self.unresolved += 1,
            Outcome::Loci(_) | Outcome::SameDomain => {}
        }
        let reportable = outcome.is_reportable();
        if reportable {
            self.reported += 1;
            *self.per_category.entry(category).or_default() += 1;
        }
        reportable
    }
}

/// Everything one full pass produced.
#[derive(Debug, Clone, Serialize)]
pub struct IntersectionReport {
    pub records: Vec<IntersectionRecord>,
    pub stats: IntersectorStats,
    pub cache: CacheStats,
}

impl IntersectionReport {
    pub fn to_json(&self) -> Result<String, IntersectionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Records of one category, in report order.
    pub fn of_category(&self, category: Category) -> impl Iterator<Item = &IntersectionRecord> {
        self.records.iter().filter(move |r| r.couple.category == category)
    }
}
