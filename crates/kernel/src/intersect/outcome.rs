use serde::Serialize;

/// What a category intersector concluded for one couple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Outcome<L> {
    /// No intersection, or no usable geometric domain.
    Empty,
    /// Computed intersection loci (never empty).
    Loci(Vec<L>),
    /// The two domains coincide over their full extent.
    SameDomain,
    /// Whether the domains coincide stayed undecidable after widening.
    Unresolved,
    /// The numeric solve did not settle even after widening.
    Inconclusive,
}

/// Tri-state answer to "do these domains coincide".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DomainRelation {
    Distinct,
    Same,
    Unknown,
}

impl<L> Outcome<L> {
    /// `Loci` when there is at least one locus, `Empty` otherwise.
    pub fn from_loci(loci: Vec<L>) -> Self {
        if loci.is_empty() {
            Outcome::Empty
        } else {
            Outcome::Loci(loci)
        }
    }

    /// Whether the couple is handed to the caller.
    pub fn is_reportable(&self) -> bool {
        matches!(self, Outcome::Loci(_) | Outcome::SameDomain | Outcome::Unresolved)
    }

    pub fn relation(&self) -> DomainRelation {
        match self {
            Outcome::SameDomain => DomainRelation::Same,
            Outcome::Unresolved => DomainRelation::Unknown,
            _ => DomainRelation::Distinct,
        }
    }

    pub fn loci(&self) -> &[L] {
        match self {
            Outcome::Loci(loci) => loci,
            _ => &[],
        }
    }
}

/// Result of a single solve at one tolerance.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<L> {
    Settled(Outcome<L>),
    /// The solve failed to settle; `ambiguous_domain` marks a same-domain
    /// question rather than a plain numeric failure.
    Diverged { ambiguous_domain: bool },
}

/// The current result held by a category intersector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoupleResult<L> {
    pub outcome: Outcome<L>,
    /// Working tolerances actually applied, one per rank.
    pub tolerances: (f64, f64),
}

impl<L> Default for CoupleResult<L> {
    fn default() -> Self {
        Self {
            outcome: Outcome::Empty,
            tolerances: (0.0, 0.0),
        }
    }
}

impl<L> CoupleResult<L> {
    pub fn new(outcome: Outcome<L>, tolerances: (f64, f64)) -> Self {
        Self { outcome, tolerances }
    }
}
