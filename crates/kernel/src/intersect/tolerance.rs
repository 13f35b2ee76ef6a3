use tracing::debug;

use super::config::{IntersectorConfig, ToleranceConfig};
use super::outcome::{Attempt, CoupleResult, Outcome};

/// Turns entity tolerances into the working tolerances of a couple.
#[derive(Debug, Clone, Copy)]
pub struct ToleranceModel {
    config: ToleranceConfig,
    forced: Option<(f64, f64)>,
}

impl ToleranceModel {
    pub fn new(config: &IntersectorConfig) -> Self {
        Self {
            config: config.tolerance,
            forced: config.forced_tolerances,
        }
    }

    pub fn config(&self) -> &ToleranceConfig {
        &self.config
    }

    /// Floor at the modeling tolerance, cap against blow-up. NaN floors.
    pub fn clamp(&self, tolerance: f64) -> f64 {
        if tolerance.is_nan() {
            return self.config.modeling;
        }
        tolerance.clamp(self.config.modeling, self.config.cap)
    }

    /// Working (tol1, tol2) for two entity tolerances: both ranks get the
    /// clamped maximum, unless tolerances are forced.
    pub fn working(&self, tol1: f64, tol2: f64) -> (f64, f64) {
        if let Some(forced) = self.forced {
            return forced;
        }
        let t = self.clamp(tol1.max(tol2));
        (t, t)
    }

    /// Smallest box enlargement that keeps box rejection within the working
    /// tolerance of any couple: the modeling floor, or the forced pair.
    pub fn box_margin(&self) -> f64 {
        let forced = self.forced.map_or(0.0, |(t1, t2)| t1.max(t2));
        self.config.modeling.max(forced)
    }

    /// Never narrows, never passes the widening cap (unless already above it).
    pub fn widen(&self, tolerance: f64) -> f64 {
        (tolerance * self.config.widen_factor)
            .min(self.config.widen_cap)
            .max(tolerance)
    }

    /// Run `attempt` at the working tolerance, retrying once at the widened
    /// tolerance when it diverges. A second divergence collapses to
    /// `Unresolved` (domain ambiguity) or `Inconclusive`.
    pub fn run_with_widening<L>(
        &self,
        tolerances: (f64, f64),
        mut attempt: impl FnMut(f64) -> Attempt<L>,
    ) -> CoupleResult<L> {
        let tol = tolerances.0.max(tolerances.1);
        let ambiguous_domain = match attempt(tol) {
            Attempt::Settled(outcome) => return CoupleResult::new(outcome, tolerances),
            Attempt::Diverged { ambiguous_domain } => ambiguous_domain,
        };

        let widened = (self.widen(tolerances.0), self.widen(tolerances.1));
        let widened_tol = widened.0.max(widened.1);
        let ambiguous_domain = if widened_tol > tol {
            debug!(from = tol, to = widened_tol, "widening tolerance");
            match attempt(widened_tol) {
                Attempt::Settled(outcome) => return CoupleResult::new(outcome, widened),
                Attempt::Diverged { ambiguous_domain } => ambiguous_domain,
            }
        } else {
            ambiguous_domain
        };

        let outcome = if ambiguous_domain {
            Outcome::Unresolved
        } else {
            Outcome::Inconclusive
        };
        CoupleResult::new(outcome, widened)
    }
}
