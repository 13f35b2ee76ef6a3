//! Configuration for the shape intersection engine.

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Tolerance policy applied to every couple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceConfig {
    /// Floor for working tolerances: points closer than this coincide.
    pub modeling: f64,
    /// Ceiling for working tolerances derived from entity tolerances.
    pub cap: f64,
    /// Multiplier applied on the single widening retry.
    pub widen_factor: f64,
    /// Absolute bound a widened tolerance never exceeds.
    pub widen_cap: f64,
    /// Sine below which two directions are parallel.
    pub angular: f64,
    /// Sine below which a crossing is too ill-conditioned to solve.
    pub ill_conditioned_sine: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        let base = crate::default_tolerance();
        Self {
            modeling: base.coincidence,
            cap: 1e-4,
            widen_factor: 10.0,
            widen_cap: 1e-3,
            angular: base.angular,
            ill_conditioned_sine: 1e-6,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectorConfig {
    pub tolerance: ToleranceConfig,
    /// Samples per curved edge when bounding it.
    pub curve_samples: u32,
    /// Replaces entity tolerances for every couple when set.
    pub forced_tolerances: Option<(f64, f64)>,
}

impl Default for IntersectorConfig {
    fn default() -> Self {
        Self {
            tolerance: ToleranceConfig::default(),
            curve_samples: 16,
            forced_tolerances: None,
        }
    }
}

impl IntersectorConfig {
    /// Tight caps, for models built at modeling precision.
    pub fn strict() -> Self {
        Self {
            tolerance: ToleranceConfig {
                cap: 1e-5,
                widen_cap: 1e-4,
                ..ToleranceConfig::default()
            },
            ..Self::default()
        }
    }

    /// Loose caps and denser sampling, for imported or healed models.
    pub fn relaxed() -> Self {
        Self {
            tolerance: ToleranceConfig {
                cap: 1e-3,
                widen_cap: 1e-2,
                ..ToleranceConfig::default()
            },
            curve_samples: 32,
            ..Self::default()
        }
    }

    /// Pin both working tolerances, bypassing entity tolerances and clamping.
    pub fn with_forced_tolerances(mut self, tol1: f64, tol2: f64) -> Self {
        self.forced_tolerances = Some((tol1, tol2));
        self
    }

    /// Parse a (possibly partial) JSON configuration and validate it.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.tolerance;
        let positive = [
            ("modeling", t.modeling),
            ("cap", t.cap),
            ("widen_cap", t.widen_cap),
            ("angular", t.angular),
            ("ill_conditioned_sine", t.ill_conditioned_sine),
        ];
        for (field, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if let Some((a, b)) = self.forced_tolerances {
            for value in [a, b] {
                if !(value > 0.0 && value.is_finite()) {
                    return Err(ConfigError::NonPositive {
                        field: "forced_tolerances",
                        value,
                    });
                }
            }
        }
        if t.modeling > t.cap {
            return Err(ConfigError::InvertedBounds {
                modeling: t.modeling,
                cap: t.cap,
            });
        }
        if t.widen_cap < t.cap {
            return Err(ConfigError::WideningBelowCap {
                widen_cap: t.widen_cap,
                cap: t.cap,
            });
        }
        if !(t.widen_factor > 1.0 && t.widen_factor.is_finite()) {
            return Err(ConfigError::NonWideningFactor(t.widen_factor));
        }
        if self.curve_samples == 0 {
            return Err(ConfigError::NoCurveSamples);
        }
        Ok(())
    }
}
