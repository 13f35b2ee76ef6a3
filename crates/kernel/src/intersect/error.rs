use thiserror::Error;

use super::couple::Rank;

/// Why an input shape cannot be intersected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShapeDefect {
    #[error("it references entities missing from the store")]
    Null,

    #[error("it holds no faces or edges")]
    Empty,
}

/// Failures raised by the intersection engine.
///
/// Only malformed input surfaces as an error; a bad couple never does.
#[derive(Debug, Error)]
pub enum IntersectionError {
    #[error("shape {rank} is not initialized: {defect}")]
    NotInitialized { rank: Rank, defect: ShapeDefect },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Invalid engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("{field} must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("modeling tolerance {modeling} exceeds tolerance cap {cap}")]
    InvertedBounds { modeling: f64, cap: f64 },

    #[error("widening cap {widen_cap} is below tolerance cap {cap}")]
    WideningBelowCap { widen_cap: f64, cap: f64 },

    #[error("widening factor must exceed 1, got {0}")]
    NonWideningFactor(f64),

    #[error("box builder needs at least one curve sample")]
    NoCurveSamples,
}
