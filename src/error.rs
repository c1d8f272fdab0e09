//! Error types for the migration engine
//!
//! Every variant is a precondition violation detected at the point of
//! computation. Nothing here is retried or downgraded to a default value.

use thiserror::Error;

/// Errors raised by matrix, hazard and simulation operations
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Non-square input, entries outside [0, 1], or rows not summing to 1
    #[error("invalid transition matrix: {0}")]
    InvalidMatrixShape(String),

    /// No unit eigenvalue, or more than one independent stationary vector
    #[error("degenerate stationary distribution: {0}")]
    DegenerateStationaryDistribution(String),

    /// Cumulative default curve is not a non-decreasing sequence in [0, 1]
    #[error("invalid cumulative default curve at period {period}: {reason}")]
    InvalidCumulativeCurve { period: usize, reason: String },

    /// Survival is exhausted or the conditional default probability reached 1
    #[error("hazard rate undefined (marginal {marginal}, prior survival {survival})")]
    HazardUndefined { marginal: f64, survival: f64 },

    /// Probability row handed to the sampler is not a distribution
    #[error("cannot sample from probability row: {0}")]
    SamplingError(String),

    #[error("state {state} out of range for {size} states")]
    StateOutOfRange { state: usize, size: usize },

    #[error("period count must be positive, got {0}")]
    InvalidPeriodCount(u32),

    #[error("statistic requested on an empty trajectory batch")]
    EmptyBatch,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, MigrationError>;
