//! Hazard-rate engine: cumulative default curve to marginals, survival,
//! hazard rates and per-period transition matrices

mod curve;
mod transitions;

pub use curve::{
    marginal_from_cumulative, cumulative_from_marginal, survival_curve,
    hazard_rate, hazard_rates, HazardTermStructure,
};
pub use transitions::{
    build_transition_matrices, build_transition_matrices_with, row_sums_by_period,
    implied_cumulative_defaults, HazardMatrixConvention, PERFORMING_STATE, DEFAULT_STATE,
};
