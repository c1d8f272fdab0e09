//! Transition matrices, n-step powers and stationary distributions

mod transition;
mod power;
mod stationary;

pub use transition::{TransitionMatrix, DEFAULT_ROW_SUM_TOLERANCE};
pub use power::{power, compose, project_distribution};
pub use stationary::{
    stationary_distribution, rows_converged, transient_rows_converged,
    StationaryDistribution, DEFAULT_EIGEN_TOLERANCE,
};
