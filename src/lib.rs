//! Credit Migration - Markov chain engine for credit-rating migration analysis
//!
//! This library provides:
//! - Validated transition matrices, n-step powers and stationary distributions
//! - Hazard-rate curves derived from cumulative default probabilities
//! - Per-period default/performing transition matrices from a hazard curve
//! - Annualization of sub-annual matrices
//! - Monte Carlo simulation of rating trajectories (sequential or parallel)
//! - CSV loading and CSV/JSON export of analysis results

pub mod error;
pub mod matrix;
pub mod hazard;
pub mod simulation;
pub mod conversion;
pub mod config;
pub mod presets;
pub mod loader;
pub mod analysis;
pub mod report;

// Re-export commonly used types
pub use error::{MigrationError, Result};
pub use matrix::{TransitionMatrix, StationaryDistribution, power, stationary_distribution};
pub use hazard::{HazardTermStructure, HazardMatrixConvention, build_transition_matrices};
pub use simulation::{Trajectory, TrajectoryBatch, simulate_trajectory, simulate_batch, simulate_batch_parallel};
pub use conversion::annualize;
pub use config::AnalysisConfig;
pub use presets::MigrationModel;
pub use analysis::{AnalysisRunner, MigrationReport, HazardReport, SimulationReport};
pub use report::ReportWriter;
