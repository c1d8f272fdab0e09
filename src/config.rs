//! Analysis settings
//!
//! Defaults reproduce the reference exercises. Any field can be overridden
//! from the environment:
//!   CREDIT_HORIZON, CREDIT_CONVERGENCE_HORIZON, CREDIT_SIMULATIONS,
//!   CREDIT_PERIODS, CREDIT_PERIODS_PER_YEAR, CREDIT_INITIAL_STATE, CREDIT_SEED,
//!   CREDIT_EIGEN_TOLERANCE, CREDIT_CONVERGENCE_TOLERANCE, CREDIT_PARALLEL

use std::env;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::hazard::HazardMatrixConvention;
use crate::matrix::DEFAULT_EIGEN_TOLERANCE;

/// Settings shared by the migration, hazard and simulation analyses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Horizon in periods for the n-step default probability
    pub horizon: u32,

    /// Power used for the long-run row-convergence check
    pub convergence_horizon: u32,

    /// Absolute tolerance for row convergence
    pub convergence_tolerance: f64,

    /// Tolerance on `|λ − 1|` when extracting the stationary distribution
    pub eigen_tolerance: f64,

    /// Number of Monte Carlo trajectories
    pub n_simulations: usize,

    /// Periods per trajectory (20 quarters = 5 years)
    pub n_periods: usize,

    /// Sub-periods per year for annualization
    pub periods_per_year: u32,

    pub initial_state: usize,

    pub seed: u64,

    /// Spread trajectories over the rayon pool
    pub parallel: bool,

    pub hazard_convention: HazardMatrixConvention,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            horizon: 3,
            convergence_horizon: 20,
            convergence_tolerance: 1e-5,
            eigen_tolerance: DEFAULT_EIGEN_TOLERANCE,
            n_simulations: 1000,
            n_periods: 20,
            periods_per_year: 4,
            initial_state: 0,
            seed: 42,
            parallel: true,
            hazard_convention: HazardMatrixConvention::default(),
        }
    }
}

impl AnalysisConfig {
    /// Defaults overridden by `CREDIT_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable name
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            horizon: read_var(&lookup, "CREDIT_HORIZON", defaults.horizon),
            convergence_horizon: read_var(&lookup, "CREDIT_CONVERGENCE_HORIZON", defaults.convergence_horizon),
            convergence_tolerance: read_var(&lookup, "CREDIT_CONVERGENCE_TOLERANCE", defaults.convergence_tolerance),
            eigen_tolerance: read_var(&lookup, "CREDIT_EIGEN_TOLERANCE", defaults.eigen_tolerance),
            n_simulations: read_var(&lookup, "CREDIT_SIMULATIONS", defaults.n_simulations),
            n_periods: read_var(&lookup, "CREDIT_PERIODS", defaults.n_periods),
            periods_per_year: read_var(&lookup, "CREDIT_PERIODS_PER_YEAR", defaults.periods_per_year),
            initial_state: read_var(&lookup, "CREDIT_INITIAL_STATE", defaults.initial_state),
            seed: read_var(&lookup, "CREDIT_SEED", defaults.seed),
            parallel: read_var(&lookup, "CREDIT_PARALLEL", defaults.parallel),
            hazard_convention: defaults.hazard_convention,
        }
    }
}

fn read_var<T, F>(lookup: &F, name: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("ignoring unparseable {}={:?}", name, raw);
                default
            }
        },
        None => default,
    }
}
