//! Analysis runner producing serializable reports
//!
//! Holds one [`AnalysisConfig`] and runs the three analyses against it:
//! rating migration (n-step, stationary, convergence), hazard curve, and
//! Monte Carlo simulation of a sub-annual chain.
//!
//! By convention the last state of a model is the default state.
//!
//! # Example
//! ```ignore
//! let runner = AnalysisRunner::new(AnalysisConfig::from_env());
//! let report = runner.run_migration(&MigrationModel::annual_rating())?;
//! println!("{}", report.default_probabilities[1]);
//! ```

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::conversion::annualize;
use crate::error::{MigrationError, Result};
use crate::hazard::{
    build_transition_matrices_with, implied_cumulative_defaults, row_sums_by_period,
    HazardMatrixConvention, HazardTermStructure, DEFAULT_STATE, PERFORMING_STATE,
};
use crate::matrix::{power, stationary_distribution, transient_rows_converged, StationaryDistribution, TransitionMatrix};
use crate::presets::MigrationModel;
use crate::simulation::{simulate_batch, simulate_batch_parallel, simulate_path, Trajectory, TrajectoryBatch};

/// Trajectories kept in a simulation report for display
const SAMPLE_TRAJECTORIES: usize = 5;

/// n-step default probabilities, stationary distribution and long-run convergence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    pub labels: Vec<String>,
    pub horizon: u32,
    pub horizon_matrix: TransitionMatrix,

    /// `M^horizon[i][default]` for every origin state `i`
    pub default_probabilities: Vec<f64>,

    pub stationary: Option<StationaryDistribution>,

    /// Why no stationary distribution could be extracted
    pub stationary_error: Option<String>,

    pub convergence_horizon: u32,
    pub convergence_matrix: TransitionMatrix,
    pub rows_converged: bool,
}

/// Hazard term structure with its per-period transition matrices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardReport {
    pub structure: HazardTermStructure,
    pub convention: HazardMatrixConvention,
    pub matrices: Vec<TransitionMatrix>,
    pub row_sums: Vec<Vec<f64>>,

    /// Cumulative defaults obtained by chaining the matrices back together
    pub implied_cumulative: Vec<f64>,

    /// Share of simulated paths through the matrices that end in default
    pub simulated_cumulative_default: f64,
}

/// Annualized matrix and Monte Carlo estimate against the analytic value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub labels: Vec<String>,
    pub periods_per_year: u32,
    pub annual_matrix: TransitionMatrix,
    pub n_simulations: usize,
    pub n_periods: usize,
    pub initial_state: usize,
    pub seed: u64,
    pub target_state: usize,

    /// `M^n_periods[initial][target]`
    pub analytic_terminal_probability: f64,
    pub empirical_terminal_probability: f64,
    pub standard_error: f64,

    /// Mean state index per period
    pub average_state: Vec<f64>,

    /// Fraction of paths in the initial state per period
    pub initial_state_occupancy: Vec<f64>,

    pub sample_trajectories: Vec<Trajectory>,
}

/// Runs analyses against a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct AnalysisRunner {
    config: AnalysisConfig,
}

impl AnalysisRunner {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// n-step default probability, stationary distribution and convergence check
    pub fn run_migration(&self, model: &MigrationModel) -> Result<MigrationReport> {
        let config = &self.config;
        let matrix = model.matrix();
        let default_state = model.default_state();
        info!(
            "migration analysis: {} states, horizon {}, convergence horizon {}",
            model.size(),
            config.horizon,
            config.convergence_horizon
        );

        let horizon_matrix = power(matrix, config.horizon);
        let default_probabilities = (0..model.size())
            .map(|i| horizon_matrix.entry(i, default_state))
            .collect::<Result<Vec<f64>>>()?;

        let (stationary, stationary_error) = match stationary_distribution(matrix, config.eigen_tolerance) {
            Ok(distribution) => (Some(distribution), None),
            Err(e) => {
                warn!("no stationary distribution: {}", e);
                (None, Some(e.to_string()))
            }
        };

        let convergence_matrix = power(matrix, config.convergence_horizon);
        let rows_converged = transient_rows_converged(&convergence_matrix, config.convergence_tolerance)?;

        Ok(MigrationReport {
            labels: model.labels().to_vec(),
            horizon: config.horizon,
            horizon_matrix,
            default_probabilities,
            stationary,
            stationary_error,
            convergence_horizon: config.convergence_horizon,
            convergence_matrix,
            rows_converged,
        })
    }

    /// Marginals, survival, hazards and per-period matrices from a cumulative curve
    pub fn run_hazard(&self, cumulative: &[f64]) -> Result<HazardReport> {
        let config = &self.config;
        if config.n_simulations == 0 {
            return Err(MigrationError::EmptyBatch);
        }
        info!("hazard analysis: {} periods, {:?}", cumulative.len(), config.hazard_convention);

        let structure = HazardTermStructure::from_cumulative(cumulative)?;
        let matrices = build_transition_matrices_with(&structure.hazards, config.hazard_convention)?;
        let row_sums = row_sums_by_period(&matrices);
        let implied_cumulative = implied_cumulative_defaults(&matrices)?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut defaulted = 0usize;
        for _ in 0..config.n_simulations {
            let path = simulate_path(&matrices, PERFORMING_STATE, &mut rng)?;
            if path.final_state() == Some(DEFAULT_STATE) {
                defaulted += 1;
            }
        }
        let simulated_cumulative_default = defaulted as f64 / config.n_simulations as f64;

        Ok(HazardReport {
            structure,
            convention: config.hazard_convention,
            matrices,
            row_sums,
            implied_cumulative,
            simulated_cumulative_default,
        })
    }

    /// Annualize a sub-annual model and simulate trajectories under it
    pub fn run_simulation(&self, model: &MigrationModel) -> Result<SimulationReport> {
        let config = &self.config;
        let matrix = model.matrix();
        let target_state = model.default_state();
        info!(
            "simulation analysis: {} trajectories x {} periods from state {}",
            config.n_simulations, config.n_periods, config.initial_state
        );

        let annual_matrix = annualize(matrix, config.periods_per_year)?;
        let batch = self.simulate(matrix)?;

        let analytic_terminal_probability =
            power(matrix, to_exponent(config.n_periods)).entry(config.initial_state, target_state)?;
        let empirical_terminal_probability = batch.empirical_terminal_probability(target_state)?;
        let standard_error = batch.terminal_standard_error(target_state)?;

        info!(
            "terminal probability of {}: simulated {:.4} vs analytic {:.4}",
            model.label(target_state).unwrap_or("default"),
            empirical_terminal_probability,
            analytic_terminal_probability
        );

        Ok(SimulationReport {
            labels: model.labels().to_vec(),
            periods_per_year: config.periods_per_year,
            annual_matrix,
            n_simulations: config.n_simulations,
            n_periods: config.n_periods,
            initial_state: config.initial_state,
            seed: config.seed,
            target_state,
            analytic_terminal_probability,
            empirical_terminal_probability,
            standard_error,
            average_state: batch.average_state_occupancy()?,
            initial_state_occupancy: batch.state_occupancy(config.initial_state)?,
            sample_trajectories: batch.trajectories().iter().take(SAMPLE_TRAJECTORIES).cloned().collect(),
        })
    }

    /// Trajectory batch under the configured seed, sequential or parallel
    pub fn simulate(&self, matrix: &TransitionMatrix) -> Result<TrajectoryBatch> {
        let config = &self.config;
        if config.parallel {
            simulate_batch_parallel(matrix, config.n_periods, config.initial_state, config.n_simulations, config.seed)
        } else {
            let mut rng = StdRng::seed_from_u64(config.seed);
            simulate_batch(matrix, config.n_periods, config.initial_state, config.n_simulations, &mut rng)
        }
    }
}

fn to_exponent(n_periods: usize) -> u32 {
    u32::try_from(n_periods).unwrap_or(u32::MAX)
}
