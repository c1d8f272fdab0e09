//! Independent trajectory batches and their empirical statistics

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::trajectory::{simulate_trajectory, Trajectory};
use crate::error::{MigrationError, Result};
use crate::matrix::TransitionMatrix;

/// `n_simulations` trajectories sharing an initial state and horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryBatch {
    initial_state: usize,
    n_periods: usize,
    trajectories: Vec<Trajectory>,
}

impl TrajectoryBatch {
    pub fn initial_state(&self) -> usize {
        self.initial_state
    }

    pub fn n_periods(&self) -> usize {
        self.n_periods
    }

    pub fn trajectories(&self) -> &[Trajectory] {
        &self.trajectories
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    /// Fraction of trajectories ending in `target`
    pub fn empirical_terminal_probability(&self, target: usize) -> Result<f64> {
        if self.is_empty() {
            return Err(MigrationError::EmptyBatch);
        }
        let hits = self
            .trajectories
            .iter()
            .filter(|t| t.final_state() == Some(target))
            .count();
        Ok(hits as f64 / self.len() as f64)
    }

    /// Binomial standard error of [`Self::empirical_terminal_probability`]
    pub fn terminal_standard_error(&self, target: usize) -> Result<f64> {
        let p = self.empirical_terminal_probability(target)?;
        Ok((p * (1.0 - p) / self.len() as f64).sqrt())
    }

    /// Mean state index at each time step `0..=n_periods`
    pub fn average_state_occupancy(&self) -> Result<Vec<f64>> {
        if self.is_empty() {
            return Err(MigrationError::EmptyBatch);
        }
        let mut sums = vec![0.0; self.n_periods + 1];
        for trajectory in &self.trajectories {
            for (sum, &state) in sums.iter_mut().zip(trajectory.states()) {
                *sum += state as f64;
            }
        }
        let n = self.len() as f64;
        Ok(sums.into_iter().map(|s| s / n).collect())
    }

    /// Fraction of trajectories in `state` at each time step `0..=n_periods`
    pub fn state_occupancy(&self, state: usize) -> Result<Vec<f64>> {
        if self.is_empty() {
            return Err(MigrationError::EmptyBatch);
        }
        let mut counts = vec![0usize; self.n_periods + 1];
        for trajectory in &self.trajectories {
            for (count, &s) in counts.iter_mut().zip(trajectory.states()) {
                if s == state {
                    *count += 1;
                }
            }
        }
        let n = self.len() as f64;
        Ok(counts.into_iter().map(|c| c as f64 / n).collect())
    }
}

/// Simulate `n_simulations` trajectories sequentially from one generator
pub fn simulate_batch<R: Rng + ?Sized>(
    matrix: &TransitionMatrix,
    n_periods: usize,
    initial_state: usize,
    n_simulations: usize,
    rng: &mut R,
) -> Result<TrajectoryBatch> {
    matrix.check_state(initial_state)?;
    debug!(
        "simulating {} trajectories of {} periods from state {}",
        n_simulations, n_periods, initial_state
    );

    let trajectories = (0..n_simulations)
        .map(|_| simulate_trajectory(matrix, n_periods, initial_state, rng))
        .collect::<Result<Vec<_>>>()?;

    Ok(TrajectoryBatch {
        initial_state,
        n_periods,
        trajectories,
    })
}

/// Simulate `n_simulations` trajectories across the rayon pool.
///
/// Trajectory `i` draws from its own generator seeded with `seed + i`, so the
/// batch is identical for a given seed whatever the thread count.
pub fn simulate_batch_parallel(
    matrix: &TransitionMatrix,
    n_periods: usize,
    initial_state: usize,
    n_simulations: usize,
    seed: u64,
) -> Result<TrajectoryBatch> {
    matrix.check_state(initial_state)?;
    info!(
        "simulating {} trajectories of {} periods in parallel (seed {})",
        n_simulations, n_periods, seed
    );

    let trajectories = (0..n_simulations)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            simulate_trajectory(matrix, n_periods, initial_state, &mut rng)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TrajectoryBatch {
        initial_state,
        n_periods,
        trajectories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn absorbing_matrix() -> TransitionMatrix {
        TransitionMatrix::new(vec![vec![0.95, 0.05], vec![0.0, 1.0]]).unwrap()
    }

    #[test]
    fn test_batch_shape() {
        let mut rng = StdRng::seed_from_u64(42);
        let batch = simulate_batch(&absorbing_matrix(), 10, 0, 50, &mut rng).unwrap();
        assert_eq!(batch.len(), 50);
        assert_eq!(batch.n_periods(), 10);
        assert!(batch.trajectories().iter().all(|t| t.states().len() == 11));
    }

    #[test]
    fn test_seeded_batches_reproduce() {
        let a = simulate_batch(&absorbing_matrix(), 20, 0, 100, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = simulate_batch(&absorbing_matrix(), 20, 0, 100, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parallel_batch_independent_of_thread_count() {
        let matrix = absorbing_matrix();
        let single = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap()
            .install(|| simulate_batch_parallel(&matrix, 20, 0, 200, 42).unwrap());
        let many = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .unwrap()
            .install(|| simulate_batch_parallel(&matrix, 20, 0, 200, 42).unwrap());
        assert_eq!(single, many);
    }

    #[test]
    fn test_occupancy_starts_at_initial_state() {
        let mut rng = StdRng::seed_from_u64(3);
        let batch = simulate_batch(&absorbing_matrix(), 5, 0, 100, &mut rng).unwrap();

        let average = batch.average_state_occupancy().unwrap();
        assert_eq!(average.len(), 6);
        assert_eq!(average[0], 0.0);

        let performing = batch.state_occupancy(0).unwrap();
        assert_eq!(performing[0], 1.0);
        // Default is absorbing, so the performing share never rises
        for pair in performing.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        // For a 0/1 chain the mean state is the default share
        let defaulted = batch.state_occupancy(1).unwrap();
        for (a, d) in average.iter().zip(&defaulted) {
            assert_abs_diff_eq!(*a, *d, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_terminal_probability_from_absorbing_start() {
        let mut rng = StdRng::seed_from_u64(9);
        let batch = simulate_batch(&absorbing_matrix(), 20, 1, 25, &mut rng).unwrap();
        assert_eq!(batch.empirical_terminal_probability(1).unwrap(), 1.0);
        assert_eq!(batch.terminal_standard_error(1).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_batch() {
        let mut rng = StdRng::seed_from_u64(1);
        let batch = simulate_batch(&absorbing_matrix(), 5, 0, 0, &mut rng).unwrap();
        assert!(batch.is_empty());
        assert!(matches!(batch.empirical_terminal_probability(1), Err(MigrationError::EmptyBatch)));
        assert!(matches!(batch.average_state_occupancy(), Err(MigrationError::EmptyBatch)));
        assert!(matches!(batch.state_occupancy(0), Err(MigrationError::EmptyBatch)));
    }

    #[test]
    fn test_invalid_initial_state() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            simulate_batch(&absorbing_matrix(), 5, 4, 10, &mut rng),
            Err(MigrationError::StateOutOfRange { .. })
        ));
        assert!(simulate_batch_parallel(&absorbing_matrix(), 5, 4, 10, 0).is_err());
    }
}
