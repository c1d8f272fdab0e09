//! Single rating trajectories

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::sampler::sample_next_state;
use crate::error::{MigrationError, Result};
use crate::matrix::TransitionMatrix;

/// One realised path `x_0, x_1, …, x_n` of state indices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trajectory {
    states: Vec<usize>,
}

impl Trajectory {
    /// All visited states, including the initial one
    pub fn states(&self) -> &[usize] {
        &self.states
    }

    pub fn initial_state(&self) -> Option<usize> {
        self.states.first().copied()
    }

    pub fn final_state(&self) -> Option<usize> {
        self.states.last().copied()
    }

    /// Number of transitions simulated
    pub fn n_periods(&self) -> usize {
        self.states.len().saturating_sub(1)
    }

    /// First period in which the path is in `state` (e.g. time of default)
    pub fn first_entry(&self, state: usize) -> Option<usize> {
        self.states.iter().position(|&s| s == state)
    }
}

/// Simulate `n_periods` transitions of a time-homogeneous chain.
///
/// Absorbing states hold the path because their row is one-hot; nothing here
/// special-cases them.
pub fn simulate_trajectory<R: Rng + ?Sized>(
    matrix: &TransitionMatrix,
    n_periods: usize,
    initial_state: usize,
    rng: &mut R,
) -> Result<Trajectory> {
    matrix.check_state(initial_state)?;

    let mut states = Vec::with_capacity(n_periods + 1);
    let mut state = initial_state;
    states.push(state);
    for _ in 0..n_periods {
        state = sample_next_state(matrix, state, rng)?;
        states.push(state);
    }

    Ok(Trajectory { states })
}

/// Simulate one transition per matrix, in order (time-inhomogeneous chain)
pub fn simulate_path<R: Rng + ?Sized>(
    matrices: &[TransitionMatrix],
    initial_state: usize,
    rng: &mut R,
) -> Result<Trajectory> {
    if let Some(first) = matrices.first() {
        first.check_state(initial_state)?;
        if let Some(other) = matrices.iter().find(|m| m.size() != first.size()) {
            return Err(MigrationError::InvalidMatrixShape(format!(
                "period matrices mix {0}x{0} and {1}x{1}",
                first.size(),
                other.size()
            )));
        }
    }

    let mut states = Vec::with_capacity(matrices.len() + 1);
    let mut state = initial_state;
    states.push(state);
    for matrix in matrices {
        state = sample_next_state(matrix, state, rng)?;
        states.push(state);
    }

    Ok(Trajectory { states })
}
