//! Categorical draws for single-step state transitions

use rand::Rng;

use crate::error::{MigrationError, Result};
use crate::matrix::TransitionMatrix;

/// Draw an index from a discrete distribution.
///
/// The row must be non-empty, non-negative and sum to 1 within `tolerance`.
/// A uniform draw is scaled by the row total and located by cumulative search.
pub fn sample_categorical<R: Rng + ?Sized>(
    probabilities: &[f64],
    tolerance: f64,
    rng: &mut R,
) -> Result<usize> {
    if probabilities.is_empty() {
        return Err(MigrationError::SamplingError("empty probability row".to_string()));
    }
    if let Some((i, p)) = probabilities
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite() || **p < 0.0)
    {
        return Err(MigrationError::SamplingError(format!(
            "entry {} is {}, not a probability",
            i, p
        )));
    }
    let total: f64 = probabilities.iter().sum();
    if (total - 1.0).abs() > tolerance {
        return Err(MigrationError::SamplingError(format!(
            "row sums to {}, expected 1 within {}",
            total, tolerance
        )));
    }

    let u = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (state, &p) in probabilities.iter().enumerate() {
        cumulative += p;
        if u < cumulative {
            return Ok(state);
        }
    }

    // Rounding left u at the very top of the range: take the last reachable state
    probabilities
        .iter()
        .rposition(|&p| p > 0.0)
        .ok_or_else(|| MigrationError::SamplingError("row has no positive entry".to_string()))
}

/// Draw the next state from row `current` of `matrix`
pub fn sample_next_state<R: Rng + ?Sized>(
    matrix: &TransitionMatrix,
    current: usize,
    rng: &mut R,
) -> Result<usize> {
    sample_categorical(matrix.row(current)?, matrix.tolerance(), rng)
}
