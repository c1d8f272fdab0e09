//! Stationary distributions and row-convergence checks
//!
//! A stationary row vector `π` satisfies `π M = π`, i.e. `Mᵗ πᵗ = πᵗ`, so it is
//! an eigenvector of the transpose for eigenvalue 1. The eigenvalues come from
//! a Schur decomposition of `Mᵗ`; the eigenvector is taken as the null space of
//! `Mᵗ − I` from an SVD, which also tells us how many independent stationary
//! vectors exist.
//!
//! Chains with an absorbing default state have a trivial stationary
//! distribution: all mass on the absorbing state. That vector is returned
//! with [`StationaryDistribution::absorbing_state`] set so callers can detect
//! the degenerate case instead of mistaking it for a rating mix.

use log::{debug, warn};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use super::TransitionMatrix;
use crate::error::{MigrationError, Result};

/// Default tolerance for `|λ − 1|` and the null-space singular values
pub const DEFAULT_EIGEN_TOLERANCE: f64 = 1e-8;

/// Distribution left unchanged by one application of the transition matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationaryDistribution {
    /// Probability of each state, summing to 1
    pub probabilities: Vec<f64>,

    /// Set when all mass sits on a single absorbing state
    pub absorbing_state: Option<usize>,
}

impl StationaryDistribution {
    /// True when the chain simply ends up absorbed
    pub fn is_absorbed(&self) -> bool {
        self.absorbing_state.is_some()
    }
}

/// Extract the unique stationary distribution of `matrix`.
///
/// Fails with [`MigrationError::DegenerateStationaryDistribution`] when no
/// eigenvalue lies within `tolerance` of 1, when an eigenvalue near 1 carries
/// a non-negligible imaginary part, or when more than one independent
/// stationary vector exists (several recurrent classes).
pub fn stationary_distribution(
    matrix: &TransitionMatrix,
    tolerance: f64,
) -> Result<StationaryDistribution> {
    let size = matrix.size();
    let transposed = matrix.to_dmatrix().transpose();

    let eigenvalues = transposed.complex_eigenvalues();
    let mut unit_eigenvalues = 0;
    for lambda in eigenvalues.iter() {
        if (lambda.re - 1.0).abs() >= tolerance {
            continue;
        }
        if lambda.im.abs() >= tolerance {
            return Err(MigrationError::DegenerateStationaryDistribution(format!(
                "eigenvalue {}{:+}i near 1 has a non-negligible imaginary part",
                lambda.re, lambda.im
            )));
        }
        unit_eigenvalues += 1;
    }
    debug!("found {} eigenvalue(s) within {} of 1", unit_eigenvalues, tolerance);

    if unit_eigenvalues == 0 {
        return Err(MigrationError::DegenerateStationaryDistribution(format!(
            "no eigenvalue within {} of 1",
            tolerance
        )));
    }

    let shifted = transposed - DMatrix::<f64>::identity(size, size);
    let svd = shifted.svd(false, true);
    let v_t = svd.v_t.ok_or_else(|| {
        MigrationError::DegenerateStationaryDistribution("SVD did not produce right singular vectors".to_string())
    })?;

    let null_dimension = svd
        .singular_values
        .iter()
        .filter(|&&s| s < tolerance)
        .count();
    if null_dimension > 1 {
        return Err(MigrationError::DegenerateStationaryDistribution(format!(
            "{} independent stationary vectors; the chain has several recurrent classes",
            null_dimension
        )));
    }
    if null_dimension == 0 {
        return Err(MigrationError::DegenerateStationaryDistribution(format!(
            "no null vector of M^T - I within {}",
            tolerance
        )));
    }

    let (null_index, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |best, (i, &s)| if s < best.1 { (i, s) } else { best });

    let vector: Vec<f64> = v_t.row(null_index).iter().copied().collect();
    let total: f64 = vector.iter().sum();
    if total.abs() < tolerance {
        return Err(MigrationError::DegenerateStationaryDistribution(
            "stationary eigenvector sums to zero and cannot be normalised".to_string(),
        ));
    }

    let probabilities: Vec<f64> = vector.iter().map(|v| v / total).collect();
    if let Some((state, p)) = probabilities
        .iter()
        .enumerate()
        .find(|(_, p)| **p < -tolerance)
    {
        return Err(MigrationError::DegenerateStationaryDistribution(format!(
            "normalised eigenvector has negative mass {} on state {}",
            p, state
        )));
    }

    let absorbing_state = matrix
        .absorbing_states()
        .into_iter()
        .find(|&s| (probabilities[s] - 1.0).abs() < tolerance);
    if let Some(state) = absorbing_state {
        warn!(
            "stationary distribution is concentrated on absorbing state {}",
            state
        );
    }

    Ok(StationaryDistribution {
        probabilities,
        absorbing_state,
    })
}

/// True if rows `row_a` and `row_b` agree element-wise within `tolerance`
pub fn rows_converged(
    matrix: &TransitionMatrix,
    row_a: usize,
    row_b: usize,
    tolerance: f64,
) -> Result<bool> {
    let a = matrix.row(row_a)?;
    let b = matrix.row(row_b)?;
    Ok(a.iter().zip(b).all(|(x, y)| (x - y).abs() <= tolerance))
}

/// True if every non-absorbing row has converged to the same distribution.
///
/// Checks consecutive transient rows pairwise, which is what the long-horizon
/// check needs (e.g. on `M^20`).
pub fn transient_rows_converged(matrix: &TransitionMatrix, tolerance: f64) -> Result<bool> {
    let transient = matrix.transient_states();
    for pair in transient.windows(2) {
        if !rows_converged(matrix, pair[0], pair[1], tolerance)? {
            return Ok(false);
        }
    }
    Ok(true)
}

impl TransitionMatrix {
    /// Convenience for [`stationary_distribution`]
    pub fn stationary_distribution(&self, tolerance: f64) -> Result<StationaryDistribution> {
        stationary_distribution(self, tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::power;
    use approx::assert_abs_diff_eq;

    fn rating_matrix() -> TransitionMatrix {
        TransitionMatrix::new(vec![
            vec![0.90, 0.08, 0.02, 0.00],
            vec![0.06, 0.85, 0.07, 0.02],
            vec![0.00, 0.08, 0.84, 0.08],
            vec![0.00, 0.00, 0.00, 1.00],
        ])
        .unwrap()
    }

    fn quarterly_matrix() -> TransitionMatrix {
        TransitionMatrix::new(vec![vec![0.95, 0.05], vec![0.10, 0.90]]).unwrap()
    }

    #[test]
    fn test_irreducible_chain() {
        // Balance: 0.05 * pi_0 = 0.10 * pi_1
        let stationary = stationary_distribution(&quarterly_matrix(), DEFAULT_EIGEN_TOLERANCE).unwrap();
        assert_abs_diff_eq!(stationary.probabilities[0], 2.0 / 3.0, epsilon = 1e-10);
        assert_abs_diff_eq!(stationary.probabilities[1], 1.0 / 3.0, epsilon = 1e-10);
        assert!(!stationary.is_absorbed());
    }

    #[test]
    fn test_stationary_is_fixed_point() {
        let m = TransitionMatrix::new(vec![
            vec![0.7, 0.2, 0.1],
            vec![0.3, 0.5, 0.2],
            vec![0.2, 0.3, 0.5],
        ])
        .unwrap();
        let pi = stationary_distribution(&m, DEFAULT_EIGEN_TOLERANCE).unwrap().probabilities;
        let total: f64 = pi.iter().sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
        for j in 0..3 {
            let stepped: f64 = (0..3).map(|i| pi[i] * m.entry(i, j).unwrap()).sum();
            assert_abs_diff_eq!(stepped, pi[j], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_absorbing_chain_returns_one_hot() {
        let stationary = stationary_distribution(&rating_matrix(), DEFAULT_EIGEN_TOLERANCE).unwrap();
        assert_eq!(stationary.absorbing_state, Some(3));
        assert_abs_diff_eq!(stationary.probabilities[3], 1.0, epsilon = 1e-9);
        for state in 0..3 {
            assert_abs_diff_eq!(stationary.probabilities[state], 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_two_absorbing_states_is_degenerate() {
        let m = TransitionMatrix::new(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.2, 0.5, 0.3],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        let result = stationary_distribution(&m, DEFAULT_EIGEN_TOLERANCE);
        assert!(matches!(result, Err(MigrationError::DegenerateStationaryDistribution(_))));
    }

    #[test]
    fn test_identity_is_degenerate() {
        let result = stationary_distribution(&TransitionMatrix::identity(2).unwrap(), DEFAULT_EIGEN_TOLERANCE);
        assert!(matches!(result, Err(MigrationError::DegenerateStationaryDistribution(_))));
    }

    #[test]
    fn test_periodic_chain_has_unique_distribution() {
        // Eigenvalues 1 and -1: only the first counts as a unit eigenvalue
        let m = TransitionMatrix::new(vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let stationary = stationary_distribution(&m, DEFAULT_EIGEN_TOLERANCE).unwrap();
        assert_abs_diff_eq!(stationary.probabilities[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_rows_converged() {
        let m = quarterly_matrix();
        // Rows of P^n differ by 0.85^n
        let p20 = power(&m, 20);
        assert!(!rows_converged(&p20, 0, 1, 1e-3).unwrap());
        assert!(rows_converged(&p20, 0, 1, 0.05).unwrap());

        let p100 = power(&m, 100);
        assert!(rows_converged(&p100, 0, 1, 1e-6).unwrap());
        assert!(transient_rows_converged(&p100, 1e-6).unwrap());

        assert!(rows_converged(&m, 0, 2, 1.0).is_err());
    }

    #[test]
    fn test_rating_rows_not_yet_converged_at_twenty_years() {
        let p20 = power(&rating_matrix(), 20);
        assert!(!transient_rows_converged(&p20, 1e-5).unwrap());
    }
}
