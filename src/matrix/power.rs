//! Matrix powers and products for n-step transition probabilities

use log::debug;

use super::TransitionMatrix;
use crate::error::{MigrationError, Result};

/// Compute `matrix^n` by binary exponentiation.
///
/// `n = 0` returns the identity. The result keeps whatever floating error the
/// products accumulate; its rows are not renormalised.
pub fn power(matrix: &TransitionMatrix, n: u32) -> TransitionMatrix {
    let size = matrix.size();
    let mut result = nalgebra::DMatrix::<f64>::identity(size, size);
    let mut base = matrix.to_dmatrix();
    let mut exponent = n;

    while exponent > 0 {
        if exponent & 1 == 1 {
            result = &result * &base;
        }
        exponent >>= 1;
        if exponent > 0 {
            base = &base * &base;
        }
    }

    debug!("computed {}x{} transition matrix to the power {}", size, size, n);
    TransitionMatrix::from_dmatrix(&result, matrix.tolerance())
}

/// Product `first · second`: one step of `first` followed by one of `second`
pub fn compose(first: &TransitionMatrix, second: &TransitionMatrix) -> Result<TransitionMatrix> {
    if first.size() != second.size() {
        return Err(MigrationError::InvalidMatrixShape(format!(
            "cannot compose {0}x{0} with {1}x{1}",
            first.size(),
            second.size()
        )));
    }
    let product = first.to_dmatrix() * second.to_dmatrix();
    Ok(TransitionMatrix::from_dmatrix(
        &product,
        first.tolerance().max(second.tolerance()),
    ))
}

/// Distribution over states after `n` steps starting from `initial` (row vector `π · M^n`)
pub fn project_distribution(matrix: &TransitionMatrix, initial: &[f64], n: u32) -> Result<Vec<f64>> {
    if initial.len() != matrix.size() {
        return Err(MigrationError::InvalidMatrixShape(format!(
            "distribution has {} states, matrix has {}",
            initial.len(),
            matrix.size()
        )));
    }
    let stepped = power(matrix, n);
    let size = matrix.size();
    let mut projected = vec![0.0; size];
    for (i, &weight) in initial.iter().enumerate() {
        for (j, p) in stepped.row(i)?.iter().enumerate() {
            projected[j] += weight * p;
        }
    }
    Ok(projected)
}

impl TransitionMatrix {
    /// Convenience for [`power`]
    pub fn power(&self, n: u32) -> TransitionMatrix {
        power(self, n)
    }
}
