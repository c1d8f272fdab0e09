//! Validated row-stochastic transition matrix
//!
//! Rows are origin states, columns are destination states. Construction checks
//! that the matrix is square, that every entry is a probability, and that every
//! row sums to 1 within the matrix's own tolerance. The matrix never changes
//! after construction; operations return new matrices.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{MigrationError, Result};

/// Default absolute tolerance on row sums
pub const DEFAULT_ROW_SUM_TOLERANCE: f64 = 1e-9;

/// Square stochastic matrix over `size` rating states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct TransitionMatrix {
    size: usize,

    /// Probabilities in row-major order
    data: Vec<f64>,

    /// Absolute tolerance used for row sums and absorbing-state checks
    tolerance: f64,
}

impl TransitionMatrix {
    /// Build from nested rows using the default row-sum tolerance
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::with_tolerance(rows, DEFAULT_ROW_SUM_TOLERANCE)
    }

    /// Build from nested rows with an explicit row-sum tolerance
    pub fn with_tolerance(rows: Vec<Vec<f64>>, tolerance: f64) -> Result<Self> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(MigrationError::InvalidMatrixShape(format!(
                "tolerance must be finite and non-negative, got {}",
                tolerance
            )));
        }

        let size = rows.len();
        if size == 0 {
            return Err(MigrationError::InvalidMatrixShape(
                "matrix has no rows".to_string(),
            ));
        }

        let mut data = Vec::with_capacity(size * size);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(MigrationError::InvalidMatrixShape(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    size
                )));
            }
            data.extend(row);
        }

        Self::validate(size, &data, tolerance)?;

        Ok(Self { size, data, tolerance })
    }

    /// Identity matrix: every state is absorbing. Needs at least one state.
    pub fn identity(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(MigrationError::InvalidMatrixShape(
                "matrix has no rows".to_string(),
            ));
        }
        let mut data = vec![0.0; size * size];
        for i in 0..size {
            data[i * size + i] = 1.0;
        }
        Ok(Self {
            size,
            data,
            tolerance: DEFAULT_ROW_SUM_TOLERANCE,
        })
    }

    /// Wrap the result of a product of stochastic matrices.
    ///
    /// Floating error accumulated by the product is kept as-is; row sums are
    /// not renormalised.
    pub(crate) fn from_dmatrix(matrix: &DMatrix<f64>, tolerance: f64) -> Self {
        // nalgebra stores column-major, so the transpose's storage is our row-major layout
        let data = matrix.transpose().as_slice().to_vec();
        Self {
            size: matrix.nrows(),
            data,
            tolerance,
        }
    }

    /// Built-in constant matrices only; checked in debug builds
    pub(crate) fn from_rows_unchecked(rows: Vec<Vec<f64>>) -> Self {
        let size = rows.len();
        let data: Vec<f64> = rows.into_iter().flatten().collect();
        debug_assert!(Self::validate(size, &data, DEFAULT_ROW_SUM_TOLERANCE).is_ok());
        Self {
            size,
            data,
            tolerance: DEFAULT_ROW_SUM_TOLERANCE,
        }
    }

    pub(crate) fn to_dmatrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.size, self.size, &self.data)
    }

    fn validate(size: usize, data: &[f64], tolerance: f64) -> Result<()> {
        for i in 0..size {
            let row = &data[i * size..(i + 1) * size];
            for (j, &p) in row.iter().enumerate() {
                if !p.is_finite() || p < 0.0 || p > 1.0 + tolerance {
                    return Err(MigrationError::InvalidMatrixShape(format!(
                        "entry ({}, {}) = {} is not a probability",
                        i, j, p
                    )));
                }
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > tolerance {
                return Err(MigrationError::InvalidMatrixShape(format!(
                    "row {} sums to {}, expected 1 within {}",
                    i, sum, tolerance
                )));
            }
        }
        Ok(())
    }

    /// Number of rating states
    pub fn size(&self) -> usize {
        self.size
    }

    /// Row-sum tolerance this matrix was validated with
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub(crate) fn check_state(&self, state: usize) -> Result<()> {
        if state >= self.size {
            return Err(MigrationError::StateOutOfRange {
                state,
                size: self.size,
            });
        }
        Ok(())
    }

    /// Probability of moving from `from` to `to` in one step of this matrix.
    ///
    /// On a matrix produced by [`power`](super::power) this is the n-step
    /// probability, e.g. rating `i` to the default state after `n` periods.
    pub fn entry(&self, from: usize, to: usize) -> Result<f64> {
        self.check_state(from)?;
        self.check_state(to)?;
        Ok(self.data[from * self.size + to])
    }

    /// Outgoing distribution of state `from`
    pub fn row(&self, from: usize) -> Result<&[f64]> {
        self.check_state(from)?;
        Ok(&self.data[from * self.size..(from + 1) * self.size])
    }

    /// Nested copy of the rows, for export
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.size).map(|row| row.to_vec()).collect()
    }

    /// Sum of each row, for inspecting stochasticity after derivations
    pub fn row_sums(&self) -> Vec<f64> {
        self.data.chunks(self.size).map(|row| row.iter().sum()).collect()
    }

    /// True if `state` never leaves itself
    pub fn is_absorbing(&self, state: usize) -> Result<bool> {
        self.check_state(state)?;
        Ok((self.data[state * self.size + state] - 1.0).abs() <= self.tolerance)
    }

    /// All absorbing states in ascending order
    pub fn absorbing_states(&self) -> Vec<usize> {
        (0..self.size)
            .filter(|&s| (self.data[s * self.size + s] - 1.0).abs() <= self.tolerance)
            .collect()
    }

    /// All non-absorbing states in ascending order
    pub fn transient_states(&self) -> Vec<usize> {
        (0..self.size)
            .filter(|&s| (self.data[s * self.size + s] - 1.0).abs() > self.tolerance)
            .collect()
    }
}

impl TryFrom<Vec<Vec<f64>>> for TransitionMatrix {
    type Error = MigrationError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::new(rows)
    }
}

impl From<TransitionMatrix> for Vec<Vec<f64>> {
    fn from(matrix: TransitionMatrix) -> Self {
        matrix.to_rows()
    }
}
