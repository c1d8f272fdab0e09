//! Built-in migration models and default curve
//!
//! The annual rating scale (IG / BB / B / Default) and the quarterly two-state
//! matrix are the reference inputs used throughout the analyses and tests.

use serde::{Deserialize, Serialize};

use crate::error::{MigrationError, Result};
use crate::matrix::TransitionMatrix;

/// Reference cumulative default probabilities for years 1 to 4
pub const REFERENCE_CUMULATIVE_DEFAULTS: [f64; 4] = [0.02, 0.045, 0.078, 0.112];

/// Labels for the two-state performing / default chains
pub const TWO_STATE_LABELS: [&str; 2] = ["Investment Grade", "Default"];

/// A transition matrix with a name for each state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LabelledRows", into = "LabelledRows")]
pub struct MigrationModel {
    labels: Vec<String>,
    matrix: TransitionMatrix,
}

/// Serialized form, checked against the label count on the way in
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LabelledRows {
    labels: Vec<String>,
    matrix: TransitionMatrix,
}

impl TryFrom<LabelledRows> for MigrationModel {
    type Error = MigrationError;

    fn try_from(rows: LabelledRows) -> Result<Self> {
        Self::new(rows.labels, rows.matrix)
    }
}

impl From<MigrationModel> for LabelledRows {
    fn from(model: MigrationModel) -> Self {
        Self {
            labels: model.labels,
            matrix: model.matrix,
        }
    }
}

impl MigrationModel {
    /// Pair labels with a matrix; one label per state
    pub fn new(labels: Vec<String>, matrix: TransitionMatrix) -> Result<Self> {
        if labels.len() != matrix.size() {
            return Err(MigrationError::InvalidMatrixShape(format!(
                "{} labels for {} states",
                labels.len(),
                matrix.size()
            )));
        }
        Ok(Self { labels, matrix })
    }

    /// Label states `0..k` by their index
    pub fn unlabelled(matrix: TransitionMatrix) -> Self {
        let labels = (0..matrix.size()).map(|i| i.to_string()).collect();
        Self { labels, matrix }
    }

    /// Annual rating matrix: Investment Grade, BB, B and absorbing Default
    pub fn annual_rating() -> Self {
        let matrix = TransitionMatrix::from_rows_unchecked(vec![
            vec![0.90, 0.08, 0.02, 0.00],
            vec![0.06, 0.85, 0.07, 0.02],
            vec![0.00, 0.08, 0.84, 0.08],
            vec![0.00, 0.00, 0.00, 1.00],
        ]);
        Self {
            labels: ["Investment Grade", "BB", "B", "Default"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            matrix,
        }
    }

    /// Quarterly two-state matrix. Default is not absorbing here: it cures at 10% a quarter.
    pub fn quarterly_two_state() -> Self {
        let matrix = TransitionMatrix::from_rows_unchecked(vec![vec![0.95, 0.05], vec![0.10, 0.90]]);
        Self {
            labels: TWO_STATE_LABELS.iter().map(|s| s.to_string()).collect(),
            matrix,
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn matrix(&self) -> &TransitionMatrix {
        &self.matrix
    }

    pub fn size(&self) -> usize {
        self.matrix.size()
    }

    /// The last state, which reports treat as default
    pub fn default_state(&self) -> usize {
        // Matrices always have at least one state
        self.size() - 1
    }

    /// Index of the state named `label`
    pub fn state_index(&self, label: &str) -> Result<usize> {
        self.labels
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| MigrationError::Parse(format!("unknown state label '{}'", label)))
    }

    pub fn label(&self, state: usize) -> Option<&str> {
        self.labels.get(state).map(String::as_str)
    }
}
