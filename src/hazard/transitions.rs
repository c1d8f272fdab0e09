//! Two-state (performing / default) transition matrices from a hazard curve
//!
//! One matrix per period: `[[1 − q_t, q_t], [0, 1]]` where state 0 is
//! performing and state 1 is the absorbing default state. By default `q_t` is
//! the hazard value itself, used directly as a one-period default
//! probability. That differs from the intensity relation `q = 1 − e^{−λ}`
//! used to derive the hazards; [`HazardMatrixConvention::ExponentialSurvival`]
//! builds the matrices that way so the two can be compared.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::matrix::{compose, TransitionMatrix};

/// Performing state index in the two-state matrices
pub const PERFORMING_STATE: usize = 0;

/// Absorbing default state index in the two-state matrices
pub const DEFAULT_STATE: usize = 1;

/// How a hazard value becomes a one-period default probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HazardMatrixConvention {
    /// `q = λ`
    #[default]
    HazardAsProbability,
    /// `q = 1 − e^{−λ}`
    ExponentialSurvival,
}

impl HazardMatrixConvention {
    /// One-period default probability for hazard `hazard`
    pub fn default_probability(&self, hazard: f64) -> f64 {
        match self {
            HazardMatrixConvention::HazardAsProbability => hazard,
            HazardMatrixConvention::ExponentialSurvival => 1.0 - (-hazard).exp(),
        }
    }
}

/// One matrix per hazard value, taking the hazard as the default probability
pub fn build_transition_matrices(hazards: &[f64]) -> Result<Vec<TransitionMatrix>> {
    build_transition_matrices_with(hazards, HazardMatrixConvention::default())
}

/// One matrix per hazard value under an explicit convention.
///
/// A hazard that maps outside [0, 1] yields an invalid matrix and fails with
/// `InvalidMatrixShape`.
pub fn build_transition_matrices_with(
    hazards: &[f64],
    convention: HazardMatrixConvention,
) -> Result<Vec<TransitionMatrix>> {
    hazards
        .iter()
        .map(|&hazard| {
            let q = convention.default_probability(hazard);
            TransitionMatrix::new(vec![vec![1.0 - q, q], vec![0.0, 1.0]])
        })
        .collect()
}

/// Row sums of each period's matrix, for inspection
pub fn row_sums_by_period(matrices: &[TransitionMatrix]) -> Vec<Vec<f64>> {
    matrices.iter().map(|m| m.row_sums()).collect()
}

/// Cumulative default probability implied by chaining the period matrices.
///
/// Entry `t` is `(M_1 · … · M_{t+1})[performing][default]`.
pub fn implied_cumulative_defaults(matrices: &[TransitionMatrix]) -> Result<Vec<f64>> {
    let mut implied = Vec::with_capacity(matrices.len());
    let mut running: Option<TransitionMatrix> = None;

    for matrix in matrices {
        let next = match &running {
            Some(product) => compose(product, matrix)?,
            None => matrix.clone(),
        };
        implied.push(next.entry(PERFORMING_STATE, DEFAULT_STATE)?);
        running = Some(next);
    }

    Ok(implied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrationError;
    use crate::hazard::HazardTermStructure;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    const CUMULATIVE: [f64; 4] = [0.02, 0.045, 0.078, 0.112];

    #[test]
    fn test_matrices_use_hazard_directly() {
        let structure = HazardTermStructure::from_cumulative(&CUMULATIVE).unwrap();
        let matrices = build_transition_matrices(&structure.hazards).unwrap();
        assert_eq!(matrices.len(), 4);

        for (m, &h) in matrices.iter().zip(&structure.hazards) {
            assert_eq!(m.entry(0, 1).unwrap(), h);
            assert_eq!(m.entry(0, 0).unwrap(), 1.0 - h);
            assert_eq!(m.to_rows()[1], vec![0.0, 1.0]);
            assert!(m.is_absorbing(DEFAULT_STATE).unwrap());
        }
    }

    #[test]
    fn test_row_sums_by_period() {
        let matrices = build_transition_matrices(&[0.02, 0.03]).unwrap();
        for sums in row_sums_by_period(&matrices) {
            assert_eq!(sums.len(), 2);
            for s in sums {
                assert_abs_diff_eq!(s, 1.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_hazard_above_one_rejected() {
        let result = build_transition_matrices(&[0.1, 1.5]);
        assert!(matches!(result, Err(MigrationError::InvalidMatrixShape(_))));

        let negative = build_transition_matrices(&[-0.1]);
        assert!(negative.is_err());

        // The exponential convention keeps any non-negative hazard valid
        assert!(build_transition_matrices_with(&[1.5], HazardMatrixConvention::ExponentialSurvival).is_ok());
    }

    #[test]
    fn test_exponential_convention_recovers_conditional_probabilities() {
        let structure = HazardTermStructure::from_cumulative(&CUMULATIVE).unwrap();
        let matrices = build_transition_matrices_with(
            &structure.hazards,
            HazardMatrixConvention::ExponentialSurvival,
        )
        .unwrap();

        for (m, q) in matrices.iter().zip(structure.conditional_default_probabilities()) {
            assert_abs_diff_eq!(m.entry(0, 1).unwrap(), q, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_literal_convention_overstates_default() {
        let structure = HazardTermStructure::from_cumulative(&CUMULATIVE).unwrap();
        let literal = implied_cumulative_defaults(&build_transition_matrices(&structure.hazards).unwrap()).unwrap();
        let exponential = implied_cumulative_defaults(
            &build_transition_matrices_with(&structure.hazards, HazardMatrixConvention::ExponentialSurvival)
                .unwrap(),
        )
        .unwrap();

        assert_eq!(literal.len(), 4);
        for (l, e) in literal.iter().zip(&exponential) {
            assert!(l > e);
        }
        // Non-decreasing in the horizon
        for pair in literal.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_implied_defaults_chain_products() {
        let matrices = build_transition_matrices(&[0.1, 0.2]).unwrap();
        let implied = implied_cumulative_defaults(&matrices).unwrap();
        assert_abs_diff_eq!(implied[0], 0.1, epsilon = 1e-15);
        // Survive both periods: 0.9 * 0.8
        assert_abs_diff_eq!(implied[1], 1.0 - 0.72, epsilon = 1e-12);
        assert!(implied_cumulative_defaults(&[]).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn prop_rows_sum_to_one(hazards in prop::collection::vec(0.0f64..1.0, 1..20)) {
            let matrices = build_transition_matrices(&hazards).unwrap();
            for sums in row_sums_by_period(&matrices) {
                for s in sums {
                    prop_assert!((s - 1.0).abs() < 1e-9);
                }
            }
        }
    }
}
