//! Marginal default probabilities, survival and hazard rates
//!
//! Starting from a cumulative default curve `F_1 ≤ … ≤ F_n` (with `F_0 = 0`):
//! - marginal: `p_t = F_t − F_{t−1}`
//! - survival: `S_0 = 1`, `S_t = S_{t−1} · (1 − p_t)`
//! - hazard:   `λ_t = −ln(1 − p_t / S_{t−1})`
//!
//! The survival recursion multiplies by the unconditional marginal, which is
//! the convention the curve's consumers expect; it is not the same as
//! `1 − F_t`.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{MigrationError, Result};

/// Marginal default probability per period from a cumulative curve.
///
/// Periods are 1-indexed in error messages, matching the curve's labels.
pub fn marginal_from_cumulative(cumulative: &[f64]) -> Result<Vec<f64>> {
    let mut marginals = Vec::with_capacity(cumulative.len());
    let mut previous = 0.0;

    for (i, &current) in cumulative.iter().enumerate() {
        let period = i + 1;
        if !current.is_finite() || !(0.0..=1.0).contains(&current) {
            return Err(MigrationError::InvalidCumulativeCurve {
                period,
                reason: format!("{} is not a probability", current),
            });
        }
        if current < previous {
            return Err(MigrationError::InvalidCumulativeCurve {
                period,
                reason: format!("decreases from {} to {}", previous, current),
            });
        }
        marginals.push(current - previous);
        previous = current;
    }

    Ok(marginals)
}

/// Running sum of marginals, the inverse of [`marginal_from_cumulative`]
pub fn cumulative_from_marginal(marginals: &[f64]) -> Vec<f64> {
    marginals
        .iter()
        .scan(0.0, |total, &p| {
            *total += p;
            Some(*total)
        })
        .collect()
}

/// Survival probabilities `S_0 … S_n`, one longer than the marginals
pub fn survival_curve(marginals: &[f64]) -> Vec<f64> {
    let mut survival = Vec::with_capacity(marginals.len() + 1);
    survival.push(1.0);
    for &p in marginals {
        let last = survival[survival.len() - 1];
        survival.push(last * (1.0 - p));
    }
    survival
}

/// Hazard rate for one period from its marginal and the prior period's survival.
///
/// Undefined when survival is exhausted or the conditional default probability
/// `marginal / prior_survival` reaches 1.
pub fn hazard_rate(marginal: f64, prior_survival: f64) -> Result<f64> {
    if prior_survival.is_nan() || prior_survival <= 0.0 {
        return Err(MigrationError::HazardUndefined {
            marginal,
            survival: prior_survival,
        });
    }
    let conditional = marginal / prior_survival;
    if !conditional.is_finite() || conditional >= 1.0 || conditional < 0.0 {
        return Err(MigrationError::HazardUndefined {
            marginal,
            survival: prior_survival,
        });
    }
    Ok(-(1.0 - conditional).ln())
}

/// Hazard rate for every period.
///
/// `survival` must hold at least `S_0 … S_{n−1}` for `n` marginals.
pub fn hazard_rates(marginals: &[f64], survival: &[f64]) -> Result<Vec<f64>> {
    if survival.len() < marginals.len() {
        return Err(MigrationError::InvalidCumulativeCurve {
            period: survival.len() + 1,
            reason: "no prior survival probability for this period".to_string(),
        });
    }

    marginals
        .iter()
        .zip(survival)
        .enumerate()
        .map(|(t, (&p, &s))| {
            hazard_rate(p, s).map_err(|e| {
                warn!("hazard undefined in period {}", t + 1);
                e
            })
        })
        .collect()
}

/// A cumulative default curve with everything derived from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardTermStructure {
    /// Input cumulative default probabilities `F_1 … F_n`
    pub cumulative: Vec<f64>,

    /// Marginal default probabilities `p_1 … p_n`
    pub marginals: Vec<f64>,

    /// Survival probabilities `S_0 … S_n`
    pub survival: Vec<f64>,

    /// Hazard rates `λ_1 … λ_n`
    pub hazards: Vec<f64>,
}

impl HazardTermStructure {
    pub fn from_cumulative(cumulative: &[f64]) -> Result<Self> {
        let marginals = marginal_from_cumulative(cumulative)?;
        let survival = survival_curve(&marginals);
        let hazards = hazard_rates(&marginals, &survival)?;

        debug!(
            "derived {} hazard rates from cumulative curve ending at {:?}",
            hazards.len(),
            cumulative.last()
        );

        Ok(Self {
            cumulative: cumulative.to_vec(),
            marginals,
            survival,
            hazards,
        })
    }

    /// Number of periods
    pub fn len(&self) -> usize {
        self.marginals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marginals.is_empty()
    }

    /// Conditional default probability `p_t / S_{t−1}` per period
    pub fn conditional_default_probabilities(&self) -> Vec<f64> {
        self.marginals
            .iter()
            .zip(&self.survival)
            .map(|(p, s)| p / s)
            .collect()
    }
}
