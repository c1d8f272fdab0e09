//! Sub-annual to annual transition matrices

use log::debug;

use crate::error::{MigrationError, Result};
use crate::matrix::{power, TransitionMatrix};

/// Annual matrix from a sub-annual one: `M_sub ^ periods_per_year`.
///
/// A quarterly matrix uses 4, a monthly one 12.
pub fn annualize(sub_period: &TransitionMatrix, periods_per_year: u32) -> Result<TransitionMatrix> {
    if periods_per_year == 0 {
        return Err(MigrationError::InvalidPeriodCount(periods_per_year));
    }
    debug!("annualizing {}x{} matrix over {} periods", sub_period.size(), sub_period.size(), periods_per_year);
    Ok(power(sub_period, periods_per_year))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::compose;
    use approx::assert_abs_diff_eq;

    fn quarterly() -> TransitionMatrix {
        TransitionMatrix::new(vec![vec![0.95, 0.05], vec![0.10, 0.90]]).unwrap()
    }

    #[test]
    fn test_quarterly_to_annual() {
        let annual = annualize(&quarterly(), 4).unwrap();
        // 2/3 + 0.85^4 / 3
        assert_abs_diff_eq!(annual.entry(0, 0).unwrap(), 0.84066875, epsilon = 1e-12);
        assert_abs_diff_eq!(annual.entry(0, 1).unwrap(), 0.15933125, epsilon = 1e-12);
        for s in annual.row_sums() {
            assert_abs_diff_eq!(s, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_matches_manual_multiplication() {
        let q = quarterly();
        let mut manual = q.clone();
        for _ in 1..4 {
            manual = compose(&manual, &q).unwrap();
        }
        let annual = annualize(&q, 4).unwrap();
        for (a, m) in annual.to_rows().iter().flatten().zip(manual.to_rows().iter().flatten()) {
            assert_abs_diff_eq!(*a, *m, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_single_period_is_unchanged() {
        assert_eq!(annualize(&quarterly(), 1).unwrap(), quarterly());
    }

    #[test]
    fn test_zero_periods_rejected() {
        assert!(matches!(
            annualize(&quarterly(), 0),
            Err(MigrationError::InvalidPeriodCount(0))
        ));
    }
}
