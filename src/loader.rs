//! CSV loaders for transition matrices and cumulative default curves
//!
//! Files live in `data/` by default:
//! - a matrix file has a header of state labels and one row per origin state
//! - a curve file has `period,cumulative` columns, periods numbered from 1

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::error::{MigrationError, Result};
use crate::matrix::{TransitionMatrix, DEFAULT_ROW_SUM_TOLERANCE};
use crate::presets::MigrationModel;

/// Default path to the input data directory
pub const DEFAULT_DATA_PATH: &str = "data";

#[derive(Debug, Deserialize)]
struct CurveRow {
    period: usize,
    cumulative: f64,
}

/// Load a labelled transition matrix from a CSV file
pub fn load_migration_model(path: &Path) -> Result<MigrationModel> {
    load_migration_model_with_tolerance(path, DEFAULT_ROW_SUM_TOLERANCE)
}

/// Load a labelled transition matrix, validating row sums at `tolerance`.
///
/// Published matrices are often rounded to a few decimals, so a looser
/// tolerance than the default may be needed.
pub fn load_migration_model_with_tolerance(path: &Path, tolerance: f64) -> Result<MigrationModel> {
    let file = File::open(path)?;
    let model = read_migration_model(file, tolerance)?;
    debug!("loaded {}x{} matrix from {}", model.size(), model.size(), path.display());
    Ok(model)
}

/// Parse a labelled transition matrix from any CSV source
pub fn read_migration_model<R: Read>(source: R, tolerance: f64) -> Result<MigrationModel> {
    let mut reader = csv::Reader::from_reader(source);
    let labels: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::with_capacity(labels.len());
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let row = record
            .iter()
            .map(|field| {
                field.trim().parse::<f64>().map_err(|e| {
                    MigrationError::Parse(format!("row {}: '{}' is not a number: {}", i + 1, field, e))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    let matrix = TransitionMatrix::with_tolerance(rows, tolerance)?;
    MigrationModel::new(labels, matrix)
}

/// Load a cumulative default curve from a CSV file
pub fn load_cumulative_curve(path: &Path) -> Result<Vec<f64>> {
    let file = File::open(path)?;
    let curve = read_cumulative_curve(file)?;
    debug!("loaded {} curve points from {}", curve.len(), path.display());
    Ok(curve)
}

/// Parse a `period,cumulative` curve; periods must run 1, 2, 3, …
pub fn read_cumulative_curve<R: Read>(source: R) -> Result<Vec<f64>> {
    let mut reader = csv::Reader::from_reader(source);
    let mut curve = Vec::new();

    for (i, result) in reader.deserialize().enumerate() {
        let row: CurveRow = result?;
        if row.period != i + 1 {
            return Err(MigrationError::Parse(format!(
                "expected period {}, found {}",
                i + 1,
                row.period
            )));
        }
        curve.push(row.cumulative);
    }

    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_matrix() {
        let csv = "Investment Grade,Default\n0.95,0.05\n0.10,0.90\n";
        let model = read_migration_model(csv.as_bytes(), DEFAULT_ROW_SUM_TOLERANCE).unwrap();
        assert_eq!(model.labels(), &["Investment Grade", "Default"]);
        assert_eq!(model.matrix().entry(1, 0).unwrap(), 0.10);
    }

    #[test]
    fn test_read_matrix_rejects_bad_rows() {
        let not_stochastic = "A,B\n0.5,0.4\n0.0,1.0\n";
        assert!(matches!(
            read_migration_model(not_stochastic.as_bytes(), DEFAULT_ROW_SUM_TOLERANCE),
            Err(MigrationError::InvalidMatrixShape(_))
        ));

        let not_numeric = "A,B\n0.5,x\n0.0,1.0\n";
        assert!(matches!(
            read_migration_model(not_numeric.as_bytes(), DEFAULT_ROW_SUM_TOLERANCE),
            Err(MigrationError::Parse(_))
        ));

        let not_square = "A,B\n0.5,0.5\n";
        assert!(read_migration_model(not_square.as_bytes(), DEFAULT_ROW_SUM_TOLERANCE).is_err());
    }

    #[test]
    fn test_rounded_matrix_needs_looser_tolerance() {
        let rounded = "A,B\n0.333,0.666\n0,1\n";
        assert!(read_migration_model(rounded.as_bytes(), DEFAULT_ROW_SUM_TOLERANCE).is_err());
        assert!(read_migration_model(rounded.as_bytes(), 1e-2).is_ok());
    }

    #[test]
    fn test_read_curve() {
        let csv = "period,cumulative\n1,0.02\n2,0.045\n3,0.078\n4,0.112\n";
        let curve = read_cumulative_curve(csv.as_bytes()).unwrap();
        assert_eq!(curve, vec![0.02, 0.045, 0.078, 0.112]);
    }

    #[test]
    fn test_read_curve_rejects_gaps() {
        let csv = "period,cumulative\n1,0.02\n3,0.078\n";
        assert!(matches!(
            read_cumulative_curve(csv.as_bytes()),
            Err(MigrationError::Parse(_))
        ));
    }

    #[test]
    fn test_bundled_data_files() {
        let data = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_DATA_PATH);

        let rating = load_migration_model(&data.join("rating_matrix.csv")).unwrap();
        assert_eq!(rating, MigrationModel::annual_rating());

        let quarterly = load_migration_model(&data.join("quarterly_matrix.csv")).unwrap();
        assert_eq!(quarterly, MigrationModel::quarterly_two_state());

        let curve = load_cumulative_curve(&data.join("cumulative_defaults.csv")).unwrap();
        assert_eq!(curve, crate::presets::REFERENCE_CUMULATIVE_DEFAULTS.to_vec());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_cumulative_curve(Path::new("does/not/exist.csv")),
            Err(MigrationError::Io(_))
        ));
    }
}
