//! CSV and JSON export of analysis results
//!
//! Every file goes into one output directory:
//! - `marginals.csv`, `hazards.csv`, `matrix_period_{t}.csv` for a hazard analysis
//! - `average_states.csv`, `terminal_probability.csv`, `annual_matrix.csv` for a simulation
//! - `horizon_matrix.csv`, `convergence_matrix.csv` for a migration analysis
//! - `<name>.json` with the full report on request

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::analysis::{HazardReport, MigrationReport, SimulationReport};
use crate::error::{MigrationError, Result};
use crate::matrix::TransitionMatrix;

/// Write `period,<value_column>` rows, numbering periods from `first_period`
pub fn write_series<W: Write>(
    writer: W,
    value_column: &str,
    values: &[f64],
    first_period: usize,
) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["period", value_column])?;
    for (i, value) in values.iter().enumerate() {
        csv.write_record([(first_period + i).to_string(), value.to_string()])?;
    }
    csv.flush()?;
    Ok(())
}

/// Write a matrix with one column per labelled destination state
pub fn write_matrix<W: Write>(writer: W, labels: &[String], matrix: &TransitionMatrix) -> Result<()> {
    if labels.len() != matrix.size() {
        return Err(MigrationError::InvalidMatrixShape(format!(
            "{} labels for {} states",
            labels.len(),
            matrix.size()
        )));
    }
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(labels)?;
    for row in matrix.to_rows() {
        csv.write_record(row.iter().map(|p| p.to_string()))?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes report files into a single directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    /// Create the writer, creating `output_dir` if needed
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn create(&self, filename: &str) -> Result<(File, PathBuf)> {
        let path = self.output_dir.join(filename);
        Ok((File::create(&path)?, path))
    }

    pub fn series(&self, filename: &str, value_column: &str, values: &[f64], first_period: usize) -> Result<PathBuf> {
        let (file, path) = self.create(filename)?;
        write_series(file, value_column, values, first_period)?;
        Ok(path)
    }

    pub fn matrix(&self, filename: &str, labels: &[String], matrix: &TransitionMatrix) -> Result<PathBuf> {
        let (file, path) = self.create(filename)?;
        write_matrix(file, labels, matrix)?;
        Ok(path)
    }

    /// Pretty-printed JSON of any serializable result
    pub fn json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let (file, path) = self.create(&format!("{}.json", name))?;
        serde_json::to_writer_pretty(file, value)
            .map_err(|e| MigrationError::Parse(format!("cannot serialize {}: {}", name, e)))?;
        Ok(path)
    }

    pub fn migration(&self, report: &MigrationReport) -> Result<Vec<PathBuf>> {
        let written = vec![
            self.matrix("horizon_matrix.csv", &report.labels, &report.horizon_matrix)?,
            self.matrix("convergence_matrix.csv", &report.labels, &report.convergence_matrix)?,
        ];
        info!("wrote {} migration files to {}", written.len(), self.output_dir.display());
        Ok(written)
    }

    /// Marginals and hazards by period, plus one file per period matrix
    pub fn hazard(&self, report: &HazardReport) -> Result<Vec<PathBuf>> {
        let labels: Vec<String> = crate::presets::TWO_STATE_LABELS
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut written = vec![
            self.series("marginals.csv", "marginal", &report.structure.marginals, 1)?,
            self.series("hazards.csv", "hazard", &report.structure.hazards, 1)?,
        ];
        for (t, matrix) in report.matrices.iter().enumerate() {
            written.push(self.matrix(&format!("matrix_period_{}.csv", t + 1), &labels, matrix)?);
        }
        info!("wrote {} hazard files to {}", written.len(), self.output_dir.display());
        Ok(written)
    }

    /// Average state per period, the annual matrix and the terminal estimate
    pub fn simulation(&self, report: &SimulationReport) -> Result<Vec<PathBuf>> {
        let mut written = vec![
            self.series("average_states.csv", "average_state", &report.average_state, 0)?,
            self.matrix("annual_matrix.csv", &report.labels, &report.annual_matrix)?,
        ];

        let (file, path) = self.create("terminal_probability.csv")?;
        let mut csv = csv::Writer::from_writer(file);
        csv.write_record(["target_state", "empirical", "analytic", "standard_error"])?;
        csv.write_record([
            report.target_state.to_string(),
            report.empirical_terminal_probability.to_string(),
            report.analytic_terminal_probability.to_string(),
            report.standard_error.to_string(),
        ])?;
        csv.flush()?;
        written.push(path);

        info!("wrote {} simulation files to {}", written.len(), self.output_dir.display());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisRunner;
    use crate::loader::read_migration_model;
    use crate::matrix::DEFAULT_ROW_SUM_TOLERANCE;
    use crate::presets::{MigrationModel, REFERENCE_CUMULATIVE_DEFAULTS};
    use std::env;

    #[test]
    fn test_series_layout() {
        let mut buffer = Vec::new();
        write_series(&mut buffer, "hazard", &[0.5, 0.25], 1).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "period,hazard\n1,0.5\n2,0.25\n");
    }

    #[test]
    fn test_matrix_reads_back() {
        let model = MigrationModel::annual_rating();
        let mut buffer = Vec::new();
        write_matrix(&mut buffer, model.labels(), model.matrix()).unwrap();

        let back = read_migration_model(buffer.as_slice(), DEFAULT_ROW_SUM_TOLERANCE).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_matrix_label_mismatch() {
        let mut buffer = Vec::new();
        let result = write_matrix(&mut buffer, &["A".to_string()], &TransitionMatrix::identity(2).unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn test_hazard_files() {
        let dir = env::temp_dir().join("credit_migration_report_hazard");
        let writer = ReportWriter::new(&dir).unwrap();
        let report = AnalysisRunner::default().run_hazard(&REFERENCE_CUMULATIVE_DEFAULTS).unwrap();

        let written = writer.hazard(&report).unwrap();
        assert_eq!(written.len(), 6);
        assert!(dir.join("matrix_period_4.csv").exists());

        let marginals = fs::read_to_string(dir.join("marginals.csv")).unwrap();
        assert!(marginals.starts_with("period,marginal\n1,0.02\n"));

        let json = writer.json("hazard", &report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(json).unwrap()).unwrap();
        assert_eq!(value["structure"]["hazards"].as_array().unwrap().len(), 4);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_simulation_files() {
        let dir = env::temp_dir().join("credit_migration_report_simulation");
        let writer = ReportWriter::new(&dir).unwrap();
        let report = AnalysisRunner::default()
            .run_simulation(&MigrationModel::quarterly_two_state())
            .unwrap();

        writer.simulation(&report).unwrap();
        let averages = fs::read_to_string(dir.join("average_states.csv")).unwrap();
        // Header plus periods 0..=20
        assert_eq!(averages.lines().count(), 22);
        assert!(averages.starts_with("period,average_state\n0,0\n"));

        let terminal = fs::read_to_string(dir.join("terminal_probability.csv")).unwrap();
        assert!(terminal.starts_with("target_state,empirical,analytic,standard_error\n1,"));

        fs::remove_dir_all(&dir).ok();
    }
}
