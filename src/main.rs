//! Credit Migration CLI
//!
//! Command-line interface for rating-migration, hazard-curve and simulation analyses.
//! Settings come from `CREDIT_*` environment variables (see `config`), then flags.
//!
//! - `credit_migration migration [--matrix file.csv]`
//! - `credit_migration hazard [--curve file.csv]`
//! - `credit_migration simulate [--matrix file.csv]`
//!
//! `--json` prints the full report as JSON; `--output-dir` writes CSV exports.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use credit_migration::loader::{load_cumulative_curve, load_migration_model_with_tolerance};
use credit_migration::presets::REFERENCE_CUMULATIVE_DEFAULTS;
use credit_migration::{
    AnalysisConfig, AnalysisRunner, HazardMatrixConvention, HazardReport, MigrationModel,
    MigrationReport, ReportWriter, SimulationReport, TransitionMatrix,
};

#[derive(Parser)]
#[command(name = "credit_migration")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print the full report as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Directory for CSV exports
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// n-step default probabilities, stationary distribution and convergence
    Migration {
        /// Labelled transition matrix CSV (defaults to the annual rating matrix)
        #[arg(short, long)]
        matrix: Option<PathBuf>,

        /// Row-sum tolerance for the loaded matrix
        #[arg(long, default_value = "1e-9")]
        tolerance: f64,

        #[arg(long)]
        horizon: Option<u32>,

        #[arg(long)]
        convergence_horizon: Option<u32>,
    },

    /// Marginals, survival, hazard rates and per-period matrices
    Hazard {
        /// `period,cumulative` CSV (defaults to the reference curve)
        #[arg(short, long)]
        curve: Option<PathBuf>,

        #[arg(long, value_enum)]
        convention: Option<ConventionArg>,

        #[arg(long)]
        simulations: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Annualize a sub-annual matrix and simulate trajectories
    Simulate {
        /// Labelled transition matrix CSV (defaults to the quarterly matrix)
        #[arg(short, long)]
        matrix: Option<PathBuf>,

        #[arg(long, default_value = "1e-9")]
        tolerance: f64,

        #[arg(short = 'n', long)]
        simulations: Option<usize>,

        #[arg(short, long)]
        periods: Option<usize>,

        #[arg(long)]
        periods_per_year: Option<u32>,

        #[arg(long)]
        initial_state: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,

        /// Run on one thread with a single generator
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ConventionArg {
    /// Hazard used directly as the one-period default probability
    Literal,
    /// Default probability `1 - exp(-hazard)`
    Exponential,
}

impl From<ConventionArg> for HazardMatrixConvention {
    fn from(arg: ConventionArg) -> Self {
        match arg {
            ConventionArg::Literal => HazardMatrixConvention::HazardAsProbability,
            ConventionArg::Exponential => HazardMatrixConvention::ExponentialSurvival,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = AnalysisConfig::from_env();
    let writer = cli
        .output_dir
        .as_deref()
        .map(ReportWriter::new)
        .transpose()
        .context("cannot create output directory")?;

    match cli.command {
        Commands::Migration {
            matrix,
            tolerance,
            horizon,
            convergence_horizon,
        } => {
            if let Some(h) = horizon {
                config.horizon = h;
            }
            if let Some(h) = convergence_horizon {
                config.convergence_horizon = h;
            }
            let model = load_model(matrix.as_deref(), tolerance, MigrationModel::annual_rating)?;
            let report = AnalysisRunner::new(config).run_migration(&model)?;

            if let Some(writer) = &writer {
                writer.migration(&report)?;
                writer.json("migration", &report)?;
            }
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_migration(&report);
            }
        }
        Commands::Hazard {
            curve,
            convention,
            simulations,
            seed,
        } => {
            if let Some(c) = convention {
                config.hazard_convention = c.into();
            }
            if let Some(n) = simulations {
                config.n_simulations = n;
            }
            if let Some(s) = seed {
                config.seed = s;
            }
            let cumulative = match curve {
                Some(path) => load_cumulative_curve(&path)
                    .with_context(|| format!("cannot load curve from {}", path.display()))?,
                None => REFERENCE_CUMULATIVE_DEFAULTS.to_vec(),
            };
            let report = AnalysisRunner::new(config).run_hazard(&cumulative)?;

            if let Some(writer) = &writer {
                writer.hazard(&report)?;
                writer.json("hazard", &report)?;
            }
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_hazard(&report);
            }
        }
        Commands::Simulate {
            matrix,
            tolerance,
            simulations,
            periods,
            periods_per_year,
            initial_state,
            seed,
            sequential,
        } => {
            if let Some(n) = simulations {
                config.n_simulations = n;
            }
            if let Some(p) = periods {
                config.n_periods = p;
            }
            if let Some(p) = periods_per_year {
                config.periods_per_year = p;
            }
            if let Some(s) = initial_state {
                config.initial_state = s;
            }
            if let Some(s) = seed {
                config.seed = s;
            }
            if sequential {
                config.parallel = false;
            }
            let model = load_model(matrix.as_deref(), tolerance, MigrationModel::quarterly_two_state)?;
            let report = AnalysisRunner::new(config).run_simulation(&model)?;

            if let Some(writer) = &writer {
                writer.simulation(&report)?;
                writer.json("simulation", &report)?;
            }
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_simulation(&report);
            }
        }
    }

    if let Some(writer) = &writer {
        println!("\nResults written to: {}", writer.output_dir().display());
    }

    Ok(())
}

fn load_model(
    path: Option<&Path>,
    tolerance: f64,
    preset: fn() -> MigrationModel,
) -> anyhow::Result<MigrationModel> {
    match path {
        Some(path) => load_migration_model_with_tolerance(path, tolerance)
            .with_context(|| format!("cannot load matrix from {}", path.display())),
        None => Ok(preset()),
    }
}

fn print_matrix(labels: &[String], matrix: &TransitionMatrix) {
    print!("{:>18}", "");
    for label in labels {
        print!(" {:>18}", label);
    }
    println!();
    for (label, row) in labels.iter().zip(matrix.to_rows()) {
        print!("{:>18}", label);
        for p in row {
            print!(" {:>18.8}", p);
        }
        println!();
    }
}

fn print_migration(report: &MigrationReport) {
    println!("Default probability within {} periods:", report.horizon);
    for (label, p) in report.labels.iter().zip(&report.default_probabilities) {
        println!("  {:<18} {:.4}", label, p);
    }

    println!("\nStationary distribution:");
    match (&report.stationary, &report.stationary_error) {
        (Some(stationary), _) => {
            for (label, p) in report.labels.iter().zip(&stationary.probabilities) {
                println!("  {:<18} {:.6}", label, p);
            }
            if let Some(state) = stationary.absorbing_state {
                println!("  (all mass absorbed in {})", report.labels[state]);
            }
        }
        (None, Some(error)) => println!("  unavailable: {}", error),
        (None, None) => println!("  unavailable"),
    }

    println!("\nMatrix to the power {}:", report.convergence_horizon);
    print_matrix(&report.labels, &report.convergence_matrix);
    println!("Rows converged: {}", report.rows_converged);
}

fn print_hazard(report: &HazardReport) {
    let structure = &report.structure;
    println!("{:>6} {:>12} {:>12} {:>12} {:>12}", "Period", "Cumulative", "Marginal", "Survival", "Hazard");
    println!("{}", "-".repeat(58));
    for t in 0..structure.len() {
        println!(
            "{:>6} {:>12.4} {:>12.4} {:>12.6} {:>12.6}",
            t + 1,
            structure.cumulative[t],
            structure.marginals[t],
            structure.survival[t + 1],
            structure.hazards[t],
        );
    }

    println!("\nTransition matrices ({:?}):", report.convention);
    for (t, (matrix, sums)) in report.matrices.iter().zip(&report.row_sums).enumerate() {
        let rows = matrix.to_rows();
        println!(
            "  Period {}: [[{:.6}, {:.6}], [{:.1}, {:.1}]]  row sums {:?}",
            t + 1,
            rows[0][0],
            rows[0][1],
            rows[1][0],
            rows[1][1],
            sums
        );
    }

    if let Some(last) = report.implied_cumulative.last() {
        println!("\nImplied cumulative default at final period: {:.6}", last);
        println!("Simulated cumulative default:               {:.6}", report.simulated_cumulative_default);
    }
}

fn print_simulation(report: &SimulationReport) {
    println!("Annualized matrix ({} periods per year):", report.periods_per_year);
    print_matrix(&report.labels, &report.annual_matrix);

    println!("\nSample trajectories:");
    for (i, trajectory) in report.sample_trajectories.iter().enumerate() {
        println!("  Trajectory {}: {:?}", i + 1, trajectory.states());
    }

    let target = report
        .labels
        .get(report.target_state)
        .map(String::as_str)
        .unwrap_or("target");
    println!(
        "\nProbability of {} after {} periods ({} paths, seed {}):",
        target, report.n_periods, report.n_simulations, report.seed
    );
    println!(
        "  Simulated: {:.4} (standard error {:.4})",
        report.empirical_terminal_probability, report.standard_error
    );
    println!("  Analytic:  {:.4}", report.analytic_terminal_probability);

    println!("\nAverage state by period:");
    for (t, avg) in report.average_state.iter().enumerate() {
        println!("  {:>3}: {:.4}", t, avg);
    }
}
