//! Experiment Runner for the Davidson-Liu Convergence History.
//!
//! This executable builds the diagonally dominant test problem `diag(1, ..., n)` plus a
//! small symmetric Gaussian perturbation, computes its lowest eigenpairs with the block
//! Davidson-Liu solver and records the Ritz values of every iteration. Optionally the
//! result is checked against a dense reference decomposition.

use anyhow::{Context, Result, ensure};
use clap::{Parser, ValueEnum};
use davidson_project::{
    ConvergenceCriterion, DavidsonParams, OverflowPolicy,
    algorithms::davidson::DavidsonSnapshot,
    solvers::solve_eigenpairs_with_callback,
    utils::test_problems::perturbed_diagonal,
};
use faer::Side;
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use std::{path::PathBuf, time::Instant};

/// Largest accepted deviation from the dense reference eigenvalues.
const REFERENCE_TOLERANCE: f64 = 1e-4;

/// How the change of the Ritz values is reduced to a stopping decision.
#[derive(ValueEnum, Clone, Debug, Copy)]
enum Criterion {
    /// Euclidean norm of the change over all roots.
    Norm,
    /// Largest change of any single root.
    PerRoot,
}

/// What to do when the trial basis is full.
#[derive(ValueEnum, Clone, Debug, Copy)]
enum Overflow {
    /// Stop with an error.
    Fail,
    /// Collapse the basis onto the current Ritz vectors.
    Collapse,
}

/// Command-line arguments for the convergence experiment.
#[derive(Parser, Debug)]
#[clap(
    name = "convergence-runner",
    about = "Records the per-iteration Ritz values of a Davidson-Liu solve."
)]
struct ConvergenceArgs {
    /// Dimension of the test matrix.
    #[clap(long, default_value_t = 3000)]
    n: usize,

    /// Number of lowest eigenpairs to compute.
    #[clap(long, default_value_t = 5)]
    roots: usize,

    /// Standard deviation of the symmetric off-diagonal perturbation.
    #[clap(long, default_value_t = 1e-4)]
    magnitude: f64,

    /// Convergence tolerance on the change of the Ritz values.
    #[clap(long, default_value_t = 1e-6)]
    tol: f64,

    /// The basis holds at most `multiplier * roots` vectors.
    #[clap(long, default_value_t = 20)]
    multiplier: usize,

    /// Maximum number of Davidson iterations.
    #[clap(long, default_value_t = 100)]
    max_iterations: usize,

    #[clap(long, value_enum, default_value_t = Criterion::Norm)]
    criterion: Criterion,

    #[clap(long, value_enum, default_value_t = Overflow::Fail)]
    overflow: Overflow,

    /// Seed for the random perturbation.
    #[clap(long, default_value_t = 20)]
    seed: u64,

    /// Also compute a dense reference decomposition and report the deviation.
    #[clap(long)]
    reference: bool,

    /// Path to the output CSV file where the history will be written.
    #[clap(long, value_name = "PATH")]
    output: PathBuf,
}

/// A single row of the convergence history CSV: one root in one iteration.
#[derive(Debug, Serialize)]
struct HistoryRow {
    iteration: usize,
    root: usize,
    ritz_value: f64,
    basis_size: usize,
    inserted: usize,
    /// Empty on the first iteration.
    delta: Option<f64>,
}

/// The main entry point for the convergence experiment.
fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()?;
    let args = ConvergenceArgs::parse();
    log::info!(
        "Starting Davidson convergence experiment: n = {}, roots = {}, seed = {}",
        args.n,
        args.roots,
        args.seed
    );

    // 1. Setup the test problem.
    let mut rng = StdRng::seed_from_u64(args.seed);
    let a = perturbed_diagonal(args.n, args.magnitude, &mut rng);

    let params = DavidsonParams {
        n_roots: args.roots,
        tol: args.tol,
        max_basis_multiplier: args.multiplier,
        max_iterations: args.max_iterations,
        criterion: match args.criterion {
            Criterion::Norm => ConvergenceCriterion::EigenvalueNorm,
            Criterion::PerRoot => ConvergenceCriterion::PerRoot,
        },
        overflow_policy: match args.overflow {
            Overflow::Fail => OverflowPolicy::Fail,
            Overflow::Collapse => OverflowPolicy::Collapse,
        },
        ..DavidsonParams::default()
    };

    // 2. Run the solver, recording every iteration.
    let mut history = Vec::new();
    let mut record = |snapshot: &DavidsonSnapshot<'_>| {
        for (root, &ritz_value) in snapshot.eigenvalues.iter().enumerate() {
            history.push(HistoryRow {
                iteration: snapshot.iteration,
                root,
                ritz_value,
                basis_size: snapshot.basis.ncols(),
                inserted: snapshot.inserted,
                delta: snapshot.delta,
            });
        }
        true
    };
    let start = Instant::now();
    let outcome = solve_eigenpairs_with_callback(&a.as_ref(), &params, &mut record);
    let elapsed = start.elapsed();

    // 3. Write the history, also for failed runs.
    log::info!("Writing history to {:?}...", &args.output);
    let mut writer = csv::Writer::from_path(&args.output)?;
    for row in history {
        writer.serialize(row)?;
    }
    writer.flush()?;

    let solution = outcome.context("Davidson solve failed")?;
    log::info!(
        "Converged in {} iterations ({:.3?}), basis size {}",
        solution.report.iterations,
        elapsed,
        solution.report.basis_size
    );
    for (k, value) in solution.eigenvalues.iter().enumerate() {
        log::info!("  λ_{k} = {value:.12}");
    }

    // 4. Optional dense reference.
    if args.reference {
        let start = Instant::now();
        let evd = a
            .as_ref()
            .self_adjoint_eigen(Side::Lower)
            .map_err(|e| anyhow::anyhow!("dense reference failed: {e:?}"))?;
        let exact = evd.S();
        let deviation = solution
            .eigenvalues
            .iter()
            .enumerate()
            .map(|(k, value)| (value - exact[k]).abs())
            .fold(0.0, f64::max);
        log::info!(
            "Dense reference computed in {:.3?}; max eigenvalue deviation {deviation:.3e}",
            start.elapsed()
        );
        ensure!(
            deviation < REFERENCE_TOLERANCE,
            "Davidson eigenvalues deviate from the dense reference by {deviation:.3e}"
        );
    }

    log::info!("Convergence experiment complete.");
    Ok(())
}
