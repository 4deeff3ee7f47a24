//! Block Davidson-Liu iteration for the lowest eigenpairs of a symmetric operator.
//!
//! ** NOTE: We recommend using the high-level method [`crate::solvers::solve_eigenpairs`]
//! instead. This module is intended for use cases where fine-grained control over the
//! iteration is required, such as monitoring the trial subspace with a callback.
//!
//! Each pass of [`davidson`] performs the following steps (Sherrill, *Adv. Quantum Chem.*
//! 34, 1999, fig. 5):
//!
//! 1. Project the operator onto the orthonormal trial basis `B` and diagonalize the small
//!    matrix `G = B^T A B` ([`ProjectedEigensolver`]).
//! 2. For each of the `n_roots` lowest Ritz pairs form the residual and its diagonal
//!    preconditioned correction ([`ResidualPreconditioner`]).
//! 3. Orthogonalize each correction against the basis *as it is at that moment*, so later
//!    roots see the vectors inserted for earlier roots in the same pass, and insert it if
//!    its norm exceeds the linear-dependency threshold ([`OrthogonalBasis`]).
//! 4. Compare the Ritz values with those of the previous pass ([`ConvergenceTracker`]).
//!
//! The iteration stops when the Ritz values stop changing, when the iteration cap is
//! reached, or when the basis is full. A full basis is an error unless
//! [`OverflowPolicy::Collapse`] is selected, in which case the basis is collapsed onto the
//! current Ritz vectors (a thick restart) and the iteration continues.

use super::{
    EigenError, EigenErrorKind, Method, SolveReport,
    basis::OrthogonalBasis,
    convergence::{ConvergenceCriterion, ConvergenceTracker},
    preconditioner::ResidualPreconditioner,
    projection::ProjectedEigensolver,
};
use crate::matrix::MatrixOperator;
use faer::{
    Mat, MatRef, Par,
    dyn_stack::{MemStack, StackReq},
};

/// What to do when a correction vector would not fit in the basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Stop with [`EigenErrorKind::BasisOverflow`].
    #[default]
    Fail,
    /// Collapse the basis onto the current Ritz vectors and keep iterating.
    Collapse,
}

/// Configuration of a Davidson solve.
#[derive(Debug, Clone, Copy)]
pub struct DavidsonParams {
    /// Number of lowest eigenpairs to compute.
    pub n_roots: usize,
    /// Convergence tolerance on the change of the Ritz values between passes.
    pub tol: f64,
    /// The basis holds at most `max_basis_multiplier * n_roots` vectors.
    pub max_basis_multiplier: usize,
    /// Maximum number of passes.
    pub max_iterations: usize,
    /// Corrections whose norm after orthogonalization is at or below this value are
    /// considered already spanned by the basis and are skipped.
    pub lindep_threshold: f64,
    pub criterion: ConvergenceCriterion,
    pub overflow_policy: OverflowPolicy,
    /// Whether to reconstruct the Ritz vectors of the converged roots.
    pub compute_eigenvectors: bool,
    /// Parallelism used for the batched operator products.
    pub par: Par,
}

impl Default for DavidsonParams {
    fn default() -> Self {
        Self {
            n_roots: 5,
            tol: 1e-6,
            max_basis_multiplier: 20,
            max_iterations: 100,
            lindep_threshold: 1e-3,
            criterion: ConvergenceCriterion::EigenvalueNorm,
            overflow_policy: OverflowPolicy::Fail,
            compute_eigenvectors: true,
            par: Par::Seq,
        }
    }
}

impl DavidsonParams {
    /// Default parameters for `n_roots` roots.
    pub fn with_roots(n_roots: usize) -> Self {
        Self {
            n_roots,
            ..Self::default()
        }
    }

    /// Capacity of the trial basis.
    pub fn capacity(&self) -> usize {
        self.max_basis_multiplier.saturating_mul(self.n_roots)
    }

    fn validate(&self) -> Result<(), EigenError> {
        if self.n_roots == 0 {
            return Err(EigenErrorKind::InputError("`n_roots` must be at least 1.".to_string()).into());
        }
        if !(self.tol > 0.0 && self.tol.is_finite()) {
            return Err(EigenErrorKind::InputError(format!(
                "`tol` must be positive and finite, got {}.",
                self.tol
            ))
            .into());
        }
        if !(self.lindep_threshold >= 0.0 && self.lindep_threshold < 1.0) {
            return Err(EigenErrorKind::InputError(format!(
                "`lindep_threshold` must lie in [0, 1), got {}.",
                self.lindep_threshold
            ))
            .into());
        }
        Ok(())
    }
}

/// The converged eigenpairs of a Davidson solve.
#[derive(Debug, Clone)]
pub struct EigenSolution {
    /// The `n_roots` lowest eigenvalues in ascending order.
    pub eigenvalues: Vec<f64>,
    /// `n x n_roots` matrix of unit-norm Ritz vectors, column `k` belonging to
    /// `eigenvalues[k]`. The sign of each column is arbitrary.
    pub eigenvectors: Option<Mat<f64>>,
    pub report: SolveReport,
}

/// The state of the iteration passed to a [`DavidsonCallback`] after every pass.
#[derive(Debug, Clone, Copy)]
pub struct DavidsonSnapshot<'a> {
    /// Zero-based index of the pass that just finished.
    pub iteration: usize,
    /// The trial basis after this pass's insertions (`n x L`).
    pub basis: MatRef<'a, f64>,
    /// The Ritz values computed in this pass.
    pub eigenvalues: &'a [f64],
    /// The convergence measure, `None` on the first pass.
    pub delta: Option<f64>,
    /// Number of correction vectors inserted in this pass.
    pub inserted: usize,
}

/// Invoked after every pass. Returning `false` stops the solve with
/// [`EigenErrorKind::Interrupted`], which is how a caller imposes a deadline.
pub type DavidsonCallback<'a> = dyn FnMut(&DavidsonSnapshot<'_>) -> bool + 'a;

/// Scratch space required by [`davidson`] for the given operator and parameters.
pub fn davidson_scratch<O: MatrixOperator + ?Sized>(operator: &O, params: &DavidsonParams) -> StackReq {
    let max_cols = params.capacity().max(params.n_roots);
    operator.apply_scratch(max_cols, params.par)
}

/// Runs the block Davidson-Liu iteration for the `params.n_roots` lowest eigenpairs.
///
/// The initial basis is made of the first `n_roots` standard unit vectors, which is a good
/// guess for diagonally dominant operators whose smallest diagonal entries come first.
///
/// # Arguments
/// * `operator`: A symmetric operator implementing [`MatrixOperator`].
/// * `params`: Iteration parameters, see [`DavidsonParams`].
/// * `stack`: Workspace of at least [`davidson_scratch`] bytes.
/// * `callback`: Optional observer invoked after every pass; may stop the solve.
///
/// # Errors
/// * [`EigenErrorKind::NonConvergence`] if `max_iterations` passes do not converge.
/// * [`EigenErrorKind::BasisOverflow`] if the basis fills up under [`OverflowPolicy::Fail`].
/// * [`EigenErrorKind::NumericalInstability`] on a preconditioner pole or a failed dense
///   eigendecomposition.
/// * [`EigenErrorKind::Interrupted`] if the callback returns `false`.
/// * [`EigenErrorKind::InputError`] for invalid parameters or a non-square operator.
pub fn davidson<O: MatrixOperator + ?Sized>(
    operator: &O,
    params: &DavidsonParams,
    stack: &mut MemStack,
    mut callback: Option<&mut DavidsonCallback<'_>>,
) -> Result<EigenSolution, EigenError> {
    params.validate()?;
    if operator.nrows() != operator.ncols() {
        return Err(EigenErrorKind::InputError(format!(
            "the operator must be square, got {} x {}.",
            operator.nrows(),
            operator.ncols()
        ))
        .into());
    }
    let n = operator.dimension();
    let n_roots = params.n_roots;
    let capacity = params.capacity();

    let mut basis = OrthogonalBasis::from_unit_vectors(n, n_roots, capacity)?;
    let mut projector = ProjectedEigensolver::new(n);
    let preconditioner = ResidualPreconditioner::new(operator.diagonal_entries());
    let mut tracker = ConvergenceTracker::new(n_roots, params.tol, params.criterion);

    log::debug!(
        "Davidson start: n = {n}, roots = {n_roots}, capacity = {capacity}, tol = {:.1e}",
        params.tol
    );

    for iteration in 0..params.max_iterations {
        let b = basis.as_matrix();
        let ritz = projector.project(operator, b.as_ref(), n_roots, params.par, stack)?;

        // β_k = B α_k and A β_k = (A B) α_k; the cached image avoids further products.
        let ritz_vectors = b.as_ref() * ritz.coefficients.as_ref();
        let ritz_images = projector.image() * ritz.coefficients.as_ref();

        let mut inserted = 0;
        for (k, &eigenvalue) in ritz.values.iter().enumerate() {
            let residual = ResidualPreconditioner::residual(
                ritz_vectors.as_ref().get(.., k..k + 1),
                ritz_images.as_ref().get(.., k..k + 1),
                eigenvalue,
            );
            let Some(correction) = preconditioner.precondition(k, eigenvalue, residual.as_ref())?
            else {
                log::trace!("root {k} has a round-off residual; no correction");
                continue;
            };

            let mut candidate = basis.orthogonalize(correction.as_ref());
            if candidate.norm_l2() <= params.lindep_threshold {
                log::trace!(
                    "root {k}: correction is linearly dependent (norm {:.3e}); skipped",
                    candidate.norm_l2()
                );
                continue;
            }

            if basis.is_full() {
                if params.overflow_policy == OverflowPolicy::Fail || capacity <= n_roots {
                    log::warn!(
                        "Davidson basis overflow at iteration {iteration} (capacity {capacity})"
                    );
                    return Err(EigenErrorKind::BasisOverflow { capacity }.into());
                }
                log::debug!(
                    "collapsing the basis from {} to {n_roots} Ritz vectors",
                    basis.len()
                );
                basis.reset_to(ritz_vectors.as_ref())?;
                projector.clear_image();
                candidate = basis.orthogonalize(correction.as_ref());
                if candidate.norm_l2() <= params.lindep_threshold {
                    continue;
                }
            }

            basis.insert(candidate.as_ref())?;
            inserted += 1;
        }

        let converged = tracker.update(&ritz.values);
        let delta = tracker.last_delta();
        log::debug!(
            "iteration {iteration}: L = {}, inserted = {inserted}, delta = {}",
            basis.len(),
            delta.map_or_else(|| "-".to_string(), |d| format!("{d:.3e}"))
        );

        let report = SolveReport {
            method: Method::Davidson,
            iterations: iteration + 1,
            converged,
            delta: delta.unwrap_or(f64::INFINITY),
            basis_size: basis.len(),
        };

        // The callback can signal for an early, graceful stop.
        let mut stop = false;
        if let Some(ref mut cb) = callback {
            let current_basis = basis.as_matrix();
            let snapshot = DavidsonSnapshot {
                iteration,
                basis: current_basis.as_ref(),
                eigenvalues: &ritz.values,
                delta,
                inserted,
            };
            stop = !cb(&snapshot);
        }

        if converged {
            log::info!(
                "Davidson converged in {} iterations (basis size {}, delta {:.3e})",
                report.iterations,
                report.basis_size,
                report.delta
            );
            let eigenvectors = params.compute_eigenvectors.then_some(ritz_vectors);
            return Ok(EigenSolution {
                eigenvalues: ritz.values,
                eigenvectors,
                report,
            });
        }
        if stop {
            log::info!("Davidson interrupted by the caller at iteration {iteration}");
            return Err(EigenErrorKind::Interrupted { report }.into());
        }
    }

    let report = SolveReport {
        method: Method::Davidson,
        iterations: params.max_iterations,
        converged: false,
        delta: tracker.last_delta().unwrap_or(f64::INFINITY),
        basis_size: basis.len(),
    };
    log::warn!(
        "Davidson did not converge in {} iterations (delta {:.3e})",
        report.iterations,
        report.delta
    );
    Err(EigenErrorKind::NonConvergence { report }.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::dyn_stack::MemBuffer;

    /// Symmetric, diagonally dominant test matrix with a deterministic coupling.
    fn coupled_diagonal(n: usize, coupling: f64) -> Mat<f64> {
        Mat::from_fn(n, n, |i, j| {
            if i == j {
                (i + 1) as f64
            } else {
                coupling / (1.0 + i.abs_diff(j) as f64)
            }
        })
    }

    fn run(a: &Mat<f64>, params: &DavidsonParams) -> Result<EigenSolution, EigenError> {
        let operator = a.as_ref();
        let mut mem = MemBuffer::new(davidson_scratch(&operator, params));
        let stack = MemStack::new(&mut mem);
        davidson(&operator, params, stack, None)
    }

    #[test]
    fn test_matches_dense_eigenvalues() {
        let n = 60;
        let a = coupled_diagonal(n, 0.01);
        let params = DavidsonParams {
            n_roots: 3,
            tol: 1e-10,
            ..DavidsonParams::default()
        };
        let solution = run(&a, &params).unwrap();

        let reference = a.as_ref().self_adjoint_eigen(faer::Side::Lower).unwrap();
        let exact = reference.S();
        for k in 0..3 {
            assert!((solution.eigenvalues[k] - exact[k]).abs() < 1e-8);
        }
        assert!(solution.report.converged);
        assert_eq!(solution.report.method, Method::Davidson);
        let vectors = solution.eigenvectors.unwrap();
        assert_eq!((vectors.nrows(), vectors.ncols()), (n, 3));
    }

    #[test]
    fn test_diagonal_matrix_converges_immediately() {
        let a = Mat::from_fn(10, 10, |i, j| if i == j { (i + 1) as f64 } else { 0.0 });
        let solution = run(&a, &DavidsonParams::with_roots(2)).unwrap();
        assert!((solution.eigenvalues[0] - 1.0).abs() < 1e-14);
        assert!((solution.eigenvalues[1] - 2.0).abs() < 1e-14);
        // Pass 0 stores the values, pass 1 sees no change.
        assert_eq!(solution.report.iterations, 2);
        assert_eq!(solution.report.basis_size, 2);
    }

    #[test]
    fn test_overflow_is_reported() {
        let a = coupled_diagonal(30, 0.05);
        let params = DavidsonParams {
            n_roots: 2,
            max_basis_multiplier: 1,
            ..DavidsonParams::default()
        };
        let err = run(&a, &params).unwrap_err();
        assert_eq!(err.kind(), &EigenErrorKind::BasisOverflow { capacity: 2 });
    }

    #[test]
    fn test_iteration_cap_is_reported() {
        let a = coupled_diagonal(30, 0.05);
        let params = DavidsonParams {
            n_roots: 2,
            max_iterations: 1,
            ..DavidsonParams::default()
        };
        let err = run(&a, &params).unwrap_err();
        let report = err.report().copied().unwrap();
        assert!(!report.converged);
        assert_eq!(report.iterations, 1);
        assert!(matches!(err.kind(), EigenErrorKind::NonConvergence { .. }));
    }

    #[test]
    fn test_invalid_root_count() {
        let a = coupled_diagonal(4, 0.05);
        let err = run(&a, &DavidsonParams::with_roots(0)).unwrap_err();
        assert!(matches!(err.kind(), EigenErrorKind::InputError(_)));
        let err = run(&a, &DavidsonParams::with_roots(5)).unwrap_err();
        assert!(matches!(err.kind(), EigenErrorKind::InputError(_)));
    }

    #[test]
    fn test_single_root_matches_dense_eigenvalue() {
        let a = coupled_diagonal(40, 0.05);
        let params = DavidsonParams {
            tol: 1e-10,
            ..DavidsonParams::with_roots(1)
        };
        let solution = run(&a, &params).unwrap();
        let reference = a.as_ref().self_adjoint_eigen(faer::Side::Lower).unwrap();
        assert!((solution.eigenvalues[0] - reference.S()[0]).abs() < 1e-8);
        assert!(solution.report.converged);
    }

    #[test]
    fn test_non_square_operator_is_rejected() {
        let a = Mat::<f64>::zeros(4, 3);
        let err = run(&a, &DavidsonParams::with_roots(1)).unwrap_err();
        assert!(matches!(err.kind(), EigenErrorKind::InputError(_)));
    }

    #[test]
    fn test_callback_sees_orthonormal_basis_and_can_stop() {
        let a = coupled_diagonal(40, 0.05);
        let operator = a.as_ref();
        let params = DavidsonParams {
            n_roots: 2,
            tol: 1e-12,
            ..DavidsonParams::default()
        };
        let mut mem = MemBuffer::new(davidson_scratch(&operator, &params));
        let stack = MemStack::new(&mut mem);

        let mut passes = 0;
        let mut callback = |snapshot: &DavidsonSnapshot<'_>| {
            let l = snapshot.basis.ncols();
            let gram = snapshot.basis.transpose() * snapshot.basis;
            assert!((&gram - &Mat::<f64>::identity(l, l)).norm_l2() < 1e-8);
            assert!(snapshot.eigenvalues.windows(2).all(|w| w[0] <= w[1]));
            passes += 1;
            snapshot.iteration < 1
        };
        let err = davidson(&operator, &params, stack, Some(&mut callback)).unwrap_err();
        assert!(matches!(err.kind(), EigenErrorKind::Interrupted { .. }));
        assert_eq!(passes, 2);
    }
}
