//! Power iteration for the dominant eigenpair of a symmetric operator.
//!
//! Starting from `v_0`, each step computes `v_{i+1} = A v_i / ||A v_i||`. The iterates
//! converge to the eigenvector of the eigenvalue with the largest magnitude at a rate of
//! `|λ_2 / λ_1|` per step. The eigenvalue is recovered at the end with the Rayleigh
//! quotient `v^T A v`.

use super::{
    EigenError, EigenErrorKind, EigenPair, Instability, IterationParams, Method, SolveReport,
    dot, normalized, sign_agnostic_distance,
};
use faer::{
    Mat, MatRef, Par,
    dyn_stack::{MemStack, StackReq},
    matrix_free::LinOp,
};

/// Scratch space required by [`power_iteration`].
pub fn power_scratch<O: LinOp<f64> + ?Sized>(operator: &O, par: Par) -> StackReq {
    operator.apply_scratch(1, par)
}

/// Runs power iteration from the starting vector `start`.
///
/// The iteration stops when two consecutive unit iterates are closer than `params.tol`
/// up to sign. The sign of the returned eigenvector is arbitrary.
///
/// # Errors
/// * [`EigenErrorKind::NonConvergence`] after `params.max_iter` steps.
/// * [`Instability::ZeroVector`] if an iterate lies in the null space of the operator.
/// * [`EigenErrorKind::InputError`] if the operator is not square.
/// * [`EigenErrorKind::DimensionMismatch`] if `start` does not match the operator.
pub fn power_iteration<O: LinOp<f64> + ?Sized>(
    operator: &O,
    start: MatRef<'_, f64>,
    params: &IterationParams,
    par: Par,
    stack: &mut MemStack,
) -> Result<EigenPair, EigenError> {
    params.validate()?;
    if operator.nrows() != operator.ncols() {
        return Err(EigenErrorKind::InputError(format!(
            "the operator must be square, got {} x {}.",
            operator.nrows(),
            operator.ncols()
        ))
        .into());
    }
    if operator.ncols() != start.nrows() {
        return Err(EigenErrorKind::DimensionMismatch {
            operator_cols: operator.ncols(),
            vector_rows: start.nrows(),
        }
        .into());
    }
    let n = start.nrows();

    let mut v = normalized(start).ok_or(Instability::ZeroVector)?;
    let mut image = Mat::<f64>::zeros(n, 1);
    let mut delta = f64::INFINITY;

    for it in 0..params.max_iter {
        operator.apply(image.as_mut(), v.as_ref(), par, stack);
        let next = normalized(image.as_ref()).ok_or(Instability::ZeroVector)?;
        delta = sign_agnostic_distance(next.as_ref(), v.as_ref());
        v = next;

        if delta < params.tol {
            // Rayleigh quotient of the final iterate.
            operator.apply(image.as_mut(), v.as_ref(), par, stack);
            let eigenvalue = dot(v.as_ref(), image.as_ref());
            log::info!(
                "{} converged in {} iterations with delta = {delta:.2e}",
                Method::PowerIteration,
                it + 1
            );
            return Ok(EigenPair {
                eigenvalue,
                eigenvector: v,
                report: SolveReport {
                    method: Method::PowerIteration,
                    iterations: it + 1,
                    converged: true,
                    delta,
                    basis_size: 1,
                },
            });
        }
    }

    log::warn!("{} not converged (delta = {delta:.2e})", Method::PowerIteration);
    Err(EigenErrorKind::NonConvergence {
        report: SolveReport {
            method: Method::PowerIteration,
            iterations: params.max_iter,
            converged: false,
            delta,
            basis_size: 1,
        },
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::{dyn_stack::MemBuffer, mat};

    fn run(a: &Mat<f64>, start: &Mat<f64>, params: &IterationParams) -> Result<EigenPair, EigenError> {
        let operator = a.as_ref();
        let mut mem = MemBuffer::new(power_scratch(&operator, Par::Seq));
        let stack = MemStack::new(&mut mem);
        power_iteration(&operator, start.as_ref(), params, Par::Seq, stack)
    }

    #[test]
    fn test_dominant_eigenpair_of_diagonal_matrix() {
        let a: Mat<f64> = mat![[1.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 5.0]];
        let start = Mat::from_fn(3, 1, |_, _| 1.0);
        let params = IterationParams {
            max_iter: 1000,
            tol: 1e-10,
        };
        let pair = run(&a, &start, &params).unwrap();
        assert!((pair.eigenvalue - 5.0).abs() < 1e-12);
        assert!((pair.eigenvector[(2, 0)].abs() - 1.0).abs() < 1e-10);
        assert!(pair.report.converged);
        assert_eq!(pair.report.basis_size, 1);
    }

    #[test]
    fn test_negative_dominant_eigenvalue() {
        // Iterates flip sign every step; the sign-agnostic test still converges.
        let a: Mat<f64> = mat![[-4.0, 0.0], [0.0, 1.0]];
        let start: Mat<f64> = mat![[1.0], [1.0]];
        let pair = run(&a, &start, &IterationParams::default()).unwrap();
        assert!((pair.eigenvalue + 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_null_space_start_is_rejected() {
        let a: Mat<f64> = mat![[1.0, 0.0], [0.0, 0.0]];
        let start: Mat<f64> = mat![[0.0], [1.0]];
        let err = run(&a, &start, &IterationParams::default()).unwrap_err();
        assert_eq!(
            err.kind(),
            &EigenErrorKind::NumericalInstability(Instability::ZeroVector)
        );
    }

    #[test]
    fn test_iteration_cap_carries_report() {
        let a: Mat<f64> = mat![[1.0, 0.0], [0.0, 1.01]];
        let start: Mat<f64> = mat![[1.0], [1.0]];
        let params = IterationParams {
            max_iter: 3,
            tol: 1e-12,
        };
        let err = run(&a, &start, &params).unwrap_err();
        let report = err.report().copied().unwrap();
        assert_eq!(report.method, Method::PowerIteration);
        assert_eq!(report.iterations, 3);
        assert!(!report.converged);
    }

    #[test]
    fn test_non_square_operator_is_rejected() {
        let a = Mat::<f64>::zeros(3, 2);
        let start: Mat<f64> = mat![[1.0], [1.0]];
        let err = run(&a, &start, &IterationParams::default()).unwrap_err();
        assert!(matches!(err.kind(), EigenErrorKind::InputError(_)));
    }
}
