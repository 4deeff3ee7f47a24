//! Shifted inverse iteration for the eigenpair closest to a shift `σ`.
//!
//! Power iteration applied to `(A - σI)^{-1}` converges to the eigenvector whose
//! eigenvalue is nearest to `σ`, at a rate of `|λ_1 - σ| / |λ_2 - σ|`. The shifted matrix
//! is factorized once with a partial-pivoting LU decomposition and every step solves
//! against the factors. The eigenvalue is recovered from the Rayleigh quotient of the
//! inverse, `λ = 1 / (v^T (A - σI)^{-1} v) + σ`.

use super::{
    EigenError, EigenErrorKind, EigenPair, Instability, IterationParams, Method, SolveReport,
    dot, normalized, sign_agnostic_distance,
};
use faer::{Mat, MatRef, prelude::*};

/// Runs inverse iteration on the dense symmetric matrix `matrix` with shift `shift`.
///
/// # Errors
/// * [`Instability::SingularShift`] if `A - σI` is singular to working precision, so that
///   the solves produce non-finite values.
/// * [`EigenErrorKind::NonConvergence`] after `params.max_iter` steps.
/// * [`EigenErrorKind::InputError`] if `matrix` is not square or the shift is not finite.
/// * [`EigenErrorKind::DimensionMismatch`] if `start` does not match `matrix`.
pub fn inverse_iteration(
    matrix: MatRef<'_, f64>,
    shift: f64,
    start: MatRef<'_, f64>,
    params: &IterationParams,
) -> Result<EigenPair, EigenError> {
    params.validate()?;
    if matrix.nrows() != matrix.ncols() {
        return Err(EigenErrorKind::InputError(format!(
            "the matrix must be square, got {} x {}.",
            matrix.nrows(),
            matrix.ncols()
        ))
        .into());
    }
    if matrix.ncols() != start.nrows() {
        return Err(EigenErrorKind::DimensionMismatch {
            operator_cols: matrix.ncols(),
            vector_rows: start.nrows(),
        }
        .into());
    }
    if !shift.is_finite() {
        return Err(EigenErrorKind::InputError(format!("the shift must be finite, got {shift}.")).into());
    }
    let n = matrix.nrows();

    let shifted = Mat::from_fn(n, n, |i, j| {
        if i == j {
            matrix[(i, j)] - shift
        } else {
            matrix[(i, j)]
        }
    });
    let lu = shifted.partial_piv_lu();
    let singular = || EigenError::from(Instability::SingularShift { shift });

    let mut v = normalized(start).ok_or(Instability::ZeroVector)?;
    let mut delta = f64::INFINITY;

    for it in 0..params.max_iter {
        let w = lu.solve(&v);
        if !w.norm_l2().is_finite() {
            return Err(singular());
        }
        let next = normalized(w.as_ref()).ok_or(Instability::ZeroVector)?;
        delta = sign_agnostic_distance(next.as_ref(), v.as_ref());
        v = next;

        if delta < params.tol {
            let q = dot(v.as_ref(), lu.solve(&v).as_ref());
            if q == 0.0 || !q.is_finite() {
                return Err(singular());
            }
            let eigenvalue = 1.0 / q + shift;
            log::info!(
                "{} converged in {} iterations with delta = {delta:.2e}",
                Method::InverseIteration,
                it + 1
            );
            return Ok(EigenPair {
                eigenvalue,
                eigenvector: v,
                report: SolveReport {
                    method: Method::InverseIteration,
                    iterations: it + 1,
                    converged: true,
                    delta,
                    basis_size: 1,
                },
            });
        }
    }

    log::warn!("{} not converged (delta = {delta:.2e})", Method::InverseIteration);
    Err(EigenErrorKind::NonConvergence {
        report: SolveReport {
            method: Method::InverseIteration,
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
    use faer::mat;

    fn ones(n: usize) -> Mat<f64> {
        Mat::from_fn(n, 1, |_, _| 1.0)
    }

    #[test]
    fn test_finds_interior_eigenvalue() {
        let a: Mat<f64> = mat![[1.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 7.0]];
        let params = IterationParams {
            max_iter: 1000,
            tol: 1e-12,
        };
        let pair = inverse_iteration(a.as_ref(), 3.2, ones(3).as_ref(), &params).unwrap();
        assert!((pair.eigenvalue - 3.0).abs() < 1e-10);
        assert!((pair.eigenvector[(1, 0)].abs() - 1.0).abs() < 1e-10);
        assert_eq!(pair.report.method, Method::InverseIteration);
    }

    #[test]
    fn test_symmetric_coupled_matrix() {
        // Eigenvalues 1 and 3 with eigenvectors (1, -1)/√2 and (1, 1)/√2.
        let a: Mat<f64> = mat![[2.0, 1.0], [1.0, 2.0]];
        let start: Mat<f64> = mat![[1.0], [0.0]];
        let pair =
            inverse_iteration(a.as_ref(), 0.9, start.as_ref(), &IterationParams::default()).unwrap();
        assert!((pair.eigenvalue - 1.0).abs() < 1e-9);
        let exact: Mat<f64> = mat![[1.0], [-1.0]];
        let exact = normalized(exact.as_ref()).unwrap();
        assert!(sign_agnostic_distance(pair.eigenvector.as_ref(), exact.as_ref()) < 1e-5);
    }

    #[test]
    fn test_shift_on_eigenvalue_is_singular() {
        let a: Mat<f64> = mat![[1.0, 0.0], [0.0, 2.0]];
        let err =
            inverse_iteration(a.as_ref(), 2.0, ones(2).as_ref(), &IterationParams::default())
                .unwrap_err();
        assert_eq!(
            err.kind(),
            &EigenErrorKind::NumericalInstability(Instability::SingularShift { shift: 2.0 })
        );
    }

    #[test]
    fn test_non_square_matrix_is_rejected() {
        let a = Mat::<f64>::zeros(3, 2);
        let err = inverse_iteration(a.as_ref(), 0.0, ones(2).as_ref(), &IterationParams::default())
            .unwrap_err();
        assert!(matches!(err.kind(), EigenErrorKind::InputError(_)));
        let a = Mat::<f64>::zeros(3, 3);
        let err = inverse_iteration(a.as_ref(), 0.0, ones(2).as_ref(), &IterationParams::default())
            .unwrap_err();
        assert!(matches!(err.kind(), EigenErrorKind::DimensionMismatch { .. }));
    }
}
