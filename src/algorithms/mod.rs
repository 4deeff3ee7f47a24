//! Building blocks of the eigensolvers.
//!
//! ** NOTE: We recommend using the high-level functions in [`crate::solvers`] instead. The
//! modules below are intended for use cases where fine-grained control over the iteration
//! is required, for example to monitor the trial subspace with a callback.
//!
//! The Davidson-Liu method is decomposed into its components, each in its own module:
//!
//! - [`basis`]: the growing orthonormal trial subspace ([`basis::OrthogonalBasis`]).
//! - [`projection`]: the Rayleigh-Ritz step on that subspace.
//! - [`preconditioner`]: residuals and diagonal-preconditioned corrections.
//! - [`convergence`]: eigenvalue history and the stopping test.
//! - [`davidson`]: the iteration loop composing all of the above.
//!
//! The single-vector methods ([`power`], [`inverse`]) and the Gram-Schmidt QR
//! decomposition ([`gram_schmidt`]) live next to them and share the small vector
//! helpers defined here.

pub mod basis;
pub mod convergence;
pub mod davidson;
pub mod gram_schmidt;
pub mod inverse;
pub mod power;
pub mod preconditioner;
pub mod projection;

pub use crate::error::{EigenError, EigenErrorKind, Instability};

use faer::{Mat, MatRef, Scale};
use std::fmt;

/// Identifies which algorithm produced a [`SolveReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Block Davidson-Liu subspace iteration.
    Davidson,
    /// Power iteration towards the dominant eigenpair.
    PowerIteration,
    /// Shifted inverse iteration towards the eigenpair closest to a shift.
    InverseIteration,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Davidson => "Davidson-Liu",
            Method::PowerIteration => "power iteration",
            Method::InverseIteration => "inverse iteration",
        };
        f.write_str(name)
    }
}

/// Bookkeeping produced by every solver, whether or not it converged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    /// The algorithm that produced the result.
    pub method: Method,
    /// Number of completed iterations.
    pub iterations: usize,
    /// Whether the stopping criterion was met.
    pub converged: bool,
    /// The last value of the convergence measure (eigenvalue change for Davidson,
    /// sign-agnostic vector distance for the single-vector methods).
    pub delta: f64,
    /// Size of the trial subspace at termination (always 1 for single-vector methods).
    pub basis_size: usize,
}

/// Configuration of the single-vector methods ([`power`] and [`inverse`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationParams {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// The iteration stops once consecutive iterates are closer than this, up to sign.
    pub tol: f64,
}

impl Default for IterationParams {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tol: 1e-6,
        }
    }
}

impl IterationParams {
    pub(crate) fn validate(&self) -> Result<(), EigenError> {
        if !(self.tol > 0.0 && self.tol.is_finite()) {
            return Err(EigenErrorKind::InputError(format!(
                "`tol` must be positive and finite, got {}.",
                self.tol
            ))
            .into());
        }
        Ok(())
    }
}

/// Draws a random unit starting vector with entries uniform in `[0, 1)`.
pub(crate) fn random_unit_vector<R: rand::Rng>(
    n: usize,
    rng: &mut R,
) -> Result<Mat<f64>, EigenError> {
    let v = Mat::from_fn(n, 1, |_, _| rng.random::<f64>());
    normalized(v.as_ref()).ok_or_else(|| Instability::ZeroVector.into())
}

/// An approximate eigenpair computed by a single-vector method.
#[derive(Debug, Clone)]
pub struct EigenPair {
    pub eigenvalue: f64,
    /// Unit-norm eigenvector stored as an `n x 1` matrix. Its sign is arbitrary.
    pub eigenvector: Mat<f64>,
    pub report: SolveReport,
}

/// Inner product of two column vectors stored as `n x 1` matrices.
#[inline]
pub(crate) fn dot(a: MatRef<'_, f64>, b: MatRef<'_, f64>) -> f64 {
    debug_assert_eq!(a.nrows(), b.nrows());
    (a.transpose() * b)[(0, 0)]
}

/// Returns `v / ||v||`, or `None` when the norm is zero or not finite.
pub(crate) fn normalized(v: MatRef<'_, f64>) -> Option<Mat<f64>> {
    let norm = v.norm_l2();
    if norm > 0.0 && norm.is_finite() {
        Some(v * Scale(1.0 / norm))
    } else {
        None
    }
}

/// Distance between two unit vectors up to sign: `min(||v - w||, ||v + w||)`.
///
/// Eigenvectors are only defined up to sign, so this is the quantity used both as the
/// stopping test of the single-vector methods and for comparing results in tests.
pub fn sign_agnostic_distance(v: MatRef<'_, f64>, w: MatRef<'_, f64>) -> f64 {
    let minus = (v - w).norm_l2();
    let plus = (v + w).norm_l2();
    minus.min(plus)
}

/// Builds the `n x 1` standard unit vector `e_index`.
pub(crate) fn unit_vector(n: usize, index: usize) -> Mat<f64> {
    Mat::from_fn(n, 1, |i, _| if i == index { 1.0 } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;

    #[test]
    fn test_dot_and_normalized() {
        let a: Mat<f64> = mat![[3.0], [4.0]];
        let b: Mat<f64> = mat![[1.0], [-1.0]];
        assert_eq!(dot(a.as_ref(), b.as_ref()), -1.0);

        let unit = normalized(a.as_ref()).unwrap();
        assert!((unit[(0, 0)] - 0.6).abs() < 1e-15);
        assert!((unit[(1, 0)] - 0.8).abs() < 1e-15);
        assert!(normalized(Mat::<f64>::zeros(2, 1).as_ref()).is_none());
    }

    #[test]
    fn test_sign_agnostic_distance_ignores_sign() {
        let v: Mat<f64> = mat![[0.6], [0.8]];
        let w = &v * Scale(-1.0);
        assert_eq!(sign_agnostic_distance(v.as_ref(), w.as_ref()), 0.0);
        let e0 = unit_vector(2, 0);
        let e1 = unit_vector(2, 1);
        assert!((sign_agnostic_distance(e0.as_ref(), e1.as_ref()) - 2f64.sqrt()).abs() < 1e-15);
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Davidson.to_string(), "Davidson-Liu");
        assert_eq!(Method::InverseIteration.to_string(), "inverse iteration");
    }
}
