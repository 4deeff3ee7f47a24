//! This module defines the custom error types for the library.
//!
//! Every failure that the Davidson solver, the single-vector iterations or the
//! Gram-Schmidt decomposition can report is collected into a single enum,
//! [`EigenErrorKind`], wrapped by the public [`EigenError`].
//!
//! Using the [`thiserror`] crate allows us to create idiomatic error types with minimal
//! boilerplate. Note that [`faer::linalg::evd::EvdError`] does not implement the standard
//! [`std::error::Error`] trait, so we wrap it manually to provide a compatible error type.
//!
//! A correction vector that is already spanned by the Davidson basis is not an error: the
//! solver skips it.
use crate::algorithms::SolveReport;
use thiserror::Error;

/// Represents all possible errors that can occur during an eigenvalue computation.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct EigenError(#[from] EigenErrorKind);

impl EigenError {
    /// Returns the specific kind of failure, for callers that want to retry with
    /// different parameters depending on what went wrong.
    pub fn kind(&self) -> &EigenErrorKind {
        &self.0
    }

    /// Returns the iteration report attached to non-convergence and interruption errors.
    pub fn report(&self) -> Option<&SolveReport> {
        match &self.0 {
            EigenErrorKind::NonConvergence { report } | EigenErrorKind::Interrupted { report } => {
                Some(report)
            }
            _ => None,
        }
    }
}

/// The distinct kinds of errors.
#[derive(Error, Debug, PartialEq)]
pub enum EigenErrorKind {
    /// The iteration cap was exhausted before the convergence criterion was met.
    #[error(
        "{} did not converge after {} iterations (last delta {:.3e}).",
        .report.method,
        .report.iterations,
        .report.delta
    )]
    NonConvergence { report: SolveReport },

    /// A caller-supplied callback asked the solver to stop.
    #[error("{} was interrupted by the caller after {} iterations.", .report.method, .report.iterations)]
    Interrupted { report: SolveReport },

    /// The trial subspace would grow past its configured capacity.
    #[error(
        "Basis overflow: the trial subspace is full at capacity {capacity}. Increase the basis multiplier or enable collapsing."
    )]
    BasisOverflow { capacity: usize },

    /// A numerical kernel produced, or was about to produce, a meaningless result.
    #[error("Numerical instability: {0}")]
    NumericalInstability(#[from] Instability),

    /// Indicates that the dimensions of the operator and an input are incompatible.
    #[error(
        "Dimension mismatch: operator has {operator_cols} columns but vector has {vector_rows} rows."
    )]
    DimensionMismatch {
        operator_cols: usize,
        vector_rows: usize,
    },

    /// Indicates that an invalid input parameter was provided to a function.
    #[error("Invalid input parameter: {0}")]
    InputError(String),
}

/// The numerical failure modes grouped under [`EigenErrorKind::NumericalInstability`].
#[derive(Error, Debug, PartialEq)]
pub enum Instability {
    /// The Davidson denominator `λ_k - A_ii` vanished for some coordinate.
    #[error("preconditioner pole for root {root} at diagonal index {index}")]
    PreconditionerPole { root: usize, index: usize },

    /// The shifted matrix `A - σI` could not be inverted.
    #[error("the shifted matrix is singular for shift {shift}")]
    SingularShift { shift: f64 },

    /// An iterate collapsed to the zero vector and cannot be normalized.
    #[error("the iterate collapsed to the zero vector")]
    ZeroVector,

    /// A column of the input to Gram-Schmidt is linearly dependent on its predecessors.
    #[error("column {column} is linearly dependent on the preceding columns")]
    DependentColumn { column: usize },

    /// Wraps an error originating from [`faer`]'s eigendecomposition module.
    #[error("eigendecomposition of the projected matrix failed: {0:?}")]
    Evd(faer::linalg::evd::EvdError),
}

impl From<Instability> for EigenError {
    fn from(value: Instability) -> Self {
        EigenError(EigenErrorKind::NumericalInstability(value))
    }
}

// Manually implement PartialEq for the public error type.
// We compare the inner `EigenErrorKind`.
impl PartialEq for EigenError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

// Unit tests to ensure error messages are formatted correctly.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::Method;

    #[test]
    fn test_basis_overflow_message() {
        let error = EigenError(EigenErrorKind::BasisOverflow { capacity: 20 });
        let expected_message = "Basis overflow: the trial subspace is full at capacity 20. Increase the basis multiplier or enable collapsing.";
        assert_eq!(error.to_string(), expected_message);
        assert!(error.report().is_none());
    }

    #[test]
    fn test_non_convergence_message() {
        let report = SolveReport {
            method: Method::PowerIteration,
            iterations: 1000,
            converged: false,
            delta: 2.5e-3,
            basis_size: 1,
        };
        let error = EigenError(EigenErrorKind::NonConvergence { report });
        assert_eq!(
            error.to_string(),
            "power iteration did not converge after 1000 iterations (last delta 2.500e-3)."
        );
        assert_eq!(error.report().map(|r| r.iterations), Some(1000));
    }

    #[test]
    fn test_instability_message() {
        let error = EigenError::from(Instability::PreconditionerPole { root: 2, index: 7 });
        assert_eq!(
            error.to_string(),
            "Numerical instability: preconditioner pole for root 2 at diagonal index 7"
        );
        assert_eq!(
            error.kind(),
            &EigenErrorKind::NumericalInstability(Instability::PreconditionerPole {
                root: 2,
                index: 7
            })
        );
    }

    #[test]
    fn test_dimension_mismatch_error_message() {
        let error = EigenError(EigenErrorKind::DimensionMismatch {
            operator_cols: 100,
            vector_rows: 99,
        });
        let expected_message =
            "Dimension mismatch: operator has 100 columns but vector has 99 rows.";
        assert_eq!(error.to_string(), expected_message);
    }

    #[test]
    fn test_evd_error_message() {
        let evd_error = faer::linalg::evd::EvdError::NoConvergence;
        let error = EigenError::from(Instability::Evd(evd_error));
        // Note: the message uses the `Debug` format for the inner error.
        let expected_message = "Numerical instability: eigendecomposition of the projected matrix failed: NoConvergence";
        assert_eq!(error.to_string(), expected_message);
    }
}
