//! Block Davidson-Liu eigensolver for the lowest eigenpairs of large symmetric matrices.
//!
//! This crate computes a small number of extremal eigenpairs of a real symmetric operator
//! `A` without diagonalizing it. The core is the block Davidson-Liu method: it maintains a
//! growing orthonormal trial subspace, projects `A` onto it, solves the small projected
//! eigenproblem, and expands the subspace with diagonally preconditioned residuals until
//! the target eigenvalues stop changing.
//!
//! Built on the [`faer`] linear algebra framework, the solvers operate on matrix-free
//! operators ([`faer::matrix_free::LinOp`]) extended with access to the diagonal
//! ([`matrix::MatrixOperator`]). Dense (`MatRef`) and sparse (`SparseColMatRef`) matrices
//! are supported out of the box.
//!
//! ## Algorithms
//!
//! **Davidson-Liu** ([`solve_eigenpairs`]): The `n_roots` lowest eigenpairs. Each iteration
//! costs one batched operator application on the newly added basis vectors plus a dense
//! eigendecomposition of an `L x L` matrix, where `L` is the current subspace size. Works
//! best for diagonally dominant operators.
//!
//! **Power iteration** ([`power_iteration`]): The eigenpair of largest magnitude.
//!
//! **Inverse iteration** ([`inverse_iteration`]): The eigenpair closest to a shift, for
//! dense matrices.
//!
//! **Gram-Schmidt** ([`gram_schmidt`]): The thin QR decomposition of a dense matrix,
//! using the same modified Gram-Schmidt kernel that keeps the Davidson basis orthonormal.
//!
//! ## Example Usage
//!
//! The following example computes the three lowest eigenvalues of a diagonally dominant
//! symmetric matrix and compares them with a dense reference decomposition.
//!
//! ```rust
//! use davidson_project::{DavidsonParams, solve_eigenpairs};
//! use faer::{Mat, Side};
//!
//! // Diagonal 1, 2, ..., n with a weak symmetric coupling.
//! let n = 50;
//! let a = Mat::from_fn(n, n, |i, j| {
//!     if i == j { (i + 1) as f64 } else { 1e-3 / (1.0 + i.abs_diff(j) as f64) }
//! });
//!
//! let params = DavidsonParams {
//!     n_roots: 3,
//!     tol: 1e-10,
//!     ..DavidsonParams::default()
//! };
//! let solution = solve_eigenpairs(&a.as_ref(), &params).unwrap();
//!
//! let reference = a.as_ref().self_adjoint_eigen(Side::Lower).unwrap();
//! for k in 0..3 {
//!     assert!((solution.eigenvalues[k] - reference.S()[k]).abs() < 1e-8);
//! }
//! assert!(solution.report.converged);
//! ```
//!
//! ## Errors
//!
//! Every solver returns [`EigenError`]. Non-convergence and caller interruption carry a
//! [`algorithms::SolveReport`] with the iteration count and the last convergence measure.

pub mod algorithms;
pub mod error;
pub mod matrix;
pub mod solvers;
pub mod utils;

pub use algorithms::{
    EigenPair, IterationParams, SolveReport,
    convergence::ConvergenceCriterion,
    davidson::{DavidsonParams, EigenSolution, OverflowPolicy},
};
pub use error::{EigenError, EigenErrorKind};
pub use matrix::MatrixOperator;
pub use solvers::{gram_schmidt, inverse_iteration, power_iteration, solve_eigenpairs};
