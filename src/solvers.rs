//! This module provides a high-level, user-friendly API for the eigensolvers.
//!
//! The functions here allocate the workspace required by the lower-level routines in
//! [`crate::algorithms`], draw random starting vectors where needed, and forward to them.

pub use crate::algorithms::gram_schmidt::gram_schmidt;

use crate::{
    algorithms::{
        EigenPair, IterationParams,
        davidson::{self, DavidsonCallback, DavidsonParams, EigenSolution, davidson_scratch},
        inverse, power, random_unit_vector,
    },
    error::EigenError,
    matrix::MatrixOperator,
};
use faer::{
    MatRef, Par,
    dyn_stack::{MemBuffer, MemStack},
    matrix_free::LinOp,
};
use rand::Rng;

/// Computes the `params.n_roots` lowest eigenpairs of a symmetric operator with the block
/// Davidson-Liu method.
///
/// # Arguments
/// * `operator`: A symmetric operator implementing [`MatrixOperator`], e.g. a dense
///   `MatRef<'_, f64>` or a sparse `SparseColMatRef<'_, usize, f64>`.
/// * `params`: Iteration parameters, see [`DavidsonParams`].
///
/// # Returns
/// The eigenvalues in ascending order and, if requested, the matching unit eigenvectors.
pub fn solve_eigenpairs<O: MatrixOperator + ?Sized>(
    operator: &O,
    params: &DavidsonParams,
) -> Result<EigenSolution, EigenError> {
    let mut mem = MemBuffer::new(davidson_scratch(operator, params));
    let stack = MemStack::new(&mut mem);
    davidson::davidson(operator, params, stack, None)
}

/// Same as [`solve_eigenpairs`], but invokes `callback` after every pass.
///
/// Returning `false` from the callback stops the solve with
/// [`crate::error::EigenErrorKind::Interrupted`].
pub fn solve_eigenpairs_with_callback<O: MatrixOperator + ?Sized>(
    operator: &O,
    params: &DavidsonParams,
    callback: &mut DavidsonCallback<'_>,
) -> Result<EigenSolution, EigenError> {
    let mut mem = MemBuffer::new(davidson_scratch(operator, params));
    let stack = MemStack::new(&mut mem);
    davidson::davidson(operator, params, stack, Some(callback))
}

/// Computes the dominant eigenpair of `operator` by power iteration from a random start.
///
/// The starting vector has entries drawn uniformly from `[0, 1)` using `rng`, so a seeded
/// generator makes the result reproducible.
pub fn power_iteration<O: LinOp<f64> + ?Sized, R: Rng>(
    operator: &O,
    params: &IterationParams,
    rng: &mut R,
) -> Result<EigenPair, EigenError> {
    let start = random_unit_vector(operator.ncols(), rng)?;
    let mut mem = MemBuffer::new(power::power_scratch(operator, Par::Seq));
    let stack = MemStack::new(&mut mem);
    power::power_iteration(operator, start.as_ref(), params, Par::Seq, stack)
}

/// Computes the eigenpair of the dense symmetric `matrix` whose eigenvalue is closest to
/// `shift`, by shifted inverse iteration from a random start.
pub fn inverse_iteration<R: Rng>(
    matrix: MatRef<'_, f64>,
    shift: f64,
    params: &IterationParams,
    rng: &mut R,
) -> Result<EigenPair, EigenError> {
    let start = random_unit_vector(matrix.ncols(), rng)?;
    inverse::inverse_iteration(matrix, shift, start.as_ref(), params)
}
