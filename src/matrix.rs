//! This module defines the operator abstraction consumed by every solver in the crate.
//!
//! Iterative eigensolvers never need the individual entries of a matrix. Their
//! fundamental operation is the matrix-vector product, which faer already formalizes
//! as [`faer::matrix_free::LinOp`]. The Davidson method needs exactly one more piece of
//! information: the diagonal of the operator, which drives the preconditioner.
//!
//! [`MatrixOperator`] extends `LinOp<f64>` with that diagonal. It is implemented for
//! dense views ([`MatRef`]) and for compressed sparse column views
//! ([`SparseColMatRef`]), so the same solver runs against small dense test matrices and
//! large sparse problems without changes to the core logic.

use faer::{MatRef, matrix_free::LinOp, sparse::SparseColMatRef};

/// A real symmetric operator that exposes its diagonal.
///
/// The operator is applied through the [`LinOp`] supertrait, which works on blocks of
/// columns at once. This lets the Davidson solver batch all of the matrix-vector
/// products of one iteration into a single call.
///
/// # Example
///
/// ```rust
/// use davidson_project::matrix::MatrixOperator;
/// use faer::Mat;
///
/// let a = Mat::from_fn(3, 3, |i, j| if i == j { (i + 1) as f64 } else { 0.1 });
/// let operator = a.as_ref();
/// assert_eq!(operator.dimension(), 3);
/// assert_eq!(operator.diagonal_entries(), vec![1.0, 2.0, 3.0]);
/// ```
pub trait MatrixOperator: LinOp<f64> {
    /// Returns the `n` diagonal entries `A_ii` of the operator.
    fn diagonal_entries(&self) -> Vec<f64>;

    /// Returns the dimension `n` of the (square) operator.
    #[inline]
    fn dimension(&self) -> usize {
        self.nrows()
    }
}

impl MatrixOperator for MatRef<'_, f64> {
    fn diagonal_entries(&self) -> Vec<f64> {
        let n = self.nrows().min(self.ncols());
        (0..n).map(|i| self[(i, i)]).collect()
    }
}

/// Sparse operators only store their non-zeros; a missing diagonal entry is zero.
impl MatrixOperator for SparseColMatRef<'_, usize, f64> {
    fn diagonal_entries(&self) -> Vec<f64> {
        let n = self.nrows().min(self.ncols());
        let mut diag = vec![0.0; n];
        for (j, d) in diag.iter_mut().enumerate() {
            for (&i, &val) in self
                .row_idx_of_col_raw(j)
                .iter()
                .zip(self.val_of_col(j).iter())
            {
                if i == j {
                    *d += val;
                }
            }
        }
        diag
    }
}
