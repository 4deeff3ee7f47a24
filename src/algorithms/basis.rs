//! The orthonormal trial subspace of the Davidson method.
//!
//! The basis is an explicit growable list of unit vectors with an explicit capacity.
//! Insertion is checked: once the basis holds `capacity` vectors, [`OrthogonalBasis::insert`]
//! fails with [`EigenErrorKind::BasisOverflow`] instead of silently overwriting a slot.

use super::{EigenError, EigenErrorKind, Instability, gram_schmidt::project_out, normalized};
use faer::{Mat, MatRef};

/// Relative norm below which a column handed to [`OrthogonalBasis::reset_to`] is dropped.
const RESET_DEPENDENCY_TOLERANCE: f64 = 1e-10;

/// An ordered set of orthonormal vectors in `R^n` with a fixed capacity.
#[derive(Debug, Clone)]
pub struct OrthogonalBasis {
    dim: usize,
    capacity: usize,
    vectors: Vec<Mat<f64>>,
}

impl OrthogonalBasis {
    /// Creates an empty basis for vectors of length `dim`.
    pub fn new(dim: usize, capacity: usize) -> Self {
        Self {
            dim,
            capacity,
            vectors: Vec::with_capacity(capacity),
        }
    }

    /// Creates a basis holding the first `count` standard unit vectors `e_0, ..., e_{count-1}`.
    ///
    /// # Errors
    /// [`EigenErrorKind::BasisOverflow`] if `count` exceeds `capacity`, and
    /// [`EigenErrorKind::InputError`] if `count` exceeds `dim`.
    pub fn from_unit_vectors(dim: usize, count: usize, capacity: usize) -> Result<Self, EigenError> {
        if count > dim {
            return Err(EigenErrorKind::InputError(format!(
                "cannot build {count} unit vectors in a space of dimension {dim}"
            ))
            .into());
        }
        let mut basis = Self::new(dim, capacity);
        for k in 0..count {
            basis.insert(super::unit_vector(dim, k).as_ref())?;
        }
        Ok(basis)
    }

    /// Number of vectors currently in the basis (`L`).
    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Maximum number of vectors the basis may hold (`C`).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Length of the vectors in the basis.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Iterates over the basis vectors as `n x 1` views, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = MatRef<'_, f64>> + Clone {
        self.vectors.iter().map(|v| v.as_ref())
    }

    /// Removes from `vector` its components along every basis vector (modified Gram-Schmidt).
    ///
    /// The result is not renormalized; its norm measures how much of `vector` lies
    /// outside the span of the basis.
    pub fn orthogonalize(&self, vector: MatRef<'_, f64>) -> Mat<f64> {
        debug_assert_eq!(vector.nrows(), self.dim);
        project_out(vector, self.iter())
    }

    /// Normalizes `vector` and appends it to the basis.
    ///
    /// The caller is responsible for passing a vector that is already orthogonal to the
    /// basis, typically the output of [`Self::orthogonalize`].
    ///
    /// # Errors
    /// [`EigenErrorKind::BasisOverflow`] if the basis is full, and
    /// [`Instability::ZeroVector`] if `vector` cannot be normalized.
    pub fn insert(&mut self, vector: MatRef<'_, f64>) -> Result<(), EigenError> {
        if self.is_full() {
            return Err(EigenErrorKind::BasisOverflow {
                capacity: self.capacity,
            }
            .into());
        }
        if vector.nrows() != self.dim {
            return Err(EigenErrorKind::DimensionMismatch {
                operator_cols: self.dim,
                vector_rows: vector.nrows(),
            }
            .into());
        }
        let unit = normalized(vector).ok_or(Instability::ZeroVector)?;
        self.vectors.push(unit);
        Ok(())
    }

    /// Replaces the whole basis by the orthonormalization of `columns`.
    ///
    /// Used to collapse the subspace onto the current Ritz vectors. Columns that are
    /// dependent on the ones before them are dropped.
    pub fn reset_to(&mut self, columns: MatRef<'_, f64>) -> Result<(), EigenError> {
        self.vectors.clear();
        for j in 0..columns.ncols() {
            let column = columns.get(.., j..j + 1);
            let residual = self.orthogonalize(column);
            if residual.norm_l2() > RESET_DEPENDENCY_TOLERANCE * column.norm_l2() {
                self.insert(residual.as_ref())?;
            }
        }
        Ok(())
    }

    /// Returns the basis as an `n x L` matrix whose columns are the basis vectors.
    pub fn as_matrix(&self) -> Mat<f64> {
        Mat::from_fn(self.dim, self.len(), |i, j| self.vectors[j][(i, 0)])
    }

    /// Frobenius norm of `B^T B - I`, zero for an exactly orthonormal basis.
    pub fn orthonormality_error(&self) -> f64 {
        let b = self.as_matrix();
        let gram = b.transpose() * b.as_ref();
        let identity = Mat::<f64>::identity(self.len(), self.len());
        (&gram - &identity).norm_l2()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn test_unit_vector_initialization() {
        let basis = OrthogonalBasis::from_unit_vectors(6, 3, 10).unwrap();
        assert_eq!(basis.len(), 3);
        assert_eq!(basis.capacity(), 10);
        let b = basis.as_matrix();
        assert_eq!(b.nrows(), 6);
        assert_eq!(b.ncols(), 3);
        for j in 0..3 {
            for i in 0..6 {
                assert_eq!(b[(i, j)], if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn test_orthogonalize_does_not_normalize() {
        let basis = OrthogonalBasis::from_unit_vectors(3, 1, 3).unwrap();
        let v: Mat<f64> = mat![[2.0], [3.0], [4.0]];
        let residual = basis.orthogonalize(v.as_ref());
        assert_eq!(residual[(0, 0)], 0.0);
        assert_eq!(residual[(1, 0)], 3.0);
        assert_eq!(residual[(2, 0)], 4.0);
    }

    #[test]
    fn test_insert_past_capacity_overflows() {
        let mut basis = OrthogonalBasis::from_unit_vectors(4, 2, 2).unwrap();
        assert!(basis.is_full());
        let v: Mat<f64> = mat![[0.0], [0.0], [1.0], [0.0]];
        let err = basis.insert(v.as_ref()).unwrap_err();
        assert_eq!(err.kind(), &EigenErrorKind::BasisOverflow { capacity: 2 });
        assert_eq!(basis.len(), 2);
    }

    #[test]
    fn test_zero_vector_is_rejected() {
        let mut basis = OrthogonalBasis::new(3, 3);
        let err = basis.insert(Mat::<f64>::zeros(3, 1).as_ref()).unwrap_err();
        assert_eq!(
            err.kind(),
            &EigenErrorKind::NumericalInstability(Instability::ZeroVector)
        );
    }

    #[test]
    fn test_orthonormality_holds_after_every_insertion() {
        let n = 50;
        let mut rng = StdRng::seed_from_u64(7);
        let mut basis = OrthogonalBasis::from_unit_vectors(n, 2, 30).unwrap();
        while !basis.is_full() {
            let v = Mat::from_fn(n, 1, |_, _| rng.random::<f64>() - 0.5);
            let residual = basis.orthogonalize(v.as_ref());
            basis.insert(residual.as_ref()).unwrap();
            assert!(basis.orthonormality_error() < 1e-8);
        }
        assert_eq!(basis.len(), 30);
    }

    #[test]
    fn test_nearly_dependent_vector_stays_orthogonal() {
        let mut basis = OrthogonalBasis::from_unit_vectors(3, 1, 3).unwrap();
        // Almost parallel to e_0: the second sweep keeps the basis orthonormal.
        let v: Mat<f64> = mat![[1.0], [1e-9], [-2e-9]];
        let residual = basis.orthogonalize(v.as_ref());
        basis.insert(residual.as_ref()).unwrap();
        assert!(basis.orthonormality_error() < 1e-8);
    }

    #[test]
    fn test_reset_to_drops_dependent_columns() {
        let mut basis = OrthogonalBasis::from_unit_vectors(3, 3, 3).unwrap();
        let columns: Mat<f64> = mat![[1.0, 2.0], [1.0, 2.0], [0.0, 0.0]];
        basis.reset_to(columns.as_ref()).unwrap();
        assert_eq!(basis.len(), 1);
        assert!(basis.orthonormality_error() < 1e-12);
    }
}
