//! Gram-Schmidt orthogonalization and the QR decomposition built on it.
//!
//! The sweep in [`project_out`] is the numerical primitive shared by the QR
//! decomposition and by [`super::basis::OrthogonalBasis`]: it subtracts from a vector its
//! component along each column of an orthonormal set, one column at a time (modified
//! Gram-Schmidt). Each column is assumed to have unit norm.
//!
//! A single modified sweep loses orthogonality in proportion to the amount of
//! cancellation. When the sweep removes most of the vector (the new direction is
//! nearly dependent on the old ones), a second sweep restores orthogonality to working
//! precision ("twice is enough").

use super::{EigenError, Instability, dot, normalized};
use faer::{Mat, MatRef, Scale};

/// Fraction of the original norm below which a second sweep is performed.
const REORTHOGONALIZATION_RATIO: f64 = 0.5;

/// Relative residual norm below which a column counts as linearly dependent.
const DEPENDENCY_TOLERANCE: f64 = 1e-12;

/// The factors of a QR decomposition `A = Q R`.
#[derive(Debug, Clone)]
pub struct QrFactors {
    /// `m x n` matrix with orthonormal columns.
    pub q: Mat<f64>,
    /// `n x n` matrix `Q^T A`, upper triangular up to round-off.
    pub r: Mat<f64>,
}

/// Removes from `v` its components along every vector yielded by `columns`.
///
/// Returns the residual, which is not renormalized. A second sweep is applied when
/// the first one cancels more than half of the norm of `v`.
pub(crate) fn project_out<'a, I>(v: MatRef<'_, f64>, columns: I) -> Mat<f64>
where
    I: IntoIterator<Item = MatRef<'a, f64>> + Clone,
{
    let original_norm = v.norm_l2();
    let mut residual = sweep(v.to_owned(), columns.clone());
    if residual.norm_l2() < REORTHOGONALIZATION_RATIO * original_norm {
        residual = sweep(residual, columns);
    }
    residual
}

fn sweep<'a, I>(mut v: Mat<f64>, columns: I) -> Mat<f64>
where
    I: IntoIterator<Item = MatRef<'a, f64>>,
{
    for q in columns {
        let coefficient = dot(q, v.as_ref());
        v = v.as_ref() - (q * Scale(coefficient)).as_ref();
    }
    v
}

/// Computes the QR decomposition of `a` by modified Gram-Schmidt.
///
/// Column `i` of `Q` is column `i` of `a` with its components along the previous columns
/// of `Q` removed, then normalized. `R` is formed afterwards as `Q^T A`.
///
/// # Errors
/// Returns [`Instability::DependentColumn`] if a column of `a` vanishes after
/// projection, i.e. `a` does not have full column rank.
pub fn gram_schmidt(a: MatRef<'_, f64>) -> Result<QrFactors, EigenError> {
    let (m, n) = (a.nrows(), a.ncols());
    let mut q = Mat::<f64>::zeros(m, n);

    for i in 0..n {
        let residual = {
            let previous = q.as_ref().get(.., 0..i);
            project_out(a.get(.., i..i + 1), (0..i).map(move |j| previous.get(.., j..j + 1)))
        };
        // Treat a column as dependent once its residual is at round-off level.
        let scale = a.get(.., i..i + 1).norm_l2();
        if residual.norm_l2() <= DEPENDENCY_TOLERANCE * scale {
            return Err(Instability::DependentColumn { column: i }.into());
        }
        let unit = normalized(residual.as_ref()).ok_or(Instability::DependentColumn { column: i })?;
        q.col_mut(i).copy_from(unit.col(0));
    }

    let r = q.transpose() * a;
    Ok(QrFactors { q, r })
}
