//! The Rayleigh-Ritz step: projecting the operator onto the trial subspace.
//!
//! Given an orthonormal basis `B` (`n x L`) the projected matrix is
//! `G = B^T (A B)`, a small dense symmetric `L x L` matrix. The `n x n` operator is never
//! formed; only its action on the basis vectors is needed.
//!
//! The image `A B` is cached between iterations. The basis only grows, so each call to
//! [`ProjectedEigensolver::project`] applies the operator to the columns added since the
//! previous call, in a single batched multi-column product.

use super::{EigenError, EigenErrorKind, Instability};
use crate::matrix::MatrixOperator;
use faer::{Mat, MatRef, Par, Side, dyn_stack::MemStack};

/// The lowest Ritz pairs of a projected eigenproblem.
#[derive(Debug, Clone)]
pub struct RitzPairs {
    /// Ritz values `λ_k` in ascending order.
    pub values: Vec<f64>,
    /// `L x n_roots` matrix whose column `k` is the coefficient vector `α_k` of `λ_k`.
    /// The sign of each column is arbitrary.
    pub coefficients: Mat<f64>,
}

impl RitzPairs {
    /// Number of Ritz pairs.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Forms and diagonalizes the projected matrix, caching the operator image `A B`.
#[derive(Debug, Clone)]
pub struct ProjectedEigensolver {
    image: Mat<f64>,
}

impl ProjectedEigensolver {
    /// Creates a solver for an operator of dimension `dim` with an empty image cache.
    pub fn new(dim: usize) -> Self {
        Self {
            image: Mat::zeros(dim, 0),
        }
    }

    /// The cached image `A B`, one column per basis vector seen so far.
    pub fn image(&self) -> MatRef<'_, f64> {
        self.image.as_ref()
    }

    /// Drops the cached image, e.g. after the basis has been collapsed.
    pub fn clear_image(&mut self) {
        self.image = Mat::zeros(self.image.nrows(), 0);
    }

    /// Extends the cached image so that it covers every column of `basis`.
    fn update_image<O: MatrixOperator + ?Sized>(
        &mut self,
        operator: &O,
        basis: MatRef<'_, f64>,
        par: Par,
        stack: &mut MemStack,
    ) {
        let n = basis.nrows();
        let total = basis.ncols();
        if self.image.ncols() > total {
            self.clear_image();
        }
        let cached = self.image.ncols();
        if cached == total {
            return;
        }

        // One batched product for all of the new columns. The call returns only when every
        // column has been computed, so the image is complete before `G` is formed.
        let mut fresh = Mat::<f64>::zeros(n, total - cached);
        operator.apply(fresh.as_mut(), basis.get(.., cached..total), par, stack);

        let image = Mat::from_fn(n, total, |i, j| {
            if j < cached {
                self.image[(i, j)]
            } else {
                fresh[(i, j - cached)]
            }
        });
        self.image = image;
    }

    /// Projects `operator` onto `basis` and returns its `n_roots` lowest Ritz pairs.
    ///
    /// # Errors
    /// [`EigenErrorKind::InputError`] if the basis holds fewer than `n_roots` vectors, and
    /// [`Instability::Evd`] if the dense symmetric eigensolver fails.
    pub fn project<O: MatrixOperator + ?Sized>(
        &mut self,
        operator: &O,
        basis: MatRef<'_, f64>,
        n_roots: usize,
        par: Par,
        stack: &mut MemStack,
    ) -> Result<RitzPairs, EigenError> {
        let l = basis.ncols();
        if l < n_roots {
            return Err(EigenErrorKind::InputError(format!(
                "the subspace holds {l} vectors but {n_roots} roots were requested"
            ))
            .into());
        }
        self.update_image(operator, basis, par, stack);

        let g = basis.transpose() * self.image.as_ref();
        // Remove the round-off asymmetry before calling the symmetric solver.
        let g = Mat::from_fn(l, l, |i, j| 0.5 * (g[(i, j)] + g[(j, i)]));

        let evd = g
            .as_ref()
            .self_adjoint_eigen(Side::Lower)
            .map_err(Instability::Evd)?;
        let s = evd.S();
        let u = evd.U();

        // The solver reports ascending eigenvalues; sort anyway so that the ordering does
        // not depend on that detail.
        let mut order: Vec<usize> = (0..l).collect();
        order.sort_by(|&a, &b| s[a].total_cmp(&s[b]));
        order.truncate(n_roots);

        let values = order.iter().map(|&k| s[k]).collect();
        let coefficients = Mat::from_fn(l, n_roots, |i, k| u[(i, order[k])]);
        Ok(RitzPairs {
            values,
            coefficients,
        })
    }
}
