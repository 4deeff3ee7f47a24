//! Residuals and Davidson correction vectors.
//!
//! For a Ritz pair `(λ_k, β_k)` the residual is `r_k = A β_k - λ_k β_k`. The Davidson
//! correction approximates `(A - λ_k I)^{-1} r_k` by keeping only the diagonal of `A`:
//!
//! ```text
//! d_k[i] = r_k[i] / (λ_k - A_ii)
//! ```
//!
//! This is cheap and works well when `A` is diagonally dominant. When `λ_k` coincides
//! with a diagonal entry `A_ii` while `r_k[i]` is not round-off, the root is reported as
//! numerically unstable instead of producing an infinite correction. Round-off entries
//! of the residual contribute nothing to the correction.

use super::{EigenError, Instability, normalized};
use faer::{Mat, MatRef, Scale};

/// Diagonal (Davidson) preconditioner built from the diagonal of the operator.
#[derive(Debug, Clone)]
pub struct ResidualPreconditioner {
    diagonal: Vec<f64>,
    diagonal_scale: f64,
}

/// Residuals below this multiple of `ε * scale` are round-off and carry no direction.
const RESIDUAL_FLOOR: f64 = 16.0;

impl ResidualPreconditioner {
    pub fn new(diagonal: Vec<f64>) -> Self {
        let diagonal_scale = diagonal.iter().fold(0.0, |acc: f64, d| acc.max(d.abs()));
        Self {
            diagonal,
            diagonal_scale,
        }
    }

    pub fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    /// Forms `r = A β - λ β` from a Ritz vector and its image under the operator.
    pub fn residual(
        ritz_vector: MatRef<'_, f64>,
        ritz_image: MatRef<'_, f64>,
        eigenvalue: f64,
    ) -> Mat<f64> {
        ritz_image - (ritz_vector * Scale(eigenvalue)).as_ref()
    }

    /// Returns the normalized correction vector for root `root`, or `None` when the
    /// residual is at round-off level (the Ritz pair is already an eigenpair).
    ///
    /// # Errors
    /// [`Instability::PreconditionerPole`] if `λ - A_ii` is zero to machine precision for
    /// some `i` where `r_i` is above round-off.
    pub fn precondition(
        &self,
        root: usize,
        eigenvalue: f64,
        residual: MatRef<'_, f64>,
    ) -> Result<Option<Mat<f64>>, EigenError> {
        debug_assert_eq!(residual.nrows(), self.diagonal.len());
        let scale = self.diagonal_scale.max(eigenvalue.abs());
        if residual.norm_l2() <= RESIDUAL_FLOOR * f64::EPSILON * scale {
            return Ok(None);
        }

        // A vanishing denominator only matters where the residual has weight. On the
        // basis coordinates `r_i` is round-off and the entry is dropped.
        let entry_floor = RESIDUAL_FLOOR * f64::EPSILON * scale;
        let guard = f64::EPSILON * eigenvalue.abs().max(1.0);
        if let Some(index) = (0..residual.nrows()).find(|&i| {
            (eigenvalue - self.diagonal[i]).abs() <= guard && residual[(i, 0)].abs() > entry_floor
        }) {
            log::warn!("Davidson preconditioner pole: root {root}, diagonal index {index}");
            return Err(Instability::PreconditionerPole { root, index }.into());
        }

        let correction = Mat::from_fn(residual.nrows(), 1, |i, _| {
            let r = residual[(i, 0)];
            if r.abs() <= entry_floor {
                0.0
            } else {
                r / (eigenvalue - self.diagonal[i])
            }
        });
        match normalized(correction.as_ref()) {
            Some(unit) => Ok(Some(unit)),
            None => {
                // The correction overflowed: blame the smallest denominator.
                let index = self.closest_diagonal(eigenvalue);
                Err(Instability::PreconditionerPole { root, index }.into())
            }
        }
    }

    fn closest_diagonal(&self, eigenvalue: f64) -> usize {
        self.diagonal
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (eigenvalue - **a).abs().total_cmp(&(eigenvalue - **b).abs()))
            .map_or(0, |(i, _)| i)
    }
}
