//! This module provides generators for the symmetric test problems used by the binaries
//! and the integration tests.
//!
//! Every generator takes the random source as an argument, so a seeded
//! [`rand::rngs::StdRng`] makes the problem reproducible.

use crate::error::{EigenError, EigenErrorKind};
use faer::{
    Mat,
    sparse::{SparseColMat, Triplet},
};
use rand::Rng;
use rand_distr::StandardNormal;

/// Builds the diagonally dominant matrix `A = (D + P + (D + P)^T) / 2`, where
/// `D = diag(1, 2, ..., n)` and `P` has independent `N(0, magnitude^2)` entries.
///
/// For small `magnitude` the `k` lowest eigenvalues are close to `1, ..., k`, and the
/// diagonal is an excellent preconditioner, which is the regime the Davidson method is
/// designed for.
pub fn perturbed_diagonal<R: Rng>(n: usize, magnitude: f64, rng: &mut R) -> Mat<f64> {
    let noise = Mat::from_fn(n, n, |_, _| magnitude * rng.sample::<f64, _>(StandardNormal));
    Mat::from_fn(n, n, |i, j| {
        let diagonal = if i == j { (i + 1) as f64 } else { 0.0 };
        diagonal + 0.5 * (noise[(i, j)] + noise[(j, i)])
    })
}

/// Builds the symmetric positive semi-definite matrix `M M^T`, where `M` has independent
/// entries uniform in `[0, 1)`.
///
/// Its dominant eigenvalue (about `n^2 / 4`) is well separated from the rest of the
/// spectrum, so power iteration converges in a handful of steps.
pub fn random_gram<R: Rng>(n: usize, rng: &mut R) -> Mat<f64> {
    let m = Mat::from_fn(n, n, |_, _| rng.random::<f64>());
    m.as_ref() * m.transpose()
}

/// Sparse counterpart of [`perturbed_diagonal`]: `diag(1, ..., n)` plus symmetric
/// `N(0, magnitude^2)` couplings restricted to `|i - j| <= bandwidth`.
pub fn sparse_perturbed_diagonal<R: Rng>(
    n: usize,
    bandwidth: usize,
    magnitude: f64,
    rng: &mut R,
) -> Result<SparseColMat<usize, f64>, EigenError> {
    let mut triplets = Vec::with_capacity(n * (2 * bandwidth + 1));
    for i in 0..n {
        triplets.push(Triplet {
            row: i,
            col: i,
            val: (i + 1) as f64 + magnitude * rng.sample::<f64, _>(StandardNormal),
        });
        for j in (i + 1)..n.min(i + bandwidth + 1) {
            let val = magnitude * rng.sample::<f64, _>(StandardNormal);
            triplets.push(Triplet { row: i, col: j, val });
            triplets.push(Triplet { row: j, col: i, val });
        }
    }
    SparseColMat::try_new_from_triplets(n, n, &triplets).map_err(|e| {
        EigenErrorKind::InputError(format!("failed to assemble the sparse matrix: {e:?}")).into()
    })
}
