//! Convergence bookkeeping for the Davidson iteration.
//!
//! The tracker remembers the Ritz values of the previous iteration and compares them
//! with the current ones. Roots are matched by position: root `k` is the `k`-th lowest
//! Ritz value in both iterations.

/// How the change in the eigenvalue estimates is turned into a stopping decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvergenceCriterion {
    /// Euclidean norm of the change over all target roots, `||λ - λ_old||_2 < tol`.
    ///
    /// A single slowly converging root keeps the whole solve running.
    #[default]
    EigenvalueNorm,
    /// Every root must individually satisfy `|λ_k - λ_old_k| < tol`.
    PerRoot,
}

/// Records the eigenvalue history of one solve and decides convergence.
#[derive(Debug, Clone)]
pub struct ConvergenceTracker {
    n_roots: usize,
    tol: f64,
    criterion: ConvergenceCriterion,
    previous: Option<Vec<f64>>,
    last_delta: Option<f64>,
}

impl ConvergenceTracker {
    pub fn new(n_roots: usize, tol: f64, criterion: ConvergenceCriterion) -> Self {
        Self {
            n_roots,
            tol,
            criterion,
            previous: None,
            last_delta: None,
        }
    }

    /// Compares `current` with the values of the previous call and stores it.
    ///
    /// The first call never reports convergence. Only the first `n_roots` values of
    /// `current` are considered.
    pub fn update(&mut self, current: &[f64]) -> bool {
        let current = &current[..self.n_roots.min(current.len())];
        let converged = match self.previous.as_deref() {
            None => {
                self.last_delta = None;
                false
            }
            Some(previous) => {
                let changes = current.iter().zip(previous).map(|(new, old)| new - old);
                let (delta, converged) = match self.criterion {
                    ConvergenceCriterion::EigenvalueNorm => {
                        let norm = changes.map(|d| d * d).sum::<f64>().sqrt();
                        (norm, norm < self.tol)
                    }
                    ConvergenceCriterion::PerRoot => {
                        let worst = changes.map(f64::abs).fold(0.0, f64::max);
                        (worst, worst < self.tol)
                    }
                };
                self.last_delta = Some(delta);
                converged
            }
        };
        self.previous = Some(current.to_vec());
        converged
    }

    /// The convergence measure computed by the last call to [`Self::update`], if any.
    pub fn last_delta(&self) -> Option<f64> {
        self.last_delta
    }

    pub fn tolerance(&self) -> f64 {
        self.tol
    }
}
