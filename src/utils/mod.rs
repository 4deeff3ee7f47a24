//! Common utilities shared by the experiment binary and the test suites.
//!
//! - **`test_problems`**: Reproducible generators for symmetric test matrices, including
//!   the diagonally dominant perturbed diagonal matrix the Davidson method is designed
//!   for and random Gram matrices for the single-vector methods.

pub mod test_problems;
