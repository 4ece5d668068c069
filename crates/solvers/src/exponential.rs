//! Reference matrix-exponential solver.
//!
//! Computes `N(dt) = exp(A·dt)·N(0)` densely by scaling and squaring a
//! truncated Taylor series. It is exact enough for short chains and test
//! problems; production runs plug in a dedicated solver through
//! [`DepletionSolver`].

use burnup_core::{CscMatrix, DepletionSolver};
use ndarray::{Array1, Array2};
use thiserror::Error;

/// Norm below which the scaled matrix is expanded directly.
const SCALED_NORM: f64 = 0.5;

/// Taylor terms kept; with a norm of at most 0.5 the remainder is below
/// double-precision round-off.
const TAYLOR_TERMS: usize = 20;

/// Errors returned by [`ExponentialSolver`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ExponentialError {
    #[error("initial vector has {found} entries, matrix is {expected}x{expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("step length {0} is negative or not finite")]
    InvalidStep(f64),
}

/// Dense scaling-and-squaring exponential solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExponentialSolver;

impl ExponentialSolver {
    /// Returns `exp(A·dt)` as a dense matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ExponentialError::InvalidStep`] for a negative or
    /// non-finite `dt`.
    pub fn propagator(&self, matrix: &CscMatrix, dt: f64) -> Result<Array2<f64>, ExponentialError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(ExponentialError::InvalidStep(dt));
        }

        let n = matrix.dim();
        let mut scaled = Array2::<f64>::zeros((n, n));
        for col in 0..n {
            for (row, value) in matrix.column(col) {
                scaled[[row, col]] = value * dt;
            }
        }

        // Max column sum bounds the spectral radius.
        let norm = scaled
            .columns()
            .into_iter()
            .map(|c| c.iter().map(|v| v.abs()).sum::<f64>())
            .fold(0.0, f64::max);
        let squarings = if norm > SCALED_NORM {
            (norm / SCALED_NORM).log2().ceil() as i32
        } else {
            0
        };
        scaled /= 2f64.powi(squarings);

        let mut result = Array2::<f64>::eye(n);
        let mut term = Array2::<f64>::eye(n);
        for k in 1..=TAYLOR_TERMS {
            term = term.dot(&scaled) / k as f64;
            result += &term;
        }
        for _ in 0..squarings {
            result = result.dot(&result);
        }

        Ok(result)
    }
}

impl DepletionSolver for ExponentialSolver {
    type Error = ExponentialError;

    /// Negative results are round-off and are clamped to zero.
    fn solve(&self, matrix: &CscMatrix, initial: &[f64], dt: f64) -> Result<Vec<f64>, Self::Error> {
        if initial.len() != matrix.dim() {
            return Err(ExponentialError::DimensionMismatch {
                expected: matrix.dim(),
                found: initial.len(),
            });
        }

        let propagator = self.propagator(matrix, dt)?;
        let after = propagator.dot(&Array1::from_vec(initial.to_vec()));
        Ok(after.iter().map(|&v| v.max(0.0)).collect())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use burnup_core::TripletBuilder;

    use super::*;

    fn chain(lambda: f64) -> CscMatrix {
        let mut triplets = TripletBuilder::with_bound(2, 2);
        triplets.push(0, 0, -lambda).unwrap();
        triplets.push(1, 0, lambda).unwrap();
        triplets.finalize()
    }

    #[test]
    fn decays_parent_into_daughter() {
        let after = ExponentialSolver.solve(&chain(0.1), &[1.0, 0.0], 10.0).unwrap();

        assert_relative_eq!(after[0], (-1.0f64).exp(), max_relative = 1e-12);
        assert_relative_eq!(after[1], 1.0 - (-1.0f64).exp(), max_relative = 1e-12);
    }

    #[test]
    fn stiff_chain_conserves_atoms() {
        let after = ExponentialSolver.solve(&chain(1.0e3), &[2.0, 0.5], 1.0e6).unwrap();

        assert_eq!(after[0], 0.0);
        assert_relative_eq!(after[1], 2.5, max_relative = 1e-5);
    }

    #[test]
    fn zero_step_is_identity() {
        let after = ExponentialSolver.solve(&chain(0.3), &[0.7, 0.2], 0.0).unwrap();
        assert_eq!(after, vec![0.7, 0.2]);
    }

    #[test]
    fn rejects_mismatched_input() {
        assert_eq!(
            ExponentialSolver.solve(&chain(0.1), &[1.0], 1.0),
            Err(ExponentialError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            ExponentialSolver.solve(&chain(0.1), &[1.0, 0.0], -1.0),
            Err(ExponentialError::InvalidStep(-1.0))
        );
    }
}
