//! Least squares solver.
//!
//! Forecast models here are linear in their coefficients once the design
//! (trend + seasonal columns) is built, so fitting reduces to:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - SVD solve, so tall designs (many more rows than columns) work and
//!   rank-deficient designs (e.g. a single observation, where the slope
//!   column is all zeros) still yield the minimum-norm solution.
//! - Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices, so it is not used.

use nalgebra::{DMatrix, DVector};

/// Coefficients plus the residual sum of squares.
#[derive(Debug, Clone)]
pub struct LeastSquaresFit {
    pub betas: Vec<f64>,
    pub sse: f64,
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y ≈ X β` for a row-major design and report the SSE.
pub fn fit_least_squares(design: &[Vec<f64>], y: &[f64]) -> Option<LeastSquaresFit> {
    let n = design.len();
    let p = design.first()?.len();
    if n != y.len() || p == 0 {
        return None;
    }

    let x = DMatrix::from_fn(n, p, |i, j| design[i][j]);
    let yv = DVector::from_column_slice(y);
    let beta = solve_least_squares(&x, &yv)?;

    let residuals = &yv - &x * &beta;
    let sse = residuals.iter().map(|r| r * r).sum::<f64>();
    if !sse.is_finite() {
        return None;
    }

    Some(LeastSquaresFit {
        betas: beta.iter().copied().collect(),
        sse,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_reports_residual_sum_of_squares() {
        let design = vec![vec![1.0, 0.0], vec![1.0, 1.0], vec![1.0, 2.0], vec![1.0, 3.0]];
        let y = [1.0, 3.0, 5.0, 8.0];
        let fit = fit_least_squares(&design, &y).unwrap();
        assert_eq!(fit.betas.len(), 2);
        assert!(fit.sse > 0.0 && fit.sse < 1.0);
    }

    #[test]
    fn rank_deficient_design_still_solves() {
        // Single observation: the slope column carries no information.
        let design = vec![vec![1.0, 0.0]];
        let fit = fit_least_squares(&design, &[4.0]).unwrap();
        assert!((fit.betas[0] - 4.0).abs() < 1e-9);
        assert!(fit.sse.abs() < 1e-12);
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        assert!(fit_least_squares(&[vec![1.0]], &[1.0, 2.0]).is_none());
        assert!(fit_least_squares(&[], &[]).is_none());
    }
}
