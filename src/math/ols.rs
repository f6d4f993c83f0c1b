//! Least squares solver.
//!
//! The Hill curve is linear in its asymptotes given fixed (midpoint, slope),
//! so during the grid search we repeatedly solve tiny regression problems of
//! the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - SVD solves the least-squares problem robustly for tall matrices (many
//!   observations, 1-2 columns). Nalgebra's `QR::solve` is intended for
//!   square systems and will panic for non-square matrices.
//! - With at most 2 columns, SVD cost is negligible next to grid evaluation.

use nalgebra::{DMatrix, DVector};

/// Widest design matrix this crate ever solves (both asymptotes free).
const MAX_COLUMNS: usize = 2;

/// Near-degenerate design columns occur when the candidate midpoint sits far
/// outside the tested range (the basis column is almost constant), so the
/// solve is retried at progressively looser tolerances before the candidate
/// is rejected.
const SVD_TOLERANCES: [f64; 3] = [1e-10, 1e-8, 1e-6];

/// Solve a least squares problem using SVD.
///
/// Returns `None` for under-determined or too-ill-conditioned systems.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    debug_assert_eq!(x.nrows(), y.len());
    if x.ncols() == 0 || x.ncols() > MAX_COLUMNS || x.nrows() < x.ncols() {
        return None;
    }

    let svd = x.clone().svd(true, true);
    SVD_TOLERANCES.iter().find_map(|&tol| {
        svd.solve(y, tol)
            .ok()
            .filter(|beta| beta.iter().all(|v| v.is_finite()))
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
    fn least_squares_solves_single_column() {
        // Fit y = 4x on x = [1,2,3]
        let x = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        let y = DVector::from_row_slice(&[4.0, 8.0, 12.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn least_squares_rejects_under_determined_systems() {
        // One observation cannot determine two asymptotes.
        let x = DMatrix::from_row_slice(1, 2, &[1.0, 0.5]);
        let y = DVector::from_row_slice(&[0.7]);
        assert!(solve_least_squares(&x, &y).is_none());

        // Wider than any design this crate builds.
        let x = DMatrix::from_row_slice(3, 3, &[1.0; 9]);
        let y = DVector::from_row_slice(&[1.0, 1.0, 1.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }
}
