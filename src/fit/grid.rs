//! Candidate grid generation for the Hill fit.
//!
//! The nonlinear parameters (midpoint, slope) are searched on a
//! deterministic log-spaced grid.
//!
//! Why grid search?
//! - It avoids the local-minima and starting-point sensitivity of
//!   unconstrained nonlinear optimization on small, noisy assays.
//! - It is deterministic given the same inputs.
//! - The parameter count is tiny, so a modest grid plus local refinement is
//!   fast enough for whole-plate runs.

use crate::error::TiterError;

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, TiterError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(TiterError::InvalidInput(format!(
            "invalid grid range: min={min}, max={max} (must be finite, >0, and max>min)"
        )));
    }
    if steps < 2 {
        return Err(TiterError::InvalidInput(
            "grid steps must be >= 2".to_string(),
        ));
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push((ln_min + step * i as f64).exp());
    }
    Ok(out)
}

/// Cartesian (midpoint, slope) candidate grid.
pub fn candidate_grid(
    midpoints: &[f64],
    slopes: &[f64],
) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(midpoints.len() * slopes.len());
    for &m in midpoints {
        for &s in slopes {
            out.push((m, s));
        }
    }
    out
}
