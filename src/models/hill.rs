//! Hill-type dose-response model.
//!
//! The fitter relies on two primitive operations:
//! - the basis value `h(c)` for a given (midpoint, slope), which makes the
//!   model linear in its asymptotes (for OLS)
//! - the predicted response for full parameters (for residuals/diagnostics)
//!
//! plus the closed-form inverse used by the inverse-threshold solve.
//!
//! Model:
//!
//! ```text
//! response(c) = bottom + (top - bottom) * h(c)
//! h(c)        = 1 / (1 + (c / midpoint)^slope)
//! ```
//!
//! With `slope > 0`, `h` runs from 1 (c -> 0, high dilution, full
//! infectivity) to 0 (high serum concentration).

use crate::domain::{HillCurve, HillFit};

/// Basis value `h(c)` for fixed (midpoint, slope).
///
/// Well-behaved at the extremes: `(c/m)^s` overflowing to infinity yields 0,
/// underflowing to zero yields 1.
pub fn hill_basis(concentration: f64, midpoint: f64, slope: f64) -> f64 {
    1.0 / (1.0 + (concentration / midpoint).powf(slope))
}

/// Predicted fraction infectivity at the given concentration.
pub fn response(curve: &HillCurve, concentration: f64) -> f64 {
    let h = hill_basis(concentration, curve.midpoint, curve.slope);
    curve.bottom + (curve.top - curve.bottom) * h
}

/// Concentration at which the curve crosses `target` response, unclamped.
///
/// Returns `None` when the asymptotes preclude a crossing (`top <= target`
/// or `bottom >= target`): the curve then sits entirely on one side of the
/// target and there is no solution at any concentration.
pub fn inverse_concentration(curve: &HillCurve, target: f64) -> Option<f64> {
    let num = curve.top - target;
    let den = target - curve.bottom;
    if !(num > 0.0 && den > 0.0) {
        return None;
    }
    let c = curve.midpoint * (num / den).powf(1.0 / curve.slope);
    c.is_finite().then_some(c)
}

/// Outcome of the inverse-threshold solve against the tested range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IcSolve {
    /// The crossing concentration lies within the tested dilutions.
    InRange(f64),
    /// The crossing lies below the lowest tested concentration: the serum
    /// neutralizes throughout the tested range (off-scale strong).
    /// `bound` is the lowest tested concentration.
    BelowRange { bound: f64 },
    /// The crossing lies above the highest tested concentration: the serum
    /// never neutralizes to the target within the tested range (off-scale
    /// weak). `bound` is the highest tested concentration.
    AboveRange { bound: f64 },
}

/// Solve for the concentration where the fitted response equals `target`,
/// classified against the tested concentration range.
///
/// A curve whose asymptotes preclude a crossing is classified off-scale on
/// the side its asymptotes imply: `top <= target` means the response is
/// below the target everywhere (off-scale strong), `bottom >= target` means
/// it never drops to the target (off-scale weak).
pub fn solve_threshold(fit: &HillFit, target: f64) -> IcSolve {
    match inverse_concentration(&fit.curve, target) {
        Some(c) if c < fit.conc_min => IcSolve::BelowRange {
            bound: fit.conc_min,
        },
        Some(c) if c > fit.conc_max => IcSolve::AboveRange {
            bound: fit.conc_max,
        },
        Some(c) => IcSolve::InRange(c),
        None => {
            if fit.curve.top <= target {
                IcSolve::BelowRange {
                    bound: fit.conc_min,
                }
            } else {
                IcSolve::AboveRange {
                    bound: fit.conc_max,
                }
            }
        }
    }
}
