//! Continuous titer estimation.
//!
//! Fits a Hill dose-response curve to (concentration, fraction infectivity)
//! samples, solves for the concentration at the target response, and turns
//! the solve into a titer:
//!
//! - a crossing inside the tested range is a plain reciprocal-dilution
//!   number, rounded to two decimals
//! - a crossing above the tested range means the serum is undetectably
//!   weak: `<` the strongest tested dilution
//! - a crossing below the tested range means the serum is off-scale
//!   strong: the ladder's cutoff table supplies the canonical `>` label
//!   and, when extrapolation is requested, the ceiling it must respect
//!
//! A cutoff-table miss is the one soft failure in the crate: it warns and
//! degrades to a bound computed from the boundary concentration itself.

use tracing::warn;

use crate::domain::{CurveShape, HillFit, Sample, Titer};
use crate::error::TiterError;
use crate::fit::fit_hill;
use crate::models::{IcSolve, inverse_concentration, solve_threshold};
use crate::titer::cutoffs::CutoffTable;

/// Infer the continuous titer for one serum/virus/replicate group.
///
/// `limit` is the target neutralization fraction in `(0, 1)` (0.5 for
/// PRNT50); the curve is solved at response `1 - limit`. `interpolate`
/// permits curve-based extrapolation of off-scale-strong titers up to the
/// cutoff ceiling. Returns the titer together with the fitted curve for
/// diagnostics (absent when no titration was performed).
pub fn continuous_titer(
    samples: &[Sample],
    limit: f64,
    shape: CurveShape,
    interpolate: bool,
    cutoffs: &CutoffTable,
) -> Result<(Titer, Option<HillFit>), TiterError> {
    if samples.is_empty() {
        return Ok((Titer::NotDetermined, None));
    }
    if !(limit.is_finite() && limit > 0.0 && limit < 1.0) {
        return Err(TiterError::InvalidInput(format!(
            "continuous limit must lie in (0, 1), got {limit}"
        )));
    }

    let fit = fit_hill(samples, shape)?;
    let target = 1.0 - limit;

    let titer = match solve_threshold(&fit, target) {
        IcSolve::InRange(conc) => Titer::Numeric(round2(1.0 / conc)),

        // Undetectably weak: the response never drops to the target even at
        // the strongest tested dilution.
        IcSolve::AboveRange { bound } => Titer::LessThan((1.0 / bound).round() as u32),

        // Off-scale strong: still neutralizing at the weakest tested
        // dilution.
        IcSolve::BelowRange { bound } => match cutoffs.lookup(bound) {
            Some(cutoff) => {
                if interpolate {
                    match extrapolate_titer(&fit, target) {
                        Ok(reciprocal) if reciprocal > cutoff.ceiling => {
                            Titer::GreaterThan(cutoff.label)
                        }
                        Ok(reciprocal) => Titer::Numeric(round2(reciprocal)),
                        Err(TiterError::CurveFit(reason)) => {
                            warn!(%reason, "extrapolation unavailable, using canonical label");
                            Titer::GreaterThan(cutoff.label)
                        }
                        Err(other) => return Err(other),
                    }
                } else {
                    Titer::GreaterThan(cutoff.label)
                }
            }
            None => {
                warn!(
                    boundary = bound,
                    "boundary concentration not in the cutoff table, reporting a computed bound"
                );
                Titer::GreaterThan((1.0 / bound).round() as u32)
            }
        },
    };

    Ok((titer, Some(fit)))
}

/// Closed-form off-scale inversion of a fitted curve.
///
/// Returns the reciprocal-dilution titer at the target response without
/// clamping to the tested range. Exists strictly for explicit off-scale
/// extrapolation: a target whose solution lies inside the tested range is a
/// precondition violation, not a condition to recover from.
pub fn extrapolate_titer(fit: &HillFit, target: f64) -> Result<f64, TiterError> {
    let conc = inverse_concentration(&fit.curve, target).ok_or_else(|| {
        TiterError::CurveFit(format!(
            "fitted curve (top={}, bottom={}) never crosses response {target}",
            fit.curve.top, fit.curve.bottom
        ))
    })?;
    if conc >= fit.conc_min && conc <= fit.conc_max {
        return Err(TiterError::Internal(format!(
            "extrapolation requested at response {target}, but its solution {conc} lies inside \
             the tested range [{}, {}]",
            fit.conc_min, fit.conc_max
        )));
    }
    Ok(1.0 / conc)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
