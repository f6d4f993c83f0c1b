//! Discrete titer estimation.
//!
//! Scans per-dilution percent-neutralization values against a sensitivity
//! threshold (`limit`, e.g. 50 for PRNT50) and reports the dilution step at
//! which neutralization is lost. All readings must line up with the
//! dilution ladder, one per step, in ladder order.

use crate::domain::{DilutionLadder, Reading, Titer};
use crate::error::TiterError;

/// Guard band around `limit` separating clean at-boundary calls from
/// censored ones. Empirically chosen for the reference assay; tunable, not
/// a law of nature.
pub const GUARD_BAND: f64 = 5.0;

/// Infer the discrete titer for one serum/virus pair.
///
/// `readings` holds one percent-neutralization value (or "not done") per
/// ladder step, in ladder order. `below_range` is the censored label
/// reported when the serum fails to neutralize even at the strongest tested
/// dilution by a clear margin (conventionally `<` the first ladder step).
///
/// The scan runs from the weakest (most diluted) step toward the strongest:
///
/// - If the first determined value already exceeds `limit`, the serum is
///   at or above the scale: beyond the guard band that is `>` the weakest
///   step, inside it the weakest step itself.
/// - Otherwise the scan continues until a value first exceeds `limit`; of
///   the crossing step and the last determined weaker step, whichever value
///   is closer to `limit` names the titer (ties favour the crossing step).
/// - If no value ever exceeds `limit`, the first determined value from the
///   strong end decides: more than the guard band below `limit` is the
///   `below_range` label, within it the step itself, and at or above
///   `limit` is an impossible state given the failed first scan.
pub fn discrete_titer(
    ladder: &DilutionLadder,
    readings: &[Reading],
    limit: f64,
    below_range: Titer,
) -> Result<Titer, TiterError> {
    // "No titration at all" outranks every other check, including the
    // ladder validation. The empty list is not "all not done".
    if !readings.is_empty() && readings.iter().all(|r| matches!(r, Reading::NotDone)) {
        return Ok(Titer::NotDetermined);
    }
    if readings.len() != ladder.len() {
        return Err(TiterError::DilutionMismatch(format!(
            "{} reading(s) supplied for a {}-step ladder",
            readings.len(),
            ladder.len()
        )));
    }
    if !limit.is_finite() {
        return Err(TiterError::InvalidInput(format!(
            "discrete limit must be finite, got {limit}"
        )));
    }

    // Weakest dilution first. Interior "not done" steps are skipped; the
    // crossing comparison uses the last determined reading, so they cannot
    // poison it.
    let mut previous: Option<(f64, u32)> = None;
    for (step, reading) in ladder.steps().iter().zip(readings.iter()).rev() {
        let value = match reading {
            Reading::NotDone => continue,
            Reading::Value(v) => *v,
        };

        match previous {
            None => {
                if value > limit {
                    // Neutralizing even at the weakest tested dilution.
                    if value > limit + GUARD_BAND {
                        return Ok(Titer::GreaterThan(step.factor()));
                    }
                    return Ok(Titer::Numeric(step.factor() as f64));
                }
            }
            Some((prev_value, prev_factor)) => {
                if value > limit {
                    // Threshold crossing: report whichever of the two
                    // adjacent determined steps sits closer to the limit,
                    // ties favouring the step that crossed.
                    if (value - limit).abs() <= (prev_value - limit).abs() {
                        return Ok(Titer::Numeric(step.factor() as f64));
                    }
                    return Ok(Titer::Numeric(prev_factor as f64));
                }
            }
        }
        previous = Some((value, step.factor()));
    }

    // Never neutralizing at any tested dilution: the strongest determined
    // reading decides between a censored and an at-boundary call.
    for (step, reading) in ladder.steps().iter().zip(readings.iter()) {
        let value = match reading {
            Reading::NotDone => continue,
            Reading::Value(v) => *v,
        };
        if value < limit - GUARD_BAND {
            return Ok(below_range);
        }
        if value < limit {
            return Ok(Titer::Numeric(step.factor() as f64));
        }
        return Err(TiterError::Internal(format!(
            "step {step} reads {value} >= limit {limit} after a scan that found no value above it"
        )));
    }

    // At least one reading was determined, so the forward scan returned.
    Err(TiterError::Internal(
        "discrete scan exhausted a ladder with determined readings".to_string(),
    ))
}
