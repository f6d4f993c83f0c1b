//! Plaque-count aggregation and infectivity conversion.
//!
//! Two small, pure stages sit between raw counts and the estimators:
//!
//! - averaging replicate counts per dilution ([`average_plaque_counts`])
//! - normalizing a count against the no-serum control
//!   ([`fraction_infectivity`], [`percent_neutralization`])
//!
//! Censored readings follow conservative policies: a count that exceeded or
//! matched the seeding dose is treated as full infectivity (no
//! neutralization), and "not done" readings pass through untouched.

use crate::domain::{RawCount, Reading};
use crate::error::TiterError;

/// Average replicate plaque counts for one dilution.
///
/// Rules, in priority order:
/// 1. all "not done" -> "not done"
/// 2. all too-many-to-count -> too-many-to-count
/// 3. any mix of only "not done" and too-many-to-count -> too-many-to-count
/// 4. otherwise: arithmetic mean over the numeric values, substituting the
///    control count for too-many/equals-control entries and dropping
///    "not done" entries from the average entirely.
///
/// Fails only when a substitution is required and `control` is not positive.
pub fn average_plaque_counts(counts: &[RawCount], control: f64) -> Result<RawCount, TiterError> {
    if counts.is_empty() {
        return Err(TiterError::InvalidInput(
            "cannot average an empty list of plaque counts".to_string(),
        ));
    }

    let all_censored = counts
        .iter()
        .all(|c| matches!(c, RawCount::NotDone | RawCount::TooMany));
    if all_censored {
        if counts.iter().any(|c| matches!(c, RawCount::TooMany)) {
            return Ok(RawCount::TooMany);
        }
        return Ok(RawCount::NotDone);
    }

    let mut sum = 0.0;
    let mut n = 0usize;
    for c in counts {
        match c {
            RawCount::Counted(v) => {
                sum += v;
                n += 1;
            }
            RawCount::TooMany | RawCount::EqualsControl => {
                if !(control > 0.0) {
                    return Err(TiterError::NonPositiveControl(control));
                }
                sum += control;
                n += 1;
            }
            RawCount::NotDone => {}
        }
    }
    // The all-censored cases were handled above, so at least one value
    // contributed to the sum.
    Ok(RawCount::Counted(sum / n as f64))
}

/// Fraction of control infectivity remaining at one dilution.
///
/// "Not done" passes through; counts at or above the seeding dose mean no
/// neutralization (fraction 1). The numeric path fails on a non-positive
/// control.
pub fn fraction_infectivity(count: RawCount, control: f64) -> Result<Reading, TiterError> {
    match count {
        RawCount::NotDone => Ok(Reading::NotDone),
        RawCount::TooMany | RawCount::EqualsControl => Ok(Reading::Value(1.0)),
        RawCount::Counted(v) => {
            if !(control > 0.0) {
                return Err(TiterError::NonPositiveControl(control));
            }
            Ok(Reading::Value(v / control))
        }
    }
}

/// Percent reduction in plaques relative to the control.
///
/// Same censoring policy as [`fraction_infectivity`]: counts at or above the
/// seeding dose mean 0% neutralization. May be negative when infectivity
/// exceeds the control (experimental noise); that is a valid state.
pub fn percent_neutralization(count: RawCount, control: f64) -> Result<Reading, TiterError> {
    match count {
        RawCount::NotDone => Ok(Reading::NotDone),
        RawCount::TooMany | RawCount::EqualsControl => Ok(Reading::Value(0.0)),
        RawCount::Counted(v) => {
            if !(control > 0.0) {
                return Err(TiterError::NonPositiveControl(control));
            }
            Ok(Reading::Value(100.0 * (1.0 - v / control)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_all_not_done() {
        let counts = [RawCount::NotDone, RawCount::NotDone];
        assert_eq!(
            average_plaque_counts(&counts, 53.0).unwrap(),
            RawCount::NotDone
        );
    }

    #[test]
    fn average_all_too_many() {
        let counts = [RawCount::TooMany, RawCount::TooMany];
        assert_eq!(
            average_plaque_counts(&counts, 53.0).unwrap(),
            RawCount::TooMany
        );
    }

    #[test]
    fn average_mix_of_not_done_and_too_many() {
        let counts = [
            RawCount::NotDone,
            RawCount::NotDone,
            RawCount::TooMany,
            RawCount::TooMany,
        ];
        assert_eq!(
            average_plaque_counts(&counts, 50.0).unwrap(),
            RawCount::TooMany
        );
    }

    #[test]
    fn average_plain_mean() {
        let counts = [RawCount::Counted(20.0), RawCount::Counted(40.0)];
        assert_eq!(
            average_plaque_counts(&counts, 53.0).unwrap(),
            RawCount::Counted(30.0)
        );
    }

    #[test]
    fn average_substitutes_control_for_too_many() {
        let counts = [RawCount::TooMany, RawCount::Counted(30.0)];
        assert_eq!(
            average_plaque_counts(&counts, 53.0).unwrap(),
            RawCount::Counted(41.5)
        );
    }

    #[test]
    fn average_drops_not_done_from_the_mean() {
        let counts = [RawCount::TooMany, RawCount::Counted(30.0), RawCount::NotDone];
        assert_eq!(
            average_plaque_counts(&counts, 53.0).unwrap(),
            RawCount::Counted(41.5)
        );

        let counts = [RawCount::NotDone, RawCount::Counted(40.0)];
        assert_eq!(
            average_plaque_counts(&counts, 53.0).unwrap(),
            RawCount::Counted(40.0)
        );
    }

    #[test]
    fn average_substitutes_control_for_equals_control() {
        let counts = [RawCount::EqualsControl, RawCount::Counted(30.0)];
        assert_eq!(
            average_plaque_counts(&counts, 50.0).unwrap(),
            RawCount::Counted(40.0)
        );
    }

    #[test]
    fn average_requires_positive_control_for_substitution() {
        let counts = [RawCount::TooMany, RawCount::Counted(30.0)];
        assert!(matches!(
            average_plaque_counts(&counts, 0.0),
            Err(TiterError::NonPositiveControl(_))
        ));
        // No substitution needed: the control is never consulted.
        let counts = [RawCount::Counted(20.0), RawCount::Counted(40.0)];
        assert!(average_plaque_counts(&counts, 0.0).is_ok());
    }

    #[test]
    fn fraction_infectivity_censored_values() {
        assert_eq!(
            fraction_infectivity(RawCount::NotDone, 53.0).unwrap(),
            Reading::NotDone
        );
        assert_eq!(
            fraction_infectivity(RawCount::TooMany, 53.0).unwrap(),
            Reading::Value(1.0)
        );
        assert_eq!(
            fraction_infectivity(RawCount::EqualsControl, 53.0).unwrap(),
            Reading::Value(1.0)
        );
    }

    #[test]
    fn fraction_infectivity_numeric() {
        assert_eq!(
            fraction_infectivity(RawCount::Counted(26.0), 52.0).unwrap(),
            Reading::Value(0.5)
        );
        assert_eq!(
            fraction_infectivity(RawCount::Counted(13.0), 52.0).unwrap(),
            Reading::Value(0.25)
        );
    }

    #[test]
    fn percent_neutralization_censored_values() {
        assert_eq!(
            percent_neutralization(RawCount::NotDone, 53.0).unwrap(),
            Reading::NotDone
        );
        assert_eq!(
            percent_neutralization(RawCount::TooMany, 53.0).unwrap(),
            Reading::Value(0.0)
        );
        assert_eq!(
            percent_neutralization(RawCount::EqualsControl, 53.0).unwrap(),
            Reading::Value(0.0)
        );
    }

    #[test]
    fn percent_neutralization_numeric() {
        assert_eq!(
            percent_neutralization(RawCount::Counted(26.0), 52.0).unwrap(),
            Reading::Value(50.0)
        );
        assert_eq!(
            percent_neutralization(RawCount::Counted(40.0), 50.0).unwrap(),
            Reading::Value(20.0)
        );
    }

    #[test]
    fn numeric_path_rejects_non_positive_control() {
        assert!(matches!(
            fraction_infectivity(RawCount::Counted(10.0), 0.0),
            Err(TiterError::NonPositiveControl(_))
        ));
        assert!(matches!(
            percent_neutralization(RawCount::Counted(10.0), -1.0),
            Err(TiterError::NonPositiveControl(_))
        ));
        // "Not done" never touches the control.
        assert!(fraction_infectivity(RawCount::NotDone, 0.0).is_ok());
        assert!(percent_neutralization(RawCount::NotDone, 0.0).is_ok());
    }
}
