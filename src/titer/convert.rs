//! Titer <-> log2-titer conversion.
//!
//! Downstream comparisons (fold changes, seroconversion calls) work on a
//! log2 scale anchored at a titer of 10. Censored titers are shifted by
//! `step_adjust` dilution steps to acknowledge their one-sided uncertainty:
//! 1 for discrete titers, 0 for continuous ones.

use crate::domain::Titer;

/// Map a titer to the log2 scale.
///
/// `NotDetermined` maps to NaN; `<n` and `>n` are shifted down/up by
/// `step_adjust`.
pub fn log_titer(titer: Titer, step_adjust: f64) -> f64 {
    match titer {
        Titer::NotDetermined => f64::NAN,
        Titer::Numeric(v) => (v / 10.0).log2(),
        Titer::LessThan(n) => (n as f64 / 10.0).log2() - step_adjust,
        Titer::GreaterThan(n) => (n as f64 / 10.0).log2() + step_adjust,
    }
}

/// Map a log2-titer back to a titer.
///
/// Lossy by design: censoring is never reconstructed from a log value, so
/// everything except NaN comes back as a bare number.
pub fn titer_from_log_titer(log: f64) -> Titer {
    if log.is_nan() {
        return Titer::NotDetermined;
    }
    Titer::Numeric(log.exp2() * 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_round_trip() {
        for v in [10.0, 20.0, 203.52, 640.0, 5120.0] {
            match titer_from_log_titer(log_titer(Titer::Numeric(v), 0.0)) {
                Titer::Numeric(back) => assert!((back - v).abs() / v < 1e-12),
                other => panic!("expected numeric, got {other:?}"),
            }
        }
    }

    #[test]
    fn not_determined_passes_through() {
        assert!(log_titer(Titer::NotDetermined, 1.0).is_nan());
        assert_eq!(titer_from_log_titer(f64::NAN), Titer::NotDetermined);
    }

    #[test]
    fn censored_titers_shift_by_the_step_adjustment() {
        // 160/10 = 16 -> log2 = 4.
        assert_eq!(log_titer(Titer::LessThan(160), 1.0), 3.0);
        assert_eq!(log_titer(Titer::GreaterThan(160), 1.0), 5.0);
        // Continuous titers carry no step uncertainty.
        assert_eq!(log_titer(Titer::LessThan(160), 0.0), 4.0);
    }

    #[test]
    fn reverse_direction_never_reconstructs_censoring() {
        let log = log_titer(Titer::GreaterThan(5120), 1.0);
        match titer_from_log_titer(log) {
            Titer::Numeric(v) => assert!((v - 10240.0).abs() < 1e-9),
            other => panic!("expected numeric, got {other:?}"),
        }
    }
}
