//! Hill curve calibration.
//!
//! Given (concentration, fraction infectivity) samples and a
//! [`CurveShape`], we search (midpoint, slope) on a deterministic
//! log-spaced grid; for each candidate the model is linear in the free
//! asymptotes, so they are solved by OLS. The best candidate (lowest SSE,
//! ties broken by grid index) is then refined on a shrinking local grid for
//! a fixed number of rounds.
//!
//! Every stage is bounded: a fit that cannot produce a finite candidate
//! surfaces as a `CurveFit` error instead of iterating further.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::domain::{CurveShape, HillCurve, HillFit, Sample};
use crate::error::TiterError;
use crate::fit::grid::{candidate_grid, log_space};
use crate::math::solve_least_squares;
use crate::models::{hill_basis, response};

/// Factor by which the midpoint grid extends beyond the tested
/// concentration range on each side (off-scale titers fit midpoints well
/// outside the tested dilutions).
const MIDPOINT_SPAN: f64 = 64.0;
const MIDPOINT_STEPS: usize = 41;

const SLOPE_MIN: f64 = 0.25;
const SLOPE_MAX: f64 = 16.0;
const SLOPE_STEPS: usize = 25;

/// Local refinement: per round, a 13x13 grid spanning one previous grid
/// step around the incumbent, shrinking the step six-fold each round.
const REFINE_ROUNDS: usize = 10;
const REFINE_STEPS: usize = 13;

#[derive(Debug, Clone)]
struct Candidate {
    idx: usize,
    curve: HillCurve,
    sse: f64,
}

/// Fit a Hill curve of the given shape to the samples.
pub fn fit_hill(samples: &[Sample], shape: CurveShape) -> Result<HillFit, TiterError> {
    if samples.is_empty() {
        return Err(TiterError::InsufficientData(
            "no samples to fit".to_string(),
        ));
    }
    for s in samples {
        if !(s.concentration.is_finite() && s.concentration > 0.0) {
            return Err(TiterError::InvalidInput(format!(
                "non-positive concentration {} in fit samples",
                s.concentration
            )));
        }
        if !s.fraction_infectivity.is_finite() {
            return Err(TiterError::InvalidInput(
                "non-finite fraction infectivity in fit samples".to_string(),
            ));
        }
    }

    let n = samples.len();
    if n < shape.free_param_count() + 1 {
        return Err(TiterError::InsufficientData(format!(
            "{n} sample(s) cannot determine shape {}",
            shape.display_name()
        )));
    }

    let conc_min = samples
        .iter()
        .map(|s| s.concentration)
        .fold(f64::INFINITY, f64::min);
    let conc_max = samples
        .iter()
        .map(|s| s.concentration)
        .fold(f64::NEG_INFINITY, f64::max);

    // Initial coarse grid.
    let midpoints = log_space(conc_min / MIDPOINT_SPAN, conc_max * MIDPOINT_SPAN, MIDPOINT_STEPS)?;
    let slopes = log_space(SLOPE_MIN, SLOPE_MAX, SLOPE_STEPS)?;
    let grid = candidate_grid(&midpoints, &slopes);

    let mut best = best_candidate(samples, shape, &grid).ok_or_else(|| {
        TiterError::CurveFit(format!(
            "no finite candidate for shape {} over {n} samples",
            shape.display_name()
        ))
    })?;

    // Ln-step sizes of the initial grid drive the refinement window.
    let mut step_m = ((conc_max * MIDPOINT_SPAN) / (conc_min / MIDPOINT_SPAN)).ln()
        / (MIDPOINT_STEPS as f64 - 1.0);
    let mut step_s = (SLOPE_MAX / SLOPE_MIN).ln() / (SLOPE_STEPS as f64 - 1.0);

    for _ in 0..REFINE_ROUNDS {
        let local = local_grid(best.curve.midpoint, best.curve.slope, step_m, step_s);
        if let Some(candidate) = best_candidate(samples, shape, &local) {
            if candidate.sse < best.sse {
                best = candidate;
            }
        }
        let shrink = (REFINE_STEPS as f64 - 1.0) / 2.0;
        step_m /= shrink;
        step_s /= shrink;
    }

    let rmse = (best.sse / n as f64).sqrt();
    Ok(HillFit {
        curve: best.curve,
        shape,
        conc_min,
        conc_max,
        sse: best.sse,
        rmse,
        n,
    })
}

/// A local (midpoint, slope) grid spanning one step around the incumbent in
/// log space.
fn local_grid(midpoint: f64, slope: f64, step_m: f64, step_s: f64) -> Vec<(f64, f64)> {
    let half = (REFINE_STEPS - 1) as f64 / 2.0;
    let ln_m = midpoint.ln();
    let ln_s = slope.ln();

    let mut out = Vec::with_capacity(REFINE_STEPS * REFINE_STEPS);
    for i in 0..REFINE_STEPS {
        let dm = (i as f64 - half) / half * step_m;
        for j in 0..REFINE_STEPS {
            let ds = (j as f64 - half) / half * step_s;
            out.push(((ln_m + dm).exp(), (ln_s + ds).exp()));
        }
    }
    out
}

/// Evaluate all candidates in parallel and select the best.
///
/// Deterministic selection: minimum SSE, ties broken by grid index.
fn best_candidate(
    samples: &[Sample],
    shape: CurveShape,
    grid: &[(f64, f64)],
) -> Option<Candidate> {
    let candidates: Vec<Candidate> = grid
        .par_iter()
        .enumerate()
        .filter_map(|(idx, &(midpoint, slope))| {
            evaluate_candidate(samples, shape, midpoint, slope).map(|(curve, sse)| Candidate {
                idx,
                curve,
                sse,
            })
        })
        .collect();

    let mut best: Option<&Candidate> = None;
    for c in &candidates {
        match best {
            None => best = Some(c),
            Some(b) if c.sse < b.sse || (c.sse == b.sse && c.idx < b.idx) => best = Some(c),
            Some(_) => {}
        }
    }
    best.cloned()
}

/// Solve the free asymptotes by OLS for one (midpoint, slope) candidate and
/// return the curve with its SSE, or `None` for unusable candidates.
fn evaluate_candidate(
    samples: &[Sample],
    shape: CurveShape,
    midpoint: f64,
    slope: f64,
) -> Option<(HillCurve, f64)> {
    if !(midpoint.is_finite() && midpoint > 0.0 && slope.is_finite() && slope > 0.0) {
        return None;
    }

    let n = samples.len();
    let basis: Vec<f64> = samples
        .iter()
        .map(|s| hill_basis(s.concentration, midpoint, slope))
        .collect();

    let (top, bottom) = match shape {
        CurveShape::FixBoth => (1.0, 0.0),
        CurveShape::FixTop => {
            // y = h + bottom*(1 - h)  =>  y - h = bottom*(1 - h)
            let mut x = DMatrix::<f64>::zeros(n, 1);
            let mut y = DVector::<f64>::zeros(n);
            for i in 0..n {
                x[(i, 0)] = 1.0 - basis[i];
                y[i] = samples[i].fraction_infectivity - basis[i];
            }
            let beta = solve_least_squares(&x, &y)?;
            (1.0, beta[0])
        }
        CurveShape::FixBottom => {
            // y = top*h
            let mut x = DMatrix::<f64>::zeros(n, 1);
            let mut y = DVector::<f64>::zeros(n);
            for i in 0..n {
                x[(i, 0)] = basis[i];
                y[i] = samples[i].fraction_infectivity;
            }
            let beta = solve_least_squares(&x, &y)?;
            (beta[0], 0.0)
        }
        CurveShape::Free => {
            // y = top*h + bottom*(1 - h)
            let mut x = DMatrix::<f64>::zeros(n, 2);
            let mut y = DVector::<f64>::zeros(n);
            for i in 0..n {
                x[(i, 0)] = basis[i];
                x[(i, 1)] = 1.0 - basis[i];
                y[i] = samples[i].fraction_infectivity;
            }
            let beta = solve_least_squares(&x, &y)?;
            (beta[0], beta[1])
        }
    };

    if !(top.is_finite() && bottom.is_finite()) {
        return None;
    }

    let curve = HillCurve {
        top,
        bottom,
        midpoint,
        slope,
    };

    let mut sse = 0.0;
    for s in samples {
        let r = s.fraction_infectivity - response(&curve, s.concentration);
        sse += r * r;
    }

    sse.is_finite().then_some((curve, sse))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Samples generated exactly from a unit Hill curve at the 1:160..1:5120
    /// concentrations.
    fn exact_samples(midpoint: f64, slope: f64) -> Vec<Sample> {
        let curve = HillCurve {
            top: 1.0,
            bottom: 0.0,
            midpoint,
            slope,
        };
        [160.0, 320.0, 640.0, 1280.0, 2560.0, 5120.0]
            .iter()
            .map(|d| {
                let c = 1.0 / d;
                Sample {
                    concentration: c,
                    fraction_infectivity: response(&curve, c),
                }
            })
            .collect()
    }

    #[test]
    fn fit_recovers_known_parameters_fix_both() {
        let samples = exact_samples(1.0 / 200.0, 2.0);
        let fit = fit_hill(&samples, CurveShape::FixBoth).unwrap();

        assert!((fit.curve.midpoint - 1.0 / 200.0).abs() / (1.0 / 200.0) < 1e-5);
        assert!((fit.curve.slope - 2.0).abs() < 1e-3);
        assert!(fit.sse < 1e-10);
        assert_eq!(fit.curve.top, 1.0);
        assert_eq!(fit.curve.bottom, 0.0);
    }

    #[test]
    fn fit_recovers_known_parameters_free() {
        // A curve with offset asymptotes; the free fit must pick them up via
        // OLS at the true (midpoint, slope).
        let curve = HillCurve {
            top: 0.9,
            bottom: 0.1,
            midpoint: 1.0 / 500.0,
            slope: 1.5,
        };
        let samples: Vec<Sample> = [160.0, 320.0, 640.0, 1280.0, 2560.0, 5120.0]
            .iter()
            .map(|d| {
                let c = 1.0 / d;
                Sample {
                    concentration: c,
                    fraction_infectivity: response(&curve, c),
                }
            })
            .collect();

        let fit = fit_hill(&samples, CurveShape::Free).unwrap();
        assert!(fit.sse < 1e-8);
        assert!((fit.curve.top - 0.9).abs() < 1e-3);
        assert!((fit.curve.bottom - 0.1).abs() < 1e-3);
        assert!((fit.curve.midpoint - 1.0 / 500.0).abs() / (1.0 / 500.0) < 1e-3);
    }

    #[test]
    fn fit_tracks_tested_concentration_range() {
        let samples = exact_samples(1.0 / 200.0, 2.0);
        let fit = fit_hill(&samples, CurveShape::FixBoth).unwrap();
        assert!((fit.conc_min - 1.0 / 5120.0).abs() < 1e-12);
        assert!((fit.conc_max - 1.0 / 160.0).abs() < 1e-12);
        assert_eq!(fit.n, 6);
    }

    #[test]
    fn fit_rejects_empty_and_invalid_samples() {
        assert!(matches!(
            fit_hill(&[], CurveShape::FixBoth),
            Err(TiterError::InsufficientData(_))
        ));

        let bad = [Sample {
            concentration: 0.0,
            fraction_infectivity: 0.5,
        }];
        assert!(matches!(
            fit_hill(&bad, CurveShape::FixBoth),
            Err(TiterError::InvalidInput(_))
        ));
    }

    #[test]
    fn fit_is_deterministic() {
        let samples = exact_samples(1.0 / 700.0, 3.0);
        let a = fit_hill(&samples, CurveShape::FixTop).unwrap();
        let b = fit_hill(&samples, CurveShape::FixTop).unwrap();
        assert_eq!(a, b);
    }
}
