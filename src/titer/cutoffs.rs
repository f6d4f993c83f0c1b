//! Boundary-concentration cutoff table for off-scale continuous titers.
//!
//! When the inverse-threshold solve lands below the lowest tested
//! concentration, the serum is off-scale strong and the reported titer must
//! be expressed relative to the assay's ladder: a canonical `>d` label and a
//! ceiling beyond which curve-based extrapolation is not trusted. The table
//! is derived from the ladder in use rather than hard-coded, so alternate
//! ladders remain supportable.

use crate::domain::DilutionLadder;

/// Relative tolerance for matching a solved boundary concentration to a
/// table entry.
const MATCH_TOLERANCE: f64 = 1e-6;

/// Off-scale policy for one boundary concentration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cutoff {
    /// Highest reciprocal titer an extrapolated estimate may reach before
    /// the canonical label takes over (one doubling past the boundary).
    pub ceiling: f64,
    /// Dilution factor of the canonical `>d` label.
    pub label: u32,
}

/// Boundary concentration -> off-scale policy, one entry per ladder step.
#[derive(Debug, Clone, PartialEq)]
pub struct CutoffTable {
    entries: Vec<(f64, Cutoff)>,
}

impl CutoffTable {
    /// Derive the table for a ladder: each step `1:d` maps its concentration
    /// `1/d` to the label `>d` with ceiling `2d`.
    pub fn for_ladder(ladder: &DilutionLadder) -> Self {
        let entries = ladder
            .steps()
            .iter()
            .map(|step| {
                let d = step.factor();
                (
                    step.concentration(),
                    Cutoff {
                        ceiling: 2.0 * d as f64,
                        label: d,
                    },
                )
            })
            .collect();
        CutoffTable { entries }
    }

    /// Look up the policy for a solved boundary concentration.
    ///
    /// Matching is tolerant of floating-point noise in the solved value but
    /// strict enough that adjacent doubling steps never collide.
    pub fn lookup(&self, boundary: f64) -> Option<Cutoff> {
        self.entries
            .iter()
            .find(|(conc, _)| (boundary - conc).abs() <= conc * MATCH_TOLERANCE)
            .map(|(_, cutoff)| *cutoff)
    }
}
