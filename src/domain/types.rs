//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during titer computation
//! - exported to JSON/CSV
//! - reloaded later for comparisons across assay runs
//!
//! The censored raw-count domain is a tagged union from input parsing onward;
//! no downstream code sniffs strings by prefix.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::TiterError;

/// One plaque count read at a single dilution for one replicate.
///
/// Lab notation mapped by [`RawCount::from_str`]:
/// - `nd` — no titration was carried out at this dilution
/// - `>N` — too many plaques to count (exceeds the seeding dose)
/// - `e` — plaque count corresponds to the seeding dose
/// - anything else — a numeric plaque count
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawCount {
    Counted(f64),
    NotDone,
    TooMany,
    EqualsControl,
}

impl FromStr for RawCount {
    type Err = TiterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "nd" {
            return Ok(RawCount::NotDone);
        }
        if s.starts_with('>') {
            return Ok(RawCount::TooMany);
        }
        if s == "e" {
            return Ok(RawCount::EqualsControl);
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Ok(RawCount::Counted(v)),
            _ => Err(TiterError::InvalidInput(format!(
                "unrecognized plaque count '{s}'"
            ))),
        }
    }
}

impl fmt::Display for RawCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawCount::Counted(v) => write!(f, "{v}"),
            RawCount::NotDone => write!(f, "nd"),
            RawCount::TooMany => write!(f, ">"),
            RawCount::EqualsControl => write!(f, "e"),
        }
    }
}

/// A derived per-dilution value: either a number or "not done".
///
/// Used for both fraction-infectivity (nominally in `[0, 1]`) and
/// percent-neutralization (legitimately negative when infectivity exceeds
/// the control due to experimental noise).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    NotDone,
    Value(f64),
}

/// One dilution step, stored as its reciprocal dilution factor.
///
/// `DilutionStep(160)` renders as `1:160`; its concentration is `1/160`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DilutionStep(pub u32);

impl DilutionStep {
    pub fn factor(self) -> u32 {
        self.0
    }

    /// Reciprocal of the dilution factor (`1:160` -> `1/160`).
    pub fn concentration(self) -> f64 {
        1.0 / self.0 as f64
    }
}

impl fmt::Display for DilutionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1:{}", self.0)
    }
}

impl FromStr for DilutionStep {
    type Err = TiterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let rest = s.strip_prefix("1:").ok_or_else(|| {
            TiterError::InvalidInput(format!("dilution step '{s}' must look like '1:160'"))
        })?;
        let factor: u32 = rest.parse().map_err(|_| {
            TiterError::InvalidInput(format!("dilution step '{s}' has a non-numeric factor"))
        })?;
        if factor == 0 {
            return Err(TiterError::InvalidInput(
                "dilution factor must be positive".to_string(),
            ));
        }
        Ok(DilutionStep(factor))
    }
}

/// The ordered sequence of tested dilution steps, least diluted first.
///
/// Invariant: non-empty and strictly increasing in dilution factor. Every
/// dataset consumed by the estimators must supply values for exactly this
/// ladder, in this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DilutionLadder {
    steps: Vec<DilutionStep>,
}

impl DilutionLadder {
    pub fn new(steps: Vec<DilutionStep>) -> Result<Self, TiterError> {
        if steps.is_empty() {
            return Err(TiterError::InvalidInput(
                "dilution ladder must have at least one step".to_string(),
            ));
        }
        for pair in steps.windows(2) {
            if pair[1].factor() <= pair[0].factor() {
                return Err(TiterError::InvalidInput(format!(
                    "dilution ladder must be strictly increasing, got {} after {}",
                    pair[1], pair[0]
                )));
            }
        }
        Ok(DilutionLadder { steps })
    }

    pub fn from_factors(factors: &[u32]) -> Result<Self, TiterError> {
        Self::new(factors.iter().map(|&f| DilutionStep(f)).collect())
    }

    /// Parse a comma-separated list of dilution factors, e.g. `20,40,80`.
    pub fn parse_factors(s: &str) -> Result<Self, TiterError> {
        let factors: Result<Vec<u32>, _> = s
            .split(',')
            .map(|part| {
                part.trim().parse::<u32>().map_err(|_| {
                    TiterError::InvalidInput(format!("bad dilution factor '{}'", part.trim()))
                })
            })
            .collect();
        Self::from_factors(&factors?)
    }

    /// The standard PRNT ladder: 1:20 doubling up to 1:5120.
    pub fn standard() -> Self {
        DilutionLadder {
            steps: [20, 40, 80, 160, 320, 640, 1280, 2560, 5120]
                .iter()
                .map(|&f| DilutionStep(f))
                .collect(),
        }
    }

    pub fn steps(&self) -> &[DilutionStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Lowest dilution (least diluted, most concentrated serum).
    pub fn first(&self) -> DilutionStep {
        self.steps[0]
    }

    /// Highest dilution (most diluted, weakest serum).
    pub fn last(&self) -> DilutionStep {
        self.steps[self.steps.len() - 1]
    }

    pub fn concentrations(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.concentration()).collect()
    }
}

impl Default for DilutionLadder {
    fn default() -> Self {
        Self::standard()
    }
}

/// The inferred potency estimate for one serum/virus pair.
///
/// Canonical textual notation: `203.52`, `640`, `<160`, `>5120`, `*`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Titer {
    Numeric(f64),
    LessThan(u32),
    GreaterThan(u32),
    /// No titration was performed at all.
    NotDetermined,
}

impl fmt::Display for Titer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Titer::Numeric(v) => {
                if (v - v.round()).abs() < 1e-9 && v.abs() < 1e12 {
                    write!(f, "{}", v.round() as i64)
                } else {
                    write!(f, "{v:.2}")
                }
            }
            Titer::LessThan(n) => write!(f, "<{n}"),
            Titer::GreaterThan(n) => write!(f, ">{n}"),
            Titer::NotDetermined => write!(f, "*"),
        }
    }
}

impl FromStr for Titer {
    type Err = TiterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "*" {
            return Ok(Titer::NotDetermined);
        }
        if let Some(rest) = s.strip_prefix('<') {
            let bound: u32 = rest.parse().map_err(|_| {
                TiterError::InvalidInput(format!("bad censored titer '{s}'"))
            })?;
            return Ok(Titer::LessThan(bound));
        }
        if let Some(rest) = s.strip_prefix('>') {
            let bound: u32 = rest.parse().map_err(|_| {
                TiterError::InvalidInput(format!("bad censored titer '{s}'"))
            })?;
            return Ok(Titer::GreaterThan(bound));
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Titer::Numeric(v)),
            _ => Err(TiterError::InvalidInput(format!("bad titer '{s}'"))),
        }
    }
}

// Titers serialize as their canonical notation so exports match terminal
// output ("203.52", "<160", ">5120", "*").
impl Serialize for Titer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Titer {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Which asymptotes of the dose-response curve are constrained.
///
/// The four combinations form a closed variant set consumed by a single fit
/// entry point; there are no per-shape code paths in the fitter beyond the
/// design-matrix layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CurveShape {
    /// Top fixed at 1 and bottom fixed at 0.
    FixBoth,
    /// Top fixed at 1, bottom free.
    FixTop,
    /// Bottom fixed at 0, top free.
    FixBottom,
    /// Both asymptotes free.
    Free,
}

impl CurveShape {
    pub const ALL: [CurveShape; 4] = [
        CurveShape::FixBoth,
        CurveShape::FixTop,
        CurveShape::FixBottom,
        CurveShape::Free,
    ];

    pub fn fix_top(self) -> bool {
        matches!(self, CurveShape::FixBoth | CurveShape::FixTop)
    }

    pub fn fix_bottom(self) -> bool {
        matches!(self, CurveShape::FixBoth | CurveShape::FixBottom)
    }

    /// Number of free linear parameters (asymptotes) solved by OLS.
    pub fn free_param_count(self) -> usize {
        match self {
            CurveShape::FixBoth => 0,
            CurveShape::FixTop | CurveShape::FixBottom => 1,
            CurveShape::Free => 2,
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            CurveShape::FixBoth => "fix-both",
            CurveShape::FixTop => "fix-top",
            CurveShape::FixBottom => "fix-bottom",
            CurveShape::Free => "free",
        }
    }
}

/// One (concentration, fraction infectivity) observation for curve fitting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Reciprocal of the dilution factor (`1:160` -> `1/160`).
    pub concentration: f64,
    pub fraction_infectivity: f64,
}

/// Fitted Hill-type dose-response curve parameters.
///
/// `response(c) = bottom + (top - bottom) / (1 + (c / midpoint)^slope)`
///
/// With `slope > 0` the response decreases monotonically in concentration:
/// full infectivity (`top`) at high dilution, `bottom` at high serum
/// concentration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HillCurve {
    pub top: f64,
    pub bottom: f64,
    /// Inflection concentration (response halfway between the asymptotes).
    pub midpoint: f64,
    /// Hill coefficient.
    pub slope: f64,
}

/// A fitted curve plus the tested concentration range and fit quality.
///
/// Produced fresh per titer computation and discarded afterwards; the only
/// consumers are the inverse-threshold solve and diagnostic output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HillFit {
    pub curve: HillCurve,
    pub shape: CurveShape,
    /// Lowest tested concentration (highest dilution).
    pub conc_min: f64,
    /// Highest tested concentration (lowest dilution).
    pub conc_max: f64,
    pub sse: f64,
    pub rmse: f64,
    pub n: usize,
}

/// Raw counts for one replicate of a serum/virus pair, aligned with the ladder.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicateCounts {
    pub label: String,
    /// Plaque count of the no-serum control well (Viruskontrolle).
    pub control: f64,
    /// One raw count per ladder step, in ladder order.
    pub counts: Vec<RawCount>,
}

/// All replicates for one serum/virus pair.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRecord {
    pub serum: String,
    pub virus: String,
    pub replicates: Vec<ReplicateCounts>,
}

impl GroupRecord {
    /// Control count used for replicate-averaged values.
    ///
    /// Per-replicate normalization uses each replicate's own control; the
    /// averaged (discrete) path uses the group's first.
    pub fn control(&self) -> f64 {
        self.replicates[0].control
    }
}

/// One continuous titer estimate with the shape that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeTiter {
    pub shape: CurveShape,
    pub titer: Titer,
    /// Fitted curve for diagnostics; absent when no titration was done.
    pub fit: Option<HillFit>,
}

/// All titers computed for one serum/virus group: the discrete estimate
/// plus one continuous estimate per curve shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTiters {
    pub serum: String,
    pub virus: String,
    pub discrete: Titer,
    pub continuous: Vec<ShapeTiter>,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub ladder: DilutionLadder,
    /// Sensitivity in percent reduction, e.g. 50 for PRNT50 or 90 for PRNT90.
    pub limit_percent: f64,
    /// Permit curve-based extrapolation of off-scale-high continuous titers.
    pub interpolate: bool,

    pub serum: Option<String>,
    pub virus: Option<String>,

    pub export_results: Option<PathBuf>,
    pub export_curves: Option<PathBuf>,
}
