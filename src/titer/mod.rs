//! Titer inference.
//!
//! Two independent estimators produce a [`crate::domain::Titer`] in the same
//! notation:
//!
//! - `discrete`: stepwise scan of per-dilution percent-neutralization values
//!   against the sensitivity threshold
//! - `continuous`: Hill-curve fit over (concentration, fraction infectivity)
//!   samples plus an inverse-threshold solve, with off-scale handling driven
//!   by a ladder-derived cutoff table
//!
//! `convert` maps titers to and from the log2 scale used by downstream
//! comparisons.

pub mod continuous;
pub mod convert;
pub mod cutoffs;
pub mod discrete;

pub use continuous::{continuous_titer, extrapolate_titer};
pub use convert::{log_titer, titer_from_log_titer};
pub use cutoffs::{Cutoff, CutoffTable};
pub use discrete::discrete_titer;
