//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the censored raw-count domain (`RawCount`, `Reading`)
//! - the dilution ladder (`DilutionStep`, `DilutionLadder`)
//! - titer notation (`Titer`)
//! - curve-shape configuration and fitted curves (`CurveShape`, `HillCurve`, `HillFit`)
//! - grouped assay records and run configuration

pub mod types;

pub use types::*;
