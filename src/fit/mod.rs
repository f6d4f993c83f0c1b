//! Hill curve fitting.
//!
//! Responsibilities:
//!
//! - generate (midpoint, slope) candidate grids
//! - evaluate each candidate (parallel), solving the free asymptotes by OLS
//! - refine the best candidate on a shrinking local grid (bounded rounds)

pub mod fitter;
pub mod grid;

pub use fitter::*;
pub use grid::*;
