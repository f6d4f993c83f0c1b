//! Mathematical utilities: the least-squares solver used by the fitter.

pub mod ols;

pub use ols::*;
