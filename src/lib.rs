//! `prnt-titers` library crate.
//!
//! The binary (`prnt`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the estimators are reusable from other tooling (notebooks, batch jobs)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod counts;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod titer;
