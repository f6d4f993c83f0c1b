//! Command-line parsing for the PRNT titer tool.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the estimation/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "prnt", version, about = "PRNT titer inference from raw plaque counts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute discrete and continuous titers for every group in the input.
    Titers(TiterArgs),
    /// Show the detailed fits for a single serum/virus group.
    ///
    /// Uses the same pipeline as `prnt titers` but requires `--serum` and
    /// `--virus` and prints per-shape curve parameters.
    Group(TiterArgs),
}

/// Common options for titer computation.
#[derive(Debug, Parser, Clone)]
pub struct TiterArgs {
    /// Input CSV: serum,virus,replicate,control plus one column per dilution.
    pub input: PathBuf,

    /// Sensitivity in percent reduction (50 for PRNT50, 90 for PRNT90).
    #[arg(short = 'l', long, default_value_t = 50.0)]
    pub limit: f64,

    /// Extrapolate off-scale-strong continuous titers from the fitted curve.
    #[arg(long)]
    pub interpolate: bool,

    /// Dilution ladder as comma-separated reciprocal factors (default
    /// 20,40,...,5120).
    #[arg(long)]
    pub ladder: Option<String>,

    /// Only process groups with this serum identifier.
    #[arg(long)]
    pub serum: Option<String>,

    /// Only process groups with this virus identifier.
    #[arg(long)]
    pub virus: Option<String>,

    /// Export per-group titers to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export fitted curves (model + params + titers) to JSON.
    #[arg(long = "export-curves")]
    pub export_curves: Option<PathBuf>,

    /// Verbose logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
