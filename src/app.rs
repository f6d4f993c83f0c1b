//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - ingests the raw-count CSV
//! - runs the estimation pipeline
//! - prints reports
//! - writes optional exports

use clap::Parser;

use crate::cli::{Cli, Command, TiterArgs};
use crate::domain::{DilutionLadder, RunConfig};
use crate::error::TiterError;

pub mod pipeline;

/// Entry point for the `prnt` binary.
pub fn run() -> Result<(), TiterError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Titers(args) => handle_titers(args),
        Command::Group(args) => handle_group(args),
    }
}

fn handle_titers(args: TiterArgs) -> Result<(), TiterError> {
    init_tracing(args.verbose);
    let config = run_config_from_args(&args)?;
    let run = pipeline::run_titers(&config)?;

    println!("{}", crate::report::format_titer_table(&run.groups, &config));

    if let Some(path) = &config.export_results {
        crate::io::export::write_results_csv(path, &run.groups)?;
    }
    if let Some(path) = &config.export_curves {
        crate::io::export::write_curves_json(path, &run.groups)?;
    }

    Ok(())
}

fn handle_group(args: TiterArgs) -> Result<(), TiterError> {
    init_tracing(args.verbose);
    let config = run_config_from_args(&args)?;
    if config.serum.is_none() || config.virus.is_none() {
        return Err(TiterError::InvalidInput(
            "`prnt group` requires both --serum and --virus".to_string(),
        ));
    }

    let run = pipeline::run_titers(&config)?;
    if run.groups.is_empty() {
        return Err(TiterError::InvalidInput(format!(
            "no group matches serum {:?} / virus {:?}",
            config.serum.as_deref().unwrap_or(""),
            config.virus.as_deref().unwrap_or("")
        )));
    }

    for group in &run.groups {
        println!("{}", crate::report::format_group_detail(group));
    }

    Ok(())
}

pub fn run_config_from_args(args: &TiterArgs) -> Result<RunConfig, TiterError> {
    let ladder = match &args.ladder {
        Some(spec) => DilutionLadder::parse_factors(spec)?,
        None => DilutionLadder::standard(),
    };
    if !(args.limit.is_finite() && args.limit > 0.0 && args.limit < 100.0) {
        return Err(TiterError::InvalidInput(format!(
            "limit must lie in (0, 100), got {}",
            args.limit
        )));
    }

    Ok(RunConfig {
        input: args.input.clone(),
        ladder,
        limit_percent: args.limit,
        interpolate: args.interpolate,
        serum: args.serum.clone(),
        virus: args.virus.clone(),
        export_results: args.export.clone(),
        export_curves: args.export_curves.clone(),
    })
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init()
        .ok();
}
