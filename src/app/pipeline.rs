//! Shared estimation pipeline used by both subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> per-group aggregation -> conversion -> discrete + continuous
//! estimation. Groups are independent, so they are processed in parallel.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::counts::{average_plaque_counts, fraction_infectivity, percent_neutralization};
use crate::domain::{
    CurveShape, GroupRecord, GroupTiters, Reading, RunConfig, Sample, ShapeTiter, Titer,
};
use crate::error::TiterError;
use crate::titer::{CutoffTable, continuous_titer, discrete_titer};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub groups: Vec<GroupTiters>,
}

/// Execute the full pipeline: ingest, filter, estimate per group.
pub fn run_titers(config: &RunConfig) -> Result<RunOutput, TiterError> {
    let mut records = crate::io::ingest::read_groups_csv(&config.input, &config.ladder)?;
    if let Some(serum) = &config.serum {
        records.retain(|g| &g.serum == serum);
    }
    if let Some(virus) = &config.virus {
        records.retain(|g| &g.virus == virus);
    }
    info!(groups = records.len(), input = %config.input.display(), "ingested raw counts");

    let cutoffs = CutoffTable::for_ladder(&config.ladder);
    let groups = records
        .par_iter()
        .map(|record| compute_group(record, config, &cutoffs))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RunOutput { groups })
}

/// Compute the discrete titer and all four continuous titers for one group.
pub fn compute_group(
    record: &GroupRecord,
    config: &RunConfig,
    cutoffs: &CutoffTable,
) -> Result<GroupTiters, TiterError> {
    for replicate in &record.replicates {
        if replicate.counts.len() != config.ladder.len() {
            return Err(TiterError::DilutionMismatch(format!(
                "{}/{} replicate '{}' has {} counts for a {}-step ladder",
                record.serum,
                record.virus,
                replicate.label,
                replicate.counts.len(),
                config.ladder.len()
            )));
        }
    }

    let discrete = discrete_titer(
        &config.ladder,
        &discrete_readings(record, config)?,
        config.limit_percent,
        Titer::LessThan(config.ladder.first().factor()),
    )
    .map_err(|e| annotate(e, record))?;
    debug!(serum = %record.serum, virus = %record.virus, titer = %discrete, "discrete titer");

    let samples = continuous_samples(record, config)?;
    let limit_fraction = config.limit_percent / 100.0;
    let mut continuous = Vec::with_capacity(CurveShape::ALL.len());
    for shape in CurveShape::ALL {
        let (titer, fit) =
            continuous_titer(&samples, limit_fraction, shape, config.interpolate, cutoffs)
                .map_err(|e| annotate(e, record))?;
        debug!(
            serum = %record.serum,
            virus = %record.virus,
            shape = shape.display_name(),
            titer = %titer,
            "continuous titer"
        );
        continuous.push(ShapeTiter { shape, titer, fit });
    }

    Ok(GroupTiters {
        serum: record.serum.clone(),
        virus: record.virus.clone(),
        discrete,
        continuous,
    })
}

/// Per-step percent neutralization of the replicate-averaged counts,
/// normalized against the group control.
fn discrete_readings(record: &GroupRecord, config: &RunConfig) -> Result<Vec<Reading>, TiterError> {
    let control = record.control();
    let mut readings = Vec::with_capacity(config.ladder.len());
    for step in 0..config.ladder.len() {
        let column: Vec<_> = record.replicates.iter().map(|r| r.counts[step]).collect();
        let averaged = average_plaque_counts(&column, control)?;
        readings.push(percent_neutralization(averaged, control)?);
    }
    Ok(readings)
}

/// Per-replicate (concentration, fraction infectivity) samples, each
/// normalized against its own replicate's control; "not done" wells are
/// dropped.
fn continuous_samples(record: &GroupRecord, config: &RunConfig) -> Result<Vec<Sample>, TiterError> {
    let mut samples = Vec::new();
    for replicate in &record.replicates {
        for (step, &count) in config.ladder.steps().iter().zip(&replicate.counts) {
            match fraction_infectivity(count, replicate.control)? {
                Reading::NotDone => {}
                Reading::Value(fraction) => samples.push(Sample {
                    concentration: step.concentration(),
                    fraction_infectivity: fraction,
                }),
            }
        }
    }
    Ok(samples)
}

fn annotate(err: TiterError, record: &GroupRecord) -> TiterError {
    match err {
        TiterError::Internal(msg) => TiterError::Internal(format!(
            "{}/{}: {msg}",
            record.serum, record.virus
        )),
        other => other,
    }
}
