//! Export computed titers to CSV and fitted curves to JSON.
//!
//! The CSV is meant to be easy to consume in spreadsheets or downstream
//! scripts: one row per group and estimation method, titers in canonical
//! notation plus their log2 value. The JSON export carries the fitted curve
//! parameters for external plotting.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::domain::{GroupTiters, Titer};
use crate::error::TiterError;
use crate::titer::log_titer;

#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    serum: &'a str,
    virus: &'a str,
    method: &'a str,
    titer: Titer,
    log_titer: Option<f64>,
    sse: Option<f64>,
    rmse: Option<f64>,
    n: Option<usize>,
}

/// Write one row per group and method to a CSV file.
pub fn write_results_csv(path: &Path, groups: &[GroupTiters]) -> Result<(), TiterError> {
    let mut writer = csv::Writer::from_path(path)?;

    for group in groups {
        writer.serialize(ResultRow {
            serum: &group.serum,
            virus: &group.virus,
            method: "discrete",
            titer: group.discrete,
            log_titer: finite(log_titer(group.discrete, 1.0)),
            sse: None,
            rmse: None,
            n: None,
        })?;
        for shape in &group.continuous {
            writer.serialize(ResultRow {
                serum: &group.serum,
                virus: &group.virus,
                method: shape.shape.display_name(),
                titer: shape.titer,
                log_titer: finite(log_titer(shape.titer, 0.0)),
                sse: shape.fit.as_ref().map(|f| f.sse),
                rmse: shape.fit.as_ref().map(|f| f.rmse),
                n: shape.fit.as_ref().map(|f| f.n),
            })?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Write all fitted curves (with their titers) to a JSON file.
pub fn write_curves_json(path: &Path, groups: &[GroupTiters]) -> Result<(), TiterError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, groups)?;
    Ok(())
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurveShape, ShapeTiter};

    fn sample_groups() -> Vec<GroupTiters> {
        vec![GroupTiters {
            serum: "S001".to_string(),
            virus: "WNV".to_string(),
            discrete: Titer::Numeric(640.0),
            continuous: vec![ShapeTiter {
                shape: CurveShape::FixBoth,
                titer: Titer::GreaterThan(5120),
                fit: None,
            }],
        }]
    }

    #[test]
    fn results_csv_has_one_row_per_method() {
        let dir = std::env::temp_dir();
        let path = dir.join("prnt_export_test_results.csv");
        write_results_csv(&path, &sample_groups()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("serum,virus,method,titer,log_titer"));
        assert!(lines[1].contains("discrete"));
        assert!(lines[1].contains("640"));
        assert!(lines[2].contains("fix-both"));
        assert!(lines[2].contains(">5120"));
    }

    #[test]
    fn curves_json_round_trips_titer_notation() {
        let dir = std::env::temp_dir();
        let path = dir.join("prnt_export_test_curves.json");
        write_curves_json(&path, &sample_groups()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["discrete"], "640");
        assert_eq!(parsed[0]["continuous"][0]["titer"], ">5120");
    }
}
