//! Formatted terminal output for computed titers.
//!
//! We keep formatting code in one place so:
//! - the estimation code stays clean and testable
//! - output changes are localized

use crate::domain::{CurveShape, GroupTiters, RunConfig};

/// Format the summary table: one row per group, one column per method.
pub fn format_titer_table(groups: &[GroupTiters], config: &RunConfig) -> String {
    let mut out = String::new();

    out.push_str("=== prnt - PRNT titer inference ===\n");
    out.push_str(&format!(
        "Limit: {}% | ladder: {}..{} ({} steps) | interpolate: {}\n",
        config.limit_percent,
        config.ladder.first(),
        config.ladder.last(),
        config.ladder.len(),
        if config.interpolate { "on" } else { "off" },
    ));
    out.push_str(&format!("Groups: {}\n\n", groups.len()));

    out.push_str(&format!(
        "{:<12} {:<10} {:>10} {:>10} {:>10} {:>10} {:>10}\n",
        "SERUM", "VIRUS", "DISCRETE", "FIX-BOTH", "FIX-TOP", "FIX-BOT", "FREE"
    ));
    for group in groups {
        out.push_str(&format!(
            "{:<12} {:<10} {:>10}",
            group.serum,
            group.virus,
            group.discrete.to_string()
        ));
        for shape in CurveShape::ALL {
            let cell = group
                .continuous
                .iter()
                .find(|s| s.shape == shape)
                .map(|s| s.titer.to_string())
                .unwrap_or_default();
            out.push_str(&format!(" {cell:>10}"));
        }
        out.push('\n');
    }

    out
}

/// Format the detailed view of one group: titers plus fit diagnostics.
pub fn format_group_detail(group: &GroupTiters) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} / {} ===\n", group.serum, group.virus));
    out.push_str(&format!("Discrete titer: {}\n\n", group.discrete));

    out.push_str("Continuous fits:\n");
    for shape in &group.continuous {
        match &shape.fit {
            Some(fit) => out.push_str(&format!(
                "  {:<10} titer={:<10} top={:.4} bottom={:.4} midpoint={:.6e} slope={:.4} \
                 RMSE={:.5} n={}\n",
                shape.shape.display_name(),
                shape.titer.to_string(),
                fit.curve.top,
                fit.curve.bottom,
                fit.curve.midpoint,
                fit.curve.slope,
                fit.rmse,
                fit.n,
            )),
            None => out.push_str(&format!(
                "  {:<10} titer={:<10} (no titration)\n",
                shape.shape.display_name(),
                shape.titer.to_string(),
            )),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DilutionLadder, ShapeTiter, Titer};
    use std::path::PathBuf;

    fn config() -> RunConfig {
        RunConfig {
            input: PathBuf::from("counts.csv"),
            ladder: DilutionLadder::standard(),
            limit_percent: 50.0,
            interpolate: false,
            serum: None,
            virus: None,
            export_results: None,
            export_curves: None,
        }
    }

    fn group() -> GroupTiters {
        GroupTiters {
            serum: "S001".to_string(),
            virus: "WNV".to_string(),
            discrete: Titer::Numeric(640.0),
            continuous: CurveShape::ALL
                .iter()
                .map(|&shape| ShapeTiter {
                    shape,
                    titer: Titer::Numeric(620.11),
                    fit: None,
                })
                .collect(),
        }
    }

    #[test]
    fn table_lists_every_method_column() {
        let text = format_titer_table(&[group()], &config());
        assert!(text.contains("DISCRETE"));
        assert!(text.contains("FREE"));
        assert!(text.contains("S001"));
        assert!(text.contains("640"));
        assert!(text.contains("620.11"));
    }

    #[test]
    fn detail_marks_missing_fits() {
        let text = format_group_detail(&group());
        assert!(text.contains("S001 / WNV"));
        assert!(text.contains("(no titration)"));
        assert!(text.contains("fix-both"));
    }
}
