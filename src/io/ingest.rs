//! Tidy-CSV ingestion of raw plaque counts.
//!
//! Expected shape, one row per serum/virus/replicate:
//!
//! ```text
//! serum,virus,replicate,control,1:20,1:40,...,1:5120
//! S001,WNV,a,53,>50,>50,45,30,12,3,0,nd,nd
//! ```
//!
//! The fixed leading columns are followed by exactly one column per ladder
//! step, in ladder order; any deviation is a fatal input error. Rows are
//! grouped by (serum, virus) in first-appearance order.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::domain::{DilutionLadder, DilutionStep, GroupRecord, RawCount, ReplicateCounts};
use crate::error::TiterError;

const FIXED_COLUMNS: [&str; 4] = ["serum", "virus", "replicate", "control"];

/// Read and group raw-count records from a CSV file.
pub fn read_groups_csv(path: &Path, ladder: &DilutionLadder) -> Result<Vec<GroupRecord>, TiterError> {
    let file = File::open(path).map_err(|e| {
        TiterError::InvalidInput(format!("cannot open input '{}': {e}", path.display()))
    })?;
    parse_groups(file, ladder)
}

/// Parse and group raw-count records from any reader.
pub fn parse_groups<R: Read>(reader: R, ladder: &DilutionLadder) -> Result<Vec<GroupRecord>, TiterError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    validate_header(rdr.headers()?, ladder)?;

    let mut groups: Vec<GroupRecord> = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let line = row + 2;

        if record.len() != FIXED_COLUMNS.len() + ladder.len() {
            return Err(TiterError::DilutionMismatch(format!(
                "line {line}: expected {} fields, got {}",
                FIXED_COLUMNS.len() + ladder.len(),
                record.len()
            )));
        }

        let serum = field(&record, 0, line)?;
        let virus = field(&record, 1, line)?;
        let label = field(&record, 2, line)?;

        let control: f64 = record[3].parse().map_err(|_| {
            TiterError::InvalidInput(format!(
                "line {line}: control count '{}' is not numeric",
                &record[3]
            ))
        })?;
        if !(control.is_finite() && control > 0.0) {
            return Err(TiterError::NonPositiveControl(control));
        }

        let counts: Result<Vec<RawCount>, TiterError> = record
            .iter()
            .skip(FIXED_COLUMNS.len())
            .map(|cell| {
                cell.parse().map_err(|_| {
                    TiterError::InvalidInput(format!(
                        "line {line}: unrecognized plaque count '{cell}'"
                    ))
                })
            })
            .collect();
        let replicate = ReplicateCounts {
            label,
            control,
            counts: counts?,
        };

        match groups
            .iter_mut()
            .find(|g| g.serum == serum && g.virus == virus)
        {
            Some(group) => group.replicates.push(replicate),
            None => groups.push(GroupRecord {
                serum,
                virus,
                replicates: vec![replicate],
            }),
        }
    }

    Ok(groups)
}

fn validate_header(headers: &csv::StringRecord, ladder: &DilutionLadder) -> Result<(), TiterError> {
    for (i, expected) in FIXED_COLUMNS.iter().enumerate() {
        match headers.get(i) {
            Some(actual) if actual.eq_ignore_ascii_case(expected) => {}
            other => {
                return Err(TiterError::InvalidInput(format!(
                    "header column {} must be '{expected}', got {:?}",
                    i + 1,
                    other.unwrap_or("")
                )));
            }
        }
    }

    let steps: Result<Vec<DilutionStep>, TiterError> = headers
        .iter()
        .skip(FIXED_COLUMNS.len())
        .map(str::parse)
        .collect();
    let steps = steps?;
    if steps != ladder.steps() {
        return Err(TiterError::DilutionMismatch(format!(
            "header dilution columns {:?} do not match the ladder {:?}",
            steps.iter().map(ToString::to_string).collect::<Vec<_>>(),
            ladder
                .steps()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
        )));
    }
    Ok(())
}

fn field(record: &csv::StringRecord, idx: usize, line: usize) -> Result<String, TiterError> {
    let value = record[idx].to_string();
    if value.is_empty() {
        return Err(TiterError::InvalidInput(format!(
            "line {line}: column {} must not be empty",
            idx + 1
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "serum,virus,replicate,control,1:20,1:40,1:80,1:160,1:320,1:640,1:1280,1:2560,1:5120";

    fn ladder() -> DilutionLadder {
        DilutionLadder::standard()
    }

    #[test]
    fn groups_rows_by_serum_and_virus() {
        let csv = format!(
            "{HEADER}\n\
             S001,WNV,a,53,>50,>50,45,30,12,3,0,nd,nd\n\
             S001,WNV,b,48,>48,e,40,28,10,2,0,nd,nd\n\
             S002,WNV,a,53,nd,nd,nd,nd,nd,nd,nd,nd,nd\n"
        );
        let groups = parse_groups(csv.as_bytes(), &ladder()).unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].serum, "S001");
        assert_eq!(groups[0].replicates.len(), 2);
        assert_eq!(groups[0].replicates[1].label, "b");
        assert_eq!(groups[0].replicates[1].control, 48.0);
        assert_eq!(groups[0].replicates[0].counts[0], RawCount::TooMany);
        assert_eq!(groups[0].replicates[1].counts[1], RawCount::EqualsControl);
        assert_eq!(groups[0].replicates[0].counts[2], RawCount::Counted(45.0));

        assert_eq!(groups[1].serum, "S002");
        assert!(
            groups[1].replicates[0]
                .counts
                .iter()
                .all(|c| *c == RawCount::NotDone)
        );
    }

    #[test]
    fn header_must_match_the_ladder() {
        let csv = "serum,virus,replicate,control,1:20,1:40\nS001,WNV,a,53,10,5\n";
        let err = parse_groups(csv.as_bytes(), &ladder()).unwrap_err();
        assert!(matches!(err, TiterError::DilutionMismatch(_)));

        let short = DilutionLadder::from_factors(&[20, 40]).unwrap();
        assert!(parse_groups(csv.as_bytes(), &short).is_ok());
    }

    #[test]
    fn fixed_header_columns_are_required() {
        let csv = "sample,virus,replicate,control,1:20\nS001,WNV,a,53,10\n";
        let short = DilutionLadder::from_factors(&[20]).unwrap();
        assert!(matches!(
            parse_groups(csv.as_bytes(), &short).unwrap_err(),
            TiterError::InvalidInput(_)
        ));
    }

    #[test]
    fn control_must_be_positive_and_numeric() {
        let short = DilutionLadder::from_factors(&[20]).unwrap();

        let csv = "serum,virus,replicate,control,1:20\nS001,WNV,a,0,10\n";
        assert!(matches!(
            parse_groups(csv.as_bytes(), &short).unwrap_err(),
            TiterError::NonPositiveControl(_)
        ));

        let csv = "serum,virus,replicate,control,1:20\nS001,WNV,a,many,10\n";
        assert!(matches!(
            parse_groups(csv.as_bytes(), &short).unwrap_err(),
            TiterError::InvalidInput(_)
        ));
    }

    #[test]
    fn bad_count_cells_are_rejected_with_the_line_number() {
        let short = DilutionLadder::from_factors(&[20]).unwrap();
        let csv = "serum,virus,replicate,control,1:20\nS001,WNV,a,53,maybe\n";
        match parse_groups(csv.as_bytes(), &short).unwrap_err() {
            TiterError::InvalidInput(msg) => {
                assert!(msg.contains("line 2"), "{msg}");
                assert!(msg.contains("maybe"), "{msg}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
