//! Import command for loading records into the local `SQLite` store.
//!
//! Input is JSON lines, one record per line, tagged by `type`:
//! `symptom`, `side_effect` or `treatment`.

use std::io::{self, BufRead};

use anyhow::{Context, Result};
use serde::Deserialize;
use sl_core::{SideEffectRecord, SymptomRecord, TreatmentInterval};
use sl_db::{Database, DbError};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ImportRecord {
    Symptom(SymptomRecord),
    SideEffect(SideEffectRecord),
    Treatment(TreatmentInterval),
}

/// Parsed input, split by destination table.
#[derive(Debug, Default)]
struct ImportBatch {
    symptoms: Vec<SymptomRecord>,
    side_effects: Vec<SideEffectRecord>,
    treatments: Vec<TreatmentInterval>,
}

/// What an import wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub symptoms: usize,
    pub side_effects: usize,
    pub treatments: usize,
    pub skipped_treatments: usize,
}

/// Runs the import command against stdin.
pub fn run(db: &mut Database) -> Result<()> {
    let stdin = io::stdin();
    let summary = import(db, stdin.lock())?;
    println!(
        "Imported {} symptom log(s), {} side-effect log(s), {} treatment(s)",
        summary.symptoms, summary.side_effects, summary.treatments
    );
    if summary.skipped_treatments > 0 {
        println!(
            "Skipped {} treatment(s) already active",
            summary.skipped_treatments
        );
    }
    Ok(())
}

/// Imports every record from `reader`. Log records already present are ignored.
pub fn import<R: BufRead>(db: &mut Database, reader: R) -> Result<ImportSummary> {
    let batch = parse_records(reader)?;

    let mut summary = ImportSummary {
        symptoms: db.insert_symptoms(&batch.symptoms)?,
        side_effects: db.insert_side_effects(&batch.side_effects)?,
        ..ImportSummary::default()
    };

    for treatment in &batch.treatments {
        match db.insert_treatment(treatment) {
            Ok(()) => summary.treatments += 1,
            Err(DbError::DuplicateTreatment { name }) => {
                tracing::warn!(%name, "treatment already active; skipping");
                summary.skipped_treatments += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    tracing::debug!(?summary, "import finished");
    Ok(summary)
}

fn parse_records<R: BufRead>(reader: R) -> Result<ImportBatch> {
    let mut batch = ImportBatch::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: ImportRecord = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid record on line {}", idx + 1))?;
        match record {
            ImportRecord::Symptom(record) => batch.symptoms.push(record),
            ImportRecord::SideEffect(record) => batch.side_effects.push(record),
            ImportRecord::Treatment(treatment) => {
                let treatment = treatment
                    .normalized()
                    .with_context(|| format!("invalid treatment on line {}", idx + 1))?;
                batch.treatments.push(treatment);
            }
        }
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    const INPUT: &str = r#"
{"type":"symptom","id":1,"date":"2024-03-01","severity":6,"submitted_at":"2024-03-01T08:00:00Z","symptom_name":"Migraine","triggers":["stress"]}
{"type":"side_effect","id":1,"date":"2024-03-02","severity":3,"submitted_at":"2024-03-02T09:00:00Z","side_effect_name":"Nausea","treatment_name":"Topiramate"}

{"type":"treatment","name":"Topiramate","category":"preventative","start_date":"2024-02-01"}
"#;

    #[test]
    fn imports_each_record_type() {
        let mut db = Database::open_in_memory().unwrap();

        let summary = import(&mut db, Cursor::new(INPUT)).unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                symptoms: 1,
                side_effects: 1,
                treatments: 1,
                skipped_treatments: 0,
            }
        );
        let symptoms = db.symptom_records().unwrap();
        assert_eq!(symptoms[0].triggers, Some(vec!["stress".to_string()]));
        assert_eq!(db.treatments().unwrap()[0].name, "Topiramate");
    }

    #[test]
    fn reimport_skips_existing_rows() {
        let mut db = Database::open_in_memory().unwrap();
        import(&mut db, Cursor::new(INPUT)).unwrap();

        let summary = import(&mut db, Cursor::new(INPUT)).unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                symptoms: 0,
                side_effects: 0,
                treatments: 0,
                skipped_treatments: 1,
            }
        );
    }

    #[test]
    fn missing_date_is_stored_for_later_rejection() {
        let mut db = Database::open_in_memory().unwrap();
        let input = r#"{"type":"symptom","id":7,"severity":4,"submitted_at":"2024-03-01T08:00:00Z"}"#;

        let summary = import(&mut db, Cursor::new(input)).unwrap();

        assert_eq!(summary.symptoms, 1);
        assert_eq!(db.symptom_records().unwrap()[0].date, None);
    }

    #[test]
    fn bad_json_reports_line_number() {
        let mut db = Database::open_in_memory().unwrap();
        let input = "{\"type\":\"symptom\"}\n";

        let err = import(&mut db, Cursor::new(input)).unwrap_err();

        assert_eq!(err.to_string(), "invalid record on line 1");
    }

    #[test]
    fn treatment_ending_before_start_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let input = r#"{"type":"treatment","name":"Propranolol","category":"preventative","start_date":"2024-02-01","end_date":"2024-01-01"}"#;

        let err = import(&mut db, Cursor::new(input)).unwrap_err();

        assert_eq!(err.to_string(), "invalid treatment on line 1");
        assert!(db.treatments().unwrap().is_empty());
    }

    #[test]
    fn empty_end_reason_is_stored_as_absent() {
        let mut db = Database::open_in_memory().unwrap();
        let input = r#"{"type":"treatment","name":"Propranolol","category":"preventative","start_date":"2024-01-01","end_date":"2024-02-01","end_reason":""}"#;

        import(&mut db, Cursor::new(input)).unwrap();

        let stored = db.treatments().unwrap();
        assert_eq!(stored[0].end_reason, None);
        assert!(!stored[0].is_active());
    }
}
