//! Shared test builders.

use chrono::{NaiveDate, TimeZone, Utc};

use crate::entry::UnifiedLogEntry;
use crate::treatment::TreatmentInterval;
use crate::types::{LogKind, TreatmentCategory};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}

pub fn symptom_entry(id: i64, on: &str) -> UnifiedLogEntry {
    UnifiedLogEntry {
        id,
        kind: LogKind::Symptom,
        date: date(on),
        severity: 5,
        submitted_at: Utc
            .with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
            .single()
            .expect("valid test timestamp"),
        label: Some("Migraine".to_string()),
        treatment_id: None,
        treatment_name: None,
        treatment_taken: None,
        treatment_effective: None,
        triggers: None,
        notes: None,
        onset: None,
        description: None,
        side_effect_treatment_name: None,
    }
}

pub fn labelled_entry(id: i64, on: &str, label: &str) -> UnifiedLogEntry {
    UnifiedLogEntry {
        label: Some(label.to_string()),
        ..symptom_entry(id, on)
    }
}

pub fn treatment(name: &str, start: &str, end: Option<&str>) -> TreatmentInterval {
    TreatmentInterval {
        name: name.to_string(),
        category: TreatmentCategory::Preventative,
        start_date: date(start),
        end_date: end.map(date),
        end_reason: None,
    }
}
