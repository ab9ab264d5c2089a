//! Merging symptom and side-effect records into one timeline.
//!
//! Every record maps to exactly one [`UnifiedLogEntry`]. Nothing is dropped or
//! deduplicated across sources. The merged sequence is ordered by `date`
//! descending, then `submitted_at` descending; entries tied on both keep
//! symptoms ahead of side effects and otherwise preserve source order.

use std::cmp::Reverse;

use thiserror::Error;

use crate::entry::UnifiedLogEntry;
use crate::record::{SideEffectRecord, SymptomRecord, parse_record_date};
use crate::types::{LogKind, non_blank};

/// Why a record could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// The record has no date.
    MissingDate,
    /// The record has no severity.
    MissingSeverity,
    /// The date could not be parsed.
    InvalidDate(String),
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDate => f.write_str("missing date"),
            Self::MissingSeverity => f.write_str("missing severity"),
            Self::InvalidDate(raw) => write!(f, "invalid date {raw:?}"),
        }
    }
}

/// A record lacking a required field. The merger never substitutes defaults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {kind} record {id}: {reason}")]
pub struct MalformedRecord {
    pub kind: LogKind,
    pub id: i64,
    pub reason: MalformedReason,
}

/// Result of a lenient merge: the entries that converted and the records that did not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub entries: Vec<UnifiedLogEntry>,
    pub rejected: Vec<MalformedRecord>,
}

impl TryFrom<SymptomRecord> for UnifiedLogEntry {
    type Error = MalformedRecord;

    fn try_from(record: SymptomRecord) -> Result<Self, Self::Error> {
        let (date, severity) = required_fields(
            LogKind::Symptom,
            record.id,
            record.date.as_deref(),
            record.severity,
        )?;
        Ok(Self {
            id: record.id,
            kind: LogKind::Symptom,
            date,
            severity,
            submitted_at: record.submitted_at,
            label: non_blank(record.symptom_name),
            treatment_id: record.treatment_id,
            treatment_name: non_blank(record.treatment_name),
            treatment_taken: record.treatment_taken,
            treatment_effective: record.treatment_effective,
            triggers: record.triggers.filter(|t| !t.is_empty()),
            notes: non_blank(record.notes),
            onset: non_blank(record.onset),
            description: non_blank(record.description),
            side_effect_treatment_name: None,
        })
    }
}

impl TryFrom<SideEffectRecord> for UnifiedLogEntry {
    type Error = MalformedRecord;

    fn try_from(record: SideEffectRecord) -> Result<Self, Self::Error> {
        let (date, severity) = required_fields(
            LogKind::SideEffect,
            record.id,
            record.date.as_deref(),
            record.severity,
        )?;
        Ok(Self {
            id: record.id,
            kind: LogKind::SideEffect,
            date,
            severity,
            submitted_at: record.submitted_at,
            label: non_blank(record.side_effect_name),
            treatment_id: None,
            treatment_name: None,
            treatment_taken: None,
            treatment_effective: None,
            triggers: None,
            notes: non_blank(record.notes),
            onset: None,
            description: non_blank(record.description),
            side_effect_treatment_name: non_blank(record.treatment_name),
        })
    }
}

fn required_fields(
    kind: LogKind,
    id: i64,
    date: Option<&str>,
    severity: Option<i64>,
) -> Result<(chrono::NaiveDate, i64), MalformedRecord> {
    let malformed = |reason| MalformedRecord { kind, id, reason };
    let raw = date
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| malformed(MalformedReason::MissingDate))?;
    let date =
        parse_record_date(raw).ok_or_else(|| malformed(MalformedReason::InvalidDate(raw.into())))?;
    let severity = severity.ok_or_else(|| malformed(MalformedReason::MissingSeverity))?;
    Ok((date, severity))
}

/// Merges both record sets into one ordered timeline.
///
/// Fails on the first malformed record. Use [`merge_lenient`] to keep going.
pub fn merge(
    symptoms: Vec<SymptomRecord>,
    side_effects: Vec<SideEffectRecord>,
) -> Result<Vec<UnifiedLogEntry>, MalformedRecord> {
    let mut entries = Vec::with_capacity(symptoms.len() + side_effects.len());
    for record in symptoms {
        entries.push(UnifiedLogEntry::try_from(record)?);
    }
    for record in side_effects {
        entries.push(UnifiedLogEntry::try_from(record)?);
    }
    sort_timeline(&mut entries);
    Ok(entries)
}

/// Merges both record sets, setting aside records that fail to normalize.
pub fn merge_lenient(
    symptoms: Vec<SymptomRecord>,
    side_effects: Vec<SideEffectRecord>,
) -> MergeReport {
    let mut report = MergeReport::default();

    let converted = symptoms
        .into_iter()
        .map(UnifiedLogEntry::try_from)
        .chain(side_effects.into_iter().map(UnifiedLogEntry::try_from));
    for result in converted {
        match result {
            Ok(entry) => report.entries.push(entry),
            Err(malformed) => {
                tracing::warn!(%malformed, "excluding record from analytics");
                report.rejected.push(malformed);
            }
        }
    }

    sort_timeline(&mut report.entries);
    tracing::debug!(
        entries = report.entries.len(),
        rejected = report.rejected.len(),
        "merged log records"
    );
    report
}

/// Sorts newest first: `date` descending, then `submitted_at` descending.
pub fn sort_timeline(entries: &mut [UnifiedLogEntry]) {
    entries.sort_by_key(|e| (Reverse(e.date), Reverse(e.submitted_at)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0)
            .single()
            .expect("valid test timestamp")
    }

    fn symptom(id: i64, date: &str, submitted_at: DateTime<Utc>) -> SymptomRecord {
        SymptomRecord {
            id,
            date: Some(date.to_string()),
            severity: Some(5),
            submitted_at,
            symptom_name: Some("Migraine".to_string()),
            treatment_id: None,
            treatment_name: None,
            treatment_taken: None,
            treatment_effective: None,
            triggers: None,
            notes: None,
            onset: None,
            description: None,
        }
    }

    fn side_effect(id: i64, date: &str, submitted_at: DateTime<Utc>) -> SideEffectRecord {
        SideEffectRecord {
            id,
            date: Some(date.to_string()),
            severity: Some(3),
            submitted_at,
            side_effect_name: Some("Nausea".to_string()),
            treatment_name: Some("Topiramate".to_string()),
            notes: None,
            description: None,
        }
    }

    #[test]
    fn same_date_orders_by_submission_descending() {
        let a = symptom(1, "2024-03-01", at(10));
        let b = symptom(2, "2024-03-01", at(11));

        let merged = merge(vec![a, b], vec![]).unwrap();

        let ids: Vec<_> = merged.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn date_dominates_submission_time() {
        let older = symptom(1, "2024-02-28", at(23));
        let newer = side_effect(1, "2024-03-01", at(1));

        let merged = merge(vec![older], vec![newer]).unwrap();

        assert_eq!(merged[0].kind, LogKind::SideEffect);
        assert_eq!(merged[1].kind, LogKind::Symptom);
        assert!(merged.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn colliding_ids_across_sources_are_kept() {
        let merged = merge(
            vec![symptom(7, "2024-03-01", at(9))],
            vec![side_effect(7, "2024-03-01", at(9))],
        )
        .unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].key(), (LogKind::Symptom, 7));
        assert_eq!(merged[1].key(), (LogKind::SideEffect, 7));
    }

    #[test]
    fn side_effect_fields_map_to_label_and_blamed_treatment() {
        let entry = UnifiedLogEntry::try_from(side_effect(3, "2024-03-01", at(9))).unwrap();

        assert_eq!(entry.label.as_deref(), Some("Nausea"));
        assert_eq!(
            entry.side_effect_treatment_name.as_deref(),
            Some("Topiramate")
        );
        assert_eq!(entry.treatment_name, None);
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn blank_optional_fields_become_absent() {
        let mut record = symptom(1, "2024-03-01", at(9));
        record.symptom_name = Some(String::new());
        record.notes = Some("   ".to_string());
        record.triggers = Some(vec![]);

        let entry = UnifiedLogEntry::try_from(record).unwrap();

        assert_eq!(entry.label, None);
        assert_eq!(entry.notes, None);
        assert_eq!(entry.triggers, None);
    }

    #[test]
    fn missing_date_fails_fast() {
        let mut bad = symptom(4, "2024-03-01", at(9));
        bad.date = None;

        let err = merge(vec![symptom(1, "2024-03-01", at(9)), bad], vec![]).unwrap_err();

        assert_eq!(err.kind, LogKind::Symptom);
        assert_eq!(err.id, 4);
        assert_eq!(err.reason, MalformedReason::MissingDate);
        assert_eq!(err.to_string(), "malformed symptom record 4: missing date");
    }

    #[test]
    fn missing_severity_is_malformed() {
        let mut bad = side_effect(9, "2024-03-01", at(9));
        bad.severity = None;

        let err = merge(vec![], vec![bad]).unwrap_err();
        assert_eq!(err.reason, MalformedReason::MissingSeverity);
    }

    #[test]
    fn unparseable_date_is_malformed() {
        let bad = symptom(2, "yesterday", at(9));

        let err = UnifiedLogEntry::try_from(bad).unwrap_err();
        assert_eq!(
            err.reason,
            MalformedReason::InvalidDate("yesterday".to_string())
        );
    }

    #[test]
    fn lenient_merge_collects_rejections() {
        let mut bad = symptom(2, "2024-03-01", at(9));
        bad.date = Some(String::new());

        let report = merge_lenient(
            vec![symptom(1, "2024-03-02", at(9)), bad],
            vec![side_effect(1, "2024-03-03", at(9))],
        );

        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].kind, LogKind::SideEffect);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].id, 2);
        assert_eq!(report.rejected[0].reason, MalformedReason::MissingDate);
    }

    #[test]
    fn empty_inputs_merge_to_empty() {
        assert!(merge(vec![], vec![]).unwrap().is_empty());
    }
}
