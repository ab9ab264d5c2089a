//! Raw records as they arrive from the store.
//!
//! These mirror the two source tables before normalization. Required fields
//! the store may still leave null (`date`, `severity`) are optional here so
//! the merger can reject them explicitly instead of inventing values.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A symptom occurrence as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomRecord {
    /// Primary key within the symptom table.
    pub id: i64,

    /// Logical event date, `YYYY-MM-DD` or RFC 3339.
    #[serde(default)]
    pub date: Option<String>,

    /// Severity on a 1-10 scale.
    #[serde(default)]
    pub severity: Option<i64>,

    /// When the record was submitted.
    pub submitted_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptom_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_taken: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_effective: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggers: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A medication side-effect occurrence as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideEffectRecord {
    /// Primary key within the side-effect table.
    pub id: i64,

    /// Logical event date, `YYYY-MM-DD` or RFC 3339.
    #[serde(default)]
    pub date: Option<String>,

    /// Severity on a 1-10 scale.
    #[serde(default)]
    pub severity: Option<i64>,

    /// When the record was submitted.
    pub submitted_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_effect_name: Option<String>,

    /// The medication believed to cause the side effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parses a stored date as a calendar date.
///
/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, whose UTC date is used.
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_date() {
        assert_eq!(
            parse_record_date("2024-03-01"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn parse_timestamp_uses_utc_date() {
        assert_eq!(
            parse_record_date("2024-03-01T23:30:00-05:00"),
            NaiveDate::from_ymd_opt(2024, 3, 2)
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_record_date(""), None);
        assert_eq!(parse_record_date("03/01/2024"), None);
        assert_eq!(parse_record_date("2024-02-30"), None);
    }

    #[test]
    fn symptom_record_missing_fields_deserialize_as_none() {
        let json = r#"{"id": 7, "submitted_at": "2024-03-01T10:00:00Z"}"#;
        let record: SymptomRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.date, None);
        assert_eq!(record.severity, None);
        assert_eq!(record.triggers, None);
    }
}
