//! The unified log entry shared by every analytics view.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::LogKind;

/// A symptom or side-effect occurrence after normalization.
///
/// `date` and `severity` are always present. Optional text fields are never
/// `Some("")`: blank values are normalized to `None` during merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedLogEntry {
    /// Primary key in the source table. Unique only together with `kind`.
    pub id: i64,

    /// Which source table the entry came from.
    pub kind: LogKind,

    /// Logical event date (not submission time).
    pub date: NaiveDate,

    /// Severity on a 1-10 scale, validated upstream.
    pub severity: i64,

    /// Submission time, used to order entries sharing a date.
    pub submitted_at: DateTime<Utc>,

    /// What happened: the symptom name or the side-effect name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_taken: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_effective: Option<bool>,

    /// Suspected triggers, in the order they were entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggers: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Medication blamed for a side effect. Only set for side-effect entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_effect_treatment_name: Option<String>,
}

impl UnifiedLogEntry {
    /// The entry's identity across both source tables.
    pub const fn key(&self) -> (LogKind, i64) {
        (self.kind, self.id)
    }
}
