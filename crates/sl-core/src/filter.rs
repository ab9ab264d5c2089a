//! Conjunctive range filters over the unified timeline.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entry::UnifiedLogEntry;
use crate::types::LogKind;

/// Lowest severity on the logging scale.
pub const SEVERITY_MIN: i64 = 1;

/// Highest severity on the logging scale.
pub const SEVERITY_MAX: i64 = 10;

/// The global filters of an analytics view.
///
/// An entry passes only if it satisfies every bound. Empty `kinds` or
/// `labels` sets exclude everything; they never mean "match all".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub kinds: BTreeSet<LogKind>,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub severity_min: i64,
    pub severity_max: i64,
    pub labels: BTreeSet<String>,
}

impl FilterCriteria {
    /// Criteria that admit every labelled entry in `entries`.
    ///
    /// This is the state of a view before the user narrows anything: every
    /// kind, the full date span, the whole severity scale, and every label seen.
    pub fn admitting_all(entries: &[UnifiedLogEntry]) -> Self {
        let date_start = entries.iter().map(|e| e.date).min();
        let date_end = entries.iter().map(|e| e.date).max();
        Self {
            kinds: LogKind::ALL.into_iter().collect(),
            date_start: date_start.unwrap_or(NaiveDate::MIN),
            date_end: date_end.unwrap_or(NaiveDate::MAX),
            severity_min: SEVERITY_MIN,
            severity_max: SEVERITY_MAX,
            labels: entries.iter().filter_map(|e| e.label.clone()).collect(),
        }
    }

    /// Returns true if the entry satisfies every bound.
    pub fn matches(&self, entry: &UnifiedLogEntry) -> bool {
        self.kinds.contains(&entry.kind)
            && (self.date_start..=self.date_end).contains(&entry.date)
            && (self.severity_min..=self.severity_max).contains(&entry.severity)
            && entry
                .label
                .as_ref()
                .is_some_and(|label| self.labels.contains(label))
    }
}

/// Returns the entries passing `criteria`, in their original order.
pub fn filter(entries: &[UnifiedLogEntry], criteria: &FilterCriteria) -> Vec<UnifiedLogEntry> {
    let passing: Vec<_> = entries
        .iter()
        .filter(|e| criteria.matches(e))
        .cloned()
        .collect();
    tracing::debug!(
        input = entries.len(),
        output = passing.len(),
        "applied range filter"
    );
    passing
}
