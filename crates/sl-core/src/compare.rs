//! Comparison subsets for side-by-side analytics panels.
//!
//! A comparison first applies the view's baseline filters, then exactly one
//! comparison predicate. When a selection carries several criteria at once,
//! precedence is fixed: a date range longer than one second wins, then a
//! non-blank label, then a non-blank treatment name. A selection with none
//! of these, or naming an unknown treatment, yields an empty subset.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::UnifiedLogEntry;
use crate::filter::{FilterCriteria, filter};
use crate::treatment::{TreatmentInterval, find_treatment};

/// A picked time range. Entries match on their calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Range covering whole days, from the start of `first` to the last second of `last`.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Self {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        Self {
            start: first.and_time(NaiveTime::MIN).and_utc(),
            end: last.and_time(end_of_day).and_utc(),
        }
    }

    /// A range only counts as a selection when it spans more than one second.
    pub fn is_selected(&self) -> bool {
        self.end - self.start > Duration::seconds(1)
    }

    /// Returns true if `date` lies within the range's calendar days.
    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start.date_naive()..=self.end.date_naive()).contains(&date)
    }
}

/// Everything a comparison panel has selected. Possibly more than one criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
}

/// The single criterion a selection resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison<'a> {
    DateRange(DateRange),
    Label(&'a str),
    Treatment(&'a str),
}

impl CompareSelection {
    pub fn by_date_range(range: DateRange) -> Self {
        Self {
            date_range: Some(range),
            ..Self::default()
        }
    }

    pub fn by_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn by_treatment(name: impl Into<String>) -> Self {
        Self {
            treatment: Some(name.into()),
            ..Self::default()
        }
    }

    /// Resolves the criterion that applies, by precedence.
    pub fn active(&self) -> Option<Comparison<'_>> {
        if let Some(range) = self.date_range.filter(DateRange::is_selected) {
            return Some(Comparison::DateRange(range));
        }
        if let Some(label) = non_blank(self.label.as_deref()) {
            return Some(Comparison::Label(label));
        }
        non_blank(self.treatment.as_deref()).map(Comparison::Treatment)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Derives one comparison subset from `entries`.
pub fn compare_subset(
    entries: &[UnifiedLogEntry],
    baseline: &FilterCriteria,
    selection: &CompareSelection,
    treatments: &[TreatmentInterval],
) -> Vec<UnifiedLogEntry> {
    let Some(comparison) = selection.active() else {
        tracing::debug!("comparison has no active criterion");
        return Vec::new();
    };

    let mut passing = filter(entries, baseline);
    match comparison {
        Comparison::DateRange(range) => passing.retain(|e| range.contains(e.date)),
        Comparison::Label(label) => {
            let wanted = normalize_label(label);
            passing.retain(|e| {
                e.label
                    .as_deref()
                    .is_some_and(|l| normalize_label(l) == wanted)
            });
        }
        Comparison::Treatment(name) => {
            let Some(treatment) = find_treatment(treatments, name) else {
                tracing::debug!(treatment = name, "comparison treatment not found");
                return Vec::new();
            };
            passing.retain(|e| treatment.covers(e.date));
        }
    }
    passing
}

/// Both sides of a comparison view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonPair {
    pub left: Vec<UnifiedLogEntry>,
    pub right: Vec<UnifiedLogEntry>,
}

/// Derives the two subsets of a comparison view under the same baseline.
pub fn compare_pair(
    entries: &[UnifiedLogEntry],
    baseline: &FilterCriteria,
    left: &CompareSelection,
    right: &CompareSelection,
    treatments: &[TreatmentInterval],
) -> ComparisonPair {
    ComparisonPair {
        left: compare_subset(entries, baseline, left, treatments),
        right: compare_subset(entries, baseline, right, treatments),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, labelled_entry, treatment};
    use chrono::TimeZone;

    fn ids(entries: &[UnifiedLogEntry]) -> Vec<i64> {
        entries.iter().map(|e| e.id).collect()
    }

    fn sample() -> Vec<UnifiedLogEntry> {
        vec![
            labelled_entry(1, "2024-06-01", "Migraine"),
            labelled_entry(2, "2024-03-15", " migraine "),
            labelled_entry(3, "2024-02-01", "Aura"),
            labelled_entry(4, "2024-01-05", "Migraine"),
        ]
    }

    #[test]
    fn date_range_takes_precedence_over_label() {
        let entries = sample();
        let baseline = FilterCriteria::admitting_all(&entries);
        let range = DateRange::days(date("2024-02-01"), date("2024-03-31"));

        let both = CompareSelection {
            date_range: Some(range),
            label: Some("Aura".into()),
            treatment: Some("Topiramate".into()),
        };
        let range_only = CompareSelection::by_date_range(range);

        let with_both = compare_subset(&entries, &baseline, &both, &[]);
        let with_range = compare_subset(&entries, &baseline, &range_only, &[]);

        assert_eq!(with_both, with_range);
        assert_eq!(ids(&with_both), vec![2, 3]);
    }

    #[test]
    fn one_second_range_falls_through_to_label() {
        let entries = sample();
        let baseline = FilterCriteria::admitting_all(&entries);
        let instant = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let selection = CompareSelection {
            date_range: Some(DateRange {
                start: instant,
                end: instant + Duration::seconds(1),
            }),
            label: Some("aura".into()),
            treatment: None,
        };

        assert!(matches!(selection.active(), Some(Comparison::Label("aura"))));
        assert_eq!(
            ids(&compare_subset(&entries, &baseline, &selection, &[])),
            vec![3]
        );
    }

    #[test]
    fn label_match_trims_and_ignores_case() {
        let entries = sample();
        let baseline = FilterCriteria::admitting_all(&entries);
        let selection = CompareSelection::by_label("  MIGRAINE");

        assert_eq!(
            ids(&compare_subset(&entries, &baseline, &selection, &[])),
            vec![1, 2, 4]
        );
    }

    #[test]
    fn open_treatment_interval() {
        let entries = sample();
        let baseline = FilterCriteria::admitting_all(&entries);
        let treatments = vec![treatment("Topiramate", "2024-01-10", None)];
        let selection = CompareSelection::by_treatment("topiramate");

        let subset = compare_subset(&entries, &baseline, &selection, &treatments);

        assert_eq!(ids(&subset), vec![1, 2, 3]);
    }

    #[test]
    fn closed_treatment_interval() {
        let entries = sample();
        let baseline = FilterCriteria::admitting_all(&entries);
        let treatments = vec![treatment("Propranolol", "2024-01-01", Some("2024-02-29"))];
        let selection = CompareSelection::by_treatment("Propranolol");

        let subset = compare_subset(&entries, &baseline, &selection, &treatments);

        assert_eq!(ids(&subset), vec![3, 4]);
    }

    #[test]
    fn unknown_treatment_yields_empty() {
        let entries = sample();
        let baseline = FilterCriteria::admitting_all(&entries);
        let treatments = vec![treatment("Topiramate", "2024-01-10", None)];
        let selection = CompareSelection::by_treatment("Amitriptyline");

        assert!(compare_subset(&entries, &baseline, &selection, &treatments).is_empty());
    }

    #[test]
    fn nothing_selected_yields_empty() {
        let entries = sample();
        let baseline = FilterCriteria::admitting_all(&entries);
        let selection = CompareSelection {
            date_range: None,
            label: Some("   ".into()),
            treatment: Some(String::new()),
        };

        assert_eq!(selection.active(), None);
        assert!(compare_subset(&entries, &baseline, &selection, &[]).is_empty());
    }

    #[test]
    fn baseline_applies_before_comparison() {
        let entries = sample();
        let mut baseline = FilterCriteria::admitting_all(&entries);
        baseline.date_start = date("2024-03-01");
        let selection = CompareSelection::by_label("migraine");

        assert_eq!(
            ids(&compare_subset(&entries, &baseline, &selection, &[])),
            vec![1, 2]
        );
    }

    #[test]
    fn pair_uses_shared_baseline() {
        let entries = sample();
        let baseline = FilterCriteria::admitting_all(&entries);

        let pair = compare_pair(
            &entries,
            &baseline,
            &CompareSelection::by_label("Aura"),
            &CompareSelection::by_date_range(DateRange::days(
                date("2024-06-01"),
                date("2024-06-30"),
            )),
            &[],
        );

        assert_eq!(ids(&pair.left), vec![3]);
        assert_eq!(ids(&pair.right), vec![1]);
    }
}
