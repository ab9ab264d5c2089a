//! Immutable analytics input.
//!
//! A snapshot is assembled once all fetches have finished and is only read
//! afterwards. Every view computes from the same snapshot, so no engine
//! function touches shared or ambient state.

use crate::compare::{ComparisonPair, CompareSelection, compare_pair};
use crate::entry::UnifiedLogEntry;
use crate::filter::{FilterCriteria, filter};
use crate::group::{GroupedCounts, LogField, group_by_field};
use crate::merge::{MalformedRecord, merge_lenient};
use crate::record::{SideEffectRecord, SymptomRecord};
use crate::timeline::{LayoutConfig, TimelineLayout, layout};
use crate::treatment::TreatmentInterval;
use crate::types::ValidationError;

/// Merged logs and treatments for one analytics session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyticsSnapshot {
    entries: Vec<UnifiedLogEntry>,
    rejected: Vec<MalformedRecord>,
    treatments: Vec<TreatmentInterval>,
}

impl AnalyticsSnapshot {
    /// Merges raw records into a snapshot. Malformed records are kept aside in `rejected`.
    pub fn build(
        symptoms: Vec<SymptomRecord>,
        side_effects: Vec<SideEffectRecord>,
        treatments: Vec<TreatmentInterval>,
    ) -> Self {
        let report = merge_lenient(symptoms, side_effects);
        Self {
            entries: report.entries,
            rejected: report.rejected,
            treatments,
        }
    }

    /// Merged entries, newest first.
    pub fn entries(&self) -> &[UnifiedLogEntry] {
        &self.entries
    }

    /// Records excluded from analytics.
    pub fn rejected(&self) -> &[MalformedRecord] {
        &self.rejected
    }

    /// Treatments in creation order.
    pub fn treatments(&self) -> &[TreatmentInterval] {
        &self.treatments
    }

    /// Criteria admitting every labelled entry.
    pub fn default_criteria(&self) -> FilterCriteria {
        FilterCriteria::admitting_all(&self.entries)
    }

    pub fn filtered(&self, criteria: &FilterCriteria) -> Vec<UnifiedLogEntry> {
        filter(&self.entries, criteria)
    }

    /// Chart data for `field` over the entries passing `criteria`.
    pub fn chart(&self, criteria: &FilterCriteria, field: LogField) -> GroupedCounts {
        group_by_field(&self.filtered(criteria), field)
    }

    pub fn compare(
        &self,
        baseline: &FilterCriteria,
        left: &CompareSelection,
        right: &CompareSelection,
    ) -> ComparisonPair {
        compare_pair(&self.entries, baseline, left, right, &self.treatments)
    }

    pub fn timeline(
        &self,
        total_width: f64,
        config: &LayoutConfig,
    ) -> Result<TimelineLayout, ValidationError> {
        layout(&self.treatments, total_width, config)
    }
}
