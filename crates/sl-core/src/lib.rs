//! Core analytics engine for symptom logs.
//!
//! This crate contains the pure computations behind the analytics views:
//! - Merge: normalizing symptom and side-effect records into one timeline
//! - Filter: conjunctive date, severity, kind and label filters
//! - Group: group-and-count with key coercion for chart data
//! - Compare: comparison subsets with fixed criterion precedence
//! - Timeline: treatment interval layout with greedy band assignment
//!
//! Nothing here performs I/O or holds shared state.

pub mod compare;
pub mod entry;
pub mod filter;
pub mod group;
pub mod merge;
pub mod record;
mod snapshot;
pub mod timeline;
pub mod treatment;
pub mod types;

#[cfg(test)]
mod fixtures;

pub use compare::{CompareSelection, Comparison, ComparisonPair, DateRange, compare_subset};
pub use entry::UnifiedLogEntry;
pub use filter::{FilterCriteria, filter};
pub use group::{
    FieldValue, GroupBucket, GroupedCounts, KeyKind, LogField, classify, group, group_by_field,
};
pub use merge::{MalformedReason, MalformedRecord, MergeReport, merge, merge_lenient};
pub use record::{SideEffectRecord, SymptomRecord};
pub use snapshot::AnalyticsSnapshot;
pub use timeline::{LayoutConfig, Placement, TimelineLayout, layout};
pub use treatment::{TreatmentInterval, names_match};
pub use types::{LogKind, TreatmentCategory, ValidationError};
