//! Group-by-and-count aggregation for chart data.
//!
//! An accessor pulls one [`FieldValue`] out of each entry. Values are coerced
//! to display keys, counted, and ordered numerically when every key is an
//! integer, lexicographically otherwise. Values with no meaningful key (an
//! absent boolean, an empty string) are left out of the counts entirely.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entry::UnifiedLogEntry;
use crate::types::ValidationError;

const YES: &str = "Yes";
const NO: &str = "No";

/// The value shapes an accessor may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Bool(bool),
    OptionalBool(Option<bool>),
    Str(&'a str),
    OptionalStr(Option<&'a str>),
    Int(i64),
}

impl FieldValue<'_> {
    /// The display key for this value, or `None` if it should not be counted.
    pub fn to_key(self) -> Option<String> {
        match self {
            Self::Bool(b) | Self::OptionalBool(Some(b)) => Some(yes_no(b).to_string()),
            Self::OptionalBool(None) | Self::OptionalStr(None) => None,
            Self::Str(s) | Self::OptionalStr(Some(s)) => {
                if s.is_empty() {
                    None
                } else {
                    Some(s.to_string())
                }
            }
            Self::Int(n) => Some(n.to_string()),
        }
    }
}

const fn yes_no(value: bool) -> &'static str {
    if value { YES } else { NO }
}

/// How a set of keys should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// Only "Yes" and "No".
    Boolean,
    /// Every key is an integer.
    Numeric,
    /// Anything else.
    Categorical,
}

/// Classifies a key set. Boolean wins over numeric, numeric over categorical.
pub fn classify<I, S>(keys: I) -> KeyKind
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut boolean = true;
    let mut numeric = true;
    for key in keys {
        let key = key.as_ref();
        boolean &= key == YES || key == NO;
        numeric &= is_integer(key);
    }
    if boolean {
        KeyKind::Boolean
    } else if numeric {
        KeyKind::Numeric
    } else {
        KeyKind::Categorical
    }
}

fn is_integer(key: &str) -> bool {
    key.parse::<i64>().is_ok()
}

/// One key and how many entries produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBucket {
    pub key: String,
    pub count: usize,
}

/// Ordered counts plus their classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedCounts {
    pub buckets: Vec<GroupBucket>,
    pub kind: KeyKind,
}

impl GroupedCounts {
    /// Number of entries counted under some key.
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    /// Returns true if nothing was counted.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Count for `key`, or zero.
    pub fn count_of(&self, key: &str) -> usize {
        self.buckets
            .iter()
            .find(|b| b.key == key)
            .map_or(0, |b| b.count)
    }
}

/// Groups entries by the key the accessor produces and counts each group.
pub fn group<F>(entries: &[UnifiedLogEntry], accessor: F) -> GroupedCounts
where
    F: Fn(&UnifiedLogEntry) -> FieldValue<'_>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for entry in entries {
        if let Some(key) = accessor(entry).to_key() {
            *counts.entry(key).or_insert(0) += 1;
        }
    }

    let kind = classify(counts.keys());
    // BTreeMap iteration is already lexicographic.
    let mut buckets: Vec<GroupBucket> = counts
        .into_iter()
        .map(|(key, count)| GroupBucket { key, count })
        .collect();
    if buckets.iter().all(|b| is_integer(&b.key)) {
        buckets.sort_by_key(|b| b.key.parse::<i64>().unwrap_or_default());
    }

    GroupedCounts { buckets, kind }
}

/// Entry fields that can be charted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogField {
    Kind,
    Severity,
    Label,
    Treatment,
    TreatmentTaken,
    TreatmentEffective,
    Onset,
    SideEffectTreatment,
}

impl LogField {
    /// Accessor for this field.
    pub fn value(self, entry: &UnifiedLogEntry) -> FieldValue<'_> {
        match self {
            Self::Kind => FieldValue::Str(entry.kind.as_str()),
            Self::Severity => FieldValue::Int(entry.severity),
            Self::Label => FieldValue::OptionalStr(entry.label.as_deref()),
            Self::Treatment => FieldValue::OptionalStr(entry.treatment_name.as_deref()),
            Self::TreatmentTaken => FieldValue::OptionalBool(entry.treatment_taken),
            Self::TreatmentEffective => FieldValue::OptionalBool(entry.treatment_effective),
            Self::Onset => FieldValue::OptionalStr(entry.onset.as_deref()),
            Self::SideEffectTreatment => {
                FieldValue::OptionalStr(entry.side_effect_treatment_name.as_deref())
            }
        }
    }

    /// String representation used on the command line.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Kind => "kind",
            Self::Severity => "severity",
            Self::Label => "label",
            Self::Treatment => "treatment",
            Self::TreatmentTaken => "treatment_taken",
            Self::TreatmentEffective => "treatment_effective",
            Self::Onset => "onset",
            Self::SideEffectTreatment => "side_effect_treatment",
        }
    }
}

impl fmt::Display for LogField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "kind" => Ok(Self::Kind),
            "severity" => Ok(Self::Severity),
            "label" => Ok(Self::Label),
            "treatment" => Ok(Self::Treatment),
            "treatment_taken" => Ok(Self::TreatmentTaken),
            "treatment_effective" => Ok(Self::TreatmentEffective),
            "onset" => Ok(Self::Onset),
            "side_effect_treatment" => Ok(Self::SideEffectTreatment),
            _ => Err(ValidationError::UnknownField {
                value: s.to_string(),
            }),
        }
    }
}

/// Groups entries by a named field.
pub fn group_by_field(entries: &[UnifiedLogEntry], field: LogField) -> GroupedCounts {
    group(entries, |e| field.value(e))
}
