//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid log kind value.
    #[error("invalid log kind: {value}")]
    InvalidLogKind { value: String },

    /// Invalid treatment category value.
    #[error("invalid treatment category: {value}")]
    InvalidCategory { value: String },

    /// The named field cannot be charted.
    #[error("unknown log field: {value}")]
    UnknownField { value: String },

    /// A treatment ends before it starts.
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// The band step would never resolve a collision.
    #[error("band step must be positive, got {value}")]
    InvalidBandStep { value: f64 },

    /// The collision threshold is negative or NaN.
    #[error("collision threshold must be non-negative, got {value}")]
    InvalidCollisionThreshold { value: f64 },

    /// A layout setting is infinite or NaN.
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    /// Clearing one collision would take more than the allowed number of steps.
    #[error("collision threshold {threshold} needs more than {max} steps of {step}")]
    TooManySteps { threshold: f64, step: f64, max: u32 },

    /// Adding the step no longer changes the band at this magnitude.
    #[error("band step {step} is too small to move band {band}")]
    StepBelowPrecision { band: f64, step: f64 },
}

/// Which source table a log entry came from.
///
/// Source ids are only unique within a kind, so `(kind, id)` identifies an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    /// A symptom occurrence.
    Symptom,
    /// A medication side-effect occurrence.
    SideEffect,
}

impl LogKind {
    /// Both kinds, in merge order.
    pub const ALL: [Self; 2] = [Self::Symptom, Self::SideEffect];

    /// String representation for storage and display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Symptom => "symptom",
            Self::SideEffect => "side_effect",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LogKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "symptom" => Ok(Self::Symptom),
            "side_effect" | "side-effect" => Ok(Self::SideEffect),
            _ => Err(ValidationError::InvalidLogKind {
                value: s.to_string(),
            }),
        }
    }
}

/// How a treatment is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreatmentCategory {
    /// Taken on a schedule to reduce frequency.
    Preventative,
    /// Taken when an episode starts.
    Emergency,
}

impl TreatmentCategory {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Preventative => "preventative",
            Self::Emergency => "emergency",
        }
    }
}

impl fmt::Display for TreatmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TreatmentCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preventative" => Ok(Self::Preventative),
            "emergency" => Ok(Self::Emergency),
            _ => Err(ValidationError::InvalidCategory {
                value: s.to_string(),
            }),
        }
    }
}

/// Returns the value when it holds something other than whitespace.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
