//! Treatment usage intervals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{TreatmentCategory, ValidationError, non_blank};

/// A span during which a treatment was (or still is) in use.
///
/// Ending a treatment sets `end_date` and `end_reason`; treatments are never
/// removed from history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentInterval {
    /// Name, unique among the user's active treatments.
    pub name: String,

    pub category: TreatmentCategory,

    pub start_date: NaiveDate,

    /// `None` while the treatment is still in use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<String>,
}

impl TreatmentInterval {
    /// Creates an active treatment.
    pub fn new(
        name: impl Into<String>,
        category: TreatmentCategory,
        start_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "treatment name",
            });
        }
        Ok(Self {
            name,
            category,
            start_date,
            end_date: None,
            end_reason: None,
        })
    }

    /// Returns this treatment closed on `end_date`.
    pub fn ended(
        mut self,
        end_date: NaiveDate,
        reason: Option<String>,
    ) -> Result<Self, ValidationError> {
        if end_date < self.start_date {
            return Err(ValidationError::EndBeforeStart {
                start: self.start_date,
                end: end_date,
            });
        }
        self.end_date = Some(end_date);
        self.end_reason = non_blank(reason);
        Ok(self)
    }

    /// Checks the name and date invariants of a treatment built elsewhere.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "treatment name",
            });
        }
        match self.end_date {
            Some(end) if end < self.start_date => Err(ValidationError::EndBeforeStart {
                start: self.start_date,
                end,
            }),
            _ => Ok(()),
        }
    }

    /// Validates a treatment built elsewhere and drops a blank end reason.
    pub fn normalized(mut self) -> Result<Self, ValidationError> {
        self.validate()?;
        self.end_reason = non_blank(self.end_reason);
        Ok(self)
    }

    /// Returns true while no end date is set.
    pub const fn is_active(&self) -> bool {
        self.end_date.is_none()
    }

    /// Returns true if `date` falls inside the interval. Open intervals extend forever.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && self.end_date.is_none_or(|end| date <= end)
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }
}

/// Compares two treatment names under Unicode lowercase folding.
pub fn names_match(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Finds the first treatment with the given name, ignoring case.
pub fn find_treatment<'a>(
    treatments: &'a [TreatmentInterval],
    name: &str,
) -> Option<&'a TreatmentInterval> {
    treatments.iter().find(|t| t.is_named(name))
}
