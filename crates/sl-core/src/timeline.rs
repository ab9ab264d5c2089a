//! Treatment timeline layout.
//!
//! Treatments are placed on a horizontal time axis that starts on the first
//! day of the earliest month and ends on the first day of the month after the
//! latest one. Vertical bands are assigned greedily in input order: a
//! treatment moves down one step at a time until its band is at least
//! `collision_threshold` away from every earlier treatment it overlaps.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::treatment::TreatmentInterval;
use crate::types::ValidationError;

/// Tunables for band assignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Band every treatment starts at.
    pub base_band: f64,
    /// How far a colliding treatment moves per retry.
    pub band_step: f64,
    /// Bands closer than this are visually indistinguishable.
    pub collision_threshold: f64,
    /// Drawn length of a treatment that has not ended yet.
    pub open_end_offset: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_band: 20.0,
            band_step: 20.0,
            collision_threshold: 20.0,
            open_end_offset: 30.0,
        }
    }
}

/// Most steps a treatment may take to clear a single placed neighbour.
pub const MAX_STEPS_PER_COLLISION: u32 = 10_000;

impl LayoutConfig {
    /// Rejects settings under which band assignment could loop forever.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("base band", self.base_band),
            ("band step", self.band_step),
            ("collision threshold", self.collision_threshold),
            ("open end offset", self.open_end_offset),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite { field, value });
            }
        }
        if self.band_step <= 0.0 {
            return Err(ValidationError::InvalidBandStep {
                value: self.band_step,
            });
        }
        if self.collision_threshold < 0.0 {
            return Err(ValidationError::InvalidCollisionThreshold {
                value: self.collision_threshold,
            });
        }
        if self.collision_threshold / self.band_step > f64::from(MAX_STEPS_PER_COLLISION) {
            return Err(ValidationError::TooManySteps {
                threshold: self.collision_threshold,
                step: self.band_step,
                max: MAX_STEPS_PER_COLLISION,
            });
        }
        Ok(())
    }
}

/// The month-aligned span the timeline covers. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAxis {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Set when there is nothing to spread out: one treatment, or one distinct date.
    pub collapsed: bool,
}

impl TimeAxis {
    /// Axis covering every start and end date, or `None` without treatments.
    pub fn spanning(treatments: &[TreatmentInterval]) -> Option<Self> {
        let boundaries = || {
            treatments
                .iter()
                .flat_map(|t| std::iter::once(t.start_date).chain(t.end_date))
        };
        let earliest = boundaries().min()?;
        let latest = boundaries().max()?;

        let start = first_of_month(earliest);
        let end = first_of_month(latest)
            .checked_add_months(Months::new(1))
            .unwrap_or(latest);
        Some(Self {
            start,
            end,
            collapsed: treatments.len() == 1 || earliest == latest,
        })
    }

    /// Linear position of `date` across `width`.
    #[allow(clippy::cast_precision_loss)]
    pub fn position(&self, date: NaiveDate, width: f64) -> f64 {
        let span = (self.end - self.start).num_days();
        if self.collapsed || span <= 0 {
            return width / 2.0;
        }
        let offset = (date - self.start).num_days();
        offset as f64 / span as f64 * width
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Where one treatment is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Index into the input treatment slice.
    pub index: usize,
    pub x_start: f64,
    pub x_end: f64,
    pub band: f64,
}

impl Placement {
    fn overlaps(&self, other: &Self) -> bool {
        self.x_start <= other.x_end && other.x_start <= self.x_end
    }
}

/// Placements for every treatment plus the deepest band used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineLayout {
    pub axis: Option<TimeAxis>,
    pub placements: Vec<Placement>,
    pub max_band: f64,
}

impl TimelineLayout {
    /// Height a container needs to show every band plus a fixed margin.
    pub fn frame_height(&self, margin: f64) -> f64 {
        self.max_band + margin
    }
}

/// Lays out treatments across `total_width`, in their given order.
pub fn layout(
    treatments: &[TreatmentInterval],
    total_width: f64,
    config: &LayoutConfig,
) -> Result<TimelineLayout, ValidationError> {
    config.validate()?;

    let Some(axis) = TimeAxis::spanning(treatments) else {
        return Ok(TimelineLayout {
            axis: None,
            placements: Vec::new(),
            max_band: 0.0,
        });
    };

    let mut placements: Vec<Placement> = Vec::with_capacity(treatments.len());
    let mut retries = 0_usize;
    for (index, treatment) in treatments.iter().enumerate() {
        let x_start = axis.position(treatment.start_date, total_width);
        let x_end = treatment.end_date.map_or(x_start + config.open_end_offset, |end| {
            axis.position(end, total_width)
        });

        let mut candidate = Placement {
            index,
            x_start,
            x_end,
            band: config.base_band,
        };
        while placements.iter().any(|placed| {
            candidate.overlaps(placed)
                && (placed.band - candidate.band).abs() < config.collision_threshold
        }) {
            let next = candidate.band + config.band_step;
            if next <= candidate.band {
                return Err(ValidationError::StepBelowPrecision {
                    band: candidate.band,
                    step: config.band_step,
                });
            }
            candidate.band = next;
            retries += 1;
        }
        placements.push(candidate);
    }

    let max_band = placements
        .iter()
        .map(|p| p.band)
        .fold(config.base_band, f64::max);
    tracing::debug!(
        treatments = treatments.len(),
        retries,
        max_band,
        "laid out treatment timeline"
    );

    Ok(TimelineLayout {
        axis: Some(axis),
        placements,
        max_band,
    })
}
