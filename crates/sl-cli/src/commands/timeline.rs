//! Timeline command: treatment intervals laid out in non-colliding bands.

use std::fmt::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use sl_core::{TimelineLayout, TreatmentInterval};

use super::util::truncate;
use crate::Config;
use crate::fetch::load_snapshot;

/// One drawn treatment.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineRow {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub x_start: f64,
    pub x_end: f64,
    pub band: f64,
}

/// A laid-out timeline ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineView {
    pub axis_start: Option<NaiveDate>,
    pub axis_end: Option<NaiveDate>,
    pub collapsed: bool,
    pub width: f64,
    pub frame_height: f64,
    pub rows: Vec<TimelineRow>,
}

impl TimelineView {
    /// Joins placements back to the treatments they were computed from.
    pub fn new(
        treatments: &[TreatmentInterval],
        layout: &TimelineLayout,
        width: f64,
        frame_margin: f64,
    ) -> Result<Self> {
        let rows = layout
            .placements
            .iter()
            .map(|placement| {
                let treatment = treatments
                    .get(placement.index)
                    .with_context(|| format!("no treatment at index {}", placement.index))?;
                Ok(TimelineRow {
                    name: treatment.name.clone(),
                    start_date: treatment.start_date,
                    end_date: treatment.end_date,
                    x_start: placement.x_start,
                    x_end: placement.x_end,
                    band: placement.band,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            axis_start: layout.axis.map(|a| a.start),
            axis_end: layout.axis.map(|a| a.end),
            collapsed: layout.axis.is_some_and(|a| a.collapsed),
            width,
            frame_height: layout.frame_height(frame_margin),
            rows,
        })
    }
}

/// Format a timeline for human-readable output.
pub fn format_timeline(view: &TimelineView) -> String {
    let mut output = String::new();

    let (Some(start), Some(end)) = (view.axis_start, view.axis_end) else {
        writeln!(output, "No treatments to lay out.").unwrap();
        return output;
    };

    writeln!(
        output,
        "TIMELINE {start} to {end} (width {}, height {})",
        view.width, view.frame_height
    )
    .unwrap();
    if view.collapsed {
        writeln!(output, "Single point in time; every treatment is centered.").unwrap();
    }
    writeln!(output).unwrap();

    writeln!(
        output,
        "{:<22}  {:<10}  {:<10}  {:>6}  {:>6}  Band",
        "Name", "Start", "End", "From", "To"
    )
    .unwrap();
    writeln!(
        output,
        "──────────────────────  ──────────  ──────────  ──────  ──────  ────"
    )
    .unwrap();

    for row in &view.rows {
        let end = row
            .end_date
            .map_or_else(|| "active".to_string(), |d| d.to_string());
        writeln!(
            output,
            "{:<22}  {:<10}  {:<10}  {:>6.1}  {:>6.1}  {:>4.0}",
            truncate(&row.name, 22),
            row.start_date.to_string(),
            end,
            row.x_start,
            row.x_end,
            row.band
        )
        .unwrap();
    }

    output
}

/// Runs the timeline command.
pub fn run(config: &Config, width: Option<f64>, json: bool) -> Result<()> {
    let width = width.unwrap_or(config.timeline.width);
    let fetched = load_snapshot(&config.database_path)?;
    let layout = fetched
        .snapshot
        .timeline(width, &config.timeline.layout())
        .context("invalid timeline settings")?;
    let view = TimelineView::new(
        fetched.snapshot.treatments(),
        &layout,
        width,
        config.timeline.frame_margin,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", format_timeline(&view));
    }
    Ok(())
}
