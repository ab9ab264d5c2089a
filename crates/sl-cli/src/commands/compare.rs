//! Compare command: two subsets of the filtered timeline, side by side.

use std::fmt::Write;

use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use sl_core::{
    CompareSelection, Comparison, ComparisonPair, GroupedCounts, LogField, UnifiedLogEntry,
    group_by_field,
};

use super::chart::write_counts;
use super::filters::FilterArgs;
use super::util::parse_selection;
use crate::Config;
use crate::fetch::load_snapshot;

/// Short description of what a selection resolved to.
pub fn describe(selection: &CompareSelection) -> String {
    match selection.active() {
        Some(Comparison::DateRange(range)) => format!(
            "{} to {}",
            range.start.format("%Y-%m-%d"),
            range.end.format("%Y-%m-%d")
        ),
        Some(Comparison::Label(label)) => format!("label {}", label.trim()),
        Some(Comparison::Treatment(name)) => format!("treatment {}", name.trim()),
        None => "nothing selected".to_string(),
    }
}

/// One side of the comparison, grouped for display.
#[derive(Debug, Serialize)]
pub struct ComparePanel {
    pub selection: String,
    pub entries: usize,
    pub counts: GroupedCounts,
}

impl ComparePanel {
    fn new(selection: &CompareSelection, subset: &[UnifiedLogEntry], field: LogField) -> Self {
        Self {
            selection: describe(selection),
            entries: subset.len(),
            counts: group_by_field(subset, field),
        }
    }
}

/// Both panels of a comparison.
#[derive(Debug, Serialize)]
pub struct CompareView {
    pub field: LogField,
    pub left: ComparePanel,
    pub right: ComparePanel,
}

impl CompareView {
    pub fn new(
        field: LogField,
        left: &CompareSelection,
        right: &CompareSelection,
        pair: &ComparisonPair,
    ) -> Self {
        Self {
            field,
            left: ComparePanel::new(left, &pair.left, field),
            right: ComparePanel::new(right, &pair.right, field),
        }
    }
}

fn write_panel(output: &mut String, title: &str, panel: &ComparePanel) {
    writeln!(
        output,
        "{title}: {} ({} entries)",
        panel.selection, panel.entries
    )
    .unwrap();
    if panel.counts.is_empty() {
        writeln!(output, "  (no data)").unwrap();
    } else {
        write_counts(output, &panel.counts);
    }
}

/// Format a comparison for human-readable output.
pub fn format_compare(view: &CompareView) -> String {
    let mut output = String::new();
    writeln!(output, "COMPARE by {}", view.field).unwrap();
    writeln!(output).unwrap();
    write_panel(&mut output, "LEFT", &view.left);
    writeln!(output).unwrap();
    write_panel(&mut output, "RIGHT", &view.right);
    output
}

/// Runs the compare command.
pub fn run(
    config: &Config,
    left: &str,
    right: &str,
    field: LogField,
    filters: &FilterArgs,
    json: bool,
) -> Result<()> {
    let today = Local::now().date_naive();
    let left = parse_selection(left, today)?;
    let right = parse_selection(right, today)?;

    let fetched = load_snapshot(&config.database_path)?;
    let baseline = filters.criteria(&fetched.snapshot, today)?;
    let pair = fetched.snapshot.compare(&baseline, &left, &right);
    let view = CompareView::new(field, &left, &right, &pair);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", format_compare(&view));
    }
    Ok(())
}
