//! Chart command: group-and-count over the filtered timeline.
//!
//! Boolean and numeric keys are drawn as bars in key order. Categorical keys
//! also show each key's share of the total, the way a pie legend would.

use std::fmt::Write;

use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use sl_core::{GroupBucket, GroupedCounts, KeyKind, LogField};

use super::filters::FilterArgs;
use super::util::{progress_bar, truncate};
use crate::Config;
use crate::fetch::load_snapshot;

const fn kind_name(kind: KeyKind) -> &'static str {
    match kind {
        KeyKind::Boolean => "boolean",
        KeyKind::Numeric => "numeric",
        KeyKind::Categorical => "categorical",
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 * 100.0 / total as f64
}

/// Writes the bar rows for one set of counts.
pub fn write_counts(output: &mut String, counts: &GroupedCounts) {
    let max = counts.buckets.iter().map(|b| b.count).max().unwrap_or(0);
    let total = counts.total();
    for bucket in &counts.buckets {
        write!(
            output,
            "{:<20}  {}  {:>4}",
            truncate(&bucket.key, 20),
            progress_bar(bucket.count, max),
            bucket.count
        )
        .unwrap();
        if counts.kind == KeyKind::Categorical {
            write!(output, "  {:>5.1}%", percent(bucket.count, total)).unwrap();
        }
        writeln!(output).unwrap();
    }
}

/// Format chart data for human-readable output.
pub fn format_chart(field: LogField, counts: &GroupedCounts) -> String {
    let mut output = String::new();

    if counts.is_empty() {
        writeln!(output, "No {field} values among the filtered entries.").unwrap();
        return output;
    }

    writeln!(
        output,
        "CHART: {field} ({}, {} counted)",
        kind_name(counts.kind),
        counts.total()
    )
    .unwrap();
    writeln!(output).unwrap();
    write_counts(&mut output, counts);
    output
}

#[derive(Debug, Serialize)]
struct JsonChart<'a> {
    field: LogField,
    kind: KeyKind,
    total: usize,
    buckets: &'a [GroupBucket],
}

/// Format chart data as JSON.
pub fn format_chart_json(field: LogField, counts: &GroupedCounts) -> Result<String> {
    let chart = JsonChart {
        field,
        kind: counts.kind,
        total: counts.total(),
        buckets: &counts.buckets,
    };
    Ok(serde_json::to_string_pretty(&chart)?)
}

/// Runs the chart command.
pub fn run(config: &Config, field: LogField, filters: &FilterArgs, json: bool) -> Result<()> {
    let fetched = load_snapshot(&config.database_path)?;
    let criteria = filters.criteria(&fetched.snapshot, Local::now().date_naive())?;
    let counts = fetched.snapshot.chart(&criteria, field);

    if json {
        println!("{}", format_chart_json(field, &counts)?);
    } else {
        print!("{}", format_chart(field, &counts));
    }
    Ok(())
}
