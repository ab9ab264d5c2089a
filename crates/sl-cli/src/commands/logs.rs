//! Logs command: the merged timeline after the view filters.

use std::fmt::Write;

use anyhow::Result;
use chrono::Local;
use sl_core::{LogKind, UnifiedLogEntry};

use super::filters::FilterArgs;
use super::util::truncate;
use crate::fetch::load_snapshot;
use crate::Config;

/// Format entries for human-readable output.
pub fn format_logs(entries: &[UnifiedLogEntry]) -> String {
    let mut output = String::new();

    if entries.is_empty() {
        writeln!(output, "No entries match the current filters.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<10}  {:<11}  {:>3}  {:<22}  Treatment",
        "Date", "Kind", "Sev", "Label"
    )
    .unwrap();
    writeln!(
        output,
        "──────────  ───────────  ───  ──────────────────────  ──────────────────"
    )
    .unwrap();

    for entry in entries {
        let label = entry.label.as_deref().unwrap_or("(none)");
        let treatment = match entry.kind {
            LogKind::Symptom => entry.treatment_name.as_deref(),
            LogKind::SideEffect => entry.side_effect_treatment_name.as_deref(),
        };
        writeln!(
            output,
            "{:<10}  {:<11}  {:>3}  {:<22}  {}",
            entry.date.format("%Y-%m-%d"),
            entry.kind.as_str(),
            entry.severity,
            truncate(label, 22),
            treatment.unwrap_or("-")
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "{} entries", entries.len()).unwrap();
    output
}

/// Runs the logs command.
pub fn run(config: &Config, filters: &FilterArgs, json: bool) -> Result<()> {
    let fetched = load_snapshot(&config.database_path)?;
    let criteria = filters.criteria(&fetched.snapshot, Local::now().date_naive())?;
    let entries = fetched.snapshot.filtered(&criteria);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print!("{}", format_logs(&entries));
    }
    Ok(())
}
