//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{Days, NaiveDate};
use regex::Regex;
use sl_core::{CompareSelection, DateRange};

/// Pre-compiled regex for relative date parsing.
static RELATIVE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(day|week)s?\s+ago$").unwrap());

/// Conservative bound for relative date parsing (~1000 years in days).
const MAX_RELATIVE_DAYS: u64 = 1000 * 365;

/// Parse a date string as ISO 8601, `today`, `yesterday` or a relative date.
///
/// Supports:
/// - ISO 8601: "2024-03-01"
/// - Relative: "3 days ago", "1 week ago"
pub fn parse_date(s: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    match s {
        "today" => return Ok(today),
        "yesterday" => return Ok(today - Days::new(1)),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    let Some(caps) = RELATIVE_DATE_RE.captures(s) else {
        anyhow::bail!(
            "Invalid date: {s}. Use YYYY-MM-DD (e.g., 2024-03-01) or relative (e.g., '3 days ago')"
        );
    };

    let n: u64 = caps[1]
        .parse()
        .context("failed to parse number in relative date")?;
    let days = match &caps[2] {
        "day" => n,
        "week" => n.saturating_mul(7),
        unit => anyhow::bail!("Unknown date unit: {unit}"),
    };

    if days > MAX_RELATIVE_DAYS {
        anyhow::bail!("Relative date too far back: {s}");
    }

    today
        .checked_sub_days(Days::new(days))
        .with_context(|| format!("date out of range: {s}"))
}

/// Parse a comparison selection.
///
/// Accepts `FROM..TO` (dates as in [`parse_date`]), `label:<name>` or
/// `treatment:<name>`.
pub fn parse_selection(s: &str, today: NaiveDate) -> anyhow::Result<CompareSelection> {
    if let Some(label) = s.strip_prefix("label:") {
        return Ok(CompareSelection::by_label(label.trim()));
    }
    if let Some(name) = s.strip_prefix("treatment:") {
        return Ok(CompareSelection::by_treatment(name.trim()));
    }
    let Some((from, to)) = s.split_once("..") else {
        anyhow::bail!(
            "Invalid selection: {s}. Use FROM..TO, label:<name> or treatment:<name>"
        );
    };

    let first = parse_date(from, today)?;
    let last = parse_date(to, today)?;
    if last < first {
        anyhow::bail!("Invalid selection: {s} ends before it starts");
    }
    Ok(CompareSelection::by_date_range(DateRange::days(first, last)))
}

/// Generates a 10-character bar.
/// Non-zero values below 5% of max get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(value: usize, max: usize) -> String {
    if max == 0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = value as f64 / max as f64;
    let filled = if ratio < 0.05 && value > 0 {
        1
    } else {
        (ratio * 10.0).round().min(10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// Truncates by characters, appending "..." when shortened.
pub fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() > width {
        let keep = width.saturating_sub(3);
        format!("{}...", value.chars().take(keep).collect::<String>())
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date("2024-01-02", today()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_parse_date_keywords() {
        assert_eq!(parse_date("today", today()).unwrap(), today());
        assert_eq!(
            parse_date("yesterday", today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
        );
    }

    #[test]
    fn test_parse_date_relative() {
        assert_eq!(
            parse_date("3 days ago", today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()
        );
        assert_eq!(
            parse_date("1 week ago", today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
        );
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("next tuesday", today()).is_err());
        assert!(parse_date("99999999 weeks ago", today()).is_err());
    }

    #[test]
    fn test_parse_selection_variants() {
        let range = parse_selection("2024-01-01..2024-01-31", today()).unwrap();
        assert_eq!(
            range.date_range,
            Some(DateRange::days(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            ))
        );

        let label = parse_selection("label: Migraine ", today()).unwrap();
        assert_eq!(label, CompareSelection::by_label("Migraine"));

        let treatment = parse_selection("treatment:Topiramate", today()).unwrap();
        assert_eq!(treatment, CompareSelection::by_treatment("Topiramate"));
    }

    #[test]
    fn test_parse_selection_rejects_reversed_range() {
        assert!(parse_selection("2024-02-01..2024-01-01", today()).is_err());
        assert!(parse_selection("Migraine", today()).is_err());
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 0), "░░░░░░░░░░");
        assert_eq!(progress_bar(5, 10), "█████░░░░░");
        assert_eq!(progress_bar(1, 100), "█░░░░░░░░░");
        assert_eq!(progress_bar(10, 10), "██████████");
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("Migraine", 10), "Migraine");
        assert_eq!(truncate("Überempfindlichkeit", 10), "Überemp...");
    }
}
