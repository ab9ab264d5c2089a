//! Treatments command for listing, starting and ending treatments.

use std::fmt::Write;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use sl_core::{TreatmentCategory, TreatmentInterval};
use sl_db::Database;

use super::util::{parse_date, truncate};

/// Format treatments for human-readable output.
pub fn format_treatments(treatments: &[TreatmentInterval]) -> String {
    let mut output = String::new();

    writeln!(output, "TREATMENTS").unwrap();
    writeln!(output).unwrap();

    if treatments.is_empty() {
        writeln!(output, "No treatments recorded.").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "Hint: Run 'sl treatments add <name> --category preventative --start <date>' to start one."
        )
        .unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<22}  {:<12}  {:<10}  {:<10}  Reason",
        "Name", "Category", "Start", "End"
    )
    .unwrap();
    writeln!(
        output,
        "──────────────────────  ────────────  ──────────  ──────────  ──────────────────"
    )
    .unwrap();

    for treatment in treatments {
        let end = treatment
            .end_date
            .map_or_else(|| "active".to_string(), |d| d.format("%Y-%m-%d").to_string());
        writeln!(
            output,
            "{:<22}  {:<12}  {:<10}  {:<10}  {}",
            truncate(&treatment.name, 22),
            treatment.category.as_str(),
            treatment.start_date.format("%Y-%m-%d").to_string(),
            end,
            treatment.end_reason.as_deref().unwrap_or("-")
        )
        .unwrap();
    }

    output
}

/// Runs `sl treatments list`.
pub fn list(db: &Database, json: bool) -> Result<()> {
    let treatments = db.treatments()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&treatments)?);
    } else {
        print!("{}", format_treatments(&treatments));
    }
    Ok(())
}

/// Dates given to `sl treatments add`, unparsed.
#[derive(Debug, Clone, Default)]
pub struct Span<'a> {
    pub start: &'a str,
    pub end: Option<&'a str>,
    pub reason: Option<String>,
}

impl<'a> Span<'a> {
    pub const fn open(start: &'a str) -> Self {
        Self {
            start,
            end: None,
            reason: None,
        }
    }
}

/// Records a treatment, active unless `span` carries an end date.
pub fn add(
    db: &mut Database,
    name: &str,
    category: TreatmentCategory,
    span: &Span<'_>,
    today: NaiveDate,
) -> Result<TreatmentInterval> {
    let start = parse_date(span.start, today)?;
    let mut treatment = TreatmentInterval::new(name.trim(), category, start)?;
    if let Some(end) = span.end {
        treatment = treatment.ended(parse_date(end, today)?, span.reason.clone())?;
    }
    db.insert_treatment(&treatment)
        .with_context(|| format!("failed to add treatment {}", treatment.name))?;
    Ok(treatment)
}

/// Ends an active treatment on `date`, or today.
pub fn end(
    db: &mut Database,
    name: &str,
    date: Option<&str>,
    reason: Option<String>,
    today: NaiveDate,
) -> Result<TreatmentInterval> {
    let end_date = date.map_or(Ok(today), |d| parse_date(d, today))?;
    let ended = db.end_treatment(name.trim(), end_date, reason)?;
    Ok(ended)
}

/// Runs `sl treatments add`.
pub fn run_add(
    db: &mut Database,
    name: &str,
    category: TreatmentCategory,
    span: &Span<'_>,
) -> Result<()> {
    let treatment = add(db, name, category, span, Local::now().date_naive())?;
    match treatment.end_date {
        Some(end_date) => println!(
            "Recorded {} ({}) from {} to {end_date}",
            treatment.name, treatment.category, treatment.start_date
        ),
        None => println!(
            "Started {} ({}) on {}",
            treatment.name, treatment.category, treatment.start_date
        ),
    }
    Ok(())
}

/// Runs `sl treatments end`.
pub fn run_end(
    db: &mut Database,
    name: &str,
    date: Option<&str>,
    reason: Option<String>,
) -> Result<()> {
    let ended = end(db, name, date, reason, Local::now().date_naive())?;
    if let Some(end_date) = ended.end_date {
        println!("Ended {} on {end_date}", ended.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use sl_db::DbError;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
    }

    #[test]
    fn test_add_then_end() {
        let mut db = Database::open_in_memory().unwrap();
        let category = TreatmentCategory::Preventative;
        add(&mut db, "Topiramate", category, &Span::open("2024-02-01"), today()).unwrap();

        let reason = Some("side effects".to_string());
        let ended = end(&mut db, "topiramate", None, reason, today()).unwrap();

        assert_eq!(ended.end_date, Some(today()));
        assert_eq!(ended.end_reason.as_deref(), Some("side effects"));
        assert!(!db.treatments().unwrap()[0].is_active());
    }

    #[test]
    fn test_add_duplicate_active_fails() {
        let mut db = Database::open_in_memory().unwrap();
        let category = TreatmentCategory::Preventative;
        add(&mut db, "Topiramate", category, &Span::open("2024-02-01"), today()).unwrap();

        let span = Span::open("today");
        let err = add(&mut db, "topiramate", category, &span, today()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DbError>(),
            Some(DbError::DuplicateTreatment { .. })
        ));
    }

    #[test]
    fn test_add_finished_treatment() {
        let mut db = Database::open_in_memory().unwrap();
        let span = Span {
            start: "2024-01-01",
            end: Some("2024-02-01"),
            reason: Some("no effect".into()),
        };

        let category = TreatmentCategory::Preventative;
        let treatment = add(&mut db, "Propranolol", category, &span, today()).unwrap();

        assert!(!treatment.is_active());
        // A finished treatment does not block starting the same one again.
        add(&mut db, "Propranolol", category, &Span::open("today"), today()).unwrap();
        assert_eq!(db.treatments().unwrap().len(), 2);
    }

    #[test]
    fn test_add_rejects_end_before_start() {
        let mut db = Database::open_in_memory().unwrap();
        let span = Span {
            start: "2024-02-01",
            end: Some("2024-01-01"),
            reason: None,
        };

        let category = TreatmentCategory::Preventative;
        let result = add(&mut db, "Propranolol", category, &span, today());

        assert!(result.is_err());
        assert!(db.treatments().unwrap().is_empty());
    }

    #[test]
    fn test_end_unknown_treatment_fails() {
        let mut db = Database::open_in_memory().unwrap();
        let err = end(&mut db, "Propranolol", None, None, today()).unwrap_err();
        assert_eq!(err.to_string(), "no active treatment named Propranolol");
    }

    #[test]
    fn test_format_treatments() {
        let topiramate = TreatmentInterval::new(
            "Topiramate",
            TreatmentCategory::Preventative,
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        )
        .unwrap()
        .ended(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            Some("tingling".into()),
        )
        .unwrap();
        let sumatriptan = TreatmentInterval::new(
            "Sumatriptan",
            TreatmentCategory::Emergency,
            NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(),
        )
        .unwrap();

        let output = format_treatments(&[topiramate, sumatriptan]);

        assert_snapshot!(output, @r"
        TREATMENTS

        Name                    Category      Start       End         Reason
        ──────────────────────  ────────────  ──────────  ──────────  ──────────────────
        Topiramate              preventative  2024-01-10  2024-03-01  tingling
        Sumatriptan             emergency     2024-02-05  active      -
        ");
    }

    #[test]
    fn test_format_no_treatments() {
        let output = format_treatments(&[]);
        assert!(output.contains("No treatments recorded."));
    }
}
