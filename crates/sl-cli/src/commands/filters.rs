//! Global view filters shared by the analytics commands.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use sl_core::{AnalyticsSnapshot, FilterCriteria, LogKind, names_match};

use super::util::parse_date;

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// First date to include (YYYY-MM-DD or relative, e.g. '2 weeks ago').
    #[arg(long)]
    pub from: Option<String>,

    /// Last date to include.
    #[arg(long)]
    pub to: Option<String>,

    /// Lowest severity to include.
    #[arg(long)]
    pub min_severity: Option<i64>,

    /// Highest severity to include.
    #[arg(long)]
    pub max_severity: Option<i64>,

    /// Only include these kinds (symptom, side_effect). Repeatable.
    #[arg(long = "kind")]
    pub kinds: Vec<LogKind>,

    /// Only include these labels. Repeatable.
    #[arg(long = "label")]
    pub labels: Vec<String>,
}

impl FilterArgs {
    /// Narrows the snapshot's admit-all criteria by whatever was given.
    pub fn criteria(
        &self,
        snapshot: &AnalyticsSnapshot,
        today: NaiveDate,
    ) -> Result<FilterCriteria> {
        let mut criteria = snapshot.default_criteria();

        if let Some(from) = &self.from {
            criteria.date_start = parse_date(from, today)?;
        }
        if let Some(to) = &self.to {
            criteria.date_end = parse_date(to, today)?;
        }
        if let Some(min) = self.min_severity {
            criteria.severity_min = min;
        }
        if let Some(max) = self.max_severity {
            criteria.severity_max = max;
        }
        if !self.kinds.is_empty() {
            criteria.kinds = self.kinds.iter().copied().collect();
        }
        if !self.labels.is_empty() {
            // Resolve case-insensitively against known labels; unknown names match nothing.
            criteria.labels = self
                .labels
                .iter()
                .map(|wanted| {
                    criteria
                        .labels
                        .iter()
                        .find(|known| names_match(known, wanted.trim()))
                        .cloned()
                        .unwrap_or_else(|| wanted.clone())
                })
                .collect();
        }

        tracing::debug!(?criteria, "resolved filter criteria");
        Ok(criteria)
    }
}
