//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sl_core::{LogField, TreatmentCategory};

use crate::commands::filters::FilterArgs;

/// Symptom log analytics.
///
/// Merges symptom and side-effect logs into one timeline and summarizes them
/// as charts, comparisons and a treatment timeline.
#[derive(Debug, Parser)]
#[command(name = "sl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import records as JSON lines from stdin.
    Import,

    /// List the merged, filtered log timeline.
    Logs {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Count filtered entries grouped by a field.
    Chart {
        /// Field to group by (e.g. severity, label, treatment_taken).
        #[arg(long, default_value = "label")]
        field: LogField,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compare two subsets of the filtered entries.
    ///
    /// A selection is a date range (2024-01-01..2024-02-01), `label:<name>`
    /// or `treatment:<name>`.
    Compare {
        /// Selection for the left panel.
        #[arg(long)]
        left: String,

        /// Selection for the right panel.
        #[arg(long)]
        right: String,

        /// Field to group each subset by.
        #[arg(long, default_value = "severity")]
        field: LogField,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Manage treatments.
    #[command(subcommand)]
    Treatments(TreatmentsAction),

    /// Lay out treatments on a timeline.
    Timeline {
        /// Drawing width; defaults to the configured width.
        #[arg(long)]
        width: Option<f64>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Treatment subcommands.
#[derive(Debug, Subcommand)]
pub enum TreatmentsAction {
    /// List treatments in creation order.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Start a treatment.
    Add {
        /// Treatment name.
        name: String,

        /// preventative or emergency.
        #[arg(long)]
        category: TreatmentCategory,

        /// Start date (YYYY-MM-DD or relative, e.g. '3 days ago').
        #[arg(long)]
        start: String,

        /// End date, for recording a treatment that already finished.
        #[arg(long)]
        end: Option<String>,

        /// Why the treatment was stopped. Only kept with --end.
        #[arg(long, requires = "end")]
        reason: Option<String>,
    },

    /// End an active treatment.
    End {
        /// Treatment name (case-insensitive).
        name: String,

        /// End date (YYYY-MM-DD or relative). Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Why the treatment was stopped.
        #[arg(long)]
        reason: Option<String>,
    },
}
