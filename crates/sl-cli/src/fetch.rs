//! Concurrent loading of analytics inputs.
//!
//! The three store reads run as separate blocking tasks, each on its own
//! connection, and are joined at a single barrier. Only then is the snapshot
//! assembled. A cancelled read means the caller gets no snapshot at all; a
//! failed read is reported and its input is left empty.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use sl_core::{AnalyticsSnapshot, SideEffectRecord, SymptomRecord, TreatmentInterval};
use sl_db::{Database, DbError};
use tokio::task::{JoinError, JoinHandle};

/// How one read finished.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    Loaded(T),
    Failed(String),
    Cancelled,
}

impl<T> FetchOutcome<T> {
    fn from_join(result: Result<Result<T, DbError>, JoinError>) -> Self {
        match result {
            Ok(Ok(value)) => Self::Loaded(value),
            Ok(Err(err)) => Self::Failed(err.to_string()),
            Err(err) if err.is_cancelled() => Self::Cancelled,
            Err(err) => Self::Failed(format!("fetch task panicked: {err}")),
        }
    }
}

/// Which input a read was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Symptoms,
    SideEffects,
    Treatments,
}

impl fmt::Display for FetchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Symptoms => "symptom logs",
            Self::SideEffects => "side-effect logs",
            Self::Treatments => "treatments",
        })
    }
}

/// A read that failed and was left out of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub source: FetchSource,
    pub message: String,
}

/// A snapshot plus the reads that did not make it in.
#[derive(Debug)]
pub struct FetchedSnapshot {
    pub snapshot: AnalyticsSnapshot,
    pub failures: Vec<FetchFailure>,
}

fn spawn_read<T, F>(path: PathBuf, read: F) -> JoinHandle<Result<T, DbError>>
where
    T: Send + 'static,
    F: FnOnce(&Database) -> Result<T, DbError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let db = Database::open(&path)?;
        read(&db)
    })
}

/// Reads every input concurrently and assembles a snapshot.
///
/// Returns `None` if any read was cancelled.
pub async fn fetch_snapshot(database_path: &Path) -> Option<FetchedSnapshot> {
    let symptoms = spawn_read(database_path.to_path_buf(), Database::symptom_records);
    let side_effects = spawn_read(database_path.to_path_buf(), Database::side_effect_records);
    let treatments = spawn_read(database_path.to_path_buf(), Database::treatments);

    let (symptoms, side_effects, treatments) = tokio::join!(symptoms, side_effects, treatments);

    assemble(
        FetchOutcome::from_join(symptoms),
        FetchOutcome::from_join(side_effects),
        FetchOutcome::from_join(treatments),
    )
}

/// Combines read outcomes into a snapshot.
pub fn assemble(
    symptoms: FetchOutcome<Vec<SymptomRecord>>,
    side_effects: FetchOutcome<Vec<SideEffectRecord>>,
    treatments: FetchOutcome<Vec<TreatmentInterval>>,
) -> Option<FetchedSnapshot> {
    let mut failures = Vec::new();
    let symptoms = settle(symptoms, FetchSource::Symptoms, &mut failures)?;
    let side_effects = settle(side_effects, FetchSource::SideEffects, &mut failures)?;
    let treatments = settle(treatments, FetchSource::Treatments, &mut failures)?;

    Some(FetchedSnapshot {
        snapshot: AnalyticsSnapshot::build(symptoms, side_effects, treatments),
        failures,
    })
}

fn settle<T: Default>(
    outcome: FetchOutcome<T>,
    source: FetchSource,
    failures: &mut Vec<FetchFailure>,
) -> Option<T> {
    match outcome {
        FetchOutcome::Loaded(value) => Some(value),
        FetchOutcome::Failed(message) => {
            tracing::warn!(%source, %message, "fetch failed; continuing without it");
            failures.push(FetchFailure { source, message });
            Some(T::default())
        }
        FetchOutcome::Cancelled => {
            tracing::debug!(%source, "fetch cancelled; skipping update");
            None
        }
    }
}

/// Loads a snapshot on a fresh runtime, blocking until every read has finished.
pub fn load_snapshot(database_path: &Path) -> anyhow::Result<FetchedSnapshot> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start fetch runtime")?;
    let fetched = runtime
        .block_on(fetch_snapshot(database_path))
        .context("loading was cancelled")?;

    for failure in &fetched.failures {
        eprintln!(
            "warning: could not load {}: {}",
            failure.source, failure.message
        );
    }
    let rejected = fetched.snapshot.rejected();
    if !rejected.is_empty() {
        eprintln!(
            "warning: excluded {} malformed record(s) from analytics",
            rejected.len()
        );
    }
    Ok(fetched)
}
