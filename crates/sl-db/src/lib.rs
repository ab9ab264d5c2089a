//! Storage layer for symptom logs.
//!
//! Provides persistence for symptom logs, side-effect logs and treatments
//! using `rusqlite`. Records are returned in their raw shapes; normalization
//! happens in `sl-core`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Callers that read concurrently open one `Database` per task.
//!
//! # Schema
//!
//! ## Dates
//!
//! Log dates are stored as nullable TEXT exactly as submitted. A missing or
//! malformed date is not repaired here; the merger rejects such records.
//! Treatment dates are stored as `YYYY-MM-DD` and are always valid.
//!
//! ## Timestamps
//!
//! Submission timestamps are stored as TEXT in RFC 3339 format with
//! millisecond precision (e.g., `2024-01-15T10:30:00.000Z`).
//!
//! ## Triggers
//!
//! The `triggers` column stores a JSON array of strings, or NULL.

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, Row, params};
use thiserror::Error;

use sl_core::{
    SideEffectRecord, SymptomRecord, TreatmentCategory, TreatmentInterval, ValidationError,
    names_match,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A value failed domain validation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// Failed to parse a stored submission timestamp.
    #[error("invalid timestamp for {table} row {id}: {timestamp}")]
    TimestampParse {
        table: &'static str,
        id: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// Failed to parse a stored treatment date.
    #[error("invalid {field} for treatment {name}: {value}")]
    DateParse {
        name: String,
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// Stored triggers are not a JSON string array.
    #[error("invalid triggers for symptom {id}")]
    Triggers {
        id: i64,
        #[source]
        source: serde_json::Error,
    },
    /// No active treatment has the given name.
    #[error("no active treatment named {name}")]
    TreatmentNotFound { name: String },
    /// An active treatment already uses the name.
    #[error("treatment {name} is already active")]
    DuplicateTreatment { name: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- date: as submitted, nullable so malformed rows surface during merge
            -- triggers: JSON array of strings
            CREATE TABLE IF NOT EXISTS symptom_logs (
                id INTEGER PRIMARY KEY,
                date TEXT,
                severity INTEGER,
                submitted_at TEXT NOT NULL,
                symptom_name TEXT,
                treatment_id INTEGER,
                treatment_name TEXT,
                treatment_taken INTEGER,
                treatment_effective INTEGER,
                triggers TEXT,
                notes TEXT,
                onset TEXT,
                description TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_symptom_logs_date ON symptom_logs(date);

            CREATE TABLE IF NOT EXISTS side_effect_logs (
                id INTEGER PRIMARY KEY,
                date TEXT,
                severity INTEGER,
                submitted_at TEXT NOT NULL,
                side_effect_name TEXT,
                treatment_name TEXT,
                notes TEXT,
                description TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_side_effect_logs_date ON side_effect_logs(date);

            -- Treatments are ended by setting end_date, never deleted.
            CREATE TABLE IF NOT EXISTS treatments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT,
                end_reason TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_treatments_name ON treatments(name);
            ",
        )?;
        Ok(())
    }

    /// Inserts a batch of symptom records, ignoring duplicates by ID.
    pub fn insert_symptoms(&mut self, records: &[SymptomRecord]) -> Result<usize, DbError> {
        if records.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO symptom_logs
                (id, date, severity, submitted_at, symptom_name, treatment_id, treatment_name,
                 treatment_taken, treatment_effective, triggers, notes, onset, description)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for record in records {
                let triggers = record
                    .triggers
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()
                    .map_err(|source| DbError::Triggers {
                        id: record.id,
                        source,
                    })?;
                inserted += stmt.execute(params![
                    record.id,
                    record.date,
                    record.severity,
                    format_timestamp(record.submitted_at),
                    record.symptom_name,
                    record.treatment_id,
                    record.treatment_name,
                    record.treatment_taken,
                    record.treatment_effective,
                    triggers,
                    record.notes,
                    record.onset,
                    record.description,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(inserted, total = records.len(), "inserted symptom logs");
        Ok(inserted)
    }

    /// Inserts a batch of side-effect records, ignoring duplicates by ID.
    pub fn insert_side_effects(&mut self, records: &[SideEffectRecord]) -> Result<usize, DbError> {
        if records.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO side_effect_logs
                (id, date, severity, submitted_at, side_effect_name, treatment_name, notes, description)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for record in records {
                inserted += stmt.execute(params![
                    record.id,
                    record.date,
                    record.severity,
                    format_timestamp(record.submitted_at),
                    record.side_effect_name,
                    record.treatment_name,
                    record.notes,
                    record.description,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(inserted, total = records.len(), "inserted side-effect logs");
        Ok(inserted)
    }

    /// Lists symptom records ordered by ID.
    pub fn symptom_records(&self) -> Result<Vec<SymptomRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, date, severity, submitted_at, symptom_name, treatment_id, treatment_name,
                   treatment_taken, treatment_effective, triggers, notes, onset, description
            FROM symptom_logs
            ORDER BY id ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| Ok(symptom_from_row(row)))?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row??);
        }
        Ok(records)
    }

    /// Lists side-effect records ordered by ID.
    pub fn side_effect_records(&self) -> Result<Vec<SideEffectRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, date, severity, submitted_at, side_effect_name, treatment_name, notes, description
            FROM side_effect_logs
            ORDER BY id ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| Ok(side_effect_from_row(row)))?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row??);
        }
        Ok(records)
    }

    /// Adds a treatment.
    ///
    /// Fails if an active treatment already has the same name, ignoring case.
    pub fn insert_treatment(&mut self, treatment: &TreatmentInterval) -> Result<(), DbError> {
        treatment.validate()?;
        if treatment.is_active() && self.active_treatment_id(&treatment.name)?.is_some() {
            return Err(DbError::DuplicateTreatment {
                name: treatment.name.clone(),
            });
        }
        self.conn.execute(
            "
            INSERT INTO treatments (name, category, start_date, end_date, end_reason)
            VALUES (?, ?, ?, ?, ?)
            ",
            params![
                treatment.name,
                treatment.category.as_str(),
                format_date(treatment.start_date),
                treatment.end_date.map(format_date),
                treatment.end_reason,
            ],
        )?;
        tracing::debug!(name = %treatment.name, "inserted treatment");
        Ok(())
    }

    /// Ends the active treatment with the given name.
    ///
    /// Returns the closed treatment. Ended treatments stay in history.
    pub fn end_treatment(
        &mut self,
        name: &str,
        end_date: NaiveDate,
        reason: Option<String>,
    ) -> Result<TreatmentInterval, DbError> {
        let Some(id) = self.active_treatment_id(name)? else {
            return Err(DbError::TreatmentNotFound {
                name: name.to_string(),
            });
        };
        let current = self.conn.query_row(
            "
            SELECT name, category, start_date, end_date, end_reason
            FROM treatments WHERE id = ?
            ",
            [id],
            raw_treatment,
        )?;
        let ended = current.into_treatment()?.ended(end_date, reason)?;
        self.conn.execute(
            "UPDATE treatments SET end_date = ?, end_reason = ? WHERE id = ?",
            params![ended.end_date.map(format_date), ended.end_reason, id],
        )?;
        tracing::debug!(name = %ended.name, %end_date, "ended treatment");
        Ok(ended)
    }

    /// Lists all treatments in creation order.
    pub fn treatments(&self) -> Result<Vec<TreatmentInterval>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT name, category, start_date, end_date, end_reason
            FROM treatments
            ORDER BY id ASC
            ",
        )?;
        let rows = stmt.query_map([], raw_treatment)?;
        let mut treatments = Vec::new();
        for row in rows {
            treatments.push(row?.into_treatment()?);
        }
        Ok(treatments)
    }

    /// Finds the oldest active treatment whose name matches under [`names_match`].
    fn active_treatment_id(&self, name: &str) -> Result<Option<i64>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, name FROM treatments
            WHERE end_date IS NULL
            ORDER BY id ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            let stored: String = row.get(1)?;
            Ok((id, stored))
        })?;
        for row in rows {
            let (id, stored) = row?;
            if names_match(&stored, name) {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }
}

fn symptom_from_row(row: &Row<'_>) -> Result<SymptomRecord, DbError> {
    let id: i64 = row.get(0)?;
    let submitted_at: String = row.get(3)?;
    let triggers: Option<String> = row.get(9)?;
    Ok(SymptomRecord {
        id,
        date: row.get(1)?,
        severity: row.get(2)?,
        submitted_at: parse_timestamp(&submitted_at, "symptom_logs", id)?,
        symptom_name: row.get(4)?,
        treatment_id: row.get(5)?,
        treatment_name: row.get(6)?,
        treatment_taken: row.get(7)?,
        treatment_effective: row.get(8)?,
        triggers: triggers
            .as_deref()
            .map(serde_json::from_str::<Vec<String>>)
            .transpose()
            .map_err(|source| DbError::Triggers { id, source })?,
        notes: row.get(10)?,
        onset: row.get(11)?,
        description: row.get(12)?,
    })
}

fn side_effect_from_row(row: &Row<'_>) -> Result<SideEffectRecord, DbError> {
    let id: i64 = row.get(0)?;
    let submitted_at: String = row.get(3)?;
    Ok(SideEffectRecord {
        id,
        date: row.get(1)?,
        severity: row.get(2)?,
        submitted_at: parse_timestamp(&submitted_at, "side_effect_logs", id)?,
        side_effect_name: row.get(4)?,
        treatment_name: row.get(5)?,
        notes: row.get(6)?,
        description: row.get(7)?,
    })
}

/// A treatment row before its text columns are parsed.
struct RawTreatment {
    name: String,
    category: String,
    start_date: String,
    end_date: Option<String>,
    end_reason: Option<String>,
}

fn raw_treatment(row: &Row<'_>) -> rusqlite::Result<RawTreatment> {
    Ok(RawTreatment {
        name: row.get(0)?,
        category: row.get(1)?,
        start_date: row.get(2)?,
        end_date: row.get(3)?,
        end_reason: row.get(4)?,
    })
}

impl RawTreatment {
    fn into_treatment(self) -> Result<TreatmentInterval, DbError> {
        let category: TreatmentCategory = self.category.parse()?;
        let start_date = parse_date(&self.start_date, &self.name, "start_date")?;
        let end_date = self
            .end_date
            .as_deref()
            .map(|value| parse_date(value, &self.name, "end_date"))
            .transpose()?;
        Ok(TreatmentInterval {
            name: self.name,
            category,
            start_date,
            end_date,
            end_reason: self.end_reason,
        })
    }
}

fn parse_date(value: &str, name: &str, field: &'static str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|source| DbError::DateParse {
        name: name.to_string(),
        field,
        value: value.to_string(),
        source,
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_timestamp(timestamp: &str, table: &'static str, id: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            table,
            id,
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
