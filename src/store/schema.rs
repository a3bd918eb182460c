//! Database schema for the phrase and correction tables.
//!
//! Timestamps are RFC 3339 TEXT columns (lexicographic order is
//! chronological). Raw rows are converted to records here; anything that
//! fails conversion is reported as a malformed record so the store can
//! skip it without aborting a fetch.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result as SqliteResult, Row};

use crate::error::Error;
use crate::records::{CorrectionRecord, PhraseRecord};

/// Initialize database with all tables.
pub fn init_db(conn: &Connection) -> Result<(), Error> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS phrases (
            id              TEXT PRIMARY KEY,
            english         TEXT NOT NULL,
            japanese        TEXT NOT NULL,
            context         TEXT NOT NULL DEFAULT '',
            created_at      TEXT NOT NULL,
            reviewed_at     TEXT,
            query_count     INTEGER NOT NULL DEFAULT 0,
            last_queried_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_phrases_created ON phrases(created_at);
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS corrections (
            id             TEXT PRIMARY KEY,
            original_text  TEXT NOT NULL,
            corrected_text TEXT NOT NULL,
            feedback       TEXT NOT NULL,
            error_pattern  TEXT,
            created_at     TEXT NOT NULL,
            reviewed_at    TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_corrections_created ON corrections(created_at);
        CREATE INDEX IF NOT EXISTS idx_corrections_pattern ON corrections(error_pattern);
        "#,
    )?;

    Ok(())
}

fn parse_ts(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp {:?}: {}", value, e))
}

/// Raw phrase row, before timestamp parsing.
pub(super) struct RawPhraseRow {
    id: String,
    english: String,
    japanese: String,
    context: String,
    created_at: String,
    reviewed_at: Option<String>,
    query_count: i64,
    last_queried_at: Option<String>,
}

impl RawPhraseRow {
    pub(super) fn from_row(row: &Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            english: row.get("english")?,
            japanese: row.get("japanese")?,
            context: row.get("context")?,
            created_at: row.get("created_at")?,
            reviewed_at: row.get("reviewed_at")?,
            query_count: row.get("query_count")?,
            last_queried_at: row.get("last_queried_at")?,
        })
    }

    pub(super) fn into_record(self) -> Result<PhraseRecord, Error> {
        let created_at = parse_ts(&self.created_at).map_err(|r| Error::malformed(&self.id, r))?;
        let reviewed_at = self
            .reviewed_at
            .as_deref()
            .map(parse_ts)
            .transpose()
            .map_err(|r| Error::malformed(&self.id, r))?;
        let last_queried_at = self
            .last_queried_at
            .as_deref()
            .map(parse_ts)
            .transpose()
            .map_err(|r| Error::malformed(&self.id, r))?;
        let query_count = u32::try_from(self.query_count)
            .map_err(|_| Error::malformed(&self.id, "negative query_count"))?;

        Ok(PhraseRecord {
            id: self.id,
            english: self.english,
            japanese: self.japanese,
            context: self.context,
            created_at,
            reviewed_at,
            query_count,
            last_queried_at,
        })
    }
}

/// Raw correction row, before timestamp parsing.
pub(super) struct RawCorrectionRow {
    id: String,
    original_text: String,
    corrected_text: String,
    feedback: String,
    error_pattern: Option<String>,
    created_at: String,
    reviewed_at: Option<String>,
}

impl RawCorrectionRow {
    pub(super) fn from_row(row: &Row<'_>) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            original_text: row.get("original_text")?,
            corrected_text: row.get("corrected_text")?,
            feedback: row.get("feedback")?,
            error_pattern: row.get("error_pattern")?,
            created_at: row.get("created_at")?,
            reviewed_at: row.get("reviewed_at")?,
        })
    }

    pub(super) fn into_record(self) -> Result<CorrectionRecord, Error> {
        // NULL means the label was never written, which is a data defect;
        // an empty string is a valid unclassified correction.
        let error_pattern = self
            .error_pattern
            .ok_or_else(|| Error::malformed(&self.id, "error_pattern column is NULL"))?;
        let created_at = parse_ts(&self.created_at).map_err(|r| Error::malformed(&self.id, r))?;
        let reviewed_at = self
            .reviewed_at
            .as_deref()
            .map(parse_ts)
            .transpose()
            .map_err(|r| Error::malformed(&self.id, r))?;

        Ok(CorrectionRecord {
            id: self.id,
            original_text: self.original_text,
            corrected_text: self.corrected_text,
            feedback: self.feedback,
            error_pattern,
            created_at,
            reviewed_at,
        })
    }
}
