//! SQLite record store (the Record Accessor).
//!
//! All SQLite failures surface as [`Error::StoreUnavailable`]; malformed
//! rows are skipped with a warning rather than failing a whole fetch, so
//! one bad record never blocks the study summary.

mod schema;

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::warn;
use uuid::Uuid;

use crate::error::Error;
use crate::records::{CorrectionRecord, PhraseRecord};
use schema::{RawCorrectionRow, RawPhraseRow};

/// Sort order for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse a user-supplied order string, defaulting to descending.
    pub fn parse_or_default(value: &str) -> Self {
        if value.eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Read interface the digest engine consumes.
///
/// One call returns one immutable snapshot in insertion order. Retries on
/// transient failure are the caller's responsibility, not the engine's.
pub trait RecordStore {
    fn fetch_all_phrases(&self) -> Result<Vec<PhraseRecord>, Error>;
    fn fetch_all_corrections(&self) -> Result<Vec<CorrectionRecord>, Error>;
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at path.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let conn = Connection::open(path)?;
        schema::init_db(&conn)?;
        Ok(Self { conn })
    }

    /// Open in-memory database for testing.
    pub fn open_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()?;
        schema::init_db(&conn)?;
        Ok(Self { conn })
    }

    // ========== Phrases ==========

    /// Save a new phrase. `reviewed_at` and the query counters start unset.
    pub fn save_phrase(
        &self,
        english: &str,
        japanese: &str,
        context: &str,
        now: DateTime<Utc>,
    ) -> Result<PhraseRecord, Error> {
        let record = PhraseRecord {
            id: Uuid::new_v4().to_string(),
            english: english.to_string(),
            japanese: japanese.to_string(),
            context: context.to_string(),
            created_at: now,
            reviewed_at: None,
            query_count: 0,
            last_queried_at: None,
        };

        self.conn.execute(
            r#"
            INSERT INTO phrases (id, english, japanese, context, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.id,
                record.english,
                record.japanese,
                record.context,
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(record)
    }

    /// List phrases ordered by creation date.
    pub fn list_phrases(&self, limit: usize, order: SortOrder) -> Result<Vec<PhraseRecord>, Error> {
        let sql = format!(
            "SELECT * FROM phrases ORDER BY created_at {o}, rowid {o} LIMIT ?1",
            o = order.sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([limit as i64], RawPhraseRow::from_row)?;

        let mut phrases = Vec::new();
        for raw in rows {
            match raw?.into_record() {
                Ok(phrase) => phrases.push(phrase),
                Err(e) => warn!(error = %e, "skipping malformed phrase record"),
            }
        }
        Ok(phrases)
    }

    /// Search phrases by case-insensitive keyword over english, japanese
    /// and context. Each hit counts as a retrieval: `query_count` is
    /// incremented and `last_queried_at` stamped, up to `limit` hits.
    /// This is the only mutation-on-read path in the store.
    pub fn search_phrases(
        &self,
        keyword: &str,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<PhraseRecord>, Error> {
        let needle = keyword.to_lowercase();
        let mut matches = Vec::new();

        for mut phrase in self.fetch_all_phrases()? {
            if matches.len() >= limit {
                break;
            }
            let hit = phrase.english.to_lowercase().contains(&needle)
                || phrase.japanese.to_lowercase().contains(&needle)
                || phrase.context.to_lowercase().contains(&needle);
            if !hit {
                continue;
            }

            self.conn.execute(
                r#"
                UPDATE phrases
                SET query_count = query_count + 1, last_queried_at = ?1
                WHERE id = ?2
                "#,
                params![now.to_rfc3339(), phrase.id],
            )?;
            phrase.query_count += 1;
            phrase.last_queried_at = Some(now);
            matches.push(phrase);
        }
        Ok(matches)
    }

    /// Record an explicit review action on a phrase.
    ///
    /// Returns false if no phrase has that id.
    pub fn mark_phrase_reviewed(&self, id: &str, now: DateTime<Utc>) -> Result<bool, Error> {
        let updated = self.conn.execute(
            "UPDATE phrases SET reviewed_at = ?1 WHERE id = ?2",
            params![now.to_rfc3339(), id],
        )?;
        Ok(updated > 0)
    }

    /// Count all phrases.
    pub fn phrase_count(&self) -> Result<usize, Error> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM phrases", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Corrections ==========

    /// Save a correction. An empty `error_pattern` means unclassified.
    pub fn save_correction(
        &self,
        original_text: &str,
        corrected_text: &str,
        feedback: &str,
        error_pattern: &str,
        now: DateTime<Utc>,
    ) -> Result<CorrectionRecord, Error> {
        let record = CorrectionRecord {
            id: Uuid::new_v4().to_string(),
            original_text: original_text.to_string(),
            corrected_text: corrected_text.to_string(),
            feedback: feedback.to_string(),
            error_pattern: error_pattern.to_string(),
            created_at: now,
            reviewed_at: None,
        };

        self.conn.execute(
            r#"
            INSERT INTO corrections (id, original_text, corrected_text, feedback, error_pattern, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.id,
                record.original_text,
                record.corrected_text,
                record.feedback,
                record.error_pattern,
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(record)
    }

    /// List corrections ordered by creation date.
    pub fn list_corrections(
        &self,
        limit: usize,
        order: SortOrder,
    ) -> Result<Vec<CorrectionRecord>, Error> {
        let sql = format!(
            "SELECT * FROM corrections ORDER BY created_at {o}, rowid {o} LIMIT ?1",
            o = order.sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([limit as i64], RawCorrectionRow::from_row)?;

        let mut corrections = Vec::new();
        for raw in rows {
            match raw?.into_record() {
                Ok(correction) => corrections.push(correction),
                Err(e) => warn!(error = %e, "skipping malformed correction record"),
            }
        }
        Ok(corrections)
    }

    /// Count all corrections.
    pub fn correction_count(&self) -> Result<usize, Error> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM corrections", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl RecordStore for Database {
    /// Full phrase snapshot in insertion (rowid) order.
    fn fetch_all_phrases(&self) -> Result<Vec<PhraseRecord>, Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM phrases ORDER BY rowid ASC")?;
        let rows = stmt.query_map([], RawPhraseRow::from_row)?;

        let mut phrases = Vec::new();
        for raw in rows {
            match raw?.into_record() {
                Ok(phrase) => phrases.push(phrase),
                Err(e) => warn!(error = %e, "skipping malformed phrase record"),
            }
        }
        Ok(phrases)
    }

    /// Full correction snapshot in insertion (rowid) order.
    fn fetch_all_corrections(&self) -> Result<Vec<CorrectionRecord>, Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM corrections ORDER BY rowid ASC")?;
        let rows = stmt.query_map([], RawCorrectionRow::from_row)?;

        let mut corrections = Vec::new();
        for raw in rows {
            match raw?.into_record() {
                Ok(correction) => corrections.push(correction),
                Err(e) => warn!(error = %e, "skipping malformed correction record"),
            }
        }
        Ok(corrections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_save_and_fetch_phrase() {
        let db = Database::open_memory().unwrap();
        let saved = db
            .save_phrase("break the ice", "打ち解ける", "small talk", ts(0))
            .unwrap();
        assert_eq!(saved.query_count, 0);
        assert!(saved.last_queried_at.is_none());
        assert!(saved.reviewed_at.is_none());

        let all = db.fetch_all_phrases().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].english, "break the ice");
        assert_eq!(all[0].created_at, ts(0));
    }

    #[test]
    fn test_list_phrases_order() {
        let db = Database::open_memory().unwrap();
        db.save_phrase("first", "一", "", ts(0)).unwrap();
        db.save_phrase("second", "二", "", ts(10)).unwrap();

        let desc = db.list_phrases(10, SortOrder::Desc).unwrap();
        assert_eq!(desc[0].english, "second");

        let asc = db.list_phrases(10, SortOrder::Asc).unwrap();
        assert_eq!(asc[0].english, "first");

        let limited = db.list_phrases(1, SortOrder::Desc).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_search_increments_counters_for_matches_only() {
        let db = Database::open_memory().unwrap();
        db.save_phrase("break the ice", "打ち解ける", "", ts(0))
            .unwrap();
        db.save_phrase("call it a day", "切り上げる", "", ts(1))
            .unwrap();

        let hits = db.search_phrases("ICE", 10, ts(100)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].query_count, 1);
        assert_eq!(hits[0].last_queried_at, Some(ts(100)));

        let all = db.fetch_all_phrases().unwrap();
        let miss = all.iter().find(|p| p.english == "call it a day").unwrap();
        assert_eq!(miss.query_count, 0);
        assert!(miss.last_queried_at.is_none());
    }

    #[test]
    fn test_search_stops_counting_at_limit() {
        let db = Database::open_memory().unwrap();
        for i in 0..5 {
            db.save_phrase(&format!("ice {}", i), "氷", "", ts(i)).unwrap();
        }

        let hits = db.search_phrases("ice", 2, ts(100)).unwrap();
        assert_eq!(hits.len(), 2);

        let touched = db
            .fetch_all_phrases()
            .unwrap()
            .iter()
            .filter(|p| p.query_count > 0)
            .count();
        assert_eq!(touched, 2);
    }

    #[test]
    fn test_mark_phrase_reviewed() {
        let db = Database::open_memory().unwrap();
        let saved = db.save_phrase("hold on", "待って", "", ts(0)).unwrap();

        assert!(db.mark_phrase_reviewed(&saved.id, ts(50)).unwrap());
        assert!(!db.mark_phrase_reviewed("no-such-id", ts(50)).unwrap());

        let all = db.fetch_all_phrases().unwrap();
        assert_eq!(all[0].reviewed_at, Some(ts(50)));
    }

    #[test]
    fn test_save_and_fetch_correction() {
        let db = Database::open_memory().unwrap();
        db.save_correction("I goed", "I went", "irregular past", "verb form", ts(0))
            .unwrap();

        let all = db.fetch_all_corrections().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].error_pattern, "verb form");
        assert!(all[0].reviewed_at.is_none());
    }

    #[test]
    fn test_malformed_phrase_row_is_skipped() {
        let db = Database::open_memory().unwrap();
        db.save_phrase("good", "良い", "", ts(0)).unwrap();
        db.conn
            .execute(
                "INSERT INTO phrases (id, english, japanese, context, created_at) VALUES ('bad', 'x', 'y', '', 'not-a-timestamp')",
                [],
            )
            .unwrap();

        let all = db.fetch_all_phrases().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].english, "good");
    }

    #[test]
    fn test_null_error_pattern_is_malformed_but_empty_is_not() {
        let db = Database::open_memory().unwrap();
        db.save_correction("a", "b", "c", "", ts(0)).unwrap();
        db.conn
            .execute(
                "INSERT INTO corrections (id, original_text, corrected_text, feedback, error_pattern, created_at)
                 VALUES ('null-pattern', 'a', 'b', 'c', NULL, ?1)",
                params![ts(1).to_rfc3339()],
            )
            .unwrap();

        let all = db.fetch_all_corrections().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].error_pattern, "");
    }

    #[test]
    fn test_counts() {
        let db = Database::open_memory().unwrap();
        db.save_phrase("a", "あ", "", ts(0)).unwrap();
        db.save_correction("x", "y", "z", "", ts(0)).unwrap();
        db.save_correction("p", "q", "r", "", ts(1)).unwrap();

        assert_eq!(db.phrase_count().unwrap(), 1);
        assert_eq!(db.correction_count().unwrap(), 2);
    }
}
