//! Phrase and correction records.
//!
//! These are the persisted shapes shared by the store, the digest engine,
//! the MCP tool layer and the notifier. Timestamps are UTC; `reviewed_at`
//! and `last_queried_at` stay `None` until the corresponding action happens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A saved English phrase with its Japanese translation.
///
/// Invariant: `last_queried_at` is `None` iff `query_count == 0`. The write
/// paths in [`crate::store`] maintain this; the scorer tolerates anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhraseRecord {
    pub id: String,
    pub english: String,
    pub japanese: String,
    pub context: String,
    pub created_at: DateTime<Utc>,
    /// Last explicit review action, if any.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Incremented on every search hit.
    pub query_count: u32,
    pub last_queried_at: Option<DateTime<Utc>>,
}

/// A saved grammar correction.
///
/// Immutable after save except `reviewed_at`. `error_pattern` may be empty
/// (unclassified); such records are excluded from weakness aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionRecord {
    pub id: String,
    pub original_text: String,
    pub corrected_text: String,
    pub feedback: String,
    pub error_pattern: String,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}
