//! Digest assembly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DigestConfig;
use crate::digest::patterns::{aggregate_patterns, PatternSummary};
use crate::digest::scoring::{rank_phrases, ScoredPhrase};
use crate::error::Error;
use crate::records::{CorrectionRecord, PhraseRecord};

/// The bounded, ranked summary produced once per notification cycle.
/// Transient: rendered and sent, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Digest {
    pub top_review_phrases: Vec<ScoredPhrase>,
    pub top_weakness_patterns: Vec<PatternSummary>,
    pub recent_corrections: Vec<CorrectionRecord>,
    pub generated_at: DateTime<Utc>,
}

impl Digest {
    /// True when there is nothing to review or report.
    pub fn is_empty(&self) -> bool {
        self.top_review_phrases.is_empty()
            && self.top_weakness_patterns.is_empty()
            && self.recent_corrections.is_empty()
    }
}

/// Assemble one digest from record snapshots.
///
/// Read-only: the snapshots are never mutated. Empty inputs produce an
/// empty digest with a valid `generated_at`, which is a normal outcome.
/// Identical inputs and `now` always compose the identical digest.
pub fn compose_digest(
    phrases: &[PhraseRecord],
    corrections: &[CorrectionRecord],
    now: DateTime<Utc>,
    config: &DigestConfig,
) -> Result<Digest, Error> {
    config.validate()?;

    let mut top_review_phrases = rank_phrases(phrases, now, config.staleness_horizon_days);
    top_review_phrases.truncate(config.max_review_phrases);

    let mut top_weakness_patterns = aggregate_patterns(corrections);
    top_weakness_patterns.truncate(config.max_weakness_patterns);

    // Stable sort: corrections sharing a timestamp keep snapshot
    // (insertion) order.
    let mut recent_corrections = corrections.to_vec();
    recent_corrections.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent_corrections.truncate(config.max_recent_corrections);

    Ok(Digest {
        top_review_phrases,
        top_weakness_patterns,
        recent_corrections,
        generated_at: now,
    })
}
