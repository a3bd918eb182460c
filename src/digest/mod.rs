//! Review scheduling and weakness analysis engine.
//!
//! One stateless pass per invocation: snapshot the record sets, score and
//! rank phrases, aggregate error patterns, compose the bounded digest.
//! Scoring is a pure function of one record and the current time, so
//! nothing here precludes scoring phrases in parallel later.

pub mod compose;
pub mod patterns;
pub mod scoring;

pub use compose::{compose_digest, Digest};
pub use patterns::{aggregate_patterns, ExamplePair, PatternSummary};
pub use scoring::{priority_score, rank_phrases, ScoredPhrase};

use chrono::{DateTime, Utc};

use crate::config::DigestConfig;
use crate::error::Error;
use crate::store::RecordStore;

/// Generate the digest for one notification cycle.
///
/// Config is validated before the store is touched. A store failure fails
/// the whole cycle; there is no partial digest.
pub fn generate_digest(
    store: &dyn RecordStore,
    now: DateTime<Utc>,
    config: &DigestConfig,
) -> Result<Digest, Error> {
    config.validate()?;
    let phrases = store.fetch_all_phrases()?;
    let corrections = store.fetch_all_corrections()?;
    compose_digest(&phrases, &corrections, now, config)
}
