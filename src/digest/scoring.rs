//! Review-priority scoring for phrases.
//!
//! The score is linear staleness damped by retrieval frequency:
//!
//! ```text
//! staleness_days = days since max(reviewed_at, created_at)
//! raw            = staleness_days / (1 + ln(1 + query_count))
//! score          = staleness_days >= horizon ? max(raw, horizon) : raw
//! ```
//!
//! Staleness is measured in whole seconds and converted to fractional
//! days. Missing timestamps mean "never": a phrase that was never reviewed
//! anchors on `created_at`, so its full age counts as staleness. The
//! horizon floor makes staleness dominate once it is exceeded: a phrase
//! past the horizon scores at least `horizon_days`, while any phrase
//! within the horizon scores strictly below it. Frequency only orders
//! phrases of comparable staleness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::records::PhraseRecord;

const SECS_PER_DAY: f64 = 86_400.0;

/// A phrase with its computed review priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPhrase {
    pub score: f64,
    pub phrase: PhraseRecord,
}

/// Compute the review-priority score for one phrase. Higher means more
/// urgently needs review. Always finite and non-negative; never fails.
pub fn priority_score(phrase: &PhraseRecord, now: DateTime<Utc>, horizon_days: f64) -> f64 {
    let anchor = match phrase.reviewed_at {
        Some(reviewed) if reviewed > phrase.created_at => reviewed,
        _ => phrase.created_at,
    };
    // Anchors in the future clamp to zero staleness.
    let staleness_days = (now - anchor).num_seconds().max(0) as f64 / SECS_PER_DAY;

    let damping = 1.0 + (1.0 + f64::from(phrase.query_count)).ln();
    let raw = staleness_days / damping;

    if staleness_days >= horizon_days {
        raw.max(horizon_days)
    } else {
        raw
    }
}

/// Score and order all phrases: score descending, ties by `created_at`
/// ascending, then `english` ascending. A total order, so pagination over
/// the ranking is stable.
pub fn rank_phrases(
    phrases: &[PhraseRecord],
    now: DateTime<Utc>,
    horizon_days: f64,
) -> Vec<ScoredPhrase> {
    let mut scored: Vec<ScoredPhrase> = phrases
        .iter()
        .map(|phrase| ScoredPhrase {
            score: priority_score(phrase, now, horizon_days),
            phrase: phrase.clone(),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.phrase.created_at.cmp(&b.phrase.created_at))
            .then_with(|| a.phrase.english.cmp(&b.phrase.english))
    });
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const HORIZON: f64 = 7.0;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn phrase(english: &str, age_days: i64, query_count: u32) -> PhraseRecord {
        let created_at = now() - Duration::days(age_days);
        PhraseRecord {
            id: english.to_string(),
            english: english.to_string(),
            japanese: String::new(),
            context: String::new(),
            created_at,
            reviewed_at: None,
            query_count,
            last_queried_at: if query_count > 0 { Some(now()) } else { None },
        }
    }

    #[test]
    fn test_score_is_finite_and_non_negative() {
        let p = phrase("a", 0, 0);
        let score = priority_score(&p, now(), HORIZON);
        assert!(score.is_finite());
        assert!(score >= 0.0);

        // Anchor in the future clamps to zero.
        let p = phrase("b", -3, 0);
        assert_eq!(priority_score(&p, now(), HORIZON), 0.0);
    }

    #[test]
    fn test_equal_inputs_give_equal_scores() {
        let a = phrase("a", 3, 4);
        let b = phrase("b", 3, 4);
        assert_eq!(
            priority_score(&a, now(), HORIZON),
            priority_score(&b, now(), HORIZON)
        );
    }

    #[test]
    fn test_staler_scores_at_least_as_high() {
        for qc in [0u32, 5, 50] {
            let fresh = phrase("fresh", 2, qc);
            let stale = phrase("stale", 5, qc);
            let very_stale = phrase("very", 30, qc);
            assert!(
                priority_score(&stale, now(), HORIZON)
                    >= priority_score(&fresh, now(), HORIZON)
            );
            assert!(
                priority_score(&very_stale, now(), HORIZON)
                    >= priority_score(&stale, now(), HORIZON)
            );
        }
    }

    #[test]
    fn test_frequency_lowers_score_at_equal_staleness() {
        let never = phrase("never", 5, 0);
        let often = phrase("often", 5, 50);
        assert!(priority_score(&never, now(), HORIZON) > priority_score(&often, now(), HORIZON));
    }

    #[test]
    fn test_beyond_horizon_outranks_any_within_horizon() {
        // Heavily used but past the horizon vs never used and fresh.
        let past = phrase("past", 8, 500);
        let fresh = phrase("fresh", 6, 0);
        assert!(priority_score(&past, now(), HORIZON) > priority_score(&fresh, now(), HORIZON));
    }

    #[test]
    fn test_review_resets_staleness_anchor() {
        let mut p = phrase("a", 30, 0);
        let untouched = priority_score(&p, now(), HORIZON);
        p.reviewed_at = Some(now() - Duration::days(1));
        let reviewed = priority_score(&p, now(), HORIZON);
        assert!(reviewed < untouched);
    }

    #[test]
    fn test_ranking_scenario_staleness_dominant() {
        // P1: 30 days old, never queried. P2: 1 day old, queried 50 times.
        // P3: 30 days old, queried 50 times.
        let p1 = phrase("P1", 30, 0);
        let p2 = phrase("P2", 1, 50);
        let p3 = phrase("P3", 30, 50);

        let ranked = rank_phrases(&[p2, p3, p1], now(), HORIZON);
        let order: Vec<&str> = ranked.iter().map(|s| s.phrase.english.as_str()).collect();
        assert_eq!(order, ["P1", "P3", "P2"]);
    }

    #[test]
    fn test_tie_break_created_then_english() {
        // Pin equal staleness through a shared review anchor so the scores
        // tie and the ordering falls through to the tie-breakers.
        let anchor = now() - Duration::days(5);
        let mut a = phrase("zulu", 5, 0);
        let mut b = phrase("alpha", 5, 0);
        a.reviewed_at = Some(anchor);
        b.reviewed_at = Some(anchor);
        a.created_at = anchor - Duration::days(10);
        b.created_at = anchor - Duration::days(3);

        let ranked = rank_phrases(&[b.clone(), a.clone()], now(), HORIZON);
        assert_eq!(ranked[0].phrase.english, "zulu"); // older created_at wins

        // Identical created_at falls through to english ascending.
        b.created_at = a.created_at;
        let ranked = rank_phrases(&[b, a], now(), HORIZON);
        assert_eq!(ranked[0].phrase.english, "alpha");
    }
}
