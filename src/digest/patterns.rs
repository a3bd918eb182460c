//! Weakness-pattern aggregation over correction records.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::records::CorrectionRecord;

/// Original/corrected text pair shown as the example for a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplePair {
    pub original_text: String,
    pub corrected_text: String,
}

/// One recurring error pattern with its recurrence count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSummary {
    pub pattern: String,
    pub count: usize,
    /// Text pair of the chronologically latest correction in the group.
    pub most_recent_example: ExamplePair,
}

struct Group<'a> {
    count: usize,
    earliest: DateTime<Utc>,
    latest: &'a CorrectionRecord,
}

/// Group corrections by trimmed error-pattern label and rank by
/// recurrence: count descending, ties by the group's earliest `created_at`
/// ascending, then label ascending.
///
/// Corrections with an empty label carry no actionable pattern and are
/// excluded entirely. An empty input yields an empty output.
pub fn aggregate_patterns(corrections: &[CorrectionRecord]) -> Vec<PatternSummary> {
    let mut groups: HashMap<&str, Group<'_>> = HashMap::new();

    for record in corrections {
        let label = record.error_pattern.trim();
        if label.is_empty() {
            continue;
        }
        groups
            .entry(label)
            .and_modify(|group| {
                group.count += 1;
                if record.created_at < group.earliest {
                    group.earliest = record.created_at;
                }
                if record.created_at > group.latest.created_at {
                    group.latest = record;
                }
            })
            .or_insert(Group {
                count: 1,
                earliest: record.created_at,
                latest: record,
            });
    }

    let mut entries: Vec<(DateTime<Utc>, PatternSummary)> = groups
        .into_iter()
        .map(|(label, group)| {
            (
                group.earliest,
                PatternSummary {
                    pattern: label.to_string(),
                    count: group.count,
                    most_recent_example: ExamplePair {
                        original_text: group.latest.original_text.clone(),
                        corrected_text: group.latest.corrected_text.clone(),
                    },
                },
            )
        })
        .collect();

    entries.sort_by(|(earliest_a, a), (earliest_b, b)| {
        b.count
            .cmp(&a.count)
            .then_with(|| earliest_a.cmp(earliest_b))
            .then_with(|| a.pattern.cmp(&b.pattern))
    });

    entries.into_iter().map(|(_, summary)| summary).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn correction(pattern: &str, offset_secs: i64) -> CorrectionRecord {
        CorrectionRecord {
            id: format!("{}-{}", pattern, offset_secs),
            original_text: format!("orig {}", offset_secs),
            corrected_text: format!("fixed {}", offset_secs),
            feedback: String::new(),
            error_pattern: pattern.to_string(),
            created_at: base() + Duration::seconds(offset_secs),
            reviewed_at: None,
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_patterns(&[]).is_empty());
    }

    #[test]
    fn test_counts_and_unlabeled_exclusion() {
        // {"article": 3, "preposition": 5, "": 2} -> preposition, article.
        let mut input = Vec::new();
        for i in 0..3 {
            input.push(correction("article", i));
        }
        for i in 10..15 {
            input.push(correction("preposition", i));
        }
        for i in 20..22 {
            input.push(correction("", i));
        }

        let summaries = aggregate_patterns(&input);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].pattern, "preposition");
        assert_eq!(summaries[0].count, 5);
        assert_eq!(summaries[1].pattern, "article");
        assert_eq!(summaries[1].count, 3);
    }

    #[test]
    fn test_count_sum_matches_labelled_input() {
        let input = vec![
            correction("a", 0),
            correction("b", 1),
            correction("a", 2),
            correction("  ", 3),
            correction("", 4),
        ];
        let summaries = aggregate_patterns(&input);
        let total: usize = summaries.iter().map(|s| s.count).sum();
        let labelled = input
            .iter()
            .filter(|c| !c.error_pattern.trim().is_empty())
            .count();
        assert_eq!(total, labelled);
    }

    #[test]
    fn test_label_is_trimmed() {
        let input = vec![correction(" article ", 0), correction("article", 1)];
        let summaries = aggregate_patterns(&input);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].pattern, "article");
        assert_eq!(summaries[0].count, 2);
    }

    #[test]
    fn test_most_recent_example() {
        let input = vec![
            correction("tense", 5),
            correction("tense", 30),
            correction("tense", 10),
        ];
        let summaries = aggregate_patterns(&input);
        assert_eq!(
            summaries[0].most_recent_example,
            ExamplePair {
                original_text: "orig 30".to_string(),
                corrected_text: "fixed 30".to_string(),
            }
        );
    }

    #[test]
    fn test_tie_break_earliest_then_label() {
        // Equal counts; "late" group started after "early" group.
        let input = vec![
            correction("late", 100),
            correction("early", 0),
            correction("late", 200),
            correction("early", 300),
        ];
        let summaries = aggregate_patterns(&input);
        assert_eq!(summaries[0].pattern, "early");
        assert_eq!(summaries[1].pattern, "late");

        // Equal counts and equal earliest: label ascending.
        let input = vec![correction("bravo", 0), correction("alpha", 0)];
        let summaries = aggregate_patterns(&input);
        assert_eq!(summaries[0].pattern, "alpha");
        assert_eq!(summaries[1].pattern, "bravo");
    }
}
