//! Typo correction against the indexed vocabulary.
//!
//! Every vocabulary entry is compared with the query by Levenshtein distance.
//! The allowed distance grows with the query length, so short words are not
//! "corrected" into unrelated words.

use crate::fuzzy::levenshtein_distance;
use crate::normalize::normalize;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A proposed replacement for a (possibly) misspelled query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    /// Query as typed
    pub original: String,
    /// Vocabulary entry the query was corrected to
    pub corrected: String,
    /// Edit distance between the normalized query and `corrected`
    pub distance: usize,
    /// `1 - distance / max(len(query), len(corrected))`
    pub confidence: f64,
}

/// Largest edit distance accepted for a query of `query_len` chars.
///
/// # Example
/// ```
/// use foodshare_search::max_typo_distance;
///
/// assert_eq!(max_typo_distance(4), 1);
/// assert_eq!(max_typo_distance(6), 2);
/// assert_eq!(max_typo_distance(10), 3);
/// ```
pub fn max_typo_distance(query_len: usize) -> usize {
    match query_len {
        0..=4 => 1,
        5..=6 => 2,
        _ => 3,
    }
}

/// Edit-distance corrector with adaptive thresholds.
#[derive(Debug, Clone)]
pub struct Corrector {
    min_query_length: usize,
}

impl Default for Corrector {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Corrector {
    /// Create a corrector ignoring queries shorter than `min_query_length` chars.
    pub fn new(min_query_length: usize) -> Self {
        Self { min_query_length }
    }

    /// Find corrections for `query` among `vocabulary` entries.
    ///
    /// A candidate qualifies when `0 < distance <= max_typo_distance(len(query))`.
    /// Results are sorted by descending confidence, then ascending distance,
    /// then alphabetically. Empty vocabulary entries never match.
    pub fn correct<S>(&self, query: &str, vocabulary: &[S]) -> Vec<Correction>
    where
        S: AsRef<str> + Sync,
    {
        let normalized = normalize(query);
        let query_len = normalized.chars().count();
        if query_len < self.min_query_length {
            return Vec::new();
        }
        let max_distance = max_typo_distance(query_len);

        let evaluate = |term: &S| evaluate_candidate(query, &normalized, query_len, max_distance, term.as_ref());

        #[cfg(feature = "parallel")]
        let mut corrections: Vec<Correction> = {
            use rayon::prelude::*;
            vocabulary.par_iter().filter_map(evaluate).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let mut corrections: Vec<Correction> = vocabulary.iter().filter_map(evaluate).collect();

        corrections.sort_by(compare_corrections);
        corrections.dedup_by(|a, b| a.corrected == b.corrected);

        tracing::trace!(
            query = %normalized,
            max_distance,
            candidates = corrections.len(),
            "typo corrections computed"
        );

        corrections
    }
}

fn evaluate_candidate(
    original: &str,
    normalized: &str,
    query_len: usize,
    max_distance: usize,
    term: &str,
) -> Option<Correction> {
    let term_len = term.chars().count();
    if term_len == 0 || term_len.abs_diff(query_len) > max_distance {
        return None;
    }

    let distance = levenshtein_distance(normalized, term);
    if distance == 0 || distance > max_distance {
        return None;
    }

    Some(Correction {
        original: original.to_string(),
        corrected: term.to_string(),
        distance,
        confidence: 1.0 - distance as f64 / query_len.max(term_len) as f64,
    })
}

fn compare_corrections(a: &Correction, b: &Correction) -> Ordering {
    b.confidence
        .partial_cmp(&a.confidence)
        .unwrap_or(Ordering::Equal)
        .then(a.distance.cmp(&b.distance))
        .then_with(|| a.corrected.cmp(&b.corrected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_query_accepts_one_edit() {
        let corrections = Corrector::default().correct("хлеп", &["хлеб", "хрен"]);
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].corrected, "хлеб");
        assert_eq!(corrections[0].distance, 1);
        assert!((corrections[0].confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_long_query_accepts_three_edits() {
        let corrections = Corrector::default().correct("шакаладнай", &["шоколадный"]);
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].distance, 3);

        assert!(Corrector::default().correct("шакаладнаа", &["шоколадный"]).is_empty());
    }

    #[test]
    fn test_medium_query_example() {
        let corrections = Corrector::default().correct("молки", &["молоко", "мороженое"]);
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].corrected, "молоко");
        assert_eq!(corrections[0].original, "молки");
        assert_eq!(corrections[0].distance, 2);
        assert!((corrections[0].confidence - (1.0 - 2.0 / 6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_exact_match_is_not_a_correction() {
        assert!(Corrector::default().correct("молоко", &["молоко"]).is_empty());
    }

    #[test]
    fn test_sorted_by_confidence() {
        let corrections = Corrector::default().correct("малоко", &["молоко", "малако", "молока"]);
        let confidences: Vec<f64> = corrections.iter().map(|c| c.confidence).collect();
        assert!(confidences.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(corrections[0].corrected, "малако");
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let corrections = Corrector::default().correct("сыр", &["", "сырь"]);
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].corrected, "сырь");
    }

    #[test]
    fn test_query_below_minimum() {
        assert!(Corrector::new(3).correct("сы", &["сыр"]).is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let corrections = Corrector::default().correct("хлеп", &["хлеб", "хлеб"]);
        assert_eq!(corrections.len(), 1);
    }
}
