//! Autocomplete suggestions: prefix matches first, fuzzy matches as a fallback.

use crate::fuzzy::similarity;
use crate::index::InvertedIndex;
use crate::normalize::normalize;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Partial queries shorter than this get no suggestions.
pub const MIN_SUGGEST_LENGTH: usize = 2;

/// How a suggestion was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    /// Term starts with the partial query
    Prefix,
    /// Term is similar to the partial query
    Fuzzy,
}

/// An autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    /// Suggested term
    pub text: String,
    /// Occurrences of the term in the corpus
    pub frequency: usize,
    /// Prefix or fuzzy
    pub kind: SuggestionKind,
    /// Similarity to the partial query (1.0 for prefix matches)
    pub similarity: f64,
}

/// Generates suggestions from the indexed vocabulary.
#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    min_similarity: f64,
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::new(0.6)
    }
}

impl SuggestionEngine {
    /// Fuzzy suggestions need at least `min_similarity`.
    pub fn new(min_similarity: f64) -> Self {
        Self { min_similarity }
    }

    /// Suggest up to `limit` completions for `partial`.
    ///
    /// Prefix matches (from the index and from `seed_words`) are ranked by
    /// corpus frequency and always precede fuzzy matches, which are only
    /// computed when there are fewer than `limit` prefix matches.
    pub fn suggest<'a, I>(&self, index: &InvertedIndex, seed_words: I, partial: &str, limit: usize) -> Vec<Suggestion>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let normalized = normalize(partial);
        if normalized.chars().count() < MIN_SUGGEST_LENGTH || limit == 0 {
            return Vec::new();
        }

        let mut found: BTreeMap<String, Suggestion> = BTreeMap::new();

        let mut add_prefix = |term: &str| {
            found.entry(term.to_string()).or_insert_with(|| Suggestion {
                text: term.to_string(),
                frequency: index.term_frequency(term),
                kind: SuggestionKind::Prefix,
                similarity: 1.0,
            });
        };
        index.terms_with_prefix(&normalized).for_each(&mut add_prefix);
        seed_words
            .into_iter()
            .filter(|word| word.starts_with(normalized.as_str()))
            .for_each(&mut add_prefix);

        if found.len() < limit {
            for suggestion in self.fuzzy_matches(index, &normalized) {
                found.entry(suggestion.text.clone()).or_insert(suggestion);
            }
        }

        let mut suggestions: Vec<Suggestion> = found.into_values().collect();
        suggestions.sort_by(compare_suggestions);
        suggestions.truncate(limit);
        suggestions
    }

    fn fuzzy_matches(&self, index: &InvertedIndex, normalized: &str) -> Vec<Suggestion> {
        let terms: Vec<&str> = index.terms().filter(|term| !term.starts_with(normalized)).collect();

        let evaluate = |term: &&str| {
            let score = similarity(normalized, term);
            (score >= self.min_similarity).then(|| Suggestion {
                text: (*term).to_string(),
                frequency: index.term_frequency(term),
                kind: SuggestionKind::Fuzzy,
                similarity: score,
            })
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            terms.par_iter().filter_map(evaluate).collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            terms.iter().filter_map(evaluate).collect()
        }
    }
}

fn compare_suggestions(a: &Suggestion, b: &Suggestion) -> Ordering {
    a.kind
        .cmp(&b.kind)
        .then(b.frequency.cmp(&a.frequency))
        .then_with(|| a.text.cmp(&b.text))
}
