//! Relevance scoring for search results.

use crate::config::RankingWeights;
use crate::document::{Document, Field};
use crate::normalize::normalize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Popular grocery words. Queries hitting one of them get a small ranking bonus.
pub const DEFAULT_COMMON_WORDS: &[&str] = &[
    "хлеб", "молоко", "мясо", "рыба", "овощи", "фрукты", "крупа", "макароны", "сыр", "масло",
    "яйца", "курица", "говядина", "свинина", "картофель", "морковь", "лук", "помидор", "огурец",
    "яблоко", "банан", "апельсин",
];

/// The search pass that produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Query found verbatim
    Exact,
    /// A synonym of the query was found
    Synonym,
    /// A typo correction of the query was found
    Typo,
    /// The phonetically folded query was found
    Phonetic,
}

impl MatchType {
    /// Lowercase name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Synonym => "synonym",
            MatchType::Typo => "typo",
            MatchType::Phonetic => "phonetic",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and how a term matched inside a document.
#[derive(Debug, Clone, Copy)]
pub struct FieldMatch<'a> {
    /// Field that matched
    pub field: Field,
    /// Normalized (or phonetically folded) field text
    pub text: &'a str,
    /// Normalized term found inside `text`
    pub term: &'a str,
}

/// Computes per-document relevance scores.
#[derive(Debug, Clone)]
pub struct Ranker {
    weights: RankingWeights,
    common_words: BTreeSet<String>,
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(RankingWeights::default())
    }
}

impl Ranker {
    /// Create a ranker with the default common words.
    pub fn new(weights: RankingWeights) -> Self {
        Self {
            weights,
            common_words: DEFAULT_COMMON_WORDS.iter().map(|w| (*w).to_string()).collect(),
        }
    }

    /// Weights in use.
    pub fn weights(&self) -> &RankingWeights {
        &self.weights
    }

    /// Add common words (normalized on insert).
    pub fn add_common_words<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.common_words
            .extend(words.into_iter().map(|w| normalize(w.as_ref())).filter(|w| !w.is_empty()));
    }

    /// Returns true if the normalized word is a common word.
    pub fn is_common_word(&self, word: &str) -> bool {
        self.common_words.contains(word)
    }

    /// Common words in lexicographic order.
    pub fn common_words(&self) -> impl Iterator<Item = &str> {
        self.common_words.iter().map(String::as_str)
    }

    /// Multiplier for hits in `field`.
    pub fn field_weight(&self, field: Field) -> f64 {
        match field {
            Field::Title => self.weights.title_weight,
            Field::Tag => self.weights.tag_weight,
            Field::Category => self.weights.category_weight,
            Field::Content => self.weights.content_weight,
        }
    }

    /// Base points before field weighting, bonuses and penalties.
    pub fn base_points(&self, match_type: MatchType, matched: &FieldMatch<'_>) -> f64 {
        match match_type {
            MatchType::Exact if matched.text == matched.term => self.weights.exact_full,
            MatchType::Exact if matched.text.starts_with(matched.term) => self.weights.exact_prefix,
            MatchType::Exact => self.weights.exact_substring,
            MatchType::Synonym => self.weights.synonym,
            MatchType::Typo => self.weights.typo,
            MatchType::Phonetic => self.weights.phonetic,
        }
    }

    /// Score a document hit.
    ///
    /// `query` is the normalized user query; it drives the length-based
    /// bonus/penalty and the phrase multiplier. Typo hits are additionally
    /// scaled by the correction confidence by the caller.
    pub fn score(
        &self,
        document: &Document,
        query: &str,
        matched: &FieldMatch<'_>,
        match_type: MatchType,
    ) -> f64 {
        let w = &self.weights;
        let title = normalize(&document.title);
        let title_len = title.chars().count();
        let query_len = query.chars().count();

        let mut score = self.base_points(match_type, matched) * self.field_weight(matched.field);

        if let Some(popularity) = document.popularity.filter(|p| *p > 0.0) {
            score += (popularity * w.popularity_factor).min(w.popularity_cap);
        }
        if self.is_common_word(query) {
            score += w.common_word_bonus;
        }
        if title_len <= query_len + w.brevity_slack {
            score += w.brevity_bonus;
        }

        let long_title_limit = query_len * w.length_penalty_ratio;
        if title_len > long_title_limit {
            let excess = (title_len - long_title_limit) as f64;
            score -= (excess * w.length_penalty_per_char).min(w.length_penalty_cap);
        }

        score = score.max(0.0);

        if has_exact_phrase(document, &title, query) {
            score *= w.phrase_multiplier;
        }

        score
    }
}

fn has_exact_phrase(document: &Document, normalized_title: &str, query: &str) -> bool {
    !query.is_empty() && (normalized_title.contains(query) || normalize(&document.content).contains(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title_match<'a>(text: &'a str, term: &'a str) -> FieldMatch<'a> {
        FieldMatch { field: Field::Title, text, term }
    }

    #[test]
    fn test_base_points_are_strictly_ordered() {
        let ranker = Ranker::default();
        let full = ranker.base_points(MatchType::Exact, &title_match("сыр", "сыр"));
        let prefix = ranker.base_points(MatchType::Exact, &title_match("сыр плавленый", "сыр"));
        let substring = ranker.base_points(MatchType::Exact, &title_match("плавленый сыр", "сыр"));
        let synonym = ranker.base_points(MatchType::Synonym, &title_match("хлеб", "хлеб"));
        let typo = ranker.base_points(MatchType::Typo, &title_match("хлеб", "хлеб"));
        let phonetic = ranker.base_points(MatchType::Phonetic, &title_match("хлеп", "хлеп"));

        assert!(full > prefix);
        assert!(prefix > substring);
        assert!(substring > synonym);
        assert!(synonym > typo);
        assert!(typo > phonetic);
    }

    #[test]
    fn test_field_weights_ordered() {
        let ranker = Ranker::default();
        assert!(ranker.field_weight(Field::Title) > ranker.field_weight(Field::Tag));
        assert!(ranker.field_weight(Field::Tag) > ranker.field_weight(Field::Category));
        assert!(ranker.field_weight(Field::Category) > ranker.field_weight(Field::Content));
    }

    #[test]
    fn test_equal_title_beats_substring_title() {
        let ranker = Ranker::default();
        let exact = Document::new("1", "Кефир");
        let contains = Document::new("2", "Напиток кефирный").with_popularity(1000.0);

        let exact_score = ranker.score(&exact, "кефир", &title_match("кефир", "кефир"), MatchType::Exact);
        let contains_score = ranker.score(
            &contains,
            "кефир",
            &title_match("напиток кефирный", "кефир"),
            MatchType::Exact,
        );

        assert!(exact_score > contains_score);
    }

    #[test]
    fn test_phrase_match_doubles() {
        let ranker = Ranker::default();
        let doc = Document::new("1", "Кефир");
        let matched = title_match("кефир", "кефир");

        // (100 base + 5 brevity) * 2
        assert_eq!(ranker.score(&doc, "кефир", &matched, MatchType::Exact), 210.0);
    }

    #[test]
    fn test_popularity_is_capped() {
        let ranker = Ranker::default();
        let plain = Document::new("1", "Кефир");
        let popular = Document::new("2", "Кефир").with_popularity(10_000.0);
        let matched = FieldMatch { field: Field::Tag, text: "кисломолочное", term: "кефир" };

        let base = ranker.score(&plain, "кефир", &matched, MatchType::Synonym);
        let boosted = ranker.score(&popular, "кефир", &matched, MatchType::Synonym);
        // Title contains the query, so the phrase multiplier applies to the bonus too
        assert_eq!(boosted - base, 10.0 * 2.0);
    }

    #[test]
    fn test_long_title_penalty_is_proportional_and_capped() {
        let ranker = Ranker::default();
        let matched = title_match("x", "ух");
        let short = Document::new("1", "ухааааа"); // 7 chars, limit 6 → 1 excess
        let long = Document::new("2", "у".repeat(200));

        let short_score = ranker.score(&short, "ух", &matched, MatchType::Typo);
        let long_score = ranker.score(&long, "ух", &matched, MatchType::Typo);

        assert_eq!(short_score, (40.0 - 0.5) * 2.0);
        assert_eq!(long_score, 40.0 - 20.0);
    }

    #[test]
    fn test_common_word_bonus() {
        let mut ranker = Ranker::default();
        let doc = Document::new("1", "Сметана");
        let matched = title_match("сметана", "сметана");
        let before = ranker.score(&doc, "сметана", &matched, MatchType::Exact);

        ranker.add_common_words(["Сметана"]);
        let after = ranker.score(&doc, "сметана", &matched, MatchType::Exact);

        assert_eq!(after - before, 5.0 * 2.0);
    }
}
