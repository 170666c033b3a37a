//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid configuration:
//!
//! ```toml
//! min_word_length = 2
//! max_results = 20
//! enable_phonetic = false
//! stop_words = ["свежий"]
//!
//! [synonyms]
//! "сыр" = ["сырок", "сырный"]
//!
//! [ranking]
//! title_weight = 1.5
//! ```

use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Base points for a query equal to the whole field text.
pub const EXACT_FULL_POINTS: f64 = 100.0;
/// Base points for a field text starting with the query.
pub const EXACT_PREFIX_POINTS: f64 = 85.0;
/// Base points for a field text containing the query.
pub const EXACT_SUBSTRING_POINTS: f64 = 70.0;
/// Base points for a synonym hit.
pub const SYNONYM_POINTS: f64 = 60.0;
/// Base points for a hit through a typo correction (before confidence scaling).
pub const TYPO_POINTS: f64 = 40.0;
/// Base points for a phonetic hit.
pub const PHONETIC_POINTS: f64 = 30.0;

/// Weights, bonuses and penalties used by the ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    /// Query equals the field text
    pub exact_full: f64,
    /// Field text starts with the query
    pub exact_prefix: f64,
    /// Field text contains the query
    pub exact_substring: f64,
    /// Synonym match
    pub synonym: f64,
    /// Typo-corrected match
    pub typo: f64,
    /// Phonetic match
    pub phonetic: f64,

    /// Multiplier for title hits
    pub title_weight: f64,
    /// Multiplier for tag hits
    pub tag_weight: f64,
    /// Multiplier for category hits
    pub category_weight: f64,
    /// Multiplier for content hits
    pub content_weight: f64,

    /// Popularity is multiplied by this factor...
    pub popularity_factor: f64,
    /// ...and capped at this bonus
    pub popularity_cap: f64,
    /// Bonus when the query is a known common word
    pub common_word_bonus: f64,
    /// Bonus when the title is about as long as the query
    pub brevity_bonus: f64,
    /// Title may exceed the query by this many chars and still get the brevity bonus
    pub brevity_slack: usize,
    /// Titles longer than `query_len * ratio` are penalized
    pub length_penalty_ratio: usize,
    /// Penalty per char beyond the ratio
    pub length_penalty_per_char: f64,
    /// Maximum length penalty
    pub length_penalty_cap: f64,
    /// Score multiplier when the whole query appears verbatim in title or content
    pub phrase_multiplier: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            exact_full: EXACT_FULL_POINTS,
            exact_prefix: EXACT_PREFIX_POINTS,
            exact_substring: EXACT_SUBSTRING_POINTS,
            synonym: SYNONYM_POINTS,
            typo: TYPO_POINTS,
            phonetic: PHONETIC_POINTS,
            title_weight: 1.0,
            tag_weight: 0.75,
            category_weight: 0.6,
            content_weight: 0.4,
            popularity_factor: 0.1,
            popularity_cap: 10.0,
            common_word_bonus: 5.0,
            brevity_bonus: 5.0,
            brevity_slack: 3,
            length_penalty_ratio: 3,
            length_penalty_per_char: 0.5,
            length_penalty_cap: 20.0,
            phrase_multiplier: 2.0,
        }
    }
}

impl RankingWeights {
    fn validate(&self) -> Result<()> {
        let ladder = [
            ("exact_full", self.exact_full),
            ("exact_prefix", self.exact_prefix),
            ("exact_substring", self.exact_substring),
            ("synonym", self.synonym),
            ("typo", self.typo),
            ("phonetic", self.phonetic),
        ];
        for pair in ladder.windows(2) {
            if pair[0].1 <= pair[1].1 {
                return Err(SearchError::InvalidConfig(format!(
                    "ranking.{} ({}) must be greater than ranking.{} ({})",
                    pair[0].0, pair[0].1, pair[1].0, pair[1].1
                )));
            }
        }

        let non_negative = [
            ("phonetic", self.phonetic),
            ("title_weight", self.title_weight),
            ("tag_weight", self.tag_weight),
            ("category_weight", self.category_weight),
            ("content_weight", self.content_weight),
            ("popularity_factor", self.popularity_factor),
            ("popularity_cap", self.popularity_cap),
            ("common_word_bonus", self.common_word_bonus),
            ("brevity_bonus", self.brevity_bonus),
            ("length_penalty_per_char", self.length_penalty_per_char),
            ("length_penalty_cap", self.length_penalty_cap),
            ("phrase_multiplier", self.phrase_multiplier),
        ];
        if let Some((name, value)) = non_negative.iter().find(|(_, v)| !(*v >= 0.0)) {
            return Err(SearchError::InvalidConfig(format!(
                "ranking.{} must be non-negative, got {}",
                name, value
            )));
        }

        Ok(())
    }
}

/// Search engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Shortest token kept by the tokenizer (chars)
    #[serde(default = "default_min_word_length")]
    pub min_word_length: usize,

    /// Queries shorter than this return an empty response (chars)
    #[serde(default = "default_min_query_length")]
    pub min_query_length: usize,

    /// Default result limit
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Number of autocomplete suggestions in a search response
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Minimum similarity for fuzzy suggestions
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,

    /// Enable typo correction
    #[serde(default = "default_true")]
    pub enable_fuzzy: bool,

    /// Enable the phonetic fallback pass
    #[serde(default = "default_true")]
    pub enable_phonetic: bool,

    /// Enable synonym expansion
    #[serde(default = "default_true")]
    pub enable_synonyms: bool,

    /// Memoize search responses
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Cache entry lifetime in milliseconds
    #[serde(default = "default_cache_timeout_ms")]
    pub cache_timeout_ms: u64,

    /// Maximum number of cached responses
    #[serde(default = "default_max_cache_entries")]
    pub max_cache_entries: usize,

    /// How many corrections the typo pass tries
    #[serde(default = "default_typo_corrections_limit")]
    pub typo_corrections_limit: usize,

    /// The phonetic pass runs while fewer candidates than this were found
    #[serde(default = "default_phonetic_fallback_threshold")]
    pub phonetic_fallback_threshold: usize,

    /// Ranking weights
    #[serde(default)]
    pub ranking: RankingWeights,

    /// Extra stop words (added to the defaults)
    #[serde(default)]
    pub stop_words: Vec<String>,

    /// Extra synonym groups: canonical term to variants
    #[serde(default)]
    pub synonyms: BTreeMap<String, Vec<String>>,

    /// Extra common words (ranking bonus, suggestion seeds)
    #[serde(default)]
    pub common_words: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_word_length: default_min_word_length(),
            min_query_length: default_min_query_length(),
            max_results: default_max_results(),
            max_suggestions: default_max_suggestions(),
            fuzzy_threshold: default_fuzzy_threshold(),
            enable_fuzzy: true,
            enable_phonetic: true,
            enable_synonyms: true,
            cache_enabled: true,
            cache_timeout_ms: default_cache_timeout_ms(),
            max_cache_entries: default_max_cache_entries(),
            typo_corrections_limit: default_typo_corrections_limit(),
            phonetic_fallback_threshold: default_phonetic_fallback_threshold(),
            ranking: RankingWeights::default(),
            stop_words: Vec::new(),
            synonyms: BTreeMap::new(),
            common_words: Vec::new(),
        }
    }
}

fn default_min_word_length() -> usize {
    2
}

fn default_min_query_length() -> usize {
    2
}

fn default_max_results() -> usize {
    50
}

fn default_max_suggestions() -> usize {
    5
}

fn default_fuzzy_threshold() -> f64 {
    0.6
}

fn default_true() -> bool {
    true
}

fn default_cache_timeout_ms() -> u64 {
    300_000 // 5 minutes
}

fn default_max_cache_entries() -> usize {
    100
}

fn default_typo_corrections_limit() -> usize {
    3
}

fn default_phonetic_fallback_threshold() -> usize {
    3
}

impl SearchConfig {
    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SearchConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Cache entry lifetime.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.min_word_length == 0 {
            return Err(SearchError::InvalidConfig("min_word_length must be at least 1".into()));
        }
        if self.min_query_length == 0 {
            return Err(SearchError::InvalidConfig("min_query_length must be at least 1".into()));
        }
        if self.max_results == 0 {
            return Err(SearchError::InvalidConfig("max_results must be at least 1".into()));
        }
        if !(self.fuzzy_threshold > 0.0 && self.fuzzy_threshold <= 1.0) {
            return Err(SearchError::InvalidConfig(format!(
                "fuzzy_threshold must be in (0, 1], got {}",
                self.fuzzy_threshold
            )));
        }
        if self.cache_enabled && (self.cache_timeout_ms == 0 || self.max_cache_entries == 0) {
            return Err(SearchError::InvalidConfig(
                "cache_timeout_ms and max_cache_entries must be positive when the cache is enabled".into(),
            ));
        }
        self.ranking.validate()
    }
}
