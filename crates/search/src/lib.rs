//! In-memory fuzzy search for FoodShare product catalogs.
//!
//! This crate provides:
//! - Text normalization, tokenization and Russian phonetic folding
//! - An inverted index with term positions
//! - Typo correction with length-adaptive Levenshtein limits
//! - Synonym expansion
//! - Multi-level relevance ranking
//! - A bounded TTL result cache
//! - Prefix and fuzzy autocomplete
//!
//! # Example
//!
//! ```
//! use foodshare_search::{SearchEngine, SearchOptions};
//! use serde_json::json;
//!
//! let mut engine = SearchEngine::default();
//! engine.index_data(&[
//!     json!({"id": "1", "title": "Хлеб бородинский", "category": "Выпечка"}),
//!     json!({"id": "2", "title": "Молоко 3.2%", "category": "Молочные продукты"}),
//! ]);
//!
//! let response = engine.search("батон", &SearchOptions::default()).unwrap();
//! assert_eq!(response.results[0].id, "1");
//! ```

mod cache;
mod config;
mod corrector;
mod document;
mod engine;
mod error;
mod fuzzy;
mod index;
mod normalize;
mod relevance;
mod suggest;
mod synonyms;

#[cfg(feature = "wasm")]
mod wasm;

pub use cache::{CacheStats, SearchCache};
pub use config::{RankingWeights, SearchConfig};
pub use corrector::{max_typo_distance, Correction, Corrector};
pub use document::{Document, Field, FieldMap};
pub use engine::{
    EngineStats, Highlight, SearchEngine, SearchHit, SearchOptions, SearchResponse, SearchStats,
};
pub use error::{Result, SearchError};
pub use fuzzy::{levenshtein_distance, similarity};
pub use index::{IndexReport, InvertedIndex, Posting, TermPosition};
pub use normalize::{normalize, phonetic_fold, Tokenizer, DEFAULT_STOP_WORDS};
pub use relevance::{FieldMatch, MatchType, Ranker, DEFAULT_COMMON_WORDS};
pub use suggest::{Suggestion, SuggestionEngine, SuggestionKind};
pub use synonyms::{SynonymTable, DEFAULT_SYNONYMS};
