//! Query engine.
//!
//! A search runs a fixed sequence of passes over the indexed documents:
//!
//! 1. exact: the normalized query is a substring of a normalized field
//! 2. synonym: a synonym of the query is a substring of a field
//! 3. typo: only when passes 1-2 found nothing; the best corrections are searched
//! 4. phonetic: only while few candidates exist; folded query against folded fields
//!
//! A document is reported once, with its best-scoring match.

use crate::cache::{CacheStats, SearchCache};
use crate::config::SearchConfig;
use crate::corrector::{Correction, Corrector};
use crate::document::{Document, Field, FieldMap};
use crate::error::{Result, SearchError};
use crate::index::{IndexReport, InvertedIndex};
use crate::normalize::{normalize, phonetic_fold, phonetic_rule_count, Tokenizer};
use crate::relevance::{FieldMatch, MatchType, Ranker};
use crate::suggest::{Suggestion, SuggestionEngine};
use crate::synonyms::SynonymTable;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, RwLock};
use std::time::Instant;
use tracing::{debug, info, instrument, trace, warn};

/// Per-query options. Unset values fall back to the engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchOptions {
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Enable typo correction
    pub fuzzy: Option<bool>,
    /// Enable the phonetic pass
    pub phonetic: Option<bool>,
    /// Enable synonym expansion
    pub synonyms: Option<bool>,
    /// Only documents in this category
    pub category: Option<String>,
    /// Only documents carrying at least one of these tags
    pub tags: Vec<String>,
}

impl SearchOptions {
    /// Limit the number of results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Toggle typo correction.
    pub fn with_fuzzy(mut self, enabled: bool) -> Self {
        self.fuzzy = Some(enabled);
        self
    }

    /// Toggle the phonetic pass.
    pub fn with_phonetic(mut self, enabled: bool) -> Self {
        self.phonetic = Some(enabled);
        self
    }

    /// Toggle synonym expansion.
    pub fn with_synonyms(mut self, enabled: bool) -> Self {
        self.synonyms = Some(enabled);
        self
    }

    /// Restrict to a category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Restrict to documents with any of the given tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Options after defaults are applied; also the cache key payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct EffectiveOptions {
    limit: usize,
    fuzzy: bool,
    phonetic: bool,
    synonyms: bool,
    category: Option<String>,
    tags: BTreeSet<String>,
}

#[derive(Serialize)]
struct CacheKey<'a> {
    query: &'a str,
    options: &'a EffectiveOptions,
}

/// Matched term and its token positions within a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    /// Field (title or content)
    pub field: Field,
    /// Term that matched
    pub term: String,
    /// Token positions in the field
    pub positions: Vec<usize>,
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    /// Document id
    pub id: String,
    /// The original record
    pub document: Value,
    /// Relevance score
    pub score: f64,
    /// Pass that produced the hit
    pub match_type: MatchType,
    /// Term found in the document (query, synonym, correction or folded query)
    pub matched_term: String,
    /// Fields the term was found in
    pub matched_fields: Vec<Field>,
    /// Title and content highlights
    pub highlights: Vec<Highlight>,
}

/// Timing and counters for one search.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    /// Wall time in milliseconds
    pub search_time_ms: f64,
    /// Matches before the result limit was applied
    pub total_found: usize,
    /// Query as given
    pub query: String,
    /// Returned exact hits
    pub exact_matches: usize,
    /// Returned synonym hits
    pub synonym_matches: usize,
    /// Returned typo hits
    pub typo_matches: usize,
    /// Returned phonetic hits
    pub phonetic_matches: usize,
    /// Served from the result cache
    pub from_cache: bool,
}

/// Search output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Ranked hits
    pub results: Vec<SearchHit>,
    /// Autocomplete suggestions for the query
    pub suggestions: Vec<String>,
    /// Typo corrections applied by the typo pass
    pub corrections: Vec<Correction>,
    /// Timing and counters
    pub stats: SearchStats,
}

impl SearchResponse {
    fn empty(query: &str) -> Self {
        Self {
            stats: SearchStats {
                query: query.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Engine-wide statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    /// Stored documents
    pub documents: usize,
    /// Unique index terms
    pub terms: usize,
    /// Indexed tokens
    pub total_words: usize,
    /// Searches executed (cache hits included)
    pub searches_performed: u64,
    /// Mean search time in milliseconds
    pub average_search_time_ms: f64,
    /// Result cache counters
    pub cache: CacheStats,
    /// Synonym groups
    pub synonym_groups: usize,
    /// Stop words
    pub stop_words: usize,
    /// Phonetic rules
    pub phonetic_rules: usize,
    /// An index has been built
    pub ready: bool,
}

#[derive(Debug, Default)]
struct UsageCounters {
    searches: u64,
    total_time_ms: f64,
}

/// A document prepared for one search: normalized fields, filter already applied.
struct DocumentView<'a> {
    rank: usize,
    doc: &'a Document,
    fields: Vec<(Field, String)>,
}

impl DocumentView<'_> {
    fn contains(&self, needle: &str) -> bool {
        self.fields.iter().any(|(_, text)| text.contains(needle))
    }
}

/// Best match found so far for a document.
struct Candidate<'a> {
    view: &'a DocumentView<'a>,
    score: f64,
    match_type: MatchType,
    term: String,
    fields: BTreeSet<Field>,
    folded: bool,
}

/// Fuzzy catalog search engine.
///
/// Owns its index, vocabulary, synonyms, stop words, ranking weights and result
/// cache, so several independent engines can live in one process.
///
/// # Example
/// ```
/// use foodshare_search::{FieldMap, MatchType, SearchEngine, SearchOptions};
/// use serde_json::json;
///
/// let mut engine = SearchEngine::default().with_field_map(FieldMap::default().with_title_field("name"));
/// engine.index_data(&[json!({"id": 1, "name": "молоко"}), json!({"id": 2, "name": "мороженое"})]);
///
/// let response = engine.search("молки", &SearchOptions::default()).unwrap();
/// assert_eq!(response.corrections[0].corrected, "молоко");
/// assert_eq!(response.results[0].id, "1");
/// assert_eq!(response.results[0].match_type, MatchType::Typo);
/// ```
#[derive(Debug)]
pub struct SearchEngine {
    config: SearchConfig,
    field_map: FieldMap,
    index: InvertedIndex,
    vocabulary: Vec<String>,
    synonyms: SynonymTable,
    ranker: Ranker,
    corrector: Corrector,
    suggester: SuggestionEngine,
    cache: Mutex<SearchCache<SearchResponse>>,
    usage: RwLock<UsageCounters>,
    ready: bool,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::build(SearchConfig::default())
    }
}

impl SearchEngine {
    /// Create an engine from a validated configuration.
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SearchConfig) -> Self {
        let mut tokenizer = Tokenizer::new(config.min_word_length);
        tokenizer.add_stop_words(&config.stop_words);

        let mut synonyms = SynonymTable::with_defaults();
        for (canonical, variants) in &config.synonyms {
            synonyms.add_group(canonical, variants);
        }

        let mut ranker = Ranker::new(config.ranking.clone());
        ranker.add_common_words(&config.common_words);

        Self {
            field_map: FieldMap::default(),
            index: InvertedIndex::new(tokenizer),
            vocabulary: Vec::new(),
            synonyms,
            ranker,
            corrector: Corrector::new(config.min_query_length),
            suggester: SuggestionEngine::new(config.fuzzy_threshold),
            cache: Mutex::new(SearchCache::new(config.cache_ttl(), config.max_cache_entries)),
            usage: RwLock::new(UsageCounters::default()),
            ready: false,
            config,
        }
    }

    /// Use a custom record-to-field mapping for subsequent indexing.
    pub fn with_field_map(mut self, field_map: FieldMap) -> Self {
        self.field_map = field_map;
        self
    }

    /// Change the field mapping; applies to records indexed afterwards.
    pub fn set_field_map(&mut self, field_map: FieldMap) {
        self.field_map = field_map;
    }

    /// Engine configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Field mapping used for indexing.
    pub fn field_map(&self) -> &FieldMap {
        &self.field_map
    }

    /// Read access to the index.
    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    /// True once an index has been built.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Replace the index with `records` (full reindex, never a merge).
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub fn index_data(&mut self, records: &[Value]) -> IndexReport {
        let report = self.index.index_data(records, &self.field_map);
        self.ready = true;
        self.index_changed();

        info!(
            documents = report.documents_indexed,
            terms = report.terms,
            total_words = report.total_words,
            elapsed_ms = report.index_time_ms,
            "Search index built"
        );

        report
    }

    /// Replace the index with records parsed from a JSON array.
    pub fn index_json(&mut self, records_json: &str) -> Result<IndexReport> {
        let records: Vec<Value> = serde_json::from_str(records_json)?;
        Ok(self.index_data(&records))
    }

    /// Replace the index using a different field mapping.
    pub fn index_data_with(&mut self, records: &[Value], field_map: FieldMap) -> IndexReport {
        self.set_field_map(field_map);
        self.index_data(records)
    }

    /// Add or replace a single record. Returns its id.
    ///
    /// A successful add counts as an index build.
    pub fn add_document(&mut self, record: &Value) -> String {
        let id = self.index.add_record(record, &self.field_map);
        self.ready = true;
        self.index_changed();
        debug!(id = %id, "Document indexed");
        id
    }

    /// Remove a document and all of its postings.
    pub fn remove_document(&mut self, id: &str) -> bool {
        let removed = self.index.remove_document(id);
        if removed {
            self.index_changed();
            debug!(id = %id, "Document removed");
        }
        removed
    }

    /// Drop the whole index. Searching fails until the next build.
    pub fn clear_index(&mut self) {
        self.index.clear();
        self.ready = false;
        self.index_changed();
        info!("Search index cleared");
    }

    /// Extra stop words; they apply to text indexed afterwards and to queries.
    pub fn add_stop_words<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.index.tokenizer_mut().add_stop_words(words);
        self.clear_cache();
    }

    /// Extend the synonym table.
    pub fn add_synonyms<I, S>(&mut self, canonical: &str, variants: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.synonyms.add_group(canonical, variants);
        self.clear_cache();
    }

    /// Extend the common-word list.
    pub fn add_common_words<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ranker.add_common_words(words);
        self.clear_cache();
    }

    /// Synonyms of a term.
    pub fn find_synonyms(&self, term: &str) -> Vec<String> {
        self.synonyms.resolve(term)
    }

    /// Typo corrections for a query against the indexed vocabulary.
    pub fn correct_typos(&self, query: &str) -> Vec<Correction> {
        self.corrector.correct(query, &self.vocabulary)
    }

    /// Autocomplete suggestions for a partial query.
    pub fn suggest(&self, partial: &str, limit: usize) -> Vec<Suggestion> {
        self.suggester
            .suggest(&self.index, self.ranker.common_words(), partial, limit)
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    /// Engine statistics.
    pub fn stats(&self) -> EngineStats {
        let (searches, total_time_ms) = match self.usage.read() {
            Ok(usage) => (usage.searches, usage.total_time_ms),
            Err(poisoned) => {
                let usage = poisoned.into_inner();
                (usage.searches, usage.total_time_ms)
            }
        };

        EngineStats {
            documents: self.index.len(),
            terms: self.index.term_count(),
            total_words: self.index.total_words(),
            searches_performed: searches,
            average_search_time_ms: if searches == 0 { 0.0 } else { total_time_ms / searches as f64 },
            cache: self.lock_cache().stats(),
            synonym_groups: self.synonyms.len(),
            stop_words: self.index.tokenizer().stop_word_count(),
            phonetic_rules: phonetic_rule_count(),
            ready: self.ready,
        }
    }

    /// Search the index.
    ///
    /// Returns [`SearchError::IndexNotReady`] when no index was built yet.
    /// A query shorter than `min_query_length` gives an empty response.
    #[instrument(skip(self, options), fields(query = %query))]
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResponse> {
        if !self.ready {
            return Err(SearchError::IndexNotReady);
        }

        let started = Instant::now();
        let normalized = normalize(query);
        if normalized.chars().count() < self.config.min_query_length {
            return Ok(SearchResponse::empty(query));
        }

        let options = self.effective_options(options);
        let cache_key = self
            .config
            .cache_enabled
            .then(|| serde_json::to_string(&CacheKey { query: &normalized, options: &options }).ok())
            .flatten();

        if let Some(key) = cache_key.as_deref() {
            let cached = self.lock_cache().get(key);
            if let Some(mut cached) = cached {
                // The key is the normalized query; echo the caller's spelling back.
                cached.stats.query = query.to_string();
                for correction in &mut cached.corrections {
                    correction.original = query.to_string();
                }
                cached.stats.from_cache = true;
                cached.stats.search_time_ms = elapsed_ms(started);
                self.record_search(cached.stats.search_time_ms);
                debug!(results = cached.results.len(), "Served from cache");
                return Ok(cached);
            }
        }

        let mut response = self.execute(query, &normalized, &options);
        response.stats.search_time_ms = elapsed_ms(started);
        self.record_search(response.stats.search_time_ms);

        if let Some(key) = cache_key {
            self.lock_cache().set(key, response.clone());
        }

        debug!(
            results = response.results.len(),
            total_found = response.stats.total_found,
            corrections = response.corrections.len(),
            elapsed_ms = response.stats.search_time_ms,
            "Search completed"
        );

        Ok(response)
    }

    fn execute(&self, query: &str, normalized: &str, options: &EffectiveOptions) -> SearchResponse {
        let views = self.document_views(options);
        let mut candidates: HashMap<&str, Candidate<'_>> = HashMap::new();

        self.scan(&views, normalized, normalized, MatchType::Exact, 1.0, false, &mut candidates);
        trace!(candidates = candidates.len(), "exact pass");

        if options.synonyms {
            for synonym in self.synonyms.resolve(normalized) {
                self.scan(&views, normalized, &synonym, MatchType::Synonym, 1.0, false, &mut candidates);
            }
            trace!(candidates = candidates.len(), "synonym pass");
        }

        let mut corrections = Vec::new();
        if options.fuzzy && candidates.is_empty() {
            corrections = self
                .corrector
                .correct(query, &self.vocabulary)
                .into_iter()
                .filter(|c| views.iter().any(|view| view.contains(&c.corrected)))
                .take(self.config.typo_corrections_limit)
                .collect();

            for correction in &corrections {
                self.scan(
                    &views,
                    normalized,
                    &correction.corrected,
                    MatchType::Typo,
                    correction.confidence,
                    false,
                    &mut candidates,
                );
            }
            trace!(candidates = candidates.len(), corrections = corrections.len(), "typo pass");
        }

        if options.phonetic && candidates.len() < self.config.phonetic_fallback_threshold {
            let folded = phonetic_fold(normalized);
            if !folded.is_empty() && folded != normalized {
                self.scan(&views, normalized, &folded, MatchType::Phonetic, 1.0, true, &mut candidates);
                trace!(candidates = candidates.len(), "phonetic pass");
            }
        }

        let mut ranked: Vec<Candidate<'_>> = candidates.into_values().collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.view.rank.cmp(&b.view.rank))
        });

        let total_found = ranked.len();
        let results: Vec<SearchHit> = ranked
            .into_iter()
            .take(options.limit)
            .map(|candidate| self.to_hit(candidate))
            .collect();

        let count = |match_type: MatchType| results.iter().filter(|r| r.match_type == match_type).count();
        let stats = SearchStats {
            search_time_ms: 0.0,
            total_found,
            query: query.to_string(),
            exact_matches: count(MatchType::Exact),
            synonym_matches: count(MatchType::Synonym),
            typo_matches: count(MatchType::Typo),
            phonetic_matches: count(MatchType::Phonetic),
            from_cache: false,
        };

        let suggestions = self
            .suggest(normalized, self.config.max_suggestions + 1)
            .into_iter()
            .map(|s| s.text)
            .filter(|text| text != normalized)
            .take(self.config.max_suggestions)
            .collect();

        SearchResponse {
            results,
            suggestions,
            corrections,
            stats,
        }
    }

    /// Substring-match `needle` against every document and keep the better match per document.
    #[allow(clippy::too_many_arguments)]
    fn scan<'a>(
        &self,
        views: &'a [DocumentView<'a>],
        query: &str,
        needle: &str,
        match_type: MatchType,
        scale: f64,
        fold: bool,
        candidates: &mut HashMap<&'a str, Candidate<'a>>,
    ) {
        if needle.is_empty() {
            return;
        }

        for view in views {
            let mut best: Option<f64> = None;
            let mut fields = BTreeSet::new();

            for (field, text) in &view.fields {
                let folded;
                let haystack = if fold {
                    folded = phonetic_fold(text);
                    folded.as_str()
                } else {
                    text.as_str()
                };
                if !haystack.contains(needle) {
                    continue;
                }

                let matched = FieldMatch { field: *field, text: haystack, term: needle };
                let score = self.ranker.score(view.doc, query, &matched, match_type) * scale;
                best = Some(best.map_or(score, |b: f64| b.max(score)));
                fields.insert(*field);
            }

            let Some(score) = best else { continue };
            let better = candidates
                .get(view.doc.id.as_str())
                .map_or(true, |existing| score > existing.score);
            if better {
                candidates.insert(
                    view.doc.id.as_str(),
                    Candidate {
                        view,
                        score,
                        match_type,
                        term: needle.to_string(),
                        fields,
                        folded: fold,
                    },
                );
            }
        }
    }

    fn to_hit(&self, candidate: Candidate<'_>) -> SearchHit {
        let tokenizer = self.index.tokenizer();
        let highlights = candidate
            .fields
            .iter()
            .filter(|field| matches!(field, Field::Title | Field::Content))
            .filter_map(|field| {
                let text = match field {
                    Field::Title => &candidate.view.doc.title,
                    _ => &candidate.view.doc.content,
                };
                let positions = highlight_positions(tokenizer, text, &candidate.term, candidate.folded);
                (!positions.is_empty()).then(|| Highlight {
                    field: *field,
                    term: candidate.term.clone(),
                    positions,
                })
            })
            .collect();

        SearchHit {
            id: candidate.view.doc.id.clone(),
            document: candidate.view.doc.original.clone(),
            score: candidate.score,
            match_type: candidate.match_type,
            matched_term: candidate.term,
            matched_fields: candidate.fields.into_iter().collect(),
            highlights,
        }
    }

    fn document_views(&self, options: &EffectiveOptions) -> Vec<DocumentView<'_>> {
        self.index
            .documents()
            .enumerate()
            .filter(|(_, doc)| passes_filters(doc, options))
            .map(|(rank, doc)| DocumentView {
                rank,
                doc,
                fields: doc
                    .field_texts()
                    .into_iter()
                    .map(|(field, text)| (field, normalize(text)))
                    .collect(),
            })
            .collect()
    }

    fn effective_options(&self, options: &SearchOptions) -> EffectiveOptions {
        EffectiveOptions {
            limit: options.limit.unwrap_or(self.config.max_results),
            fuzzy: options.fuzzy.unwrap_or(self.config.enable_fuzzy),
            phonetic: options.phonetic.unwrap_or(self.config.enable_phonetic),
            synonyms: options.synonyms.unwrap_or(self.config.enable_synonyms),
            category: options.category.as_deref().map(normalize).filter(|c| !c.is_empty()),
            tags: options
                .tags
                .iter()
                .map(|t| normalize(t))
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    fn index_changed(&mut self) {
        self.vocabulary = self.index.vocabulary();
        self.clear_cache();
    }

    fn record_search(&self, elapsed_ms: f64) {
        let mut usage = self.usage.write().unwrap_or_else(|poisoned| {
            warn!("Search usage lock was poisoned; recovering");
            poisoned.into_inner()
        });
        usage.searches += 1;
        usage.total_time_ms += elapsed_ms;
    }

    fn lock_cache(&self) -> MutexGuard<'_, SearchCache<SearchResponse>> {
        self.cache.lock().unwrap_or_else(|poisoned| {
            warn!("Search cache lock was poisoned; recovering");
            poisoned.into_inner()
        })
    }
}

fn passes_filters(doc: &Document, options: &EffectiveOptions) -> bool {
    if let Some(category) = &options.category {
        if normalize(&doc.category) != *category {
            return false;
        }
    }
    options.tags.is_empty() || doc.tags.iter().any(|tag| options.tags.contains(&normalize(tag)))
}

fn highlight_positions(tokenizer: &Tokenizer, text: &str, term: &str, folded: bool) -> Vec<usize> {
    let words: Vec<&str> = term.split_whitespace().collect();
    tokenizer
        .tokenize(text)
        .iter()
        .enumerate()
        .filter(|(_, token)| {
            let token = if folded { phonetic_fold(token) } else { (*token).clone() };
            words.iter().any(|word| token.contains(word))
        })
        .map(|(position, _)| position)
        .collect()
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
