//! WASM bindings for the search engine.
//!
//! Everything crosses the boundary as JSON strings.

use crate::{levenshtein_distance, normalize, FieldMap, SearchConfig, SearchEngine, SearchOptions};
use wasm_bindgen::prelude::*;

/// Search engine handle for JavaScript callers.
#[wasm_bindgen]
pub struct WasmSearchEngine {
    inner: SearchEngine,
}

#[wasm_bindgen]
impl WasmSearchEngine {
    /// Create an engine. `config_json` may be empty for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<WasmSearchEngine, JsError> {
        let config = if config_json.trim().is_empty() {
            SearchConfig::default()
        } else {
            serde_json::from_str(config_json)?
        };
        Ok(Self { inner: SearchEngine::new(config)? })
    }

    /// Index a JSON array of records, replacing the current index.
    ///
    /// `title_field` names the record key used as title ("title" when empty).
    /// Returns the index report as JSON.
    #[wasm_bindgen(js_name = indexJson)]
    pub fn index_json(&mut self, records_json: &str, title_field: &str) -> Result<String, JsError> {
        let field_map = if title_field.is_empty() {
            FieldMap::default()
        } else {
            FieldMap::default().with_title_field(title_field)
        };
        self.inner.set_field_map(field_map);
        let report = self.inner.index_json(records_json)?;
        Ok(serde_json::to_string(&report)?)
    }

    /// Search. `options_json` may be empty for defaults.
    #[wasm_bindgen(js_name = searchJson)]
    pub fn search_json(&self, query: &str, options_json: &str) -> Result<String, JsError> {
        let options: SearchOptions = if options_json.trim().is_empty() {
            SearchOptions::default()
        } else {
            serde_json::from_str(options_json)?
        };
        let response = self.inner.search(query, &options)?;
        Ok(serde_json::to_string(&response)?)
    }

    /// Autocomplete suggestions as a JSON array.
    #[wasm_bindgen(js_name = suggestJson)]
    pub fn suggest_json(&self, partial: &str, limit: usize) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.inner.suggest(partial, limit))?)
    }

    /// Typo corrections as a JSON array.
    #[wasm_bindgen(js_name = correctJson)]
    pub fn correct_json(&self, query: &str) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.inner.correct_typos(query))?)
    }

    /// Engine statistics as JSON.
    #[wasm_bindgen(js_name = statsJson)]
    pub fn stats_json(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.inner.stats())?)
    }

    /// Drop cached responses.
    #[wasm_bindgen(js_name = clearCache)]
    pub fn clear_cache(&self) {
        self.inner.clear_cache();
    }

    /// Drop the index.
    #[wasm_bindgen(js_name = clearIndex)]
    pub fn clear_index(&mut self) {
        self.inner.clear_index();
    }

    /// True once an index has been built.
    #[wasm_bindgen(getter, js_name = isReady)]
    pub fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }
}

/// Normalize text the way the index does.
#[wasm_bindgen(js_name = normalizeText)]
pub fn normalize_text(text: &str) -> String {
    normalize(text)
}

/// Calculate Levenshtein edit distance between two strings.
#[wasm_bindgen]
pub fn edit_distance(a: &str, b: &str) -> usize {
    levenshtein_distance(a, b)
}
