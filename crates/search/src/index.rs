//! Inverted index: normalized term to per-document occurrence metadata.

use crate::document::{Document, Field, FieldMap};
use crate::normalize::{normalize, Tokenizer};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;
use std::time::Instant;

/// Terms shorter than this are left out of the typo-correction vocabulary.
pub const MIN_VOCABULARY_TERM_LENGTH: usize = 3;

/// Where a term occurs inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TermPosition {
    /// Field the term occurs in
    pub field: Field,
    /// Token index within that field's text
    pub position: usize,
}

/// Occurrences of one term in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Posting {
    /// Number of occurrences across all fields
    pub count: usize,
    /// Fields the term occurs in
    pub fields: BTreeSet<Field>,
    /// Every occurrence, in indexing order
    pub positions: Vec<TermPosition>,
}

/// Summary of a full index build.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    /// Documents stored after the build
    pub documents_indexed: usize,
    /// Unique terms
    pub terms: usize,
    /// Tokens indexed
    pub total_words: usize,
    /// Build time in milliseconds
    pub index_time_ms: f64,
}

/// In-memory inverted index plus the document store.
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    tokenizer: Tokenizer,
    postings: BTreeMap<String, HashMap<String, Posting>>,
    documents: HashMap<String, Document>,
    order: Vec<String>,
    total_words: usize,
}

impl InvertedIndex {
    /// Create an empty index using the given tokenizer.
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            ..Default::default()
        }
    }

    /// The tokenizer applied to indexed text.
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Mutable tokenizer access; changes apply to documents indexed afterwards.
    pub fn tokenizer_mut(&mut self) -> &mut Tokenizer {
        &mut self.tokenizer
    }

    /// Replace the whole index with the given corpus.
    ///
    /// Existing postings and documents are cleared first, so documents missing
    /// from the new corpus cannot leak into results. Records sharing an id
    /// collapse to the last one.
    pub fn index_data(&mut self, records: &[Value], field_map: &FieldMap) -> IndexReport {
        let started = Instant::now();
        self.clear();

        let documents: Vec<Document> = records
            .iter()
            .map(|record| Document::from_record(record, field_map))
            .collect();

        // Map phase runs in parallel; merging into shared posting lists stays serial.
        #[cfg(feature = "parallel")]
        let analyzed: Vec<(Document, HashMap<String, Posting>)> = {
            use rayon::prelude::*;
            documents
                .into_par_iter()
                .map(|doc| {
                    let postings = self.analyze(&doc);
                    (doc, postings)
                })
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let analyzed: Vec<(Document, HashMap<String, Posting>)> = documents
            .into_iter()
            .map(|doc| {
                let postings = self.analyze(&doc);
                (doc, postings)
            })
            .collect();

        for (doc, postings) in analyzed {
            self.merge(doc, postings);
        }

        IndexReport {
            documents_indexed: self.documents.len(),
            terms: self.postings.len(),
            total_words: self.total_words,
            index_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        }
    }

    /// Add a document built from a plain record. Returns the document id.
    pub fn add_record(&mut self, record: &Value, field_map: &FieldMap) -> String {
        self.add_document(Document::from_record(record, field_map))
    }

    /// Add a document. A document with the same id is replaced. Returns the id.
    pub fn add_document(&mut self, doc: Document) -> String {
        let postings = self.analyze(&doc);
        let id = doc.id.clone();
        self.merge(doc, postings);
        id
    }

    /// Remove a document and every posting referencing it.
    ///
    /// Returns false if the id was not indexed.
    pub fn remove_document(&mut self, id: &str) -> bool {
        if self.documents.remove(id).is_none() {
            return false;
        }
        self.order.retain(|doc_id| doc_id != id);

        let mut removed_words = 0;
        self.postings.retain(|_, docs| {
            if let Some(posting) = docs.remove(id) {
                removed_words += posting.count;
            }
            !docs.is_empty()
        });
        self.total_words = self.total_words.saturating_sub(removed_words);

        true
    }

    /// Drop every document and posting.
    pub fn clear(&mut self) {
        self.postings.clear();
        self.documents.clear();
        self.order.clear();
        self.total_words = 0;
    }

    /// Posting list for a normalized term.
    pub fn posting(&self, term: &str) -> Option<&HashMap<String, Posting>> {
        self.postings.get(term)
    }

    /// Total occurrences of a term across the corpus.
    pub fn term_frequency(&self, term: &str) -> usize {
        self.postings
            .get(term)
            .map(|docs| docs.values().map(|p| p.count).sum())
            .unwrap_or(0)
    }

    /// All indexed terms in lexicographic order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    /// Indexed terms starting with `prefix`, in lexicographic order.
    pub fn terms_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.postings
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(term, _)| term.as_str())
            .take_while(move |term| term.starts_with(prefix))
    }

    /// Returns true if any posting list still references the id.
    pub fn contains_posting_for(&self, id: &str) -> bool {
        self.postings.values().any(|docs| docs.contains_key(id))
    }

    /// Look up a stored document.
    pub fn document(&self, id: &str) -> Option<&Document> {
        self.documents.get(id)
    }

    /// Stored documents in insertion order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.order.iter().filter_map(|id| self.documents.get(id))
    }

    /// Vocabulary for typo correction.
    ///
    /// Every indexed term of at least [`MIN_VOCABULARY_TERM_LENGTH`] chars plus
    /// every full normalized title, so multi-word names can be corrected as a whole.
    pub fn vocabulary(&self) -> Vec<String> {
        let mut vocabulary: BTreeSet<String> = self
            .postings
            .keys()
            .filter(|term| term.chars().count() >= MIN_VOCABULARY_TERM_LENGTH)
            .cloned()
            .collect();

        vocabulary.extend(
            self.documents()
                .map(|doc| normalize(&doc.title))
                .filter(|title| !title.is_empty()),
        );

        vocabulary.into_iter().collect()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if no documents are stored.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of unique terms.
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// Number of indexed tokens.
    pub fn total_words(&self) -> usize {
        self.total_words
    }

    fn analyze(&self, doc: &Document) -> HashMap<String, Posting> {
        let mut postings: HashMap<String, Posting> = HashMap::new();

        for (field, text) in doc.field_texts() {
            for (position, term) in self.tokenizer.tokenize(text).into_iter().enumerate() {
                let posting = postings.entry(term).or_default();
                posting.count += 1;
                posting.fields.insert(field);
                posting.positions.push(TermPosition { field, position });
            }
        }

        postings
    }

    fn merge(&mut self, doc: Document, postings: HashMap<String, Posting>) {
        self.remove_document(&doc.id);

        for (term, posting) in postings {
            self.total_words += posting.count;
            self.postings
                .entry(term)
                .or_default()
                .insert(doc.id.clone(), posting);
        }

        self.order.push(doc.id.clone());
        self.documents.insert(doc.id.clone(), doc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn sample_index() -> InvertedIndex {
        let mut index = InvertedIndex::new(Tokenizer::new(2));
        index.add_document(
            Document::new("1", "Молоко коровье")
                .with_content("Свежее молоко с фермы")
                .with_tags(["молочное"])
                .with_category("Молочные продукты"),
        );
        index.add_document(Document::new("2", "Мороженое пломбир"));
        index
    }

    #[test]
    fn test_add_document_records_postings() {
        let index = sample_index();
        let posting = &index.posting("молоко").unwrap()["1"];

        assert_eq!(posting.count, 2);
        assert!(posting.fields.contains(&Field::Title));
        assert!(posting.fields.contains(&Field::Content));
        assert_eq!(
            posting.positions,
            vec![
                TermPosition { field: Field::Title, position: 0 },
                TermPosition { field: Field::Content, position: 1 },
            ]
        );
        assert_eq!(index.term_frequency("молоко"), 2);
    }

    #[test]
    fn test_stop_words_not_indexed() {
        let index = sample_index();
        assert!(index.posting("с").is_none());
    }

    #[test]
    fn test_readding_does_not_double_count() {
        let mut index = sample_index();
        let words_before = index.total_words();

        index.add_document(Document::new("2", "Мороженое пломбир"));

        assert_eq!(index.len(), 2);
        assert_eq!(index.posting("пломбир").unwrap()["2"].count, 1);
        assert_eq!(index.total_words(), words_before);
    }

    #[test]
    fn test_remove_document_drops_postings() {
        let mut index = sample_index();

        assert!(index.remove_document("2"));
        assert!(!index.contains_posting_for("2"));
        assert!(index.posting("пломбир").is_none());
        assert!(index.document("2").is_none());
        assert!(!index.remove_document("2"));
    }

    #[test]
    fn test_index_data_replaces() {
        let mut index = sample_index();
        let report = index.index_data(&[json!({"id": 3, "title": "Хлеб ржаной"})], &FieldMap::default());

        assert_eq!(report.documents_indexed, 1);
        assert!(index.document("1").is_none());
        assert!(index.posting("молоко").is_none());
        assert!(index.posting("хлеб").is_some());
    }

    #[test]
    fn test_missing_fields_contribute_nothing() {
        let mut index = InvertedIndex::default();
        let id = index.add_record(&json!({"id": 5, "price": 10}), &FieldMap::default());

        assert_eq!(id, "5");
        assert_eq!(index.term_count(), 0);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_terms_with_prefix() {
        let index = sample_index();
        let terms: Vec<&str> = index.terms_with_prefix("мо").collect();
        assert_eq!(terms, vec!["молоко", "молочное", "молочные", "мороженое"]);
    }

    #[test]
    fn test_vocabulary_includes_full_titles() {
        let index = sample_index();
        let vocabulary = index.vocabulary();
        assert!(vocabulary.contains(&"молоко коровье".to_string()));
        assert!(vocabulary.contains(&"пломбир".to_string()));
    }

    #[test]
    fn test_documents_in_insertion_order() {
        let index = sample_index();
        let ids: Vec<&str> = index.documents().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    proptest! {
        #[test]
        fn prop_removed_documents_leave_no_postings(
            titles in proptest::collection::vec("[а-я]{2,8}( [а-я]{2,8}){0,3}", 1..12),
            remove_mask in proptest::collection::vec(any::<bool>(), 12),
        ) {
            let mut index = InvertedIndex::default();
            for (i, title) in titles.iter().enumerate() {
                index.add_document(Document::new(i.to_string(), title.clone()));
            }

            for (i, _) in titles.iter().enumerate().filter(|(i, _)| remove_mask[*i]) {
                index.remove_document(&i.to_string());
                prop_assert!(!index.contains_posting_for(&i.to_string()));
            }

            for id in (0..titles.len()).map(|i| i.to_string()) {
                if index.document(&id).is_none() {
                    prop_assert!(!index.contains_posting_for(&id));
                }
            }
        }
    }
}
