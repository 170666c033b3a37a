//! Catalog documents and the mapping from plain records to searchable fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Searchable field of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Product name / title
    Title,
    /// One of the document tags
    Tag,
    /// Document category
    Category,
    /// Free-form body text
    Content,
}

impl Field {
    /// Field name as used in highlights and matched-field lists.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Tag => "tag",
            Field::Category => "category",
            Field::Content => "content",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of the record keys holding each searchable field.
///
/// Lets the engine index any corpus shape: a product catalog keyed by `name`
/// works as well as an article list keyed by `title`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMap {
    /// Key of the title field
    pub title: String,
    /// Key of the content field
    pub content: String,
    /// Key of the id field
    pub id: String,
    /// Key of the tags field (array of strings)
    pub tags: String,
    /// Key of the category field
    pub category: String,
    /// Key of the popularity field (number)
    pub popularity: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            title: "title".to_string(),
            content: "content".to_string(),
            id: "id".to_string(),
            tags: "tags".to_string(),
            category: "category".to_string(),
            popularity: "popularity".to_string(),
        }
    }
}

impl FieldMap {
    /// Use a different key for the title field (e.g. `name` for product catalogs).
    pub fn with_title_field(mut self, key: impl Into<String>) -> Self {
        self.title = key.into();
        self
    }

    /// Use a different key for the content field.
    pub fn with_content_field(mut self, key: impl Into<String>) -> Self {
        self.content = key.into();
        self
    }

    /// Use a different key for the id field.
    pub fn with_id_field(mut self, key: impl Into<String>) -> Self {
        self.id = key.into();
        self
    }
}

/// A document stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique document id
    pub id: String,
    /// Title (product name)
    pub title: String,
    /// Body text
    pub content: String,
    /// Tags
    pub tags: Vec<String>,
    /// Category
    pub category: String,
    /// Popularity used as a ranking bonus
    pub popularity: Option<f64>,
    /// The record this document was built from
    pub original: Value,
}

impl Document {
    /// Creates a document with only an id and a title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            tags: Vec::new(),
            category: String::new(),
            popularity: None,
            original: Value::Null,
        }
    }

    /// Set the content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the popularity.
    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = Some(popularity);
        self
    }

    /// Build a document from a plain JSON record.
    ///
    /// Missing or mistyped fields degrade to empty values. A record without a
    /// usable id gets a generated `doc_<uuid>` id.
    pub fn from_record(record: &Value, field_map: &FieldMap) -> Self {
        let id = record
            .get(&field_map.id)
            .and_then(value_as_text)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(generate_id);

        let tags = match record.get(&field_map.tags) {
            Some(Value::Array(items)) => items.iter().filter_map(value_as_text).collect(),
            Some(value) => value_as_text(value).into_iter().collect(),
            None => Vec::new(),
        };

        Self {
            id,
            title: text_field(record, &field_map.title),
            content: text_field(record, &field_map.content),
            tags,
            category: text_field(record, &field_map.category),
            popularity: record.get(&field_map.popularity).and_then(Value::as_f64),
            original: record.clone(),
        }
    }

    /// All non-empty searchable texts with the field they belong to.
    ///
    /// Ordered title, tags, category, content.
    pub fn field_texts(&self) -> Vec<(Field, &str)> {
        let mut texts = Vec::with_capacity(self.tags.len() + 3);
        texts.push((Field::Title, self.title.as_str()));
        texts.extend(self.tags.iter().map(|tag| (Field::Tag, tag.as_str())));
        texts.push((Field::Category, self.category.as_str()));
        texts.push((Field::Content, self.content.as_str()));
        texts.retain(|(_, text)| !text.trim().is_empty());
        texts
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_field(record: &Value, key: &str) -> String {
    record.get(key).and_then(value_as_text).unwrap_or_default()
}

fn generate_id() -> String {
    format!("doc_{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_record_default_fields() {
        let record = json!({
            "id": 7,
            "title": "Молоко",
            "content": "Пастеризованное",
            "tags": ["молочное", "напиток"],
            "category": "Молочные продукты",
            "popularity": 42
        });
        let doc = Document::from_record(&record, &FieldMap::default());

        assert_eq!(doc.id, "7");
        assert_eq!(doc.title, "Молоко");
        assert_eq!(doc.tags.len(), 2);
        assert_eq!(doc.popularity, Some(42.0));
        assert_eq!(doc.original, record);
    }

    #[test]
    fn test_from_record_custom_title_field() {
        let record = json!({"id": "a1", "name": "Хлеб"});
        let doc = Document::from_record(&record, &FieldMap::default().with_title_field("name"));
        assert_eq!(doc.title, "Хлеб");
        assert_eq!(doc.id, "a1");
    }

    #[test]
    fn test_from_record_missing_fields() {
        let doc = Document::from_record(&json!({"title": ["not", "a", "string"]}), &FieldMap::default());
        assert!(doc.id.starts_with("doc_"));
        assert!(doc.title.is_empty());
        assert!(doc.field_texts().is_empty());
    }

    #[test]
    fn test_from_record_not_an_object() {
        let doc = Document::from_record(&json!(null), &FieldMap::default());
        assert!(doc.id.starts_with("doc_"));
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn test_field_texts_order() {
        let doc = Document::new("1", "Сыр")
            .with_tags(["твердый"])
            .with_category("Сыры")
            .with_content("Выдержанный");
        let fields: Vec<Field> = doc.field_texts().into_iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec![Field::Title, Field::Tag, Field::Category, Field::Content]);
    }
}
