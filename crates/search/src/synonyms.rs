//! Bidirectional synonym lookup.

use crate::normalize::normalize;
use std::collections::BTreeMap;

/// Built-in synonym groups for common grocery terms: canonical term to variants.
pub const DEFAULT_SYNONYMS: &[(&str, &[&str])] = &[
    ("хлеб", &["батон", "буханка", "булка", "багет"]),
    ("молоко", &["молочко", "молочный"]),
    ("мясо", &["мясной", "мясные"]),
    ("курица", &["куриный", "цыпленок", "птица"]),
    ("говядина", &["говяжий", "телятина"]),
    ("свинина", &["свиной", "поросенок"]),
    ("картофель", &["картошка", "картофельный"]),
    ("помидор", &["томат", "томатный"]),
    ("масло", &["маслице", "сливочное"]),
];

/// Static table of synonym groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynonymTable {
    groups: BTreeMap<String, Vec<String>>,
}

impl SynonymTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table seeded with [`DEFAULT_SYNONYMS`].
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for (canonical, variants) in DEFAULT_SYNONYMS {
            table.add_group(canonical, variants.iter().copied());
        }
        table
    }

    /// Add (or extend) a synonym group. Terms are normalized on insert.
    pub fn add_group<I, S>(&mut self, canonical: &str, variants: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let canonical = normalize(canonical);
        if canonical.is_empty() {
            return;
        }

        let group = self.groups.entry(canonical.clone()).or_default();
        for variant in variants {
            let variant = normalize(variant.as_ref());
            if !variant.is_empty() && variant != canonical && !group.contains(&variant) {
                group.push(variant);
            }
        }
    }

    /// Synonyms of `term`, deduplicated, never containing `term` itself.
    ///
    /// A canonical term resolves to its variants; a variant resolves to its
    /// canonical term followed by the other variants of the group.
    pub fn resolve(&self, term: &str) -> Vec<String> {
        let term = normalize(term);
        let mut resolved: Vec<String> = Vec::new();
        let mut push = |candidate: &String| {
            if *candidate != term && !resolved.contains(candidate) {
                resolved.push(candidate.clone());
            }
        };

        if let Some(variants) = self.groups.get(&term) {
            variants.iter().for_each(&mut push);
        }

        for (canonical, variants) in &self.groups {
            if variants.contains(&term) {
                push(canonical);
                variants.iter().for_each(&mut push);
            }
        }

        resolved
    }

    /// Number of synonym groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
