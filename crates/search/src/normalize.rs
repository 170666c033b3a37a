//! Text normalization, phonetic folding and tokenization.
//!
//! Everything in this module is pure: the same input always produces the same
//! output and no state is shared between calls.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Zero-width characters and soft hyphens that survive copy/paste from product pages.
const INVISIBLE_CHARS: &[char] = &[
    '\u{200B}', // zero width space
    '\u{200C}', // zero width non-joiner
    '\u{200D}', // zero width joiner
    '\u{2060}', // word joiner
    '\u{FEFF}', // byte order mark
    '\u{00AD}', // soft hyphen
];

/// Default stop words (Russian and English function words).
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "и", "в", "на", "с", "по", "для", "от", "до", "из", "к", "о", "у", "за", "под", "над", "при",
    "без", "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from",
];

/// A single ordered substitution applied during phonetic folding.
struct PhoneticRule {
    pattern: Regex,
    replacement: &'static str,
}

/// Phonetic rules for Russian. Applied in order; later rules see the output of earlier ones.
static PHONETIC_RULES: Lazy<Vec<PhoneticRule>> = Lazy::new(|| {
    [
        ("[её]", "е"),
        ("[ьъ]", ""),
        ("ц", "тс"),
        ("щ", "ш"),
        ("ч", "ш"),
        ("жш", "ш"),
        ("[бп]", "п"),
        ("[дт]", "т"),
        ("[гк]", "к"),
        ("[вф]", "ф"),
        ("[зс]", "с"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| PhoneticRule {
        pattern: Regex::new(pattern).expect("phonetic rule pattern is valid"),
        replacement,
    })
    .collect()
});

fn unify_punctuation(c: char) -> char {
    match c {
        '\u{060C}' | '\u{3001}' | '\u{FF0C}' => ',', // arabic, ideographic, fullwidth comma
        '\u{061B}' => ';',
        '\u{00B7}' | '\u{2027}' | '\u{30FB}' => '.', // middle dots
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' | '\u{2212}' => '-',
        _ => c,
    }
}

/// Normalize text for matching.
///
/// Lowercases, strips invisible characters, unifies punctuation variants and
/// collapses whitespace runs (NBSP-class spaces included) into single spaces.
///
/// # Example
/// ```
/// use foodshare_search::normalize;
///
/// assert_eq!(normalize("  Молоко\u{00A0}\u{00A0}3,2 %\u{200B} "), "молоко 3,2 %");
/// assert_eq!(normalize("Хлеб — ржаной"), "хлеб - ржаной");
/// ```
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !INVISIBLE_CHARS.contains(c))
        .map(unify_punctuation)
        .flat_map(char::to_lowercase)
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fold text so that near-homophones produce the same string.
///
/// The text is normalized first, then every phonetic rule is applied in order.
pub fn phonetic_fold(text: &str) -> String {
    PHONETIC_RULES.iter().fold(normalize(text), |acc, rule| {
        rule.pattern.replace_all(&acc, rule.replacement).into_owned()
    })
}

/// Number of phonetic rules applied by [`phonetic_fold`].
pub fn phonetic_rule_count() -> usize {
    PHONETIC_RULES.len()
}

/// Splits text into normalized index terms.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    min_word_length: usize,
    stop_words: HashSet<String>,
}

impl Tokenizer {
    /// Create a tokenizer with the default stop words.
    pub fn new(min_word_length: usize) -> Self {
        Self {
            min_word_length,
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| (*w).to_string()).collect(),
        }
    }

    /// Add extra stop words (normalized before insertion).
    pub fn add_stop_words<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stop_words
            .extend(words.into_iter().map(|w| normalize(w.as_ref())).filter(|w| !w.is_empty()));
    }

    /// Minimum token length in characters.
    pub fn min_word_length(&self) -> usize {
        self.min_word_length
    }

    /// Returns true if the (already normalized) word is a stop word.
    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Number of configured stop words.
    pub fn stop_word_count(&self) -> usize {
        self.stop_words.len()
    }

    /// Normalize and split text into terms, dropping short words and stop words.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        normalize(text)
            .unicode_words()
            .filter(|word| word.chars().count() >= self.min_word_length && !self.is_stop_word(word))
            .map(String::from)
            .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_collapses() {
        assert_eq!(normalize("  Сыр   Российский\t\n"), "сыр российский");
    }

    #[test]
    fn test_normalize_strips_invisible() {
        assert_eq!(normalize("мо\u{200B}локо\u{FEFF}"), "молоко");
        assert_eq!(normalize("хлеб\u{00A0}белый"), "хлеб белый");
    }

    #[test]
    fn test_normalize_unifies_punctuation() {
        assert_eq!(normalize("a\u{060C}b"), "a,b");
        assert_eq!(normalize("a\u{00B7}b"), "a.b");
        assert_eq!(normalize("a\u{2013}b\u{2014}c"), "a-b-c");
    }

    #[test]
    fn test_phonetic_fold_merges_pairs() {
        assert_eq!(phonetic_fold("код"), phonetic_fold("кот"));
        assert_eq!(phonetic_fold("ёлка"), "елка");
        assert_eq!(phonetic_fold("Соль"), "сол");
    }

    #[test]
    fn test_phonetic_fold_rule_order() {
        // ц expands to тс before д/т merge, so both spellings converge
        assert_eq!(phonetic_fold("цепь"), "тсеп");
        assert_eq!(phonetic_fold("тсепь"), "тсеп");
        // щ and ч both collapse to ш
        assert_eq!(phonetic_fold("щи"), phonetic_fold("чи"));
    }

    #[test]
    fn test_phonetic_fold_identity_for_plain_words() {
        assert_eq!(phonetic_fold("молки"), normalize("молки"));
    }

    #[test]
    fn test_tokenize_drops_stop_words_and_short() {
        let tokenizer = Tokenizer::new(2);
        let tokens = tokenizer.tokenize("Хлеб и масло для бутерброда, a b");
        assert_eq!(tokens, vec!["хлеб", "масло", "бутерброда"]);
    }

    #[test]
    fn test_tokenize_custom_stop_words() {
        let mut tokenizer = Tokenizer::new(3);
        tokenizer.add_stop_words(["Свежий"]);
        assert!(tokenizer.is_stop_word("свежий"));
        assert_eq!(tokenizer.tokenize("свежий сок"), vec!["сок"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(Tokenizer::default().tokenize("").is_empty());
        assert!(Tokenizer::default().tokenize("  ,,, ").is_empty());
    }
}
