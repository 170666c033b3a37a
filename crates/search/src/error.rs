//! Error types for the search crate.

use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A search was attempted before any successful index build.
    #[error("Search engine is not ready: index data before searching")]
    IndexNotReady,

    /// Configuration values out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Corpus JSON could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SearchError {
    /// Returns true if the error signals a caller lifecycle bug rather than bad input.
    pub fn is_lifecycle_error(&self) -> bool {
        matches!(self, SearchError::IndexNotReady)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_message() {
        let err = SearchError::IndexNotReady;
        assert!(err.to_string().contains("not ready"));
        assert!(err.is_lifecycle_error());
    }

    #[test]
    fn test_config_error_from_toml() {
        let parse = toml::from_str::<toml::Value>("min_word_length = ").unwrap_err();
        let err: SearchError = parse.into();
        assert!(matches!(err, SearchError::Config(_)));
        assert!(!err.is_lifecycle_error());
    }
}
