use thiserror::Error;

/// Result type for chunker operations
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors that can occur during code chunking
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// No extractor for the language and no fallback configured
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Extractor produced overlapping or out-of-range spans
    #[error("Malformed boundaries: start={start}, end={end}")]
    MalformedBoundaries { start: usize, end: usize },

    /// Chunk policy is inconsistent or forbids the required overflow handling
    #[error("Policy violation: {0}")]
    PolicyViolation(String),

    /// Tree-sitter grammar could not be loaded or the source could not be parsed
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Chunk records could not be serialized
    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),
}

impl ChunkerError {
    /// Create an unsupported language error
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    /// Create a policy violation error
    pub fn policy(msg: impl Into<String>) -> Self {
        Self::PolicyViolation(msg.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }

    /// Whether the error means the caller misconfigured the chunker
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedLanguage(_) | Self::PolicyViolation(_)
        )
    }
}
