//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors that can occur while indexing documents or answering questions.
#[derive(Debug, Error)]
pub enum RagError {
    /// Malformed caller input, such as a negative context limit.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The embedding provider failed (network, auth, quota or timeout).
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The generative model behind the answer assembler failed.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The answer assembler that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector did not have the dimensionality fixed for the index.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimensionality the index was created with.
        expected: usize,
        /// The dimensionality of the offending vector.
        actual: usize,
    },

    /// A provenance entry already exists for this index position.
    #[error("Duplicate provenance entry for position {0}")]
    DuplicatePosition(usize),

    /// No document with this identifier has been indexed.
    #[error("Document not found: {0}")]
    UnknownDocument(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    /// Whether this error describes a lookup that found nothing, as opposed
    /// to a failure of the system itself.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RagError::UnknownDocument(_))
    }

    /// Whether this error was caused by the caller's input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, RagError::InvalidArgument(_))
    }
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
