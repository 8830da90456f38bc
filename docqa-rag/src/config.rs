//! Configuration for the retrieval engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the [`RetrievalEngine`](crate::RetrievalEngine).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Number of chunks retrieved as context when the caller does not say.
    pub max_context_chunks: usize,
    /// Upper bound on one embedding batch or query embedding. `None` waits forever.
    pub embedding_timeout: Option<Duration>,
    /// Upper bound on one answer generation. `None` waits forever.
    pub generation_timeout: Option<Duration>,
    /// Clamp confidence into `[0.0, 1.0]`.
    ///
    /// Off by default: `1 - d / 2` goes negative once the nearest squared
    /// distance exceeds 2, and that raw value is reported unchanged.
    pub clamp_confidence: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_context_chunks: 3,
            embedding_timeout: None,
            generation_timeout: None,
            clamp_confidence: false,
        }
    }
}

impl EngineConfig {
    /// Create a new builder for constructing an [`EngineConfig`].
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the default number of context chunks per question.
    pub fn max_context_chunks(mut self, k: usize) -> Self {
        self.config.max_context_chunks = k;
        self
    }

    /// Bound every embedding call by `timeout`.
    pub fn embedding_timeout(mut self, timeout: Duration) -> Self {
        self.config.embedding_timeout = Some(timeout);
        self
    }

    /// Bound every generation call by `timeout`.
    pub fn generation_timeout(mut self, timeout: Duration) -> Self {
        self.config.generation_timeout = Some(timeout);
        self
    }

    /// Clamp reported confidence into `[0.0, 1.0]`.
    pub fn clamp_confidence(mut self, clamp: bool) -> Self {
        self.config.clamp_confidence = clamp;
        self
    }

    /// Build the [`EngineConfig`], validating that parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if either timeout is zero.
    pub fn build(self) -> Result<EngineConfig> {
        if self.config.embedding_timeout == Some(Duration::ZERO) {
            return Err(RagError::ConfigError("embedding_timeout must be non-zero".to_string()));
        }
        if self.config.generation_timeout == Some(Duration::ZERO) {
            return Err(RagError::ConfigError("generation_timeout must be non-zero".to_string()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.max_context_chunks, 3);
        assert!(config.embedding_timeout.is_none());
        assert!(!config.clamp_confidence);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = EngineConfig::builder().generation_timeout(Duration::ZERO).build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
    }

    #[test]
    fn builder_sets_fields() {
        let config = EngineConfig::builder()
            .max_context_chunks(5)
            .embedding_timeout(Duration::from_secs(2))
            .clamp_confidence(true)
            .build()
            .unwrap();
        assert_eq!(config.max_context_chunks, 5);
        assert_eq!(config.embedding_timeout, Some(Duration::from_secs(2)));
        assert!(config.clamp_confidence);
    }
}
