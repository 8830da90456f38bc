//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::error::Result;

/// A provider that generates fixed-length vector embeddings from text input.
///
/// Implementations wrap a specific embedding backend (OpenAI, a local model,
/// a test double) behind a unified async interface. Every vector returned by
/// one provider must have [`dimensions`](EmbeddingProvider::dimensions)
/// components; the store rejects anything else with
/// [`RagError::DimensionMismatch`](crate::RagError::DimensionMismatch).
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation issues one [`embed`](EmbeddingProvider::embed)
    /// call per input concurrently and joins them, failing as soon as any call
    /// fails. Output order always matches input order. Override this method if
    /// the backend supports native batch embedding.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        try_join_all(texts.iter().map(|text| self.embed(text))).await
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// A short name used in logs and error messages.
    fn name(&self) -> &str {
        "embedding"
    }
}
