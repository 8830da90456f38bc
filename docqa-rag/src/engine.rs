//! Retrieval engine orchestrating embedding, search and answer assembly.
//!
//! The [`RetrievalEngine`] owns a [`DocumentStore`] and coordinates document
//! indexing (embed every chunk → commit as one batch) and question answering
//! (embed → search → resolve → assemble).
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{EngineConfig, RetrievalEngine};
//!
//! let engine = RetrievalEngine::builder()
//!     .config(EngineConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .answer_assembler(Arc::new(my_llm))
//!     .build()?;
//!
//! engine.index_document("manual", &chunks).await?;
//! let answer = engine.answer_query("How do I reset it?", 3).await?;
//! ```

use std::future::Future;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::config::EngineConfig;
use crate::document::{Answer, ContextChunk, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::AnswerAssembler;
use crate::index::FlatL2Index;
use crate::provenance::ChunkRef;
use crate::store::DocumentStore;

/// Answer returned when retrieval produced no context.
pub const FALLBACK_ANSWER: &str =
    "I couldn't find any relevant information to answer your question.";

/// System instruction handed to the answer assembler with every question.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant that answers questions based on the provided context. \
     Answer only from the context. Be concise and accurate.";

/// Separator placed between chunk texts when building the context.
const CONTEXT_SEPARATOR: &str = "\n\n";

/// Convert a caller-supplied signed context limit into a chunk count.
///
/// # Errors
///
/// Returns [`RagError::InvalidArgument`] if `value` is negative.
pub fn context_limit(value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        RagError::InvalidArgument(format!("max_context_chunks must be >= 0, got {value}"))
    })
}

/// Heuristic confidence from the nearest squared distance: `1 - d / 2`.
///
/// With `clamp` unset the raw value is returned, which is negative for
/// `d > 2`.
pub fn confidence(min_distance: f32, clamp: bool) -> f32 {
    let raw = 1.0 - min_distance / 2.0;
    if clamp { raw.clamp(0.0, 1.0) } else { raw }
}

/// Await `fut`, failing with `elapsed(limit)` if `limit` passes first.
async fn bounded<T>(
    limit: Option<Duration>,
    fut: impl Future<Output = Result<T>>,
    elapsed: impl FnOnce(Duration) -> RagError,
) -> Result<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| elapsed(limit))?,
        None => fut.await,
    }
}

/// The retrieval engine.
///
/// Mutations of the store happen only inside
/// [`index_document`](RetrievalEngine::index_document), under a write lock
/// held just for the commit. Queries take the read lock, so they run in
/// parallel with each other but never observe a half-committed document.
/// Construct one via [`RetrievalEngine::builder()`].
pub struct RetrievalEngine {
    config: EngineConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    answer_assembler: Arc<dyn AnswerAssembler>,
    store: RwLock<DocumentStore>,
}

impl RetrievalEngine {
    /// Create a new [`RetrievalEngineBuilder`].
    pub fn builder() -> RetrievalEngineBuilder {
        RetrievalEngineBuilder::default()
    }

    /// Return a reference to the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The number of indexed chunks across all documents.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Whether no chunk has been indexed yet.
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    /// Whether `doc_id` has been indexed with at least one chunk.
    pub async fn contains_document(&self, doc_id: &str) -> bool {
        self.store.read().await.contains_document(doc_id)
    }

    /// Every index position belonging to `doc_id`, in insertion order.
    pub async fn document_positions(&self, doc_id: &str) -> Vec<usize> {
        self.store.read().await.document_positions(doc_id)
    }

    /// Look up which document chunk an index position belongs to.
    pub async fn resolve(&self, position: usize) -> Option<ChunkRef> {
        self.store.read().await.resolve(position).cloned()
    }

    /// Embed and index one document's chunks.
    ///
    /// An empty `chunks` slice is a no-op that returns `Ok(None)` and does not
    /// register `doc_id`. Otherwise returns the index positions assigned, in
    /// chunk order. Indexing the same `doc_id` twice appends a second set of
    /// entries; nothing is replaced or deduplicated.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if any chunk fails to embed and
    /// [`RagError::DimensionMismatch`] if the provider returns a vector of the
    /// wrong size. In both cases nothing is committed.
    pub async fn index_document(
        &self,
        doc_id: &str,
        chunks: &[String],
    ) -> Result<Option<Range<usize>>> {
        if chunks.is_empty() {
            debug!(doc_id, "skipping document with no chunks");
            return Ok(None);
        }

        let vectors = self.embed_chunks(doc_id, chunks).await?;

        let positions = self
            .store
            .write()
            .await
            .commit(doc_id, chunks, &vectors)
            .inspect_err(|e| error!(doc_id, error = %e, "failed to commit document"))?;

        info!(
            doc_id,
            chunk_count = chunks.len(),
            base_position = positions.start,
            "indexed document"
        );
        Ok(Some(positions))
    }

    /// Embed `question` and return up to `k` nearest chunks, nearest first.
    ///
    /// Sentinel slots from an under-full index are dropped, so the result may
    /// be shorter than `k` or empty.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the question fails to embed.
    pub async fn search(&self, question: &str, k: usize) -> Result<Vec<SearchResult>> {
        let provider = self.embedding_provider.name().to_string();
        let query = bounded(
            self.config.embedding_timeout,
            self.embedding_provider.embed(question),
            |limit| RagError::EmbeddingError {
                provider,
                message: format!("query embedding timed out after {limit:?}"),
            },
        )
        .await
        .inspect_err(|e| error!(error = %e, "embedding failed during query"))?;

        self.store.read().await.search(&query, k)
    }

    /// Answer `question` from at most `max_context_chunks` retrieved chunks.
    ///
    /// The question is always embedded first, even when
    /// `max_context_chunks == 0`. When nothing is retrieved (empty index, zero
    /// chunks requested, or only sentinel slots) the answer is
    /// [`FALLBACK_ANSWER`] with no context and confidence `0.0`, and the
    /// answer assembler is not called.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] or [`RagError::GenerationError`]
    /// if either provider fails. No partial answer is produced.
    pub async fn answer_query(&self, question: &str, max_context_chunks: usize) -> Result<Answer> {
        let results = self.search(question, max_context_chunks).await?;
        if results.is_empty() {
            info!(result_count = 0, "no relevant context found");
            return Ok(Self::fallback());
        }

        let context =
            results.iter().map(|r| r.text.as_str()).collect::<Vec<_>>().join(CONTEXT_SEPARATOR);

        let provider = self.answer_assembler.name().to_string();
        let answer = bounded(
            self.config.generation_timeout,
            self.answer_assembler.complete(SYSTEM_INSTRUCTION, &context, question),
            |limit| RagError::GenerationError {
                provider,
                message: format!("generation timed out after {limit:?}"),
            },
        )
        .await
        .inspect_err(|e| error!(error = %e, "answer generation failed"))?;

        let min_distance = results.iter().map(|r| r.distance).fold(f32::INFINITY, f32::min);
        let confidence = confidence(min_distance, self.config.clamp_confidence);

        info!(result_count = results.len(), min_distance, confidence, "answered question");

        Ok(Answer {
            answer,
            context_used: results.iter().map(ContextChunk::from).collect(),
            confidence,
        })
    }

    /// Answer `question` using the configured default context size.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        self.answer_query(question, self.config.max_context_chunks).await
    }

    fn fallback() -> Answer {
        Answer { answer: FALLBACK_ANSWER.to_string(), context_used: Vec::new(), confidence: 0.0 }
    }

    async fn embed_chunks(&self, doc_id: &str, chunks: &[String]) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let provider = self.embedding_provider.name().to_string();

        debug!(doc_id, batch_size = texts.len(), provider = %provider, "embedding chunks");

        let vectors = bounded(
            self.config.embedding_timeout,
            self.embedding_provider.embed_batch(&texts),
            |limit| RagError::EmbeddingError {
                provider: provider.clone(),
                message: format!("embedding timed out after {limit:?}"),
            },
        )
        .await
        .inspect_err(|e| error!(doc_id, error = %e, "embedding failed during indexing"))?;

        if vectors.len() != chunks.len() {
            error!(doc_id, expected = chunks.len(), got = vectors.len(), "embedding count mismatch");
            return Err(RagError::EmbeddingError {
                provider,
                message: format!(
                    "expected {} embeddings for document '{doc_id}', got {}",
                    chunks.len(),
                    vectors.len()
                ),
            });
        }
        Ok(vectors)
    }
}

impl std::fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("config", &self.config)
            .field("embedding_provider", &self.embedding_provider.name())
            .field("answer_assembler", &self.answer_assembler.name())
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`RetrievalEngine`].
///
/// The embedding provider and answer assembler are required. Without an
/// explicit [`store`](RetrievalEngineBuilder::store), an empty
/// [`FlatL2Index`] sized to the provider's dimensions is created.
///
/// # Example
///
/// ```rust,ignore
/// let engine = RetrievalEngine::builder()
///     .embedding_provider(Arc::new(embedder))
///     .answer_assembler(Arc::new(assembler))
///     .store(DocumentStore::new(FlatL2Index::new(1536)?)?)  // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct RetrievalEngineBuilder {
    config: Option<EngineConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    answer_assembler: Option<Arc<dyn AnswerAssembler>>,
    store: Option<DocumentStore>,
}

impl RetrievalEngineBuilder {
    /// Set the engine configuration. Defaults to [`EngineConfig::default()`].
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the answer assembler.
    pub fn answer_assembler(mut self, assembler: Arc<dyn AnswerAssembler>) -> Self {
        self.answer_assembler = Some(assembler);
        self
    }

    /// Use an explicit, empty document store.
    pub fn store(mut self, store: DocumentStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the [`RetrievalEngine`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or the
    /// store's dimension differs from the provider's.
    pub fn build(self) -> Result<RetrievalEngine> {
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let answer_assembler = self
            .answer_assembler
            .ok_or_else(|| RagError::ConfigError("answer_assembler is required".to_string()))?;

        let dimensions = embedding_provider.dimensions();
        let store = match self.store {
            Some(store) => store,
            None => DocumentStore::new(FlatL2Index::new(dimensions)?)?,
        };
        if store.dimension() != dimensions {
            return Err(RagError::ConfigError(format!(
                "store dimension ({}) does not match embedding provider dimension ({dimensions})",
                store.dimension()
            )));
        }

        Ok(RetrievalEngine {
            config: self.config.unwrap_or_default(),
            embedding_provider,
            answer_assembler,
            store: RwLock::new(store),
        })
    }
}
