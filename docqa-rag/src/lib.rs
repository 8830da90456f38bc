//! # docqa-rag
//!
//! Retrieval core for answering questions about uploaded documents.
//!
//! Document chunks are embedded through an [`EmbeddingProvider`], stored in an
//! append-only [`VectorIndex`] and traced back to their document through a
//! [`ProvenanceMap`]. At query time the [`RetrievalEngine`] finds the nearest
//! chunks by squared Euclidean distance and hands them, nearest first, to an
//! [`AnswerAssembler`].
//!
//! All state is in memory and lives as long as the engine.
//!
//! ## Features
//!
//! - `openai`: [`openai::OpenAIEmbeddingProvider`] and
//!   [`openai::OpenAIAnswerAssembler`] over the OpenAI HTTP API.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod generation;
pub mod index;
pub mod provenance;
pub mod store;

#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{Chunker, SentenceChunker};
pub use config::{EngineConfig, EngineConfigBuilder};
pub use document::{Answer, ContextChunk, SearchResult};
pub use embedding::EmbeddingProvider;
pub use engine::{
    FALLBACK_ANSWER, RetrievalEngine, RetrievalEngineBuilder, SYSTEM_INSTRUCTION, confidence,
    context_limit,
};
pub use error::{RagError, Result};
pub use generation::AnswerAssembler;
pub use index::{FlatL2Index, Neighbor, VectorIndex};
pub use provenance::{ChunkRef, ProvenanceMap};
pub use store::DocumentStore;
