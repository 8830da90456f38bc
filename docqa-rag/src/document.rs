//! Data types for retrieval results and answers.

use serde::{Deserialize, Serialize};

/// A retrieved chunk with its provenance and distance to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The document the chunk belongs to.
    pub doc_id: String,
    /// Position of the chunk within its document.
    pub chunk_index: usize,
    /// Position of the chunk's vector in the index.
    pub position: usize,
    /// The chunk text.
    pub text: String,
    /// Squared L2 distance to the query (lower is more relevant).
    pub distance: f32,
}

/// A chunk that was handed to the answer assembler as context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextChunk {
    /// The chunk text.
    pub text: String,
    /// The document the chunk belongs to.
    pub doc_id: String,
}

impl From<&SearchResult> for ContextChunk {
    fn from(result: &SearchResult) -> Self {
        Self { text: result.text.clone(), doc_id: result.doc_id.clone() }
    }
}

/// The outcome of a question: the answer text, the context it was grounded
/// in, and a heuristic confidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// Free-text answer, or the fallback when nothing relevant was found.
    pub answer: String,
    /// Context chunks in ranked order, nearest first.
    pub context_used: Vec<ContextChunk>,
    /// `1 - min_distance / 2`. Not a probability; see [`EngineConfig`](crate::EngineConfig).
    pub confidence: f32,
}

impl Answer {
    /// Whether the answer was produced without any retrieved context.
    pub fn has_context(&self) -> bool {
        !self.context_used.is_empty()
    }
}
