//! The document store owned by a retrieval engine.

use std::ops::Range;

use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;
use crate::provenance::{ChunkRef, ProvenanceMap};

/// All indexed state for one engine: vectors, provenance and chunk texts.
///
/// Index position `p` always has a provenance entry and a text at
/// `texts[p]`. [`commit`](DocumentStore::commit) is the only mutation and
/// leaves the store unchanged when it fails.
pub struct DocumentStore {
    index: Box<dyn VectorIndex>,
    provenance: ProvenanceMap,
    texts: Vec<String>,
}

impl DocumentStore {
    /// Create a store around an empty vector index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `index` already holds vectors,
    /// since those would have no provenance.
    pub fn new(index: impl VectorIndex + 'static) -> Result<Self> {
        if !index.is_empty() {
            return Err(RagError::ConfigError(format!(
                "document store requires an empty index, got {} vectors",
                index.len()
            )));
        }
        Ok(Self { index: Box::new(index), provenance: ProvenanceMap::new(), texts: Vec::new() })
    }

    /// The dimensionality of the underlying index.
    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    /// The number of indexed chunks across all documents.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether nothing has been indexed.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether `doc_id` has at least one indexed chunk.
    pub fn contains_document(&self, doc_id: &str) -> bool {
        self.provenance.contains_document(doc_id)
    }

    /// Every index position belonging to `doc_id`, in insertion order.
    pub fn document_positions(&self, doc_id: &str) -> Vec<usize> {
        self.provenance.positions_for(doc_id).to_vec()
    }

    /// Look up the provenance of an index position.
    pub fn resolve(&self, position: usize) -> Option<&ChunkRef> {
        self.provenance.resolve(position)
    }

    /// Insert one document's chunks and their vectors as a single batch.
    ///
    /// Returns the range of positions assigned, in chunk order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `chunks` and `vectors` differ
    /// in length, [`RagError::DimensionMismatch`] if any vector has the wrong
    /// dimensionality, or [`RagError::DuplicatePosition`] if the provenance
    /// map already claims a position the index is about to assign.
    pub fn commit(
        &mut self,
        doc_id: &str,
        chunks: &[String],
        vectors: &[Vec<f32>],
    ) -> Result<Range<usize>> {
        if chunks.len() != vectors.len() {
            return Err(RagError::InvalidArgument(format!(
                "{} chunks but {} vectors for document '{doc_id}'",
                chunks.len(),
                vectors.len()
            )));
        }

        let start = self.index.len();
        let positions = start..start + chunks.len();
        self.provenance.ensure_vacant(positions.clone())?;

        let base = self.index.insert(vectors)?;
        debug_assert_eq!(base, start);
        for (chunk_index, position) in positions.clone().enumerate() {
            self.provenance.record(position, doc_id, chunk_index)?;
        }
        self.texts.extend(chunks.iter().cloned());

        Ok(positions)
    }

    /// Find the `k` nearest chunks to `query`, dropping sentinel slots.
    ///
    /// `k` may be arbitrarily large; the index is never asked for more slots
    /// than it holds vectors.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let neighbors = self.index.search(query, k.min(self.index.len()))?;
        Ok(neighbors
            .into_iter()
            .filter_map(|neighbor| {
                let position = neighbor.position?;
                let chunk = self.provenance.resolve(position)?;
                let text = self.texts.get(position)?;
                Some(SearchResult {
                    doc_id: chunk.doc_id.clone(),
                    chunk_index: chunk.chunk_index,
                    position,
                    text: text.clone(),
                    distance: neighbor.distance,
                })
            })
            .collect())
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("dimension", &self.index.dimension())
            .field("len", &self.index.len())
            .field("provenance_entries", &self.provenance.len())
            .finish()
    }
}
