//! Mapping between index positions and the document chunks they came from.

use std::collections::HashMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// The identity of one chunk: its document and its position in that document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkRef {
    /// The caller-supplied document identifier.
    pub doc_id: String,
    /// Zero-based position of the chunk within the document.
    pub chunk_index: usize,
}

/// Bidirectional map from index position to [`ChunkRef`] and from document
/// to its positions.
///
/// Entries are only ever added. Re-indexing a document appends a new run of
/// positions instead of replacing the old one.
#[derive(Debug, Clone, Default)]
pub struct ProvenanceMap {
    by_position: HashMap<usize, ChunkRef>,
    by_document: HashMap<String, Vec<usize>>,
}

impl ProvenanceMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `position` as chunk `chunk_index` of `doc_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DuplicatePosition`] if `position` already has an
    /// entry. That can only happen through a bookkeeping bug.
    pub fn record(&mut self, position: usize, doc_id: &str, chunk_index: usize) -> Result<()> {
        if self.by_position.contains_key(&position) {
            return Err(RagError::DuplicatePosition(position));
        }
        self.by_position.insert(position, ChunkRef { doc_id: doc_id.to_string(), chunk_index });
        self.by_document.entry(doc_id.to_string()).or_default().push(position);
        Ok(())
    }

    /// Check that no position in `positions` is taken, without recording anything.
    pub fn ensure_vacant(&self, positions: Range<usize>) -> Result<()> {
        match positions.into_iter().find(|p| self.by_position.contains_key(p)) {
            Some(taken) => Err(RagError::DuplicatePosition(taken)),
            None => Ok(()),
        }
    }

    /// Look up the chunk stored at `position`.
    ///
    /// `None` is an ordinary outcome: sentinel slots and positions from a
    /// different index resolve to nothing.
    pub fn resolve(&self, position: usize) -> Option<&ChunkRef> {
        self.by_position.get(&position)
    }

    /// Every position recorded for `doc_id`, in insertion order.
    pub fn positions_for(&self, doc_id: &str) -> &[usize] {
        self.by_document.get(doc_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether any chunk of `doc_id` has been recorded.
    pub fn contains_document(&self, doc_id: &str) -> bool {
        self.by_document.contains_key(doc_id)
    }

    /// The number of recorded positions.
    pub fn len(&self) -> usize {
        self.by_position.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.by_position.is_empty()
    }
}
