//! Append-only vector index with exact nearest-neighbour search.
//!
//! This module provides the [`VectorIndex`] trait and [`FlatL2Index`], an
//! exhaustive squared-Euclidean index over a contiguous `Vec<f32>`. Positions
//! are assigned densely from zero in insertion order and are never reused.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// One slot of a k-nearest-neighbour result.
///
/// A search asked for more neighbours than the index holds pads its result
/// with sentinels whose `position` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// The index position of the stored vector, or `None` for a sentinel.
    pub position: Option<usize>,
    /// Squared L2 distance to the query. `f32::MAX` for sentinels.
    pub distance: f32,
}

impl Neighbor {
    /// The "no result" entry used to pad under-full searches.
    pub const SENTINEL: Neighbor = Neighbor { position: None, distance: f32::MAX };

    /// Whether this slot is padding rather than a stored vector.
    pub fn is_sentinel(&self) -> bool {
        self.position.is_none()
    }
}

/// A store of dense vectors answering k-nearest-neighbour queries.
///
/// Implementations are append-only: no vector is ever updated or removed,
/// so a position handed out by [`insert`](VectorIndex::insert) stays valid for
/// the lifetime of the index.
pub trait VectorIndex: Send + Sync {
    /// The fixed dimensionality of every stored vector.
    fn dimension(&self) -> usize;

    /// The number of vectors inserted so far.
    fn len(&self) -> usize;

    /// Whether no vector has been inserted yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `vectors` contiguously and return the position of the first.
    ///
    /// Either every vector is stored or none is: a dimension mismatch
    /// anywhere in the batch leaves the index untouched.
    fn insert(&mut self, vectors: &[Vec<f32>]) -> Result<usize>;

    /// Return exactly `k` slots ordered by ascending distance, nearest first,
    /// padded with [`Neighbor::SENTINEL`] when fewer than `k` vectors exist.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;
}

/// Exact L2 index that scans every stored vector on each search.
///
/// Ties in distance are broken by position, lower first, so results are
/// deterministic for identical vectors.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{FlatL2Index, VectorIndex};
///
/// let mut index = FlatL2Index::new(2)?;
/// let base = index.insert(&[vec![0.0, 0.0], vec![1.0, 1.0]])?;
/// let hits = index.search(&[0.9, 0.9], 1)?;
/// assert_eq!(hits[0].position, Some(base + 1));
/// ```
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    /// Create an empty index for vectors of `dimension` components.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `dimension` is zero.
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(RagError::ConfigError("index dimension must be greater than zero".into()));
        }
        Ok(Self { dimension, data: Vec::new() })
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// Squared Euclidean distance between two equal-length vectors.
pub(crate) fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn by_rank(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance.total_cmp(&b.distance).then(a.position.cmp(&b.position))
}

impl VectorIndex for FlatL2Index {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    fn insert(&mut self, vectors: &[Vec<f32>]) -> Result<usize> {
        for vector in vectors {
            self.check_dimension(vector)?;
        }
        let base = self.len();
        self.data.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(base)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.check_dimension(query)?;

        let mut scored: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, vector)| Neighbor {
                position: Some(position),
                distance: squared_l2(query, vector),
            })
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable_by(k, by_rank);
            scored.truncate(k);
        }
        scored.sort_by(by_rank);
        scored.resize(k, Neighbor::SENTINEL);
        Ok(scored)
    }
}
