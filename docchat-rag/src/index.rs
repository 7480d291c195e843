//! Exact nearest-neighbour search over embedding vectors.
//!
//! [`FlatL2Index`] stores all vectors in one contiguous buffer and answers
//! queries with a brute-force scan: every query costs O(n·d) for `n` vectors
//! of dimension `d`. At single-document scale this is both exact and fast. An
//! approximate structure would implement [`VectorIndex`] and be selected
//! explicitly by the caller; nothing here degrades to approximate results.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// One search hit: the position of a stored vector and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Index into the vector list the index was built from.
    pub index: usize,
    /// Squared Euclidean distance to the query.
    pub distance: f32,
}

/// A read-only nearest-neighbour index.
///
/// Indexes are immutable after construction. Replacing the indexed content
/// means building a new index and dropping the old one.
pub trait VectorIndex: Send + Sync {
    /// Number of stored vectors.
    fn len(&self) -> usize;

    /// Whether the index holds no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality of the stored vectors.
    fn dimensions(&self) -> usize;

    /// Return the `min(k, len)` nearest vectors to `query`, ordered by
    /// ascending distance with ties broken by lower index.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;
}

/// Exact squared-L2 index backed by a flat `n × d` buffer.
///
/// # Example
///
/// ```rust
/// use docchat_rag::index::{FlatL2Index, VectorIndex};
///
/// let index = FlatL2Index::build(vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![5.0, 5.0]]).unwrap();
/// let hits = index.search(&[0.9, 1.2], 2).unwrap();
/// assert_eq!(hits[0].index, 1);
/// assert_eq!(hits[1].index, 0);
/// ```
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dimensions: usize,
    len: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    /// Build an index over `vectors`, addressed `0..n` in input order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexError`] if `vectors` is empty, if the vectors
    /// are zero-dimensional, or if their lengths differ.
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let first = vectors
            .first()
            .ok_or_else(|| RagError::IndexError("cannot build an index from zero vectors".into()))?;
        let dimensions = first.len();
        if dimensions == 0 {
            return Err(RagError::IndexError("vectors must have at least one dimension".into()));
        }

        let len = vectors.len();
        let mut data = Vec::with_capacity(len * dimensions);
        for (i, vector) in vectors.into_iter().enumerate() {
            if vector.len() != dimensions {
                return Err(RagError::IndexError(format!(
                    "vector {i} has {} dimensions, expected {dimensions}",
                    vector.len()
                )));
            }
            data.extend(vector);
        }

        Ok(Self { dimensions, len, data })
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn by_distance_then_index(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index))
}

impl VectorIndex for FlatL2Index {
    fn len(&self) -> usize {
        self.len
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimensions {
            return Err(RagError::IndexError(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }
        let k = k.min(self.len);
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimensions)
            .enumerate()
            .map(|(index, vector)| Neighbor { index, distance: squared_l2(vector, query) })
            .collect();

        if k < neighbors.len() {
            neighbors.select_nth_unstable_by(k - 1, by_distance_then_index);
            neighbors.truncate(k);
        }
        neighbors.sort_unstable_by(by_distance_then_index);
        Ok(neighbors)
    }
}
