//! Exact brute-force nearest-neighbour index over squared L2 distance.
//!
//! Vectors are stored row-major in one flat buffer; the position of a vector
//! in insertion order is its id. Search is exhaustive, so results are exact
//! and reproducible, with ties resolved by id.

use thiserror::Error;

use crate::embeddings::EmbeddedChunk;

#[derive(Error, Debug, PartialEq)]
pub enum IndexError {
    #[error("Index dimension must be positive")]
    ZeroDimension,
    #[error("Embedding at position {position} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        position: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Query vector has dimension {actual}, index expects {expected}")]
    QueryDimensionMismatch { expected: usize, actual: usize },
}

/// One search hit: positional id and squared L2 distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: usize,
    pub distance: f32,
}

#[derive(Debug, Clone)]
pub struct VectorIndex {
    dim: usize,
    vectors: Vec<f32>,
}

impl VectorIndex {
    pub fn build(chunks: &[EmbeddedChunk], dim: usize) -> Result<Self, IndexError> {
        Self::from_vectors(chunks.iter().map(|c| c.embedding.as_slice()), dim)
    }

    pub fn from_vectors<'a, I>(vectors: I, dim: usize) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        if dim == 0 {
            return Err(IndexError::ZeroDimension);
        }

        let mut flat = Vec::new();

        for (position, vector) in vectors.into_iter().enumerate() {
            if vector.len() != dim {
                return Err(IndexError::DimensionMismatch {
                    position,
                    expected: dim,
                    actual: vector.len(),
                });
            }
            flat.extend_from_slice(vector);
        }

        Ok(Self { dim, vectors: flat })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.vectors.len() / self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// The `k` nearest vectors, closest first. `k` is clamped to the index size.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if query.len() != self.dim {
            return Err(IndexError::QueryDimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }

        let mut neighbors: Vec<Neighbor> = self.vectors
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(id, vector)| Neighbor {
                id,
                distance: squared_l2(query, vector),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.id.cmp(&b.id))
        });
        neighbors.truncate(k.min(self.len()));

        Ok(neighbors)
    }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
