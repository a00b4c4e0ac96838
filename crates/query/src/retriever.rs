use anyhow::{Context, Result};
use index::{EmbeddingProvider, VectorIndex};
use ingest::Chunk;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Squared L2 distance to the query embedding
    pub distance: f32,
}

/// Top-`k` chunks for `query`, closest first. `chunks` must be the
/// collection `index` was built from, in the same order.
pub async fn search_top_k<E, C>(
    index: &VectorIndex,
    embedder: &E,
    query: &str,
    chunks: &[C],
    k: usize,
) -> Result<Vec<Chunk>>
where
    E: EmbeddingProvider,
    C: AsRef<Chunk>,
{
    let scored = search_scored(index, embedder, query, chunks, k).await?;
    Ok(scored.into_iter().map(|s| s.chunk).collect())
}

pub async fn search_scored<E, C>(
    index: &VectorIndex,
    embedder: &E,
    query: &str,
    chunks: &[C],
    k: usize,
) -> Result<Vec<ScoredChunk>>
where
    E: EmbeddingProvider,
    C: AsRef<Chunk>,
{
    let query_embedding = embedder.embed(query).await
        .context("Failed to embed query")?;

    let neighbors = index.search(&query_embedding, k)?;

    neighbors
        .into_iter()
        .map(|neighbor| -> Result<ScoredChunk> {
            let chunk = chunks.get(neighbor.id).with_context(|| {
                format!(
                    "Index returned id {} but only {} chunks are indexed",
                    neighbor.id,
                    chunks.len()
                )
            })?;

            Ok(ScoredChunk {
                chunk: chunk.as_ref().clone(),
                distance: neighbor.distance,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use index::EmbeddedChunk;
    use std::collections::HashMap;

    struct TableEmbedder(HashMap<String, Vec<f32>>);

    #[async_trait]
    impl EmbeddingProvider for TableEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            texts
                .iter()
                .map(|t| self.0.get(t).cloned().context("unknown text"))
                .collect()
        }
    }

    fn embedder(entries: &[(&str, Vec<f32>)]) -> TableEmbedder {
        TableEmbedder(
            entries
                .iter()
                .map(|(text, vector)| (text.to_string(), vector.clone()))
                .collect(),
        )
    }

    fn corpus() -> Vec<EmbeddedChunk> {
        vec![
            EmbeddedChunk {
                embedding: vec![5.0, 5.0],
                chunk: Chunk::new("far", "", "a.pdf", 1),
            },
            EmbeddedChunk {
                embedding: vec![1.0, 0.0],
                chunk: Chunk::new("near", "", "a.pdf", 2),
            },
            EmbeddedChunk {
                embedding: vec![0.0, 2.0],
                chunk: Chunk::new("mid", "", "b.pdf", 1),
            },
        ]
    }

    #[tokio::test]
    async fn test_returns_closest_first() {
        let chunks = corpus();
        let index = VectorIndex::build(&chunks, 2).unwrap();
        let embedder = embedder(&[("query", vec![0.0, 0.0])]);

        let top = search_top_k(&index, &embedder, "query", &chunks, 2).await.unwrap();
        let contents: Vec<&str> = top.iter().map(|c| c.content.as_str()).collect();

        assert_eq!(contents, vec!["near", "mid"]);
    }

    #[tokio::test]
    async fn test_large_k_returns_whole_corpus_ordered() {
        let chunks = corpus();
        let index = VectorIndex::build(&chunks, 2).unwrap();
        let embedder = embedder(&[("query", vec![0.0, 0.0])]);

        let scored = search_scored(&index, &embedder, "query", &chunks, 10).await.unwrap();

        assert_eq!(scored.len(), 3);
        assert!(scored.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(scored[2].chunk.content, "far");
    }

    #[tokio::test]
    async fn test_single_chunk_always_returned() {
        let chunks = vec![corpus().remove(0)];
        let index = VectorIndex::build(&chunks, 2).unwrap();
        let embedder = embedder(&[("x", vec![-100.0, 3.0]), ("y", vec![5.0, 5.0])]);

        for query in ["x", "y"] {
            let top = search_top_k(&index, &embedder, query, &chunks, 3).await.unwrap();
            assert_eq!(top.len(), 1);
            assert_eq!(top[0].content, "far");
        }
    }

    #[tokio::test]
    async fn test_repeated_searches_are_stable() {
        let chunks = corpus();
        let index = VectorIndex::build(&chunks, 2).unwrap();
        let embedder = embedder(&[("query", vec![0.5, 1.0])]);

        let first = search_top_k(&index, &embedder, "query", &chunks, 3).await.unwrap();
        for _ in 0..5 {
            let again = search_top_k(&index, &embedder, "query", &chunks, 3).await.unwrap();
            assert_eq!(again, first);
        }
    }

    #[tokio::test]
    async fn test_out_of_range_id_is_an_error() {
        let chunks = corpus();
        let index = VectorIndex::build(&chunks, 2).unwrap();
        let embedder = embedder(&[("query", vec![0.0, 0.0])]);

        let truncated = &chunks[..1];
        assert!(search_top_k(&index, &embedder, "query", truncated, 3).await.is_err());
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch_is_an_error() {
        let chunks = corpus();
        let index = VectorIndex::build(&chunks, 2).unwrap();
        let embedder = embedder(&[("query", vec![0.0, 0.0, 0.0])]);

        assert!(search_top_k(&index, &embedder, "query", &chunks, 1).await.is_err());
    }
}
