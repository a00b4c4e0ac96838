use anyhow::{Context, Result};
use async_trait::async_trait;
use ingest::Chunk;
use serde::{Deserialize, Serialize};

const DEFAULT_BATCH_SIZE: usize = 32;

/// Text-to-vector capability. Implementations must return exactly one
/// vector per input text, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        anyhow::ensure!(
            vectors.len() == 1,
            "Embedding provider returned {} vectors for a single text",
            vectors.len()
        );
        Ok(vectors.remove(0))
    }

    /// Get embedding dimension
    async fn dimension(&self) -> Result<usize> {
        let test_embedding = self.embed("test").await?;
        Ok(test_embedding.len())
    }
}

/// Ollama-backed embedding client
#[derive(Clone)]
pub struct EmbeddingClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl EmbeddingClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
        }
    }

    /// Swap in a preconfigured HTTP client (timeouts, proxies)
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.base_url);

        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send embedding request")?;

        if !response.status().is_success() {
            anyhow::bail!("Embedding request failed: {}", response.status());
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        anyhow::ensure!(
            embed_response.embeddings.len() == texts.len(),
            "Embedding response has {} vectors for {} inputs",
            embed_response.embeddings.len(),
            texts.len()
        );

        Ok(embed_response.embeddings)
    }
}

/// A chunk plus its embedding. Serializes flat, so a snapshot record reads
/// `{embedding, content, heading, pdf_name, page_number}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub embedding: Vec<f32>,
    #[serde(flatten)]
    pub chunk: Chunk,
}

impl AsRef<Chunk> for EmbeddedChunk {
    fn as_ref(&self) -> &Chunk {
        &self.chunk
    }
}

pub struct ChunkEmbedder<E> {
    provider: E,
    batch_size: usize,
}

impl<E: EmbeddingProvider> ChunkEmbedder<E> {
    pub fn new(provider: E) -> Self {
        Self {
            provider,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn provider(&self) -> &E {
        &self.provider
    }

    /// Embed every non-blank chunk, keeping input order. Blank chunks are
    /// dropped before the provider sees them.
    pub async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<EmbeddedChunk>> {
        let surviving: Vec<&Chunk> = chunks.iter().filter(|c| !c.is_blank()).collect();

        if surviving.is_empty() {
            return Ok(Vec::new());
        }

        let total = surviving.len();
        let mut embedded = Vec::with_capacity(total);
        let mut dimension: Option<usize> = None;

        for batch in surviving.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();

            let vectors = self.provider
                .embed_batch(&texts)
                .await
                .context("Failed to embed chunk batch")?;

            anyhow::ensure!(
                vectors.len() == batch.len(),
                "Embedding provider returned {} vectors for {} chunks",
                vectors.len(),
                batch.len()
            );

            for (chunk, embedding) in batch.iter().zip(vectors) {
                // Every vector must match the length of the first one
                let expected = *dimension.get_or_insert(embedding.len());
                anyhow::ensure!(
                    embedding.len() == expected,
                    "Embedding for chunk '{}' (page {}) has length {}, expected {}",
                    chunk.pdf_name,
                    chunk.page_number,
                    embedding.len(),
                    expected
                );

                embedded.push(EmbeddedChunk {
                    embedding,
                    chunk: (*chunk).clone(),
                });
            }

            tracing::info!(embedded = embedded.len(), total, "Embedding progress");
        }

        tracing::debug!(
            dropped = chunks.len() - total,
            "Skipped blank chunks"
        );

        Ok(embedded)
    }
}
