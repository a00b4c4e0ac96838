pub mod embeddings;
pub mod vector_index;

pub use embeddings::{ChunkEmbedder, EmbeddedChunk, EmbeddingClient, EmbeddingProvider};
pub use vector_index::{IndexError, Neighbor, VectorIndex};
