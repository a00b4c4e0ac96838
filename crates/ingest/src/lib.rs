pub mod chunk;
pub mod reader;

pub use chunk::Chunk;
pub use reader::ChunkReader;

use anyhow::Result;
use std::path::Path;

/// Load the extractor's chunk records for every document under `dir`
pub async fn load_chunks(dir: &Path) -> Result<Vec<Chunk>> {
    let chunks = ChunkReader::read_directory(dir).await?;
    tracing::info!(dir = ?dir, chunks = chunks.len(), "Loaded chunk records");
    Ok(chunks)
}

/// Keep only chunks that belong to one of `documents`, preserving order
pub fn filter_by_documents<T, S>(chunks: &[T], documents: &[S]) -> Vec<T>
where
    T: AsRef<Chunk> + Clone,
    S: AsRef<str>,
{
    chunks
        .iter()
        .filter(|chunk| {
            let name = chunk.as_ref().pdf_name.as_str();
            documents.iter().any(|doc| doc.as_ref() == name)
        })
        .cloned()
        .collect()
}

impl AsRef<Chunk> for Chunk {
    fn as_ref(&self) -> &Chunk {
        self
    }
}
