use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

use crate::chunk::Chunk;

pub struct ChunkReader;

impl ChunkReader {
    /// Read one chunk record file (a JSON array of chunks)
    pub async fn read_file(path: &Path) -> Result<Vec<Chunk>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match extension {
            "json" => {
                let content = fs::read_to_string(path)
                    .await
                    .context(format!("Failed to read chunk file: {:?}", path))?;
                let chunks: Vec<Chunk> = serde_json::from_str(&content)
                    .context(format!("Failed to parse chunk records in {:?}", path))?;
                Ok(chunks)
            }
            _ => anyhow::bail!("Unsupported chunk file format: {}", extension),
        }
    }

    /// Read every `*.json` chunk file below `dir`, in path order
    pub async fn read_directory(dir: &Path) -> Result<Vec<Chunk>> {
        let files = Self::list_chunk_files(dir)?;
        let mut chunks = Vec::new();

        for path in files {
            let file_chunks = Self::read_file(&path).await?;
            tracing::debug!(file = ?path, chunks = file_chunks.len(), "Loaded chunk file");
            chunks.extend(file_chunks);
        }

        Ok(chunks)
    }

    fn list_chunk_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.context(format!("Failed to walk chunk directory: {:?}", dir))?;
            let path = entry.path();

            if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }
}
