use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The run descriptor: which documents to search, who is asking, and what for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInput {
    pub documents: Vec<DocumentRef>,
    pub persona: Persona,
    pub job_to_be_done: JobToBeDone,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRef {
    pub filename: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobToBeDone {
    pub task: String,
}

impl RunInput {
    pub async fn read(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .context(format!("Failed to read input file: {:?}", path))?;
        Self::parse(&content).context(format!("Failed to parse input file: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let input: RunInput = serde_json::from_str(content)?;
        anyhow::ensure!(!input.persona.role.trim().is_empty(), "persona.role is empty");
        anyhow::ensure!(!input.job_to_be_done.task.trim().is_empty(), "job_to_be_done.task is empty");
        Ok(input)
    }

    pub fn document_names(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.filename.clone()).collect()
    }
}
