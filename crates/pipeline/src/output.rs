use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use extract::StructuredResponse;

use crate::input::RunInput;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputRecord {
    #[serde(flatten)]
    pub response: StructuredResponse,
    pub metadata: RunMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    pub processing_timestamp: String,
}

impl RunMetadata {
    pub fn new(input: &RunInput, processed_at: DateTime<Utc>) -> Self {
        Self {
            input_documents: input.document_names(),
            persona: input.persona.role.clone(),
            job_to_be_done: input.job_to_be_done.task.clone(),
            processing_timestamp: processed_at.to_rfc3339_opts(SecondsFormat::Micros, false),
        }
    }
}

/// Pretty-print `value` to `path`, creating parent directories
pub async fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .context(format!("Failed to create directory: {:?}", parent))?;
    }

    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json)
        .await
        .context(format!("Failed to write {:?}", path))?;

    Ok(())
}
