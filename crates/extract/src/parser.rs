use anyhow::{Context, Result};
use thiserror::Error;

use crate::llm::LanguageModel;
use crate::schema::StructuredResponse;

pub const DEFAULT_MAX_TOKENS: usize = 1024;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Model output is not a valid response object: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

/// Strictly parse model output into a `StructuredResponse`.
pub fn parse_response(text: &str) -> Result<StructuredResponse, ParseError> {
    let response: StructuredResponse = serde_json::from_str(text.trim())?;
    validate(&response)?;
    Ok(response)
}

fn validate(response: &StructuredResponse) -> Result<(), ParseError> {
    for (i, section) in response.extracted_sections.iter().enumerate() {
        ensure_positive(section.importance_rank, || format!("extracted_sections[{}].importance_rank", i))?;
        ensure_positive(section.page_number, || format!("extracted_sections[{}].page_number", i))?;
    }

    for (i, analysis) in response.subsection_analysis.iter().enumerate() {
        ensure_positive(analysis.page_number, || format!("subsection_analysis[{}].page_number", i))?;
    }

    Ok(())
}

fn ensure_positive(value: u32, field: impl FnOnce() -> String) -> Result<(), ParseError> {
    if value == 0 {
        return Err(ParseError::InvalidField {
            field: field(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

/// Runs the model and turns its output into a `StructuredResponse`.
/// Unparseable output degrades to the empty response; only a failure of
/// the model call itself is returned as an error.
pub struct ResponseParser<L> {
    llm: L,
    max_tokens: usize,
}

impl<L: LanguageModel> ResponseParser<L> {
    pub fn new(llm: L) -> Self {
        Self {
            llm,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn llm(&self) -> &L {
        &self.llm
    }

    pub async fn run_llm(&self, prompt: &str) -> Result<StructuredResponse> {
        let raw = self.llm
            .complete(prompt, self.max_tokens)
            .await
            .context("Language model call failed")?;
        let output = raw.trim();

        match parse_response(output) {
            Ok(response) => {
                tracing::debug!(
                    sections = response.extracted_sections.len(),
                    analyses = response.subsection_analysis.len(),
                    "Parsed model response"
                );
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(error = %e, raw_output = output, "Failed to decode model output, using empty response");
                Ok(StructuredResponse::empty())
            }
        }
    }
}
