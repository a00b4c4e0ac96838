use serde::{Deserialize, Serialize};

/// A titled, paginated unit of text produced by the PDF extraction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    #[serde(default)]
    pub heading: String,
    pub pdf_name: String,
    pub page_number: u32,
}

impl Chunk {
    pub fn new(
        content: impl Into<String>,
        heading: impl Into<String>,
        pdf_name: impl Into<String>,
        page_number: u32,
    ) -> Self {
        Self {
            content: content.into(),
            heading: heading.into(),
            pdf_name: pdf_name.into(),
            page_number,
        }
    }

    /// Whitespace-only chunks are never embedded or indexed
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}
