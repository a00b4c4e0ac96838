use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSection {
    pub document: String,
    pub section_title: String,
    pub importance_rank: u32,
    pub page_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsectionAnalysis {
    pub document: String,
    pub refined_text: String,
    pub page_number: u32,
}

/// The object the model is asked to return. Both lists are always present;
/// an empty response is the fallback for unusable model output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredResponse {
    pub extracted_sections: Vec<ExtractedSection>,
    pub subsection_analysis: Vec<SubsectionAnalysis>,
}

impl StructuredResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.extracted_sections.is_empty() && self.subsection_analysis.is_empty()
    }

    /// Distinct document names referenced by either list, first-seen order
    pub fn documents(&self) -> Vec<&str> {
        let mut documents: Vec<&str> = Vec::new();
        let names = self.extracted_sections.iter().map(|s| s.document.as_str())
            .chain(self.subsection_analysis.iter().map(|s| s.document.as_str()));

        for name in names {
            if !documents.contains(&name) {
                documents.push(name);
            }
        }

        documents
    }
}
