pub mod schema;
pub mod llm;
pub mod prompt;
pub mod parser;

pub use schema::{ExtractedSection, StructuredResponse, SubsectionAnalysis};
pub use llm::{GenerationOptions, LanguageModel, OllamaClient};
pub use prompt::build_prompt;
pub use parser::{parse_response, ParseError, ResponseParser};
