pub mod retriever;
pub mod engine;

pub use retriever::{search_scored, search_top_k, ScoredChunk};
pub use engine::{SearchTrace, TaskSearchEngine, TaskSearchResult};
