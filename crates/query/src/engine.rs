use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use extract::{build_prompt, LanguageModel, ResponseParser, StructuredResponse};
use index::{ChunkEmbedder, EmbeddedChunk, EmbeddingProvider, VectorIndex};
use ingest::Chunk;

use crate::retriever::{search_scored, ScoredChunk};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSearchResult {
    pub response: StructuredResponse,
    pub sources: Vec<ScoredChunk>,
    pub trace: SearchTrace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchTrace {
    pub chunks_indexed: usize,
    pub chunks_retrieved: usize,
    pub prompt_chars: usize,
}

/// Retrieval and synthesis for one persona/task. The embedder used for
/// indexing is the one used for the query, and every index is built with
/// the engine's dimension.
pub struct TaskSearchEngine<E, L> {
    embedder: ChunkEmbedder<E>,
    parser: ResponseParser<L>,
    dimension: usize,
}

impl<E, L> TaskSearchEngine<E, L>
where
    E: EmbeddingProvider,
    L: LanguageModel,
{
    pub fn new(embedder: ChunkEmbedder<E>, parser: ResponseParser<L>, dimension: usize) -> Self {
        Self {
            embedder,
            parser,
            dimension,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub async fn embed(&self, chunks: &[Chunk]) -> Result<Vec<EmbeddedChunk>> {
        self.embedder.embed_chunks(chunks).await
    }

    pub async fn answer(
        &self,
        persona: &str,
        task: &str,
        chunks: &[EmbeddedChunk],
        top_k: usize,
    ) -> Result<TaskSearchResult> {
        // Step 1: Build the index over this run's chunks
        let index = VectorIndex::build(chunks, self.dimension)
            .context("Failed to build vector index")?;
        tracing::info!(chunks = index.len(), dimension = self.dimension, "Built vector index");

        // Step 2: Retrieve against the task text
        let sources = search_scored(&index, self.embedder.provider(), task, chunks, top_k).await?;
        tracing::info!(requested = top_k, retrieved = sources.len(), "Retrieved chunks");

        // Step 3: Build prompt
        let top_chunks: Vec<Chunk> = sources.iter().map(|s| s.chunk.clone()).collect();
        let prompt = build_prompt(persona, task, &top_chunks);

        // Step 4: Generate and parse
        let response = self.parser.run_llm(&prompt).await?;

        Ok(TaskSearchResult {
            response,
            trace: SearchTrace {
                chunks_indexed: index.len(),
                chunks_retrieved: sources.len(),
                prompt_chars: prompt.chars().count(),
            },
            sources,
        })
    }

    /// Embed, then answer, in one call
    pub async fn run(
        &self,
        persona: &str,
        task: &str,
        chunks: &[Chunk],
        top_k: usize,
    ) -> Result<TaskSearchResult> {
        let embedded = self.embed(chunks).await?;
        self.answer(persona, task, &embedded, top_k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct TableEmbedder(HashMap<String, Vec<f32>>);

    #[async_trait]
    impl EmbeddingProvider for TableEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            texts
                .iter()
                .map(|t| self.0.get(t).cloned().context("unknown text"))
                .collect()
        }
    }

    /// Replies with a fixed completion and keeps the prompt it was given
    struct ScriptedModel {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, prompt: &str, _max_tokens: usize) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    const RISKS: &str = "Currency exposure and supplier concentration are the main risks.";
    const LEGAL: &str = "Pending litigation could delay the product launch.";
    const MENU: &str = "The cafeteria menu changes every Tuesday.";

    fn engine(reply: &str) -> TaskSearchEngine<TableEmbedder, ScriptedModel> {
        let table = [
            ("summarize risks", vec![1.0, 0.0, 0.0]),
            (RISKS, vec![0.9, 0.1, 0.0]),
            (LEGAL, vec![0.6, 0.5, 0.0]),
            (MENU, vec![0.0, 0.0, 1.0]),
        ]
        .into_iter()
        .map(|(text, vector)| (text.to_string(), vector))
        .collect();

        let model = ScriptedModel {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        };

        TaskSearchEngine::new(
            ChunkEmbedder::new(TableEmbedder(table)),
            ResponseParser::new(model),
            3,
        )
    }

    fn chunks() -> Vec<Chunk> {
        vec![
            Chunk::new(MENU, "Facilities", "handbook.pdf", 12),
            Chunk::new(RISKS, "Risk Factors", "annual_report.pdf", 4),
            Chunk::new("   ", "Blank", "annual_report.pdf", 5),
            Chunk::new(LEGAL, "Legal Proceedings", "legal_update.pdf", 2),
        ]
    }

    fn prompt_of(engine: &TaskSearchEngine<TableEmbedder, ScriptedModel>) -> String {
        engine.parser.llm().prompts.lock().unwrap()[0].clone()
    }

    #[tokio::test]
    async fn test_end_to_end_two_of_three() {
        let reply = r#"{
            "extracted_sections": [
                {"document": "annual_report.pdf", "section_title": "Risk Factors", "importance_rank": 1, "page_number": 4},
                {"document": "legal_update.pdf", "section_title": "Legal Proceedings", "importance_rank": 2, "page_number": 2}
            ],
            "subsection_analysis": [
                {"document": "annual_report.pdf", "refined_text": "Currency and supplier risk.", "page_number": 4}
            ]
        }"#;
        let engine = engine(reply);

        let result = engine.run("Analyst", "summarize risks", &chunks(), 2).await.unwrap();

        let retrieved: Vec<&str> = result.sources.iter().map(|s| s.chunk.content.as_str()).collect();
        assert_eq!(retrieved, vec![RISKS, LEGAL]);
        assert_eq!(result.trace.chunks_indexed, 3);
        assert_eq!(result.trace.chunks_retrieved, 2);

        let prompt = prompt_of(&engine);
        assert!(prompt.contains("Analyst"));
        assert!(prompt.contains("summarize risks"));
        assert!(prompt.contains(RISKS));
        assert!(prompt.contains(LEGAL));
        assert!(!prompt.contains(MENU));
        assert_eq!(result.trace.prompt_chars, prompt.chars().count());

        let retrieved_docs: Vec<&str> = result.sources.iter().map(|s| s.chunk.pdf_name.as_str()).collect();
        assert_eq!(result.response.extracted_sections.len(), 2);
        assert!(result.response.documents().iter().all(|d| retrieved_docs.contains(d)));
    }

    #[tokio::test]
    async fn test_malformed_reply_degrades_to_empty() {
        let engine = engine("I could not find anything relevant.");

        let result = engine.run("Analyst", "summarize risks", &chunks(), 2).await.unwrap();

        assert_eq!(result.response, StructuredResponse::empty());
        assert_eq!(result.sources.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_corpus_still_prompts() {
        let engine = engine(r#"{"extracted_sections": [], "subsection_analysis": []}"#);

        let result = engine.run("Analyst", "summarize risks", &[], 5).await.unwrap();

        assert!(result.sources.is_empty());
        assert_eq!(result.trace.chunks_indexed, 0);
        assert!(prompt_of(&engine).contains("== Document Chunks Start =="));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_aborts() {
        let engine = engine("{}");
        let embedded = vec![EmbeddedChunk {
            embedding: vec![1.0, 2.0],
            chunk: Chunk::new(RISKS, "", "annual_report.pdf", 4),
        }];

        assert!(engine.answer("Analyst", "summarize risks", &embedded, 1).await.is_err());
        assert!(engine.parser.llm().prompts.lock().unwrap().is_empty());
    }
}
