use anyhow::Result;
use chrono::Utc;

use extract::LanguageModel;
use index::{EmbeddedChunk, EmbeddingProvider};
use ingest::Chunk;
use query::{ScoredChunk, TaskSearchEngine};

use crate::config::AppConfig;
use crate::input::RunInput;
use crate::output::{write_json, OutputRecord, RunMetadata};

/// Everything one run produced. Both artifacts are also on disk.
pub struct RunArtifacts {
    /// Every embedded chunk, before the document filter
    pub embedded: Vec<EmbeddedChunk>,
    pub sources: Vec<ScoredChunk>,
    pub record: OutputRecord,
}

/// Embed all extracted chunks, snapshot them, then answer the descriptor's
/// persona/task over the chunks of its documents only.
pub async fn run_pipeline<E, L>(
    engine: &TaskSearchEngine<E, L>,
    input: &RunInput,
    chunks: &[Chunk],
    config: &AppConfig,
) -> Result<RunArtifacts>
where
    E: EmbeddingProvider,
    L: LanguageModel,
{
    // Step 1: Embed every extracted chunk and snapshot the result
    let embedded = engine.embed(chunks).await?;

    let embeddings_path = config.embeddings_path();
    write_json(&embedded, &embeddings_path).await?;
    tracing::info!(path = ?embeddings_path, records = embedded.len(), "Saved embeddings");

    // Step 2: Retrieve and synthesize over the requested documents only
    let documents = input.document_names();
    let relevant = ingest::filter_by_documents(&embedded, &documents);
    tracing::info!(documents = documents.len(), chunks = relevant.len(), "Selected input documents");

    let result = engine
        .answer(
            &input.persona.role,
            &input.job_to_be_done.task,
            &relevant,
            config.retrieval.top_k,
        )
        .await?;

    tracing::info!(
        chunks_indexed = result.trace.chunks_indexed,
        chunks_retrieved = result.trace.chunks_retrieved,
        prompt_chars = result.trace.prompt_chars,
        sections = result.response.extracted_sections.len(),
        "Synthesis complete"
    );

    // Step 3: Attach run metadata and save
    let record = OutputRecord {
        response: result.response,
        metadata: RunMetadata::new(input, Utc::now()),
    };

    let output_path = config.output_path();
    write_json(&record, &output_path).await?;
    tracing::info!(path = ?output_path, "Output saved");

    Ok(RunArtifacts {
        embedded,
        sources: result.sources,
        record,
    })
}
