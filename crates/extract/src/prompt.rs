use ingest::Chunk;

pub const CHUNKS_START: &str = "== Document Chunks Start ==";
pub const CHUNKS_END: &str = "== Document Chunks End ==";

/// Build the synthesis prompt. Chunks are emitted whole, in the given order.
pub fn build_prompt(persona: &str, task: &str, chunks: &[Chunk]) -> String {
    let mut prompt = format!(
        r#"You are a helpful assistant.

ROLE: {persona}

TASK: {task}

INSTRUCTIONS:
1. Read the document chunks below
2. Select the sections that matter most for the task and rank them
3. Write a refined analysis for the most useful chunks
4. Output ONLY valid JSON, nothing else
5. Use the exact schema below

SCHEMA:
{{
  "extracted_sections": [
    {{"document": "<PDF filename>", "section_title": "<section heading>", "importance_rank": <integer, 1 = most important>, "page_number": <integer>}}
  ],
  "subsection_analysis": [
    {{"document": "<PDF filename>", "refined_text": "<analysis based on that chunk>", "page_number": <integer>}}
  ]
}}

RULES:
- "document" must be one of the PDF filenames listed with the chunks
- "importance_rank" and "page_number" are integers starting at 1
- Both lists must be present, even when empty
- Output ONLY the JSON object, no markdown, no explanations, no closing notes

{CHUNKS_START}
"#
    );

    for chunk in chunks {
        prompt.push_str(&format_chunk(chunk));
    }

    prompt.push_str(CHUNKS_END);
    prompt.push_str("\n\nJSON OUTPUT:");
    prompt
}

fn format_chunk(chunk: &Chunk) -> String {
    format!(
        "\n[Document: {}]\n[Page: {}]\n[Heading: {}]\n[Content]: {}\n\n",
        chunk.pdf_name, chunk.page_number, chunk.heading, chunk.content
    )
}
