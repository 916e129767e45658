//! Retrieval-grounded project overview.
//!
//! Runs the single configured query against the [`CorpusIndex`], places the
//! retrieved chunks into the overview prompt, and returns the model's answer
//! verbatim. Any failure here is fatal to the run.

use tracing::info;

use crate::config::RetrievalConfig;
use crate::embedding::Embedder;
use crate::error::{DocError, Result};
use crate::index::CorpusIndex;
use crate::llm::Generator;
use crate::models::OverviewReport;
use crate::prompt::overview_prompt;

pub async fn synthesize_overview(
    index: &CorpusIndex,
    embedder: &dyn Embedder,
    generator: &dyn Generator,
    config: &RetrievalConfig,
) -> Result<OverviewReport> {
    let hits = index.query(embedder, &config.query, config.top_k).await?;
    let texts: Vec<&str> = hits.iter().map(|h| h.chunk.text.as_str()).collect();
    info!(retrieved = texts.len(), k = config.top_k, "overview context assembled");

    let prompt = overview_prompt(&texts, config.context_chars);
    let text = generator
        .generate(&prompt)
        .await
        .map_err(|e| DocError::generation("overview generation failed", e))?;

    Ok(OverviewReport {
        text,
        context_chunks: texts.len(),
    })
}
