//! End-to-end orchestration: archive in, Markdown + DOCX out.
//!
//! ```text
//! archive ──► extract ──► discover ──► load ──► index ──► overview
//!                                                 │
//!                         render ◄── analyze ◄────┘
//! ```
//!
//! The output directory is cleared of prior artifacts before anything else
//! happens, so a failed run never leaves a stale report next to a fresh
//! error. The extracted tree lives in a temporary directory that is removed
//! when the run ends, whatever the outcome.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::analyze::analyze_files;
use crate::archive::{extract_archive, SourceArchive};
use crate::config::{Config, OutputConfig};
use crate::discover::discover_code_files;
use crate::embedding::{create_embedder, Embedder};
use crate::error::{DocError, EmptyCorpusReason, Result};
use crate::index::CorpusIndex;
use crate::llm::{create_generator, Generator};
use crate::loader::load_files;
use crate::models::{GeneratedDoc, LoadedFile};
use crate::overview::synthesize_overview;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::report::{write_outputs, FunctionalDocument};

/// The two model capabilities a run needs, built once and shared by every step.
#[derive(Clone)]
pub struct ModelClients {
    pub generator: Arc<dyn Generator>,
    pub embedder: Arc<dyn Embedder>,
}

impl ModelClients {
    pub fn new(generator: Arc<dyn Generator>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            generator,
            embedder,
        }
    }

    /// Build the configured providers. Missing credentials or unknown
    /// providers are configuration errors.
    pub fn from_config(config: &Config) -> Result<Self> {
        let generator =
            create_generator(&config.llm).map_err(|e| DocError::Config(format!("{:#}", e)))?;
        let embedder =
            create_embedder(&config.embedding).map_err(|e| DocError::Config(format!("{:#}", e)))?;
        Ok(Self {
            generator: Arc::from(generator),
            embedder: Arc::from(embedder),
        })
    }
}

/// Run the whole pipeline and return where the two documents were written.
pub async fn generate_functional_doc(
    config: &Config,
    clients: &ModelClients,
    archive: SourceArchive,
    output_dir: &Path,
    cancel: &CancellationToken,
    progress: &dyn ProgressReporter,
) -> Result<GeneratedDoc> {
    reset_output_dir(output_dir, &config.output)?;
    check_cancel(cancel)?;

    progress.report(ProgressEvent::Extracting);
    let label = archive.describe();
    let tree = extract_archive(archive)?;
    info!(archive = %label, entries = tree.file_count(), "extracted");

    let files = discover_code_files(tree.root(), &config.discovery)?;
    if files.is_empty() {
        return Err(DocError::EmptyCorpus(EmptyCorpusReason::NoSourceFiles));
    }

    let loaded = load_files(&files);
    let non_empty: Vec<LoadedFile> = loaded.into_iter().filter(|f| !f.is_empty()).collect();
    progress.report(ProgressEvent::Discovered {
        files: files.len() as u64,
        non_empty: non_empty.len() as u64,
    });
    if non_empty.is_empty() {
        return Err(DocError::EmptyCorpus(EmptyCorpusReason::AllFilesEmpty));
    }
    check_cancel(cancel)?;

    progress.report(ProgressEvent::Indexing {
        chunks: non_empty.len() as u64,
    });
    let texts: Vec<&str> = non_empty.iter().map(|f| f.content.as_str()).collect();
    let index = tokio::select! {
        _ = cancel.cancelled() => return Err(DocError::Cancelled),
        index = CorpusIndex::build(clients.embedder.as_ref(), &config.embedding, &texts) => index?,
    };

    progress.report(ProgressEvent::Overview);
    let overview = tokio::select! {
        _ = cancel.cancelled() => return Err(DocError::Cancelled),
        report = synthesize_overview(
            &index,
            clients.embedder.as_ref(),
            clients.generator.as_ref(),
            &config.retrieval,
        ) => report?,
    };

    let notes = analyze_files(
        Arc::clone(&clients.generator),
        &non_empty,
        &config.analysis,
        cancel,
        progress,
    )
    .await?;
    check_cancel(cancel)?;

    progress.report(ProgressEvent::Rendering);
    let doc = FunctionalDocument::new(&config.output.title, &overview, &notes);
    let (markdown_path, docx_path) = write_outputs(&doc, output_dir, &config.output)?;

    let files_failed = notes.iter().filter(|n| n.is_failed()).count();
    info!(
        discovered = files.len(),
        analyzed = notes.len() - files_failed,
        failed = files_failed,
        "functional documentation generated"
    );

    Ok(GeneratedDoc {
        markdown_path,
        docx_path,
        files_discovered: files.len(),
        files_analyzed: notes.len() - files_failed,
        files_failed,
    })
}

/// One recognized source file as seen by a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyEntry {
    pub relative_path: String,
    pub bytes: u64,
    pub empty: bool,
    /// Whether the file would get its own analysis section.
    pub within_cap: bool,
}

/// Extract and discover without calling any model.
pub fn survey_archive(config: &Config, archive: SourceArchive) -> Result<Vec<SurveyEntry>> {
    let tree = extract_archive(archive)?;
    let files = discover_code_files(tree.root(), &config.discovery)?;
    let loaded = load_files(&files);

    let mut slots = config.analysis.max_files;
    let entries = loaded
        .iter()
        .map(|f| {
            let empty = f.is_empty();
            let within_cap = !empty && slots > 0;
            if within_cap {
                slots -= 1;
            }
            SurveyEntry {
                relative_path: f.file.relative_path.clone(),
                bytes: fs::metadata(&f.file.path).map(|m| m.len()).unwrap_or(0),
                empty,
                within_cap,
            }
        })
        .collect();
    Ok(entries)
}

/// Create `dir` if needed and delete any artifacts from a previous run.
fn reset_output_dir(dir: &Path, output: &OutputConfig) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| DocError::storage(dir, e))?;
    for name in [&output.markdown_file, &output.docx_file] {
        let path = dir.join(name);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| DocError::storage(&path, e))?;
        }
    }
    Ok(())
}

fn check_cancel(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(DocError::Cancelled)
    } else {
        Ok(())
    }
}
