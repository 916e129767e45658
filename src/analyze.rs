//! Per-file analysis with a bounded worker pool.
//!
//! Selects at most `max_files` non-empty files in discovery order, fills the
//! per-file prompt with a bounded prefix of each file, and runs up to
//! `concurrency` model calls at once. Results are slotted by their original
//! index, so the returned notes follow discovery order regardless of which
//! call finishes first.
//!
//! A failed call either becomes a placeholder note or aborts the run,
//! depending on [`FailurePolicy`]. Cancellation is checked before every
//! model call and races each in-flight call.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{AnalysisConfig, FailurePolicy};
use crate::error::{DocError, Result};
use crate::llm::Generator;
use crate::models::{CodeFile, FileNote, LoadedFile};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::prompt::file_prompt;

/// Non-empty files in discovery order, capped at `max_files`.
pub fn select_for_analysis(files: &[LoadedFile], max_files: usize) -> Vec<LoadedFile> {
    files
        .iter()
        .filter(|f| !f.is_empty())
        .take(max_files)
        .cloned()
        .collect()
}

/// Analyze one file with a single model call.
pub async fn analyze_file(
    generator: &dyn Generator,
    file: &CodeFile,
    content: &str,
    max_chars: usize,
) -> Result<FileNote> {
    let prompt = file_prompt(&file.relative_path, content, max_chars);
    let answer = generator
        .generate(&prompt)
        .await
        .map_err(|e| DocError::generation(&format!("analysis of {}", file.relative_path), e))?;
    Ok(FileNote::analyzed(file, &answer))
}

/// Analyze the selected files and return their notes in discovery order.
pub async fn analyze_files(
    generator: Arc<dyn Generator>,
    files: &[LoadedFile],
    config: &AnalysisConfig,
    cancel: &CancellationToken,
    progress: &dyn ProgressReporter,
) -> Result<Vec<FileNote>> {
    if cancel.is_cancelled() {
        return Err(DocError::Cancelled);
    }

    let selected = select_for_analysis(files, config.max_files);
    let total = selected.len();
    debug!(
        total,
        skipped = files.len() - total,
        concurrency = config.concurrency,
        "starting file analysis"
    );

    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (index, loaded) in selected.into_iter().enumerate() {
        let generator = Arc::clone(&generator);
        let semaphore = Arc::clone(&semaphore);
        let cancel = cancel.clone();
        let max_chars = config.max_chars;

        tasks.spawn(async move {
            let outcome = match semaphore.acquire_owned().await {
                Ok(_permit) => {
                    if cancel.is_cancelled() {
                        Err(DocError::Cancelled)
                    } else {
                        tokio::select! {
                            _ = cancel.cancelled() => Err(DocError::Cancelled),
                            note = analyze_file(
                                generator.as_ref(),
                                &loaded.file,
                                &loaded.content,
                                max_chars,
                            ) => note,
                        }
                    }
                }
                Err(_) => Err(DocError::Cancelled),
            };
            (index, loaded.file, outcome)
        });
    }

    let mut slots: Vec<Option<FileNote>> = vec![None; total];
    let mut done = 0u64;

    while let Some(joined) = tasks.join_next().await {
        let (index, file, outcome) = match joined {
            Ok(result) => result,
            Err(e) => {
                tasks.abort_all();
                return Err(DocError::Generation(format!("analysis task failed: {}", e)));
            }
        };

        let note = match outcome {
            Ok(note) => note,
            Err(DocError::Cancelled) => {
                tasks.abort_all();
                return Err(DocError::Cancelled);
            }
            Err(e) => match config.on_failure {
                FailurePolicy::Abort => {
                    tasks.abort_all();
                    return Err(e);
                }
                FailurePolicy::Placeholder => {
                    warn!(path = %file.relative_path, "file analysis failed: {}", e);
                    FileNote::failed(&file, &e.to_string())
                }
            },
        };

        slots[index] = Some(note);
        done += 1;
        progress.report(ProgressEvent::Analyzing {
            n: done,
            total: total as u64,
        });
    }

    if cancel.is_cancelled() {
        return Err(DocError::Cancelled);
    }

    Ok(slots.into_iter().flatten().collect())
}
