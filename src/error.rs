//! Error taxonomy for the documentation pipeline.
//!
//! Every component boundary returns [`DocError`]. The variants mirror the
//! failure classes a caller has to tell apart: a bad archive, a filesystem
//! write failure, nothing to document, and a model/embedding failure.
//! The `fdoc` binary converts these into `anyhow` errors for display.

use std::path::Path;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocError>;

/// Why the corpus ended up empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyCorpusReason {
    /// Discovery found no file with a recognized source extension.
    NoSourceFiles,
    /// Source files exist but every one was empty or unreadable.
    AllFilesEmpty,
}

impl std::fmt::Display for EmptyCorpusReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmptyCorpusReason::NoSourceFiles => {
                write!(f, "no source files found in the uploaded project")
            }
            EmptyCorpusReason::AllFilesEmpty => {
                write!(f, "all source files in the uploaded project are empty or unreadable")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum DocError {
    /// The input is not a valid archive, or an entry is unsafe/oversized.
    #[error("archive extraction failed: {0}")]
    Extraction(String),

    /// A filesystem write (output directory, extracted tree) failed.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("nothing to document: {0}")]
    EmptyCorpus(EmptyCorpusReason),

    /// A generative-model or embedding call failed or timed out.
    #[error("generation failed: {0}")]
    Generation(String),

    #[error("run cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DocError {
    pub fn storage(path: &Path, err: impl std::fmt::Display) -> Self {
        DocError::Storage(format!("{}: {}", path.display(), err))
    }

    pub fn generation(context: &str, err: impl std::fmt::Display) -> Self {
        DocError::Generation(format!("{}: {}", context, err))
    }
}
