//! Core data models used throughout the documentation pipeline.
//!
//! These types represent the source files, notes, and report pieces that flow
//! from archive extraction to rendering.

use std::path::PathBuf;

/// A recognized source file inside the extracted tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the extracted tree root, `/`-separated.
    pub relative_path: String,
}

impl CodeFile {
    /// Final path component, used as the per-file section heading.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.relative_path.clone())
    }
}

/// A code file together with its (possibly empty) text content.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub file: CodeFile,
    pub content: String,
}

impl LoadedFile {
    /// Whitespace-only content counts as empty.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// The project-level narrative. Produced once per run.
#[derive(Debug, Clone)]
pub struct OverviewReport {
    pub text: String,
    /// Number of retrieved chunks the prompt was grounded in.
    pub context_chunks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteStatus {
    Analyzed,
    Failed { reason: String },
}

/// Structured notes for one analyzed file.
#[derive(Debug, Clone)]
pub struct FileNote {
    pub file_name: String,
    pub relative_path: String,
    pub body: String,
    pub status: NoteStatus,
}

impl FileNote {
    pub fn analyzed(file: &CodeFile, body: &str) -> Self {
        Self {
            file_name: file.file_name(),
            relative_path: file.relative_path.clone(),
            body: body.trim().to_string(),
            status: NoteStatus::Analyzed,
        }
    }

    /// Placeholder note for a file whose model call failed.
    pub fn failed(file: &CodeFile, reason: &str) -> Self {
        Self {
            file_name: file.file_name(),
            relative_path: file.relative_path.clone(),
            body: format!(
                "Analysis failed for `{}`: {}",
                file.relative_path, reason
            ),
            status: NoteStatus::Failed {
                reason: reason.to_string(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, NoteStatus::Failed { .. })
    }
}

/// Locations of the two artifacts written by a successful run.
#[derive(Debug, Clone)]
pub struct GeneratedDoc {
    pub markdown_path: PathBuf,
    pub docx_path: PathBuf,
    pub files_discovered: usize,
    pub files_analyzed: usize,
    pub files_failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_file(rel: &str) -> CodeFile {
        CodeFile {
            path: PathBuf::from("/work/repo").join(rel),
            relative_path: rel.to_string(),
        }
    }

    #[test]
    fn file_name_is_base_name() {
        assert_eq!(code_file("src/app/main.py").file_name(), "main.py");
    }

    #[test]
    fn whitespace_only_content_is_empty() {
        let loaded = LoadedFile {
            file: code_file("a.py"),
            content: " \n\t\n".to_string(),
        };
        assert!(loaded.is_empty());
    }

    #[test]
    fn failed_note_mentions_path_and_reason() {
        let note = FileNote::failed(&code_file("pkg/util.go"), "timed out");
        assert!(note.is_failed());
        assert_eq!(note.file_name, "util.go");
        assert!(note.body.contains("pkg/util.go"));
        assert!(note.body.contains("timed out"));
    }

    #[test]
    fn analyzed_note_trims_body() {
        let note = FileNote::analyzed(&code_file("a.rs"), "\n\nPurpose: x\n\n");
        assert_eq!(note.body, "Purpose: x");
        assert!(!note.is_failed());
    }
}
