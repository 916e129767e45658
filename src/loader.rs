//! Best-effort content loading.
//!
//! A file that cannot be read must not sink the whole run, so every failure
//! degrades to empty content. Callers treat empty content as "skip".

use std::path::Path;

use tracing::warn;

use crate::models::{CodeFile, LoadedFile};

/// Read a file as text. Invalid UTF-8 is replaced with U+FFFD; I/O errors yield `""`.
pub fn read_file_lossy(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        },
        Err(e) => {
            warn!(path = %path.display(), "unreadable file treated as empty: {}", e);
            String::new()
        }
    }
}

/// Load every discovered file, preserving discovery order.
pub fn load_files(files: &[CodeFile]) -> Vec<LoadedFile> {
    files
        .iter()
        .map(|file| LoadedFile {
            file: file.clone(),
            content: read_file_lossy(&file.path),
        })
        .collect()
}
