//! Archive extraction into a per-run working tree.
//!
//! The uploaded project arrives as ZIP bytes or a path to a ZIP file and is
//! unpacked under a fresh temporary directory. The [`ExtractedTree`] owns
//! that directory and deletes it when dropped, so a run never leaves its
//! working copy behind.

use std::fs;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::{DocError, Result};

/// Maximum decompressed bytes accepted for a single entry (zip-bomb protection).
pub const MAX_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// The uploaded project: raw bytes or a path to an archive on disk.
#[derive(Debug, Clone)]
pub enum SourceArchive {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

impl SourceArchive {
    pub fn describe(&self) -> String {
        match self {
            SourceArchive::Bytes(b) => format!("<{} bytes>", b.len()),
            SourceArchive::Path(p) => p.display().to_string(),
        }
    }
}

/// Directory tree produced by extraction. Removed on drop.
#[derive(Debug)]
pub struct ExtractedTree {
    _workdir: TempDir,
    root: PathBuf,
    files: usize,
}

impl ExtractedTree {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of regular files written during extraction.
    pub fn file_count(&self) -> usize {
        self.files
    }
}

/// Unpack an archive into a new temporary working tree.
///
/// Consumes the archive: once extracted, the tree is the only copy the
/// pipeline works from.
pub fn extract_archive(archive: SourceArchive) -> Result<ExtractedTree> {
    let workdir = tempfile::Builder::new()
        .prefix("fdoc-")
        .tempdir()
        .map_err(|e| DocError::Storage(format!("cannot create working directory: {}", e)))?;
    let root = workdir.path().join("repo");
    fs::create_dir_all(&root).map_err(|e| DocError::storage(&root, e))?;

    let files = match archive {
        SourceArchive::Bytes(bytes) => extract_from(Cursor::new(bytes), &root)?,
        SourceArchive::Path(path) => {
            let file = fs::File::open(&path).map_err(|e| {
                DocError::Extraction(format!("cannot open {}: {}", path.display(), e))
            })?;
            extract_from(file, &root)?
        }
    };

    info!(root = %root.display(), files, "archive extracted");
    Ok(ExtractedTree {
        _workdir: workdir,
        root,
        files,
    })
}

/// Unpack every entry of a ZIP stream under `dest`. Returns the number of files written.
pub fn extract_from<R: Read + Seek>(reader: R, dest: &Path) -> Result<usize> {
    let mut zip = zip::ZipArchive::new(reader)
        .map_err(|e| DocError::Extraction(format!("not a valid zip archive: {}", e)))?;

    let mut written = 0usize;
    for i in 0..zip.len() {
        let entry = zip
            .by_index(i)
            .map_err(|e| DocError::Extraction(format!("cannot read entry #{}: {}", i, e)))?;

        let name = entry.name().to_string();
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| DocError::Extraction(format!("unsafe entry path: {}", name)))?;
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| DocError::storage(&target, e))?;
            continue;
        }

        let mut data = Vec::new();
        entry
            .take(MAX_ENTRY_BYTES + 1)
            .read_to_end(&mut data)
            .map_err(|e| DocError::Extraction(format!("cannot decompress {}: {}", name, e)))?;
        if data.len() as u64 > MAX_ENTRY_BYTES {
            return Err(DocError::Extraction(format!(
                "entry {} exceeds size limit ({} bytes)",
                name, MAX_ENTRY_BYTES
            )));
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| DocError::storage(parent, e))?;
        }
        fs::write(&target, &data).map_err(|e| DocError::storage(&target, e))?;
        debug!(entry = %name, bytes = data.len(), "extracted");
        written += 1;
    }

    Ok(written)
}
