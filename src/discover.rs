//! Source-file discovery over an extracted tree.
//!
//! Walks the tree recursively and keeps every regular file whose name ends
//! with one of the configured extensions. Everything else (binaries, assets,
//! docs, build output) is silently skipped. Results are sorted by relative
//! path so output does not depend on filesystem enumeration order.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::DiscoveryConfig;
use crate::error::{DocError, Result};
use crate::models::CodeFile;

/// Collect recognized source files under `root`, sorted by relative path.
pub fn discover_code_files(root: &Path, config: &DiscoveryConfig) -> Result<Vec<CodeFile>> {
    if !root.is_dir() {
        return Err(DocError::Storage(format!(
            "extracted tree does not exist: {}",
            root.display()
        )));
    }

    let exclude_set = build_globset(&config.exclude_globs)?;

    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // Unreadable directories are skipped, not fatal.
                warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy();
        if !has_code_extension(&file_name, &config.extensions) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if exclude_set.is_match(&rel_str) {
            debug!(path = %rel_str, "excluded by glob");
            continue;
        }

        files.push(CodeFile {
            path: path.to_path_buf(),
            relative_path: rel_str,
        });
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    debug!(count = files.len(), "discovered source files");
    Ok(files)
}

/// Suffix match against the allow-list (`.py`, `.rs`, ...).
pub fn has_code_extension(file_name: &str, extensions: &[String]) -> bool {
    extensions.iter().any(|ext| file_name.ends_with(ext.as_str()))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let invalid = |e: globset::Error| DocError::Config(format!("discovery.exclude_globs: {}", e));
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).map_err(invalid)?);
    }
    builder.build().map_err(invalid)
}
