//! The in-memory functional document and its Markdown projection.
//!
//! The overview and file notes are assembled once into a
//! [`FunctionalDocument`]. Both output formats are projections of
//! [`FunctionalDocument::blocks`], so the Markdown and DOCX files cannot drift
//! apart in content or ordering.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::OutputConfig;
use crate::docx;
use crate::error::{DocError, Result};
use crate::models::{FileNote, OverviewReport};

pub const OVERVIEW_HEADING: &str = "Overview";
pub const FILES_HEADING: &str = "File-by-File Analysis";

/// A flattened, ordered view of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block<'a> {
    Title(&'a str),
    /// `level` 1 for top-level sections, 2 for per-file sub-headings.
    Heading { level: u8, text: &'a str },
    Paragraph(&'a str),
}

#[derive(Debug, Clone)]
pub struct Section {
    pub heading: String,
    pub paragraphs: Vec<String>,
    pub subsections: Vec<Section>,
}

#[derive(Debug, Clone)]
pub struct FunctionalDocument {
    pub title: String,
    pub sections: Vec<Section>,
}

impl FunctionalDocument {
    /// Title, then the overview, then one subsection per note in the given order.
    pub fn new(title: &str, overview: &OverviewReport, notes: &[FileNote]) -> Self {
        let overview_section = Section {
            heading: OVERVIEW_HEADING.to_string(),
            paragraphs: split_paragraphs(&overview.text),
            subsections: Vec::new(),
        };
        let files_section = Section {
            heading: FILES_HEADING.to_string(),
            paragraphs: Vec::new(),
            subsections: notes
                .iter()
                .map(|note| Section {
                    heading: note.file_name.clone(),
                    paragraphs: split_paragraphs(&note.body),
                    subsections: Vec::new(),
                })
                .collect(),
        };

        Self {
            title: title.to_string(),
            sections: vec![overview_section, files_section],
        }
    }

    pub fn blocks(&self) -> Vec<Block<'_>> {
        let mut blocks = vec![Block::Title(&self.title)];
        for section in &self.sections {
            push_section(&mut blocks, section, 1);
        }
        blocks
    }
}

fn push_section<'a>(blocks: &mut Vec<Block<'a>>, section: &'a Section, level: u8) {
    blocks.push(Block::Heading {
        level,
        text: &section.heading,
    });
    for paragraph in &section.paragraphs {
        blocks.push(Block::Paragraph(paragraph));
    }
    for sub in &section.subsections {
        push_section(blocks, sub, level + 1);
    }
}

/// Split text on blank lines. Single newlines stay inside a paragraph.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }
    paragraphs
}

/// Render the document as Markdown.
///
/// Body text is model output and often carries its own Markdown headings.
/// Those lines are escaped so they render as plain text, leaving the heading
/// outline identical to the DOCX projection.
pub fn render_markdown(doc: &FunctionalDocument) -> String {
    let mut out = String::new();
    let mut in_fence = false;
    for block in doc.blocks() {
        match block {
            Block::Title(text) => {
                out.push_str("# ");
                out.push_str(text);
            }
            Block::Heading { level, text } => {
                in_fence = false;
                out.push_str(&"#".repeat(level as usize + 1));
                out.push(' ');
                out.push_str(text);
            }
            Block::Paragraph(text) => out.push_str(&escape_headings(text, &mut in_fence)),
        }
        out.push_str("\n\n");
    }
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
    out
}

/// Escape ATX (`# x`) and setext (`x` over `===`/`---`) heading lines.
///
/// Lines inside fenced code blocks are left alone. `in_fence` carries the
/// fence state across paragraphs, since a fence may contain blank lines.
fn escape_headings(text: &str, in_fence: &mut bool) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut prev_is_text = false;

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let indent = line.len() - line.trim_start_matches(' ').len();
        let body = &line[indent..];

        if body.starts_with("```") || body.starts_with("~~~") {
            *in_fence = !*in_fence;
            out.push_str(line);
            prev_is_text = false;
            continue;
        }
        if *in_fence || indent > 3 {
            out.push_str(line);
            prev_is_text = false;
            continue;
        }

        let atx = body.starts_with('#') && {
            let rest = body.trim_start_matches('#');
            body.len() - rest.len() <= 6 && (rest.is_empty() || rest.starts_with([' ', '\t']))
        };
        let trimmed = body.trim_end();
        let setext = prev_is_text
            && !trimmed.is_empty()
            && (trimmed.chars().all(|c| c == '=') || trimmed.chars().all(|c| c == '-'));

        if atx || setext {
            out.push_str(&line[..indent]);
            out.push('\\');
            out.push_str(body);
            prev_is_text = !atx;
        } else {
            out.push_str(line);
            prev_is_text = !body.trim().is_empty();
        }
    }
    out
}

/// Render both formats in memory, then write them into `dir`.
///
/// If the second write fails the first file is removed, so a failed run
/// leaves no partial output.
pub fn write_outputs(
    doc: &FunctionalDocument,
    dir: &Path,
    output: &OutputConfig,
) -> Result<(PathBuf, PathBuf)> {
    let markdown = render_markdown(doc);
    let docx_bytes = docx::render_docx(doc)
        .map_err(|e| DocError::Storage(format!("cannot render docx: {}", e)))?;

    let md_path = dir.join(&output.markdown_file);
    let docx_path = dir.join(&output.docx_file);

    fs::write(&md_path, markdown.as_bytes()).map_err(|e| DocError::storage(&md_path, e))?;
    if let Err(e) = fs::write(&docx_path, &docx_bytes) {
        let _ = fs::remove_file(&md_path);
        return Err(DocError::storage(&docx_path, e));
    }

    info!(
        markdown = %md_path.display(),
        docx = %docx_path.display(),
        "report written"
    );
    Ok((md_path, docx_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CodeFile, NoteStatus};

    fn note(name: &str, body: &str) -> FileNote {
        FileNote {
            file_name: name.to_string(),
            relative_path: format!("src/{}", name),
            body: body.to_string(),
            status: NoteStatus::Analyzed,
        }
    }

    fn overview(text: &str) -> OverviewReport {
        OverviewReport {
            text: text.to_string(),
            context_chunks: 1,
        }
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let paras = split_paragraphs("one\nline two\n\n\n  \nthree  \n");
        assert_eq!(paras, vec!["one\nline two", "three"]);
        assert!(split_paragraphs("  \n\n").is_empty());
    }

    #[test]
    fn block_order_is_title_overview_files() {
        let doc = FunctionalDocument::new(
            "Docs",
            &overview("Summary."),
            &[note("a.py", "A notes"), note("b.py", "B notes")],
        );
        assert_eq!(
            doc.blocks(),
            vec![
                Block::Title("Docs"),
                Block::Heading { level: 1, text: "Overview" },
                Block::Paragraph("Summary."),
                Block::Heading { level: 1, text: "File-by-File Analysis" },
                Block::Heading { level: 2, text: "a.py" },
                Block::Paragraph("A notes"),
                Block::Heading { level: 2, text: "b.py" },
                Block::Paragraph("B notes"),
            ]
        );
    }

    #[test]
    fn markdown_layout() {
        let doc = FunctionalDocument::new(
            "Project Functional Documentation",
            &overview("Purpose: demo.\n\nFeatures: none."),
            &[note("main.py", "Defines `main`.")],
        );
        let md = render_markdown(&doc);
        assert_eq!(
            md,
            "# Project Functional Documentation\n\n\
             ## Overview\n\n\
             Purpose: demo.\n\n\
             Features: none.\n\n\
             ## File-by-File Analysis\n\n\
             ### main.py\n\n\
             Defines `main`.\n"
        );
    }

    #[test]
    fn model_headings_in_bodies_are_escaped() {
        let doc = FunctionalDocument::new(
            "T",
            &overview("# Summary\n\n## Core features\nGreeting."),
            &[note("main.py", "### Purpose\nGreets.\n\nKey functions\n---\n- greet")],
        );
        let md = render_markdown(&doc);
        let headings: Vec<&str> = md.lines().filter(|l| l.starts_with('#')).collect();
        assert_eq!(
            headings,
            vec!["# T", "## Overview", "## File-by-File Analysis", "### main.py"]
        );
        assert!(md.contains("\\# Summary"));
        assert!(md.contains("\\## Core features\nGreeting."));
        assert!(md.contains("\\### Purpose\nGreets."));
        assert!(md.contains("Key functions\n\\---"));
    }

    #[test]
    fn fenced_code_and_plain_hashes_are_untouched() {
        let mut in_fence = false;
        let text = "```python\n# a comment\n```\n#hashtag and C# notes\n    # indented code";
        assert_eq!(escape_headings(text, &mut in_fence), text);
        assert!(!in_fence);

        // A fence opened in one paragraph stays open into the next.
        let mut in_fence = false;
        escape_headings("```", &mut in_fence);
        assert_eq!(escape_headings("# inside", &mut in_fence), "# inside");
        assert_eq!(escape_headings("```", &mut in_fence), "```");
        assert_eq!(escape_headings("# outside", &mut in_fence), "\\# outside");
    }

    #[test]
    fn list_items_and_rules_without_text_above_are_untouched() {
        let mut in_fence = false;
        assert_eq!(escape_headings("- item\n- other", &mut in_fence), "- item\n- other");
        assert_eq!(escape_headings("---", &mut in_fence), "---");
    }

    #[test]
    fn placeholder_notes_render_like_any_other() {
        let file = CodeFile {
            path: "/w/repo/x.rs".into(),
            relative_path: "x.rs".to_string(),
        };
        let doc = FunctionalDocument::new("T", &overview("o"), &[FileNote::failed(&file, "boom")]);
        let md = render_markdown(&doc);
        assert!(md.contains("### x.rs\n\nAnalysis failed for `x.rs`: boom"));
    }

    #[test]
    fn write_outputs_creates_both_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let doc = FunctionalDocument::new("T", &overview("o"), &[note("a.rs", "n")]);
        let (md, docx) = write_outputs(&doc, tmp.path(), &OutputConfig::default()).unwrap();
        assert_eq!(md, tmp.path().join("functional_doc.md"));
        assert!(md.is_file());
        assert!(docx.is_file());
    }

    #[test]
    fn write_outputs_into_missing_dir_is_storage_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let doc = FunctionalDocument::new("T", &overview("o"), &[]);
        let err = write_outputs(&doc, &tmp.path().join("absent"), &OutputConfig::default())
            .unwrap_err();
        assert!(matches!(err, DocError::Storage(_)));
    }
}
