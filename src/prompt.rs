//! Prompt templates with named `{field}` placeholders.
//!
//! Filling is a single left-to-right pass: a placeholder is replaced only when
//! its name is one of the supplied fields, and substituted text is never
//! rescanned. Source code full of braces passes through untouched.

/// Project-level overview prompt. Fields: `context`.
pub const OVERVIEW_TEMPLATE: &str = "You are a senior software engineer. Summarize this codebase at a high functional level.
Provide:
1. Purpose of the application
2. Core features
3. Modules/components
4. API endpoints (if any)
5. UI features (if any)
6. Integrations (DB, APIs, auth, etc.)

Base your answer only on the indexed code excerpts below.

# Indexed code
{context}

# Answer";

/// Per-file analysis prompt. Fields: `filename`, `code`.
pub const FILE_TEMPLATE: &str = "You are a senior software engineer documenting a codebase.
Analyze the following file and produce structured notes.

# File
{filename}

# Code
{code}

# Instructions
1. State the purpose of this file.
2. List important functions, classes, or components and their roles.
3. Explain how it connects to other parts of the system.
4. Note any API routes, UI elements, configs, or special patterns.
5. Mention TODOs, risks, or tech debt if visible.

# Answer";

/// Substitute `{name}` placeholders from `fields`.
pub fn fill_template(template: &str, fields: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(
        template.len() + fields.iter().map(|(_, v)| v.len()).sum::<usize>(),
    );
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let name = &after[..close];
            fields
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });
        match replaced {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Overview prompt grounded in the retrieved chunks.
pub fn overview_prompt(chunks: &[&str], context_chars: usize) -> String {
    let context = chunks
        .iter()
        .enumerate()
        .map(|(i, text)| {
            format!(
                "## Excerpt {}\n```\n{}\n```",
                i + 1,
                truncate_chars(text, context_chars).trim_end()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    fill_template(OVERVIEW_TEMPLATE, &[("context", &context)])
}

/// Per-file prompt with the content cut to `max_chars` characters.
pub fn file_prompt(filename: &str, content: &str, max_chars: usize) -> String {
    fill_template(
        FILE_TEMPLATE,
        &[("filename", filename), ("code", truncate_chars(content, max_chars))],
    )
}
