//! Pipeline progress reporting.
//!
//! Reports observable progress during `fdoc generate` so users see which
//! stage is running and how many files remain. Progress is emitted on
//! **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event emitted by the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    Extracting,
    /// Discovery finished: recognized files and how many had content.
    Discovered { files: u64, non_empty: u64 },
    /// Embedding the corpus.
    Indexing { chunks: u64 },
    Overview,
    /// Per-file analysis: n notes collected out of total.
    Analyzing { n: u64, total: u64 },
    Rendering,
}

/// Reports pipeline progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "fdoc  analyzing  12 / 50 files".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Extracting => "fdoc  extracting archive...\n".to_string(),
            ProgressEvent::Discovered { files, non_empty } => format!(
                "fdoc  discovered  {} source files ({} with content)\n",
                format_number(*files),
                format_number(*non_empty)
            ),
            ProgressEvent::Indexing { chunks } => {
                format!("fdoc  indexing  {} chunks\n", format_number(*chunks))
            }
            ProgressEvent::Overview => "fdoc  writing overview...\n".to_string(),
            ProgressEvent::Analyzing { n, total } => format!(
                "fdoc  analyzing  {} / {} files\n",
                format_number(*n),
                format_number(*total)
            ),
            ProgressEvent::Rendering => "fdoc  rendering markdown + docx...\n".to_string(),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let obj = match &event {
            ProgressEvent::Extracting => serde_json::json!({
                "event": "progress",
                "phase": "extracting"
            }),
            ProgressEvent::Discovered { files, non_empty } => serde_json::json!({
                "event": "progress",
                "phase": "discovered",
                "files": files,
                "non_empty": non_empty
            }),
            ProgressEvent::Indexing { chunks } => serde_json::json!({
                "event": "progress",
                "phase": "indexing",
                "chunks": chunks
            }),
            ProgressEvent::Overview => serde_json::json!({
                "event": "progress",
                "phase": "overview"
            }),
            ProgressEvent::Analyzing { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "analyzing",
                "n": n,
                "total": total
            }),
            ProgressEvent::Rendering => serde_json::json!({
                "event": "progress",
                "phase": "rendering"
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
