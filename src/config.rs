use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Environment variable holding the API key. Defaults per provider.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            url: None,
            api_key_env: None,
            temperature: 0.0,
            timeout_secs: default_llm_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_llm_provider() -> String {
    "groq".to_string()
}
fn default_llm_model() -> String {
    "llama-3.1-8b-instant".to_string()
}
fn default_llm_timeout_secs() -> u64 {
    120
}
fn default_max_retries() -> u32 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Characters of each text sent to the embedder. The indexed chunk keeps its full text.
    #[serde(default = "default_embed_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_embed_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_chars: default_embed_max_chars(),
            max_retries: default_max_retries(),
            timeout_secs: default_embed_timeout_secs(),
        }
    }
}

fn default_embedding_provider() -> String {
    "ollama".to_string()
}
fn default_batch_size() -> usize {
    32
}
fn default_embed_max_chars() -> usize {
    8000
}
fn default_embed_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_query")]
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Per-chunk character budget inside the overview prompt.
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            query: default_query(),
            top_k: default_top_k(),
            context_chars: default_context_chars(),
        }
    }
}

fn default_query() -> String {
    "Give me a detailed overview of the codebase".to_string()
}
fn default_top_k() -> usize {
    8
}
fn default_context_chars() -> usize {
    4000
}

/// What to do when the model call for a single file fails.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Emit a note stating that analysis failed for the file.
    #[default]
    Placeholder,
    /// Fail the whole run.
    Abort,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    #[serde(default = "default_analysis_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub on_failure: FailurePolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_chars: default_analysis_max_chars(),
            concurrency: default_concurrency(),
            on_failure: FailurePolicy::default(),
        }
    }
}

fn default_max_files() -> usize {
    50
}
fn default_analysis_max_chars() -> usize {
    4000
}
fn default_concurrency() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscoveryConfig {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

pub fn default_extensions() -> Vec<String> {
    [
        ".py", ".js", ".jsx", ".ts", ".tsx", ".java", ".cs", ".cpp", ".c", ".go", ".rb", ".php",
        ".swift", ".kt", ".scala", ".rs", ".dart",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_markdown_file")]
    pub markdown_file: String,
    #[serde(default = "default_docx_file")]
    pub docx_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            markdown_file: default_markdown_file(),
            docx_file: default_docx_file(),
        }
    }
}

fn default_title() -> String {
    "Project Functional Documentation".to_string()
}
fn default_markdown_file() -> String {
    "functional_doc.md".to_string()
}
fn default_docx_file() -> String {
    "functional_doc.docx".to_string()
}

/// Commented configuration written by `fdoc init`.
pub const EXAMPLE_CONFIG: &str = include_str!("../config/fdoc.example.toml");

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    match config.llm.provider.as_str() {
        "groq" | "openai" | "ollama" => {}
        other => bail!(
            "Unknown llm provider: '{}'. Must be groq, openai, or ollama.",
            other
        ),
    }
    if config.llm.model.trim().is_empty() {
        bail!("llm.model must not be empty");
    }
    if !(0.0..=2.0).contains(&config.llm.temperature) {
        bail!("llm.temperature must be in [0.0, 2.0]");
    }

    match config.embedding.provider.as_str() {
        "openai" | "ollama" | "local" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be openai, ollama, or local.",
            other
        ),
    }
    if config.embedding.dims == Some(0) {
        bail!("embedding.dims must be > 0 when set");
    }
    if config.embedding.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }
    if config.embedding.max_chars == 0 {
        bail!("embedding.max_chars must be > 0");
    }

    if config.retrieval.top_k < 1 {
        bail!("retrieval.top_k must be >= 1");
    }
    if config.retrieval.context_chars == 0 {
        bail!("retrieval.context_chars must be > 0");
    }

    if config.analysis.max_files < 1 {
        bail!("analysis.max_files must be >= 1");
    }
    if config.analysis.max_chars < 1 {
        bail!("analysis.max_chars must be >= 1");
    }
    if config.analysis.concurrency < 1 {
        bail!("analysis.concurrency must be >= 1");
    }

    if config.discovery.extensions.is_empty() {
        bail!("discovery.extensions must not be empty");
    }
    for ext in &config.discovery.extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            bail!("discovery.extensions entries must look like '.py', got '{}'", ext);
        }
    }

    for (key, name) in [
        ("output.markdown_file", &config.output.markdown_file),
        ("output.docx_file", &config.output.docx_file),
    ] {
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            bail!("{} must be a plain file name, got '{}'", key, name);
        }
    }
    if config.output.markdown_file == config.output.docx_file {
        bail!("output.markdown_file and output.docx_file must differ");
    }

    Ok(())
}
