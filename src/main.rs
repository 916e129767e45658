//! # Functional Doc CLI (`fdoc`)
//!
//! Generates a functional documentation report from a ZIP archive of source
//! code.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fdoc generate <ARCHIVE>` | Run the full pipeline and write `.md` + `.docx` |
//! | `fdoc discover <ARCHIVE>` | List the files a run would analyze, without model calls |
//! | `fdoc init [PATH]` | Write an example configuration file |
//!
//! ## Examples
//!
//! ```bash
//! # Generate into ./docs with the default Groq + Ollama setup
//! GROQ_API_KEY=... fdoc generate project.zip --out ./docs
//!
//! # Analyze at most 10 files, failing on the first model error
//! fdoc generate project.zip --max-files 10 --on-failure abort
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use functional_doc::archive::SourceArchive;
use functional_doc::config::{self, Config, FailurePolicy, EXAMPLE_CONFIG};
use functional_doc::pipeline::{generate_functional_doc, survey_archive, ModelClients};
use functional_doc::progress::{format_number, ProgressMode};

const DEFAULT_CONFIG_FILE: &str = "fdoc.toml";

/// Functional Doc: turn a source archive into functional documentation.
#[derive(Parser)]
#[command(
    name = "fdoc",
    about = "Generate functional documentation (Markdown + DOCX) from a source-code archive",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// When omitted, `./fdoc.toml` is used if present, otherwise built-in
    /// defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the documentation report.
    ///
    /// Writes `functional_doc.md` and `functional_doc.docx` into the output
    /// directory, replacing any previous report there. Ctrl-C cancels the run;
    /// a second Ctrl-C exits immediately.
    Generate {
        /// ZIP archive of the project.
        archive: PathBuf,

        /// Output directory.
        #[arg(long, default_value = "./output")]
        out: PathBuf,

        /// Maximum number of files to analyze (overrides `[analysis].max_files`).
        #[arg(long)]
        max_files: Option<usize>,

        /// Concurrent model calls (overrides `[analysis].concurrency`).
        #[arg(long)]
        concurrency: Option<usize>,

        /// What to do when analysis of one file fails.
        #[arg(long, value_enum)]
        on_failure: Option<FailurePolicy>,

        /// Progress output on stderr. Defaults to `human` on a terminal.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// List recognized source files without calling any model.
    Discover {
        /// ZIP archive of the project.
        archive: PathBuf,

        /// Maximum number of files to analyze (overrides `[analysis].max_files`).
        #[arg(long)]
        max_files: Option<usize>,
    },

    /// Write a commented example configuration.
    Init {
        /// Destination file.
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => config::load_config(path),
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if fallback.is_file() {
                config::load_config(fallback)
            } else {
                Ok(Config::default())
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path } => {
            if path.exists() {
                bail!("Config file already exists: {}", path.display());
            }
            std::fs::write(&path, EXAMPLE_CONFIG)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote example configuration to {}", path.display());
        }
        Commands::Discover { archive, max_files } => {
            let mut cfg = resolve_config(cli.config.as_deref())?;
            if let Some(n) = max_files {
                cfg.analysis.max_files = n;
            }
            config::validate(&cfg)?;

            let entries = survey_archive(&cfg, SourceArchive::Path(archive.clone()))?;
            println!("discover {} (dry-run)", archive.display());
            for entry in &entries {
                let status = if entry.empty {
                    "empty"
                } else if entry.within_cap {
                    "analyze"
                } else {
                    "over cap"
                };
                println!(
                    "  {:<60} {:>12} bytes  {}",
                    entry.relative_path,
                    format_number(entry.bytes),
                    status
                );
            }
            let non_empty = entries.iter().filter(|e| !e.empty).count();
            let selected = entries.iter().filter(|e| e.within_cap).count();
            println!("  source files: {}", entries.len());
            println!("  non-empty: {}", non_empty);
            println!("  to analyze: {} (cap {})", selected, cfg.analysis.max_files);
        }
        Commands::Generate {
            archive,
            out,
            max_files,
            concurrency,
            on_failure,
            progress,
        } => {
            let mut cfg = resolve_config(cli.config.as_deref())?;
            if let Some(n) = max_files {
                cfg.analysis.max_files = n;
            }
            if let Some(n) = concurrency {
                cfg.analysis.concurrency = n;
            }
            if let Some(policy) = on_failure {
                cfg.analysis.on_failure = policy;
            }
            config::validate(&cfg)?;

            let clients = ModelClients::from_config(&cfg)?;
            let reporter = progress
                .unwrap_or_else(ProgressMode::default_for_tty)
                .reporter();

            let cancel = CancellationToken::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    if trigger.is_cancelled() {
                        eprintln!("fdoc  interrupted again, exiting");
                        std::process::exit(130);
                    }
                    eprintln!("fdoc  cancelling... (Ctrl-C again to exit now)");
                    trigger.cancel();
                }
            });

            let doc = generate_functional_doc(
                &cfg,
                &clients,
                SourceArchive::Path(archive),
                &out,
                &cancel,
                reporter.as_ref(),
            )
            .await?;

            println!("Documentation generated:");
            println!("  {}", doc.markdown_path.display());
            println!("  {}", doc.docx_path.display());
            if doc.files_failed > 0 {
                eprintln!(
                    "warning: analysis failed for {} of {} files; see the placeholder notes",
                    doc.files_failed,
                    doc.files_analyzed + doc.files_failed
                );
            }
        }
    }

    Ok(())
}
