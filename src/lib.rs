//! # Functional Doc
//!
//! Turns an archive of source code into a functional documentation report,
//! written both as Markdown and as a Word (`.docx`) document.
//!
//! The report has a project-level overview grounded in retrieval over an
//! in-memory semantic index of the code, followed by one section per source
//! file produced by a bounded pool of model calls.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌─────────────┐
//! │ archive  │──▶│ discover  │──▶│  loader  │──▶│    index    │
//! │  (zip)   │   │ (walkdir) │   │ (lossy)  │   │ (embedding) │
//! └──────────┘   └───────────┘   └────┬─────┘   └──────┬──────┘
//!                                     │                │
//!                                     ▼                ▼
//!                               ┌──────────┐     ┌──────────┐
//!                               │ analyze  │     │ overview │
//!                               │  (llm)   │     │  (llm)   │
//!                               └────┬─────┘     └────┬─────┘
//!                                    └───────┬────────┘
//!                                            ▼
//!                                  ┌──────────────────┐
//!                                  │ report + docx    │
//!                                  │ (.md and .docx)  │
//!                                  └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! fdoc init                         # write ./fdoc.toml
//! fdoc discover project.zip         # see what would be analyzed
//! fdoc generate project.zip --out ./docs
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`error`] | Pipeline error taxonomy |
//! | [`models`] | Core data types |
//! | [`archive`] | Safe ZIP extraction into a temporary tree |
//! | [`discover`] | Source file discovery by extension |
//! | [`loader`] | Lossy UTF-8 content loading |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`llm`] | Generative model provider abstraction |
//! | [`http`] | Shared HTTP client and retry policy |
//! | [`prompt`] | Prompt templates |
//! | [`index`] | In-memory semantic index |
//! | [`overview`] | Retrieval-grounded project overview |
//! | [`analyze`] | Bounded concurrent per-file analysis |
//! | [`report`] | Document tree and Markdown rendering |
//! | [`docx`] | Word document rendering |
//! | [`pipeline`] | End-to-end orchestration |
//! | [`progress`] | Progress reporting on stderr |

pub mod analyze;
pub mod archive;
pub mod config;
pub mod discover;
pub mod docx;
pub mod embedding;
pub mod error;
pub mod http;
pub mod index;
pub mod llm;
pub mod loader;
pub mod models;
pub mod overview;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod report;
