//! # docsummary
//!
//! Summarise pasted text or an uploaded document (`.txt`, `.md`, `.pdf`)
//! with a language model served locally by [Ollama](https://ollama.com).
//!
//! ## Pipeline Overview
//!
//! ```text
//! form / CLI
//!  │
//!  ├─ 1. Validate   something to summarise? allowed extension?
//!  ├─ 2. Extract    UTF-8 decode or per-page PDF text (spawn_blocking)
//!  ├─ 3. Select     the longer of pasted text and file text
//!  ├─ 4. Check      reject over 5000 chars, keep a 2000-char preview
//!  ├─ 5. Prompt     preamble + style instruction + first 4000 chars
//!  └─ 6. Generate   POST /api/generate, fold the NDJSON stream
//! ```
//!
//! Failures never escape as panics or HTTP 500s: input problems are
//! [`InputError`]s shown as flash messages, extraction problems degrade to
//! empty text, and inference problems become a warning in the summary field.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docsummary::{SummarizeRequest, Summarizer, SummarizerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let summarizer = Summarizer::new(SummarizerConfig::default())?;
//!     println!("{}", summarizer.status().await);
//!
//!     let summary = summarizer
//!         .summarize(SummarizeRequest {
//!             input_text: Some("Rust is a systems programming language...".into()),
//!             style: Some("bullet".into()),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("{}", summary.result.display_text());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docsummary` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod server;
pub mod stream;
pub mod summarize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{SummarizerConfig, SummarizerConfigBuilder, SummaryStyle};
pub use error::{ExtractError, InferenceError, InputError, SummarizerError};
pub use pipeline::extract::{extract, extract_or_empty, SourceDocument};
pub use pipeline::llm::{EndpointStatus, OllamaClient};
pub use prompts::build_prompt;
pub use server::{router, serve};
pub use stream::{fragment_stream, Chunk, FragmentStream};
pub use summarize::{
    select_source, PreparedRequest, Summarizer, SummarizeRequest, Summary, SummaryResult,
};
