//! Pipeline stages for document summarisation.
//!
//! Each submodule implements exactly one step, so each is testable without
//! the others.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ extract ──▶ (prompts) ──▶ llm ──▶ summary
//! (bytes)    (text)      (prompt)     (Ollama)
//! ```
//!
//! 1. [`extract`] — dispatch on file extension and produce plain text;
//!    PDF parsing runs in `spawn_blocking`
//! 2. [`llm`]     — POST the prompt to Ollama and fold the streamed reply;
//!    the only stage with network I/O

pub mod extract;
pub mod llm;
