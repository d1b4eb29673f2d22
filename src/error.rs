//! Error types for the docsummary library.
//!
//! Four error types reflect four audiences:
//!
//! * [`InputError`] — **User input rejected**: nothing to summarise, an
//!   unsupported upload, or text over the size ceiling. `Display` is the
//!   exact flash message the page shows.
//!
//! * [`ExtractError`] — **Extraction failed**: a corrupt or image-only PDF,
//!   a parser panic. Never shown to the user; the handler degrades it to
//!   empty text via [`crate::pipeline::extract::extract_or_empty`].
//!
//! * [`InferenceError`] — **Model call failed**: connection refused, timeout,
//!   or a stream that carried no text. Rendered into the summary field as a
//!   warning string by [`crate::summarize::SummaryResult::display_text`].
//!
//! * [`SummarizerError`] — **Fatal**: invalid configuration, the HTTP client
//!   cannot be built, the server cannot bind. Only constructors and
//!   [`crate::server::serve`] return it.

use std::error::Error as StdError;
use thiserror::Error;

/// Fatal, process-level errors.
#[derive(Debug, Error)]
pub enum SummarizerError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The shared HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// The listener could not bind to the requested address.
    #[error("Failed to bind '{addr}': {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The server loop exited with an I/O error.
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// A request the handler refuses to summarise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Neither pasted text nor a named upload was supplied.
    #[error("Please provide text or upload a file to summarize.")]
    MissingInput,

    /// The upload's extension is not in the allowed set.
    #[error("Unsupported file type. Allowed: {allowed}")]
    UnsupportedFileType { filename: String, allowed: String },

    /// The selected source text exceeds the character ceiling.
    ///
    /// `preview` holds the first `preview_chars` characters of the source so
    /// the page can still show what was submitted.
    #[error("Input too long ({actual} chars). Limit is {limit}.")]
    TooLong {
        actual: usize,
        limit: usize,
        preview: String,
    },
}

impl InputError {
    /// Whether the page should be re-rendered in place (with the preview)
    /// rather than redirected back to the landing page.
    pub fn renders_in_place(&self) -> bool {
        matches!(self, InputError::TooLong { .. })
    }

    /// Preview of the rejected input, when there is one to show.
    pub fn preview(&self) -> Option<&str> {
        match self {
            InputError::TooLong { preview, .. } => Some(preview),
            _ => None,
        }
    }
}

/// Text extraction failed for an uploaded document.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The PDF parser rejected the byte stream.
    #[error("PDF '{filename}' could not be parsed: {detail}")]
    Pdf { filename: String, detail: String },

    /// The parser panicked or its blocking task was cancelled.
    #[error("PDF parser aborted on '{filename}': {detail}")]
    Parser { filename: String, detail: String },

    /// No extractor exists for this extension.
    #[error("No extractor for '{filename}' (extension {extension:?})")]
    UnsupportedExtension {
        filename: String,
        extension: Option<String>,
    },
}

/// The inference endpoint could not produce a summary.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Connecting, sending, or reading the body failed.
    #[error("{source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The stream ended without a single `response` fragment.
    ///
    /// Covers error statuses too: a 404 for a model that was never pulled
    /// carries only an `error` line, kept in `server_errors`.
    #[error("no response fragments received from model '{model}' (HTTP {status})")]
    EmptyResponse {
        model: String,
        status: u16,
        server_errors: Vec<String>,
    },
}

/// Fixed warning shown when the stream carried no text.
pub const NO_RESPONSE_WARNING: &str =
    "⚠️ No response from Ollama. Please check if the model is running.";

impl InferenceError {
    /// The warning string shown in place of a summary.
    ///
    /// Failures embed the message followed by a diagnostic trace built from
    /// the error's source chain.
    pub fn user_message(&self) -> String {
        match self {
            InferenceError::EmptyResponse { .. } => NO_RESPONSE_WARNING.to_string(),
            other => format!(
                "⚠️ Error calling Ollama: {}\n{}",
                other,
                other.diagnostic()
            ),
        }
    }

    /// One line per error in the source chain, outermost first.
    pub fn diagnostic(&self) -> String {
        let mut lines = vec![self.kind().to_string()];
        if let InferenceError::Transport { url, .. } = self {
            lines.push(format!("  endpoint: {url}"));
        }
        let mut source = StdError::source(self);
        while let Some(err) = source {
            lines.push(format!("  caused by: {err}"));
            source = err.source();
        }
        lines.join("\n")
    }

    fn kind(&self) -> &'static str {
        match self {
            InferenceError::Transport { source, .. } if source.is_connect() => "connect error",
            InferenceError::Transport { source, .. } if source.is_timeout() => "timeout",
            InferenceError::Transport { source, .. } if source.is_body() => "body read error",
            InferenceError::Transport { .. } => "transport error",
            InferenceError::EmptyResponse { .. } => "empty response",
        }
    }
}
