//! Text extraction: turn an uploaded document's bytes into plain text.
//!
//! Dispatch is by file extension only; content sniffing is not attempted.
//!
//! | Extension | Strategy |
//! |-----------|----------|
//! | `txt`, `md` | UTF-8 decode, invalid sequences dropped |
//! | `pdf` | per-page text extraction, blank pages skipped, pages joined by a blank line |
//!
//! PDF parsing is CPU-bound and the parser can panic on hostile input, so it
//! runs inside `spawn_blocking`: a panic surfaces as a `JoinError` which is
//! reported as [`ExtractError::Parser`] instead of tearing down the worker.
//!
//! The handler calls [`extract_or_empty`]: for it "no text" is a valid
//! outcome (scanned, image-only PDFs), not an error.

use crate::error::ExtractError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info, warn};

/// An uploaded file, alive for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Filename as declared by the client.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a local file, keeping its file name as the declared name.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { filename, bytes })
    }

    /// Whether the client supplied a non-empty filename.
    pub fn is_named(&self) -> bool {
        !self.filename.is_empty()
    }
}

/// Lower-cased text after the last `.`, or `None` when there is no dot.
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Whether `filename` carries one of the `allowed` extensions.
pub fn is_allowed(filename: &str, allowed: &[String]) -> bool {
    extension_of(filename)
        .map(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)))
        .unwrap_or(false)
}

static RE_UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("static regex"));

/// Reduce a client-supplied filename to a safe ASCII name.
///
/// Path separators become spaces, whitespace runs become `_`, anything
/// outside `[A-Za-z0-9_.-]` is dropped and leading/trailing `.` and `_` are
/// stripped. `"../../etc/passwd"` becomes `"etc_passwd"`.
pub fn secure_filename(name: &str) -> String {
    let spaced = name.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    RE_UNSAFE_CHARS
        .replace_all(&joined, "")
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Decode bytes as UTF-8, discarding invalid sequences.
pub fn decode_text(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// Join per-page text: trim each page, skip empty ones, blank line between.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pages
        .into_iter()
        .filter_map(|p| {
            let t = p.as_ref().trim();
            (!t.is_empty()).then(|| t.to_string())
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Extract the text of every page of an in-memory PDF.
pub async fn extract_pdf_text(filename: &str, bytes: Vec<u8>) -> Result<String, ExtractError> {
    let task = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| e.to_string())
    })
    .await;

    let pages = match task {
        Ok(Ok(pages)) => pages,
        Ok(Err(detail)) => {
            return Err(ExtractError::Pdf {
                filename: filename.to_string(),
                detail,
            })
        }
        Err(join_err) => {
            return Err(ExtractError::Parser {
                filename: filename.to_string(),
                detail: join_err.to_string(),
            })
        }
    };

    debug!("PDF '{}': {} pages parsed", filename, pages.len());
    Ok(join_pages(pages))
}

/// Extract plain text from an uploaded document.
///
/// Dispatches on the extension of the sanitised filename.
pub async fn extract(document: SourceDocument) -> Result<String, ExtractError> {
    let safe_name = secure_filename(&document.filename);
    let extension = extension_of(&safe_name);

    let text = match extension.as_deref() {
        Some("txt") | Some("md") => decode_text(&document.bytes),
        Some("pdf") => extract_pdf_text(&safe_name, document.bytes).await?,
        _ => {
            return Err(ExtractError::UnsupportedExtension {
                filename: document.filename,
                extension,
            })
        }
    };

    info!(
        "Extracted {} chars from '{}'",
        text.chars().count(),
        safe_name
    );
    Ok(text)
}

/// [`extract`], degrading every failure to an empty string.
pub async fn extract_or_empty(document: SourceDocument) -> String {
    match extract(document).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Extraction failed, continuing with empty text: {}", e);
            String::new()
        }
    }
}
