//! Configuration types for the summarisation pipeline.
//!
//! Every limit and endpoint lives in one immutable [`SummarizerConfig`],
//! built once at start-up via its [`SummarizerConfigBuilder`] and shared
//! behind an `Arc` by the extractor, the inference client and the HTTP
//! handlers. Nothing mutates it after `build()`.

use crate::error::SummarizerError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default Ollama generate endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/generate";

/// Default model identifier sent with every request.
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Configuration for the summariser.
///
/// # Example
/// ```rust
/// use docsummary::SummarizerConfig;
///
/// let config = SummarizerConfig::builder()
///     .model("mistral")
///     .max_input_chars(8000)
///     .build()
///     .unwrap();
/// assert_eq!(config.prompt_char_limit, 4000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Ollama `/api/generate` URL. Default: `http://localhost:11434/api/generate`.
    pub endpoint: String,

    /// Model identifier, e.g. "llama3.2". Default: `llama3.2`.
    pub model: String,

    /// Upload extensions accepted by the handler, lower-case, no dot.
    /// Default: `txt`, `md`, `pdf`.
    pub allowed_extensions: Vec<String>,

    /// Ceiling on the selected source text, in characters. Default: 5000.
    ///
    /// Anything longer is rejected before a prompt is built.
    pub max_input_chars: usize,

    /// Characters of source text embedded in the prompt. Default: 4000.
    ///
    /// Applied silently on top of `max_input_chars`.
    pub prompt_char_limit: usize,

    /// Characters of oversized input echoed back to the page. Default: 2000.
    pub preview_chars: usize,

    /// Timeout for the liveness probe in seconds. Default: 2.
    pub probe_timeout_secs: u64,

    /// Prompt sent by the liveness probe. Default: "Hello".
    pub probe_prompt: String,

    /// Optional timeout for the summarisation call. Default: none.
    pub request_timeout_secs: Option<u64>,

    /// Maximum accepted request body for the upload form. Default: 16 MiB.
    pub max_upload_bytes: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            allowed_extensions: vec!["txt".into(), "md".into(), "pdf".into()],
            max_input_chars: 5000,
            prompt_char_limit: 4000,
            preview_chars: 2000,
            probe_timeout_secs: 2,
            probe_prompt: "Hello".to_string(),
            request_timeout_secs: None,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl SummarizerConfig {
    /// Create a new builder for `SummarizerConfig`.
    pub fn builder() -> SummarizerConfigBuilder {
        SummarizerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether `extension` (any case) is in the allowed set.
    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }

    /// Allowed extensions as shown to users: ".txt, .md, .pdf".
    pub fn allowed_display(&self) -> String {
        self.allowed_extensions
            .iter()
            .map(|e| format!(".{e}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Builder for [`SummarizerConfig`].
#[derive(Debug)]
pub struct SummarizerConfigBuilder {
    config: SummarizerConfig,
}

impl SummarizerConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    pub fn max_input_chars(mut self, n: usize) -> Self {
        self.config.max_input_chars = n;
        self
    }

    pub fn prompt_char_limit(mut self, n: usize) -> Self {
        self.config.prompt_char_limit = n;
        self
    }

    pub fn preview_chars(mut self, n: usize) -> Self {
        self.config.preview_chars = n;
        self
    }

    pub fn probe_timeout_secs(mut self, secs: u64) -> Self {
        self.config.probe_timeout_secs = secs.max(1);
        self
    }

    pub fn probe_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.probe_prompt = prompt.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SummarizerConfig, SummarizerError> {
        let c = &self.config;
        match reqwest::Url::parse(&c.endpoint) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(SummarizerError::InvalidConfig(format!(
                    "Endpoint must be http or https, got scheme '{}'",
                    url.scheme()
                )))
            }
            Err(e) => {
                return Err(SummarizerError::InvalidConfig(format!(
                    "Endpoint '{}' is not a valid URL: {}",
                    c.endpoint, e
                )))
            }
        }
        if c.model.trim().is_empty() {
            return Err(SummarizerError::InvalidConfig(
                "Model name must not be empty".into(),
            ));
        }
        if c.allowed_extensions.is_empty() || c.allowed_extensions.iter().any(|e| e.is_empty()) {
            return Err(SummarizerError::InvalidConfig(
                "At least one non-empty file extension must be allowed".into(),
            ));
        }
        if c.max_input_chars == 0 || c.prompt_char_limit == 0 {
            return Err(SummarizerError::InvalidConfig(
                "Character limits must be ≥ 1".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(SummarizerError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Summarisation mode selected on the form.
///
/// | Style | Instruction |
/// |-------|-------------|
/// | `brief` | 1–2 sentences, main idea + conclusions (default) |
/// | `detailed` | a few paragraphs, key points + conclusions |
/// | `bullet` | 3–10 bullet items, main ideas + takeaways |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStyle {
    #[default]
    Brief,
    Detailed,
    Bullet,
}

impl SummaryStyle {
    /// Map a style tag onto the instruction table.
    ///
    /// Only the exact tags `brief` and `detailed` are special; every other
    /// value, the empty string included, selects the bullet list.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "brief" => SummaryStyle::Brief,
            "detailed" => SummaryStyle::Detailed,
            _ => SummaryStyle::Bullet,
        }
    }

    /// Resolve the form field: absent or empty means `brief`.
    pub fn from_form(field: Option<&str>) -> Self {
        match field {
            None | Some("") => SummaryStyle::Brief,
            Some(tag) => Self::from_tag(tag),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryStyle::Brief => "brief",
            SummaryStyle::Detailed => "detailed",
            SummaryStyle::Bullet => "bullet",
        }
    }

    /// Every style, in the order the page lists them.
    pub const ALL: [SummaryStyle; 3] = [
        SummaryStyle::Brief,
        SummaryStyle::Detailed,
        SummaryStyle::Bullet,
    ];
}

impl fmt::Display for SummaryStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let c = SummarizerConfig::default();
        assert_eq!(c.endpoint, "http://localhost:11434/api/generate");
        assert_eq!(c.model, "llama3.2");
        assert_eq!(c.max_input_chars, 5000);
        assert_eq!(c.prompt_char_limit, 4000);
        assert_eq!(c.preview_chars, 2000);
        assert_eq!(c.probe_timeout_secs, 2);
        assert_eq!(c.allowed_display(), ".txt, .md, .pdf");
    }

    #[test]
    fn allows_extension_is_case_insensitive() {
        let c = SummarizerConfig::default();
        assert!(c.allows_extension("PDF"));
        assert!(c.allows_extension("md"));
        assert!(!c.allows_extension("exe"));
    }

    #[test]
    fn builder_normalises_extensions() {
        let c = SummarizerConfig::builder()
            .allowed_extensions([".TXT", "rst"])
            .build()
            .unwrap();
        assert_eq!(c.allowed_extensions, vec!["txt", "rst"]);
    }

    #[test]
    fn build_rejects_bad_endpoint() {
        let err = SummarizerConfig::builder()
            .endpoint("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, SummarizerError::InvalidConfig(_)));

        let err = SummarizerConfig::builder()
            .endpoint("ftp://localhost/api")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("ftp"));
    }

    #[test]
    fn build_rejects_empty_model_and_zero_limits() {
        assert!(SummarizerConfig::builder().model("  ").build().is_err());
        assert!(SummarizerConfig::builder().max_input_chars(0).build().is_err());
        assert!(SummarizerConfig::builder()
            .allowed_extensions(Vec::<String>::new())
            .build()
            .is_err());
    }

    #[test]
    fn style_from_form_defaults_to_brief() {
        assert_eq!(SummaryStyle::from_form(None), SummaryStyle::Brief);
        assert_eq!(SummaryStyle::from_form(Some("")), SummaryStyle::Brief);
        assert_eq!(SummaryStyle::from_form(Some("detailed")), SummaryStyle::Detailed);
    }

    #[test]
    fn unknown_tag_falls_through_to_bullet() {
        assert_eq!(SummaryStyle::from_tag("bullet"), SummaryStyle::Bullet);
        assert_eq!(SummaryStyle::from_tag("haiku"), SummaryStyle::Bullet);
        assert_eq!(SummaryStyle::from_tag(""), SummaryStyle::Bullet);
        assert_eq!(SummaryStyle::from_tag("Brief"), SummaryStyle::Bullet);
    }
}
