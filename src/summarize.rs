//! Request handling: validate input, pick the source text, summarise.
//!
//! One call to [`Summarizer::summarize`] walks the whole pipeline for one
//! form submission:
//!
//! ```text
//! pasted text ─┐
//!              ├─▶ validate ─▶ extract ─▶ select ─▶ size check ─▶ prompt ─▶ Ollama
//! upload ──────┘
//! ```
//!
//! Input problems come back as [`InputError`]; everything past the size
//! check succeeds, with inference failures carried inside
//! [`SummaryResult::Failed`]. Nothing here is shared between requests except
//! the immutable configuration and the HTTP client.

use crate::config::{SummarizerConfig, SummaryStyle};
use crate::error::{InferenceError, InputError, SummarizerError};
use crate::pipeline::extract::{extract_or_empty, is_allowed, SourceDocument};
use crate::pipeline::llm::{EndpointStatus, OllamaClient};
use crate::prompts::{build_prompt, char_len, truncate_chars};
use std::sync::Arc;
use tracing::{debug, info};

/// One form submission.
#[derive(Debug, Clone, Default)]
pub struct SummarizeRequest {
    /// Pasted text, untrimmed.
    pub input_text: Option<String>,
    /// Uploaded file, if the form carried one.
    pub upload: Option<SourceDocument>,
    /// Raw `style` field.
    pub style: Option<String>,
}

/// What the model produced, or why it produced nothing.
#[derive(Debug)]
pub enum SummaryResult {
    Generated(String),
    Failed(InferenceError),
}

impl SummaryResult {
    /// Text for the summary field: the summary or a warning string.
    pub fn display_text(&self) -> String {
        match self {
            SummaryResult::Generated(text) => text.clone(),
            SummaryResult::Failed(e) => e.user_message(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SummaryResult::Failed(_))
    }
}

/// A completed summarisation, ready to render.
#[derive(Debug)]
pub struct Summary {
    pub result: SummaryResult,
    /// The text that was summarised (before prompt truncation).
    pub source_text: String,
    /// Style tag echoed back to the form.
    pub style: String,
}

/// A validated request with its prompt built, before inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub prompt: String,
    pub source_text: String,
    pub style: String,
}

/// Pick the text to summarise.
///
/// The file text wins only when it is strictly longer than the pasted text;
/// ties go to the pasted text.
pub fn select_source(pasted: String, file_text: String) -> String {
    if char_len(&file_text) > char_len(&pasted) {
        file_text
    } else {
        pasted
    }
}

/// The summarisation pipeline, shared by every request.
#[derive(Debug, Clone)]
pub struct Summarizer {
    config: Arc<SummarizerConfig>,
    client: OllamaClient,
}

impl Summarizer {
    pub fn new(config: SummarizerConfig) -> Result<Self, SummarizerError> {
        let client = OllamaClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    pub fn client(&self) -> &OllamaClient {
        &self.client
    }

    /// Liveness line for the page. Advisory only.
    pub async fn status(&self) -> EndpointStatus {
        self.client.probe().await
    }

    /// Validate, extract and select the source text, then build the prompt.
    ///
    /// Everything [`summarize`](Self::summarize) does short of calling the
    /// model; the CLI uses it to stream the reply instead.
    pub async fn prepare(&self, request: SummarizeRequest) -> Result<PreparedRequest, InputError> {
        let pasted = request
            .input_text
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        let upload = request.upload.filter(SourceDocument::is_named);
        let style = match request.style {
            Some(s) if !s.is_empty() => s,
            _ => SummaryStyle::Brief.as_str().to_string(),
        };

        if pasted.is_empty() && upload.is_none() {
            return Err(InputError::MissingInput);
        }

        let file_text = match upload {
            Some(document) => {
                if !is_allowed(&document.filename, &self.config.allowed_extensions) {
                    info!("Rejected upload '{}': extension not allowed", document.filename);
                    return Err(InputError::UnsupportedFileType {
                        filename: document.filename,
                        allowed: self.config.allowed_display(),
                    });
                }
                extract_or_empty(document).await
            }
            None => String::new(),
        };

        let source_text = select_source(pasted, file_text);
        let actual = char_len(&source_text);
        if actual > self.config.max_input_chars {
            info!(
                "Rejected input: {} chars over limit {}",
                actual, self.config.max_input_chars
            );
            return Err(InputError::TooLong {
                actual,
                limit: self.config.max_input_chars,
                preview: truncate_chars(&source_text, self.config.preview_chars).to_string(),
            });
        }

        let prompt = build_prompt(
            &source_text,
            SummaryStyle::from_tag(&style),
            self.config.prompt_char_limit,
        );
        debug!("Prompt built: {} chars, style '{}'", char_len(&prompt), style);

        Ok(PreparedRequest {
            prompt,
            source_text,
            style,
        })
    }

    /// Run one request through validation, extraction, selection and
    /// inference.
    pub async fn summarize(&self, request: SummarizeRequest) -> Result<Summary, InputError> {
        let prepared = self.prepare(request).await?;
        let result = self.client.generate_summary(&prepared.prompt).await;

        Ok(Summary {
            result,
            source_text: prepared.source_text,
            style: prepared.style,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn summarizer_for(server: &MockServer) -> Summarizer {
        let config = SummarizerConfig::builder()
            .endpoint(format!("{}/api/generate", server.uri()))
            .build()
            .unwrap();
        Summarizer::new(config).unwrap()
    }

    async fn mount_reply(server: &MockServer, text: &str, calls: u64) {
        let line = serde_json::json!({ "response": text, "done": true }).to_string();
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(line, "application/x-ndjson"))
            .expect(calls)
            .mount(server)
            .await;
    }

    fn text_request(text: &str) -> SummarizeRequest {
        SummarizeRequest {
            input_text: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn longer_text_wins() {
        let chosen = select_source("A".repeat(10), "B".repeat(20));
        assert_eq!(chosen, "B".repeat(20));
        let chosen = select_source("A".repeat(30), "B".repeat(20));
        assert_eq!(chosen, "A".repeat(30));
    }

    #[test]
    fn tie_goes_to_pasted_text() {
        assert_eq!(select_source("abc".into(), "xyz".into()), "abc");
    }

    #[test]
    fn display_text_for_success() {
        let r = SummaryResult::Generated("done".into());
        assert_eq!(r.display_text(), "done");
        assert!(!r.is_failure());
    }

    #[tokio::test]
    async fn missing_input_is_rejected() {
        let server = MockServer::start().await;
        mount_reply(&server, "unused", 0).await;
        let s = summarizer_for(&server).await;

        let err = s.summarize(text_request("   \n ")).await.unwrap_err();
        assert_eq!(err, InputError::MissingInput);

        let unnamed = SummarizeRequest {
            upload: Some(SourceDocument::new("", b"data".to_vec())),
            ..Default::default()
        };
        assert_eq!(s.summarize(unnamed).await.unwrap_err(), InputError::MissingInput);
    }

    #[tokio::test]
    async fn disallowed_extension_rejected_before_extraction() {
        let server = MockServer::start().await;
        mount_reply(&server, "unused", 0).await;
        let s = summarizer_for(&server).await;

        let req = SummarizeRequest {
            input_text: Some("some pasted text".into()),
            upload: Some(SourceDocument::new("payload.exe", vec![0x4d, 0x5a, 0x90])),
            style: None,
        };
        let err = s.summarize(req).await.unwrap_err();
        assert_eq!(
            err,
            InputError::UnsupportedFileType {
                filename: "payload.exe".into(),
                allowed: ".txt, .md, .pdf".into(),
            }
        );
    }

    #[tokio::test]
    async fn oversized_source_is_rejected_without_inference() {
        let server = MockServer::start().await;
        mount_reply(&server, "unused", 0).await;
        let s = summarizer_for(&server).await;

        let err = s.summarize(text_request(&"x".repeat(5001))).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("5001") && msg.contains("5000"), "got: {msg}");
        match err {
            InputError::TooLong { preview, .. } => assert_eq!(preview.len(), 2000),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn input_at_ceiling_is_summarised() {
        let server = MockServer::start().await;
        mount_reply(&server, "fine", 1).await;
        let s = summarizer_for(&server).await;

        let summary = s.summarize(text_request(&"x".repeat(5000))).await.unwrap();
        assert_eq!(summary.result.display_text(), "fine");
    }

    #[tokio::test]
    async fn uploaded_text_wins_when_longer() {
        let server = MockServer::start().await;
        mount_reply(&server, "summary of B", 1).await;
        let s = summarizer_for(&server).await;

        let req = SummarizeRequest {
            input_text: Some("A".repeat(10)),
            upload: Some(SourceDocument::new("notes.txt", "B".repeat(20).into_bytes())),
            style: Some("detailed".into()),
        };
        let summary = s.summarize(req).await.unwrap();
        assert_eq!(summary.source_text, "B".repeat(20));
        assert_eq!(summary.style, "detailed");
        assert_eq!(summary.result.display_text(), "summary of B");
    }

    #[tokio::test]
    async fn pasted_text_is_trimmed_and_style_defaults_to_brief() {
        let server = MockServer::start().await;
        mount_reply(&server, "ok", 1).await;
        let s = summarizer_for(&server).await;

        let summary = s.summarize(text_request("  body text \n")).await.unwrap();
        assert_eq!(summary.source_text, "body text");
        assert_eq!(summary.style, "brief");
    }

    #[tokio::test]
    async fn prepare_builds_prompt_for_requested_style() {
        let server = MockServer::start().await;
        mount_reply(&server, "unused", 0).await;
        let s = summarizer_for(&server).await;

        let req = SummarizeRequest {
            input_text: Some("Quarterly results were strong.".into()),
            style: Some("unknown-style".into()),
            upload: None,
        };
        let prepared = s.prepare(req).await.unwrap();
        assert_eq!(prepared.style, "unknown-style");
        assert!(prepared.prompt.contains(crate::prompts::BULLET_INSTRUCTION));
        assert!(prepared.prompt.contains("Quarterly results were strong."));
    }

    #[tokio::test]
    async fn unparseable_pdf_falls_back_to_pasted_text() {
        let server = MockServer::start().await;
        mount_reply(&server, "ok", 1).await;
        let s = summarizer_for(&server).await;

        let req = SummarizeRequest {
            input_text: Some("pasted".into()),
            upload: Some(SourceDocument::new("scan.pdf", b"%PDF-garbage".to_vec())),
            style: None,
        };
        let summary = s.summarize(req).await.unwrap();
        assert_eq!(summary.source_text, "pasted");
    }
}
