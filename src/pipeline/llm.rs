//! Ollama interaction: send the prompt, fold the streamed reply.
//!
//! All prompt text lives in [`crate::prompts`]; this module only moves bytes
//! and classifies failures. Two calls share one `reqwest::Client`:
//!
//! * [`OllamaClient::generate`] — the summarisation call. No timeout unless
//!   `request_timeout_secs` is configured; it blocks its own request until
//!   the stream ends or the connection fails.
//! * [`OllamaClient::probe`] — a short-timeout liveness check used only for
//!   the status line on the page. It never gates summarisation.

use crate::config::SummarizerConfig;
use crate::error::{InferenceError, SummarizerError};
use crate::stream::{fragment_stream, Chunk, FragmentStream};
use crate::summarize::SummaryResult;
use futures::StreamExt;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Liveness classification of the inference endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointStatus {
    /// Reachable and answered with a success status.
    Ready,
    /// Reachable but answered with an error status.
    Erroring,
    /// Connection refused, DNS failure or timeout.
    Unreachable,
}

impl EndpointStatus {
    pub fn message(&self) -> &'static str {
        match self {
            EndpointStatus::Ready => "Powered by Ollama LLaMA ✅",
            EndpointStatus::Erroring => "Powered by Ollama LLaMA ⚠️ (not responding)",
            EndpointStatus::Unreachable => "Powered by Ollama LLaMA ⚠️ (not running)",
        }
    }
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// HTTP client for Ollama's `/api/generate`.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    probe_prompt: String,
    probe_timeout: Duration,
    request_timeout: Option<Duration>,
}

impl OllamaClient {
    pub fn new(config: &SummarizerConfig) -> Result<Self, SummarizerError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(SummarizerError::HttpClient)?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            probe_prompt: config.probe_prompt.clone(),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
            request_timeout: config.request_timeout_secs.map(Duration::from_secs),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Start a generate call and return its decoded chunk stream.
    ///
    /// The HTTP status is returned alongside so callers can classify an
    /// empty stream.
    pub async fn stream(
        &self,
        prompt: &str,
    ) -> Result<(reqwest::StatusCode, FragmentStream), InferenceError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
        };
        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|source| InferenceError::Transport {
                url: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Endpoint answered HTTP {}", status);
        }
        Ok((status, fragment_stream(response)))
    }

    /// Send `prompt` and return the model's complete reply.
    pub async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let start = Instant::now();
        let (status, mut chunks) = self.stream(prompt).await?;

        let mut output = String::new();
        let mut fragments = 0usize;
        let mut server_errors = Vec::new();

        while let Some(chunk) = chunks.next().await {
            match chunk? {
                Chunk::Fragment(text) => {
                    fragments += 1;
                    output.push_str(&text);
                }
                Chunk::ServerError(message) => server_errors.push(message),
            }
        }

        debug!(
            "Generate: {} fragments, {} chars, {:?}",
            fragments,
            output.len(),
            start.elapsed()
        );

        if !output.is_empty() {
            info!(
                "Summary received: {} chars in {}ms",
                output.chars().count(),
                start.elapsed().as_millis()
            );
            return Ok(output);
        }

        if !server_errors.is_empty() {
            warn!(
                "No text from model '{}' (HTTP {}): {}",
                self.model,
                status,
                server_errors.join("; ")
            );
        }
        Err(InferenceError::EmptyResponse {
            model: self.model.clone(),
            status: status.as_u16(),
            server_errors,
        })
    }

    /// [`generate`](Self::generate), with failures kept as a displayable result.
    pub async fn generate_summary(&self, prompt: &str) -> SummaryResult {
        match self.generate(prompt).await {
            Ok(text) => SummaryResult::Generated(text),
            Err(e) => {
                warn!("Inference failed: {}", e);
                SummaryResult::Failed(e)
            }
        }
    }

    /// Send a trivial prompt with a short timeout and classify the outcome.
    pub async fn probe(&self) -> EndpointStatus {
        let body = GenerateRequest {
            model: &self.model,
            prompt: &self.probe_prompt,
        };
        let result = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .timeout(self.probe_timeout)
            .send()
            .await;

        let status = match result {
            Ok(response) if response.status().is_success() => EndpointStatus::Ready,
            Ok(response) => {
                debug!("Probe answered HTTP {}", response.status());
                EndpointStatus::Erroring
            }
            Err(e) => {
                debug!("Probe failed: {}", e);
                EndpointStatus::Unreachable
            }
        };
        debug!("Endpoint status: {:?}", status);
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NO_RESPONSE_WARNING;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> OllamaClient {
        let config = SummarizerConfig::builder()
            .endpoint(format!("{}/api/generate", server.uri()))
            .build()
            .unwrap();
        OllamaClient::new(&config).unwrap()
    }

    /// An endpoint URL on a port nothing listens on.
    async fn closed_endpoint() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/api/generate")
    }

    fn ndjson(lines: &[&str]) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .set_body_raw(lines.join("\n").into_bytes(), "application/x-ndjson")
    }

    #[tokio::test]
    async fn accumulates_fragments_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_json(serde_json::json!({
                "model": "llama3.2",
                "prompt": "Summarise this",
            })))
            .respond_with(ndjson(&[
                r#"{"response":"The ","done":false}"#,
                r#"{"response":"summary.","done":false}"#,
                r#"{"response":"","done":true}"#,
            ]))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.generate("Summarise this").await.unwrap(), "The summary.");
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ndjson(&[r#"{"response":"a"}"#, "{broken", r#"{"response":"b"}"#]))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.generate("p").await.unwrap(), "ab");
    }

    #[tokio::test]
    async fn empty_stream_yields_no_response_warning() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ndjson(&[r#"{"done":true}"#]))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result = client.generate_summary("p").await;
        assert!(result.is_failure());
        assert_eq!(result.display_text(), NO_RESPONSE_WARNING);
    }

    #[tokio::test]
    async fn error_status_without_text_yields_no_response_warning() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_raw(r#"{"error":"model 'llama3.2' not found"}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        match client.generate("p").await.unwrap_err() {
            InferenceError::EmptyResponse {
                status,
                server_errors,
                ..
            } => {
                assert_eq!(status, 404);
                assert_eq!(server_errors, vec!["model 'llama3.2' not found"]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(client.generate_summary("p").await.display_text(), NO_RESPONSE_WARNING);
    }

    #[tokio::test]
    async fn connection_refused_becomes_warning() {
        let config = SummarizerConfig::builder()
            .endpoint(closed_endpoint().await)
            .build()
            .unwrap();
        let client = OllamaClient::new(&config).unwrap();

        let result = client.generate_summary("p").await;
        let text = result.display_text();
        assert!(text.starts_with("⚠️ Error calling Ollama:"), "got: {text}");
        assert!(text.contains('\n'), "expected a diagnostic trace: {text}");
    }

    #[tokio::test]
    async fn probe_classifies_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({"model": "llama3.2", "prompt": "Hello"})))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        let client = client_for(&server).await;
        assert_eq!(client.probe().await, EndpointStatus::Ready);

        let failing = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&failing)
            .await;
        let client = client_for(&failing).await;
        assert_eq!(client.probe().await, EndpointStatus::Erroring);

        let config = SummarizerConfig::builder()
            .endpoint(closed_endpoint().await)
            .build()
            .unwrap();
        let client = OllamaClient::new(&config).unwrap();
        assert_eq!(client.probe().await, EndpointStatus::Unreachable);
    }

    #[tokio::test]
    async fn probe_times_out_as_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let config = SummarizerConfig::builder()
            .endpoint(format!("{}/api/generate", server.uri()))
            .probe_timeout_secs(1)
            .build()
            .unwrap();
        let client = OllamaClient::new(&config).unwrap();
        assert_eq!(client.probe().await, EndpointStatus::Unreachable);
    }

    #[test]
    fn status_messages_are_fixed() {
        assert_eq!(EndpointStatus::Ready.to_string(), "Powered by Ollama LLaMA ✅");
        assert_eq!(
            EndpointStatus::Erroring.to_string(),
            "Powered by Ollama LLaMA ⚠️ (not responding)"
        );
        assert_eq!(
            EndpointStatus::Unreachable.to_string(),
            "Powered by Ollama LLaMA ⚠️ (not running)"
        );
    }
}
