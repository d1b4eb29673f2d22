//! HTTP surface: the landing page and the summarise form.
//!
//! | Route | Behaviour |
//! |-------|-----------|
//! | `GET /` | landing page, style `brief`, liveness line, optional `?flash=` message |
//! | `POST /summarize` | multipart form (`input_text`, `file`, `style`) |
//!
//! Input errors that need no context (missing input, wrong file type) are
//! flashed through a `303` redirect back to `/`. An oversized input is
//! re-rendered in place so the user still sees a preview of what was sent.
//! Inference failures are not errors here: their warning text is rendered
//! as the summary with a `200`.

pub mod page;

use crate::error::SummarizerError;
use crate::pipeline::extract::SourceDocument;
use crate::summarize::{SummarizeRequest, Summarizer};
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use page::PageView;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

type SharedSummarizer = Arc<Summarizer>;

#[derive(Debug, Deserialize)]
struct IndexQuery {
    flash: Option<String>,
}

/// Build the application router.
pub fn router(summarizer: SharedSummarizer) -> Router {
    let body_limit = summarizer.config().max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/summarize", post(summarize))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(summarizer)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(summarizer: Summarizer, addr: &str) -> Result<(), SummarizerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| SummarizerError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    match listener.local_addr() {
        Ok(local) => info!("Listening on http://{}", local),
        Err(_) => info!("Listening on {}", addr),
    }
    info!(
        "Summaries from model '{}' at {}",
        summarizer.client().model(),
        summarizer.client().endpoint()
    );

    axum::serve(listener, router(Arc::new(summarizer)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(SummarizerError::Serve)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

async fn index(
    State(summarizer): State<SharedSummarizer>,
    Query(query): Query<IndexQuery>,
) -> Html<String> {
    let status = summarizer.status().await;
    Html(page::render(&PageView {
        flash: query.flash.as_deref(),
        summary: None,
        input_text: None,
        style: "brief",
        status: status.message(),
    }))
}

async fn summarize(State(summarizer): State<SharedSummarizer>, multipart: Multipart) -> Response {
    let request = match read_form(multipart).await {
        Ok(request) => request,
        Err(e) => {
            warn!("Malformed form submission: {}", e);
            return (StatusCode::BAD_REQUEST, format!("Malformed form data: {e}")).into_response();
        }
    };
    let requested_style = request
        .style
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "brief".to_string());

    match summarizer.summarize(request).await {
        Ok(summary) => {
            let status = summarizer.status().await;
            let text = summary.result.display_text();
            Html(page::render(&PageView {
                flash: None,
                summary: Some(&text),
                input_text: Some(&summary.source_text),
                style: &summary.style,
                status: status.message(),
            }))
            .into_response()
        }
        Err(err) if err.renders_in_place() => {
            let status = summarizer.status().await;
            let message = err.to_string();
            Html(page::render(&PageView {
                flash: Some(&message),
                summary: None,
                input_text: err.preview(),
                style: &requested_style,
                status: status.message(),
            }))
            .into_response()
        }
        Err(err) => flash_redirect(&err.to_string()).into_response(),
    }
}

fn flash_redirect(message: &str) -> Redirect {
    Redirect::to(&format!("/?flash={}", urlencoding::encode(message)))
}

/// Collect the known form fields; unknown fields are ignored.
async fn read_form(mut multipart: Multipart) -> Result<SummarizeRequest, MultipartError> {
    let mut request = SummarizeRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("input_text") => request.input_text = Some(field.text().await?),
            Some("style") => request.style = Some(field.text().await?),
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                request.upload = Some(SourceDocument::new(filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    Ok(request)
}
