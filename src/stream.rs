//! Newline-delimited JSON decoding for the Ollama generate stream.
//!
//! Ollama answers `/api/generate` with one JSON object per line:
//!
//! ```text
//! {"model":"llama3.2","response":"The","done":false}
//! {"model":"llama3.2","response":" document","done":false}
//! {"model":"llama3.2","response":"","done":true,"total_duration":...}
//! ```
//!
//! Network chunks do not respect line boundaries, so [`NdjsonDecoder`]
//! buffers partial lines and only parses complete ones. [`fragment_stream`]
//! wraps a response body into a `Stream` of [`Chunk`]s; the inference client
//! folds it into one string and the CLI prints fragments as they arrive.

use crate::error::InferenceError;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::collections::VecDeque;
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::{debug, warn};

/// One decoded line of the generate stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// A `response` text fragment, in arrival order.
    Fragment(String),
    /// An `error` field reported by the endpoint.
    ServerError(String),
}

/// A boxed stream of decoded chunks.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Chunk, InferenceError>> + Send>>;

#[derive(Debug, Deserialize)]
struct GenerateLine {
    response: Option<String>,
    error: Option<String>,
}

/// Incremental line splitter + JSON decoder.
///
/// Feed it arbitrary byte chunks with [`push`](Self::push); call
/// [`finish`](Self::finish) once the body ends to flush a final line that
/// had no trailing newline. Malformed lines are skipped.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buf: Vec<u8>,
    skipped: usize,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every complete line in `bytes`, buffering the remainder.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Chunk> {
        self.buf.extend_from_slice(bytes);
        let mut out = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.buf[start..].iter().position(|&b| b == b'\n') {
            let end = start + pos;
            if let Some(chunk) = self.decode_line(start, end) {
                out.push(chunk);
            }
            start = end + 1;
        }
        self.buf.drain(..start);
        out
    }

    /// Flush whatever is left in the buffer as a final line.
    pub fn finish(&mut self) -> Vec<Chunk> {
        let len = self.buf.len();
        let out = self.decode_line(0, len).into_iter().collect();
        self.buf.clear();
        out
    }

    /// Lines that were not valid JSON objects.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn decode_line(&mut self, start: usize, end: usize) -> Option<Chunk> {
        let line = self.buf[start..end].trim_ascii();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_slice::<GenerateLine>(line) {
            Ok(GenerateLine {
                response: Some(fragment),
                ..
            }) => Some(Chunk::Fragment(fragment)),
            Ok(GenerateLine {
                error: Some(message),
                ..
            }) => {
                warn!("Endpoint reported an error: {}", message);
                Some(Chunk::ServerError(message))
            }
            Ok(_) => None,
            Err(e) => {
                self.skipped += 1;
                debug!("Skipping malformed stream line ({} bytes): {}", line.len(), e);
                None
            }
        }
    }
}

/// Turn a streaming HTTP response into decoded chunks.
pub fn fragment_stream(response: reqwest::Response) -> FragmentStream {
    let url = response.url().to_string();
    decode_stream(response.bytes_stream(), url)
}

/// Decode any byte-chunk stream. `url` is only used for error reporting.
///
/// The stream ends after the body ends or after the first transport error.
pub fn decode_stream<S, B>(bytes: S, url: String) -> FragmentStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    struct State<S> {
        bytes: Pin<Box<S>>,
        decoder: NdjsonDecoder,
        pending: VecDeque<Result<Chunk, InferenceError>>,
        done: bool,
        url: String,
    }

    let init = State {
        bytes: Box::pin(bytes),
        decoder: NdjsonDecoder::new(),
        pending: VecDeque::new(),
        done: false,
        url,
    };

    let s = stream::unfold(init, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.done {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => st.pending.extend(st.decoder.push(chunk.as_ref()).into_iter().map(Ok)),
                Some(Err(source)) => {
                    st.done = true;
                    st.pending.push_back(Err(InferenceError::Transport {
                        url: st.url.clone(),
                        source,
                    }));
                }
                None => {
                    st.done = true;
                    st.pending.extend(st.decoder.finish().into_iter().map(Ok));
                    if st.decoder.skipped() > 0 {
                        debug!("{} malformed lines skipped", st.decoder.skipped());
                    }
                }
            }
        }
    });

    Box::pin(s)
}
