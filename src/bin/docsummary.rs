//! CLI binary for docsummary.
//!
//! A thin shim over the library crate: maps flags to `SummarizerConfig`,
//! then serves the web page, summarises one document, or probes the model.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use docsummary::{
    serve, Chunk, InputError, SourceDocument, SummarizeRequest, Summarizer, SummarizerConfig,
    SummaryStyle,
};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve the web page on http://127.0.0.1:5000
  docsummary serve

  # Summarise a PDF as bullet points
  docsummary summarize --file report.pdf --style bullet

  # Summarise pasted text, printing the reply as it streams in
  docsummary summarize --text "$(cat notes.md)" --stream

  # Check whether the model endpoint is up
  docsummary status

ENVIRONMENT VARIABLES:
  DOCSUMMARY_ENDPOINT     Ollama generate URL (default http://localhost:11434/api/generate)
  DOCSUMMARY_MODEL        Model name (default llama3.2)
  DOCSUMMARY_BIND         Listen address for `serve`
  RUST_LOG                Overrides the log filter

SETUP:
  1. Install Ollama and pull a model:  ollama pull llama3.2
  2. Start it:                         ollama serve
  3. Serve the page:                   docsummary serve
"#;

/// Summarise text and documents with a local Ollama model.
#[derive(Parser, Debug)]
#[command(
    name = "docsummary",
    version,
    about = "Summarise pasted text or .txt/.md/.pdf documents with a local Ollama model",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Ollama generate endpoint.
    #[arg(long, global = true, env = "DOCSUMMARY_ENDPOINT",
          default_value = docsummary::config::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Model identifier.
    #[arg(long, global = true, env = "DOCSUMMARY_MODEL",
          default_value = docsummary::config::DEFAULT_MODEL)]
    model: String,

    /// Reject source text longer than this many characters.
    #[arg(long, global = true, env = "DOCSUMMARY_MAX_INPUT_CHARS", default_value_t = 5000)]
    max_input_chars: usize,

    /// Characters of source text embedded in the prompt.
    #[arg(long, global = true, env = "DOCSUMMARY_PROMPT_CHARS", default_value_t = 4000)]
    prompt_char_limit: usize,

    /// Liveness probe timeout in seconds.
    #[arg(long, global = true, env = "DOCSUMMARY_PROBE_TIMEOUT", default_value_t = 2)]
    probe_timeout: u64,

    /// Timeout for the summarisation call in seconds (none by default).
    #[arg(long, global = true, env = "DOCSUMMARY_REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCSUMMARY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCSUMMARY_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the summariser web page.
    Serve {
        /// Listen address.
        #[arg(long, env = "DOCSUMMARY_BIND", default_value = "127.0.0.1:5000")]
        bind: String,

        /// Maximum upload size in bytes.
        #[arg(long, env = "DOCSUMMARY_MAX_UPLOAD", default_value_t = 16 * 1024 * 1024)]
        max_upload_bytes: usize,
    },

    /// Summarise one document or text from the terminal.
    Summarize {
        /// Document to summarise (.txt, .md, .pdf).
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Text to summarise.
        #[arg(short, long)]
        text: Option<String>,

        /// Summary style.
        #[arg(short, long, value_enum, default_value = "brief")]
        style: StyleArg,

        /// Print the reply as it streams in.
        #[arg(long)]
        stream: bool,
    },

    /// Print the model endpoint's liveness status.
    Status,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StyleArg {
    Brief,
    Detailed,
    Bullet,
}

impl From<StyleArg> for SummaryStyle {
    fn from(v: StyleArg) -> Self {
        match v {
            StyleArg::Brief => SummaryStyle::Brief,
            StyleArg::Detailed => SummaryStyle::Detailed,
            StyleArg::Bullet => SummaryStyle::Bullet,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Serve {
            bind,
            max_upload_bytes,
        } => {
            let summarizer = build_summarizer(&cli, *max_upload_bytes)?;
            serve(summarizer, bind).await.context("Server failed")?;
        }
        Command::Status => {
            let summarizer = build_summarizer(&cli, 0)?;
            println!("{}", summarizer.status().await);
        }
        Command::Summarize {
            file,
            text,
            style,
            stream,
        } => {
            let summarizer = build_summarizer(&cli, 0)?;
            let upload = match file {
                Some(path) => Some(
                    SourceDocument::from_path(path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                None => None,
            };
            let request = SummarizeRequest {
                input_text: text.clone(),
                upload,
                style: Some(SummaryStyle::from(*style).as_str().to_string()),
            };
            run_summarize(&summarizer, request, *stream, cli.quiet).await?;
        }
    }

    Ok(())
}

/// Map CLI args to a `Summarizer`.
fn build_summarizer(cli: &Cli, max_upload_bytes: usize) -> Result<Summarizer> {
    let mut builder = SummarizerConfig::builder()
        .endpoint(&cli.endpoint)
        .model(&cli.model)
        .max_input_chars(cli.max_input_chars)
        .prompt_char_limit(cli.prompt_char_limit)
        .probe_timeout_secs(cli.probe_timeout)
        .request_timeout_secs(cli.request_timeout);
    if max_upload_bytes > 0 {
        builder = builder.max_upload_bytes(max_upload_bytes);
    }

    let config = builder.build().context("Invalid configuration")?;
    Summarizer::new(config).context("Failed to initialise summariser")
}

async fn run_summarize(
    summarizer: &Summarizer,
    request: SummarizeRequest,
    stream: bool,
    quiet: bool,
) -> Result<()> {
    let prepared = match summarizer.prepare(request).await {
        Ok(prepared) => prepared,
        Err(err) => return Err(input_error(err)),
    };

    if stream {
        let (_, mut chunks) = match summarizer.client().stream(&prepared.prompt).await {
            Ok(started) => started,
            Err(e) => {
                println!("{}", e.user_message());
                return Ok(());
            }
        };
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        let mut printed = false;
        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(Chunk::Fragment(text)) => {
                    printed |= !text.is_empty();
                    handle.write_all(text.as_bytes()).context("Failed to write to stdout")?;
                    handle.flush().ok();
                }
                Ok(Chunk::ServerError(message)) => eprintln!("endpoint error: {message}"),
                Err(e) => {
                    writeln!(handle).ok();
                    writeln!(handle, "{}", e.user_message()).ok();
                    return Ok(());
                }
            }
        }
        if !printed {
            write!(handle, "{}", docsummary::error::NO_RESPONSE_WARNING).ok();
        }
        writeln!(handle).ok();
        return Ok(());
    }

    let spinner = (!quiet).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message(format!(
            "Summarising {} chars with {}…",
            prepared.source_text.chars().count(),
            summarizer.client().model()
        ));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let result = summarizer.client().generate_summary(&prepared.prompt).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    println!("{}", result.display_text());
    Ok(())
}

/// Turn an input rejection into the process error, printing the preview
/// for oversized input.
fn input_error(err: InputError) -> anyhow::Error {
    if let Some(preview) = err.preview() {
        eprintln!("--- preview ---\n{preview}\n---------------");
    }
    anyhow::anyhow!(err)
}
