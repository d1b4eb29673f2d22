//! The single HTML page.
//!
//! Rendered with `format!`; every user-controlled string goes through
//! [`escape_html`] first.

use crate::config::SummaryStyle;

/// Everything the page can show.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageView<'a> {
    pub flash: Option<&'a str>,
    pub summary: Option<&'a str>,
    pub input_text: Option<&'a str>,
    pub style: &'a str,
    pub status: &'a str,
}

/// Escape text for use in element content and quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn style_options(selected: &str) -> String {
    SummaryStyle::ALL
        .iter()
        .map(|style| {
            let value = style.as_str();
            let label = match style {
                SummaryStyle::Brief => "Brief (1-2 sentences)",
                SummaryStyle::Detailed => "Detailed (a few paragraphs)",
                SummaryStyle::Bullet => "Bullet points",
            };
            let sel = if value == selected { " selected" } else { "" };
            format!(r#"<option value="{value}"{sel}>{label}</option>"#)
        })
        .collect::<Vec<_>>()
        .join("\n          ")
}

/// Render the full page.
pub fn render(view: &PageView<'_>) -> String {
    let flash = view
        .flash
        .map(|m| format!(r#"<div class="flash">{}</div>"#, escape_html(m)))
        .unwrap_or_default();
    let summary = view
        .summary
        .map(|s| {
            format!(
                r#"<section class="summary"><h2>Summary</h2><pre>{}</pre></section>"#,
                escape_html(s)
            )
        })
        .unwrap_or_default();
    let input_text = escape_html(view.input_text.unwrap_or_default());

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Document Summarizer</title>
  <style>
    body {{ font-family: system-ui, sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }}
    textarea {{ width: 100%; min-height: 12rem; }}
    .flash {{ background: #fff3cd; border: 1px solid #ffe69c; padding: .75rem; margin-bottom: 1rem; }}
    .summary pre {{ white-space: pre-wrap; background: #f6f8fa; padding: 1rem; }}
    .status {{ color: #555; font-size: .9rem; }}
  </style>
</head>
<body>
  <h1>Document Summarizer</h1>
  <p class="status">{status}</p>
  {flash}
  <form action="/summarize" method="post" enctype="multipart/form-data">
    <label for="input_text">Paste text</label>
    <textarea id="input_text" name="input_text">{input_text}</textarea>
    <p><label for="file">or upload a file (.txt, .md, .pdf)</label>
    <input id="file" type="file" name="file" accept=".txt,.md,.pdf"></p>
    <p><label for="style">Style</label>
    <select id="style" name="style">
          {options}
    </select></p>
    <button type="submit">Summarize</button>
  </form>
  {summary}
</body>
</html>
"#,
        status = escape_html(view.status),
        flash = flash,
        input_text = input_text,
        options = style_options(view.style),
        summary = summary,
    )
}
