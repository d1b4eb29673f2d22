//! Prompt text for the summarisation call.
//!
//! The framing below is what the local model has been used with; keep it
//! byte-for-byte when editing so existing deployments see the same prompt.
//! Unit tests import these constants directly.

use crate::config::SummaryStyle;

/// Fixed role line at the top of every prompt.
pub const PREAMBLE: &str = "You are a helpful assistant that summarizes documents.";

pub const BRIEF_INSTRUCTION: &str =
    "Provide a concise summary in 1-2 sentences highlighting the main idea and conclusions.";

pub const DETAILED_INSTRUCTION: &str =
    "Provide a detailed summary in a few paragraphs covering the key points and conclusions.";

pub const BULLET_INSTRUCTION: &str =
    "Provide a bullet-point summary (3-10 items) capturing the main ideas and takeaways.";

pub const DOCUMENT_START: &str = "DOCUMENT START:";
pub const DOCUMENT_END: &str = "DOCUMENT END:";
pub const CLOSING_DIRECTIVE: &str = "Please write the summary now.";

/// Instruction line for a style.
pub fn instruction_for(style: SummaryStyle) -> &'static str {
    match style {
        SummaryStyle::Brief => BRIEF_INSTRUCTION,
        SummaryStyle::Detailed => DETAILED_INSTRUCTION,
        SummaryStyle::Bullet => BULLET_INSTRUCTION,
    }
}

/// Build the full prompt, embedding at most `char_limit` characters of `text`.
///
/// The cut is silent and counts characters, not bytes.
pub fn build_prompt(text: &str, style: SummaryStyle, char_limit: usize) -> String {
    format!(
        "{PREAMBLE}\n{}\n\n{DOCUMENT_START}\n{}\n\n{DOCUMENT_END}\n{CLOSING_DIRECTIVE}",
        instruction_for(style),
        truncate_chars(text, char_limit)
    )
}

/// The first `max` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Length of `s` in characters.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_has_exact_framing() {
        let p = build_prompt("Some text.", SummaryStyle::Brief, 4000);
        assert_eq!(
            p,
            "You are a helpful assistant that summarizes documents.\n\
             Provide a concise summary in 1-2 sentences highlighting the main idea and conclusions.\n\
             \n\
             DOCUMENT START:\n\
             Some text.\n\
             \n\
             DOCUMENT END:\n\
             Please write the summary now."
        );
    }

    #[test]
    fn instruction_line_follows_style_table() {
        let line = |style| {
            build_prompt("x", style, 4000)
                .lines()
                .nth(1)
                .unwrap()
                .to_string()
        };
        assert_eq!(line(SummaryStyle::Brief), BRIEF_INSTRUCTION);
        assert_eq!(line(SummaryStyle::Detailed), DETAILED_INSTRUCTION);
        assert_eq!(line(SummaryStyle::from_tag("anything")), BULLET_INSTRUCTION);
        assert_eq!(line(SummaryStyle::from_tag("")), BULLET_INSTRUCTION);
    }

    #[test]
    fn body_is_truncated_to_limit() {
        let body = format!("{}{}", "a".repeat(4000), "b".repeat(500));
        let p = build_prompt(&body, SummaryStyle::Detailed, 4000);
        assert!(p.contains(DOCUMENT_START));
        assert!(p.contains(DOCUMENT_END));
        assert!(p.contains(&"a".repeat(4000)));
        assert!(!p.contains('b'));
    }

    #[test]
    fn short_body_is_kept_whole() {
        let p = build_prompt("hello world", SummaryStyle::Bullet, 4000);
        assert!(p.contains("DOCUMENT START:\nhello world\n\nDOCUMENT END:"));
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
        assert_eq!(char_len("日本語"), 3);
    }
}
