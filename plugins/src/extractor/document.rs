//! Text helpers shared by extractors and callers preparing prompts.

use std::sync::OnceLock;

use regex::Regex;

pub const DEFAULT_PREVIEW_CHARS: usize = 500;
pub const DEFAULT_CHUNK_CHARS: usize = 4_000;

/// Number of whitespace-separated words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// First `max_chars` characters, with `...` appended when cut.
pub fn document_preview(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        None => content.to_string(),
        Some((byte_idx, _)) => format!("{}...", &content[..byte_idx]),
    }
}

fn sentence_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s+").expect("sentence break regex is valid"))
}

/// Split after sentence-ending punctuation, dropping the whitespace between.
fn sentences(content: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for m in sentence_break().find_iter(content) {
        // The punctuation is one ASCII byte and stays with its sentence.
        out.push(&content[start..m.start() + 1]);
        start = m.end();
    }
    out.push(&content[start..]);
    out
}

/// Group sentences into chunks of at most `chunk_chars` characters.
///
/// A single sentence longer than the limit becomes its own chunk.
pub fn chunk_document(content: &str, chunk_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in sentences(content) {
        if current.chars().count() + sentence.chars().count() > chunk_chars {
            if !current.is_empty() {
                chunks.push(current.trim().to_string());
            }
            current = sentence.to_string();
        } else {
            current.push(' ');
            current.push_str(sentence);
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        chunks.push(tail.to_string());
    }
    chunks
}

/// Decode bytes as text, honouring a BOM and replacing invalid sequences.
///
/// Returns the text and whether any replacement happened.
pub fn decode_text(bytes: &[u8]) -> (String, bool) {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    (text.into_owned(), had_errors)
}

/// Summary header plus raw data for a CSV file.
///
/// Row count is the number of lines after the header, trailing newline
/// included.
pub fn describe_csv(text: &str) -> String {
    let lines = text.split('\n').count();
    let headers: Vec<&str> = text
        .split('\n')
        .next()
        .map(|h| h.split(',').map(str::trim).collect())
        .unwrap_or_default();
    format!(
        "CSV Document with {} rows and {} columns.\n\nColumns: {}\n\nData:\n{}",
        lines.saturating_sub(1),
        headers.len(),
        headers.join(", "),
        text
    )
}

/// Pretty-printed JSON under a header, or `None` when the text is not JSON.
pub fn describe_json(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let pretty = serde_json::to_string_pretty(&value).ok()?;
    Some(format!("JSON Document:\n\n{}", pretty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_count_words_ignores_runs_of_whitespace() {
        assert_eq!(count_words("  one\ttwo\n\nthree  "), 3);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn test_preview_is_char_safe() {
        assert_eq!(document_preview("short", 10), "short");
        assert_eq!(document_preview("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn test_chunk_document_respects_sentence_boundaries() {
        let text = "First one. Second one! Third one? Fourth.";
        let chunks = chunk_document(text, 24);
        assert_eq!(chunks, vec!["First one. Second one!", "Third one? Fourth."]);
    }

    #[test]
    fn test_chunk_document_keeps_oversized_sentence() {
        let text = "A very long sentence without a break";
        assert_eq!(chunk_document(text, 5), vec![text.to_string()]);
        assert!(chunk_document("", 10).is_empty());
    }

    #[test]
    fn test_decode_text_strips_bom_and_replaces_garbage() {
        let (text, lossy) = decode_text(b"\xEF\xBB\xBFhello");
        assert_eq!(text, "hello");
        assert!(!lossy);
        let (text, lossy) = decode_text(b"ab\xFFcd");
        assert_eq!(text, "ab\u{FFFD}cd");
        assert!(lossy);
    }

    #[test]
    fn test_describe_csv_header() {
        let out = describe_csv("name, amount\nrent,1200\nfood,300\n");
        assert!(out.starts_with(
            "CSV Document with 3 rows and 2 columns.\n\nColumns: name, amount\n\nData:\nname"
        ));
    }

    #[test]
    fn test_describe_json_falls_back() {
        assert_eq!(
            describe_json(r#"{"a":1}"#).as_deref(),
            Some("JSON Document:\n\n{\n  \"a\": 1\n}")
        );
        assert!(describe_json("{not json").is_none());
    }
}
