//! Text normalization, hashing, and extractive snippets.

use sha2::{Digest, Sha256};

/// Collapse every whitespace run to a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// SHA-256 hex digest of `text`.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Return the first `max_sentences` sentences of `text`.
///
/// A sentence ends at `.`, `!` or `?` when followed by whitespace or the end
/// of the text. When the text holds more sentences than requested, the
/// snippet ends at the terminator of the last included sentence; otherwise
/// the whole (trimmed) text is returned.
///
/// ```rust
/// use recall_harness_core::text::snippet;
///
/// let s = snippet("One. Two! Three? Four.", 3);
/// assert_eq!(s, "One. Two! Three?");
/// ```
pub fn snippet(text: &str, max_sentences: usize) -> String {
    let text = text.trim();
    if max_sentences == 0 {
        return String::new();
    }

    let mut seen = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = match chars.peek() {
            Some((_, next)) => next.is_whitespace(),
            None => true,
        };
        if !at_boundary {
            continue;
        }
        seen += 1;
        if seen == max_sentences {
            let end = i + c.len_utf8();
            return text[..end].to_string();
        }
    }

    text.to_string()
}
