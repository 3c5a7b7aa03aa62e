//! Normalisation applied to extracted document text before it reaches the LLM.

use once_cell::sync::Lazy;
use regex::Regex;

static HORIZONTAL_WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\t\p{Zs}]+").unwrap());
/// Control, format, private-use and line/paragraph separator characters,
/// except newline and tab.
static NON_PRINTABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[[\p{Cc}\p{Cf}\p{Co}\p{Zl}\p{Zp}]&&[^\n\t]]").unwrap());
static BLANK_LINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Appended when the text is cut at `max_chars`.
pub const TRUNCATION_MARKER: &str = "\n[... texte tronqué ...]";

/// Cleans raw OCR/PDF text.
///
/// Drops non-printable characters other than `\n` and `\t` (zero-width spaces,
/// BOMs and soft hyphens included), collapses runs of spaces and tabs into one
/// ASCII space, squeezes three or more newlines down to a single blank line,
/// and keeps only the first `max_chars` characters (the top of a résumé carries
/// the identity block). Returns an empty string for blank input.
pub fn clean_cv_text(raw: &str, max_chars: usize) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let text = NON_PRINTABLE_RE.replace_all(trimmed, "");
    let text = HORIZONTAL_WS_RE.replace_all(&text, " ");
    let mut text = BLANK_LINES_RE.replace_all(&text, "\n\n").into_owned();

    if text.chars().count() > max_chars {
        text = text.chars().take(max_chars).collect();
        text.push_str(TRUNCATION_MARKER);
    }

    text.trim().to_string()
}
