//! Regex extraction used when the LLM path fails.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

// +33 6 12 34 56 78, 0033 6..., 06.12.34.56.78, 0612345678
static FRENCH_PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+33\s?|0033\s?|\b0)[1-9](?:[\s.-]?\d{2}){4}\b").unwrap()
});

// (555) 123-4567, +1 555.123.4567
static NANP_PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap()
});

/// Strips everything but word characters, whitespace, `@`, `.` and `-`, then
/// collapses whitespace. Used to judge whether there is enough to analyse.
static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s@.-]").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub fn find_email(text: &str) -> Option<&str> {
    EMAIL_RE.find(text).map(|m| m.as_str())
}

/// French formats first, then North-American groupings.
pub fn find_phone(text: &str) -> Option<&str> {
    FRENCH_PHONE_RE
        .find(text)
        .or_else(|| NANP_PHONE_RE.find(text))
        .map(|m| m.as_str().trim())
}

pub fn strip_for_analysis(text: &str) -> String {
    let text = NON_WORD_RE.replace_all(text, " ");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}
