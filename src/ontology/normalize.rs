//! Canonical text normalization.
//!
//! Catalog terms and question text go through the same function, so matching
//! is exact on normalized forms:
//!
//! ```text
//! "Acute MI (STEMI) - management?"  →  "acute mi stemi management"
//! "Beta-blockers, in HF"            →  "beta-blockers in hf"
//! ```
//!
//! A token is a run of Unicode word characters and hyphens that starts and
//! ends on a word character. Everything else is dropped.

use once_cell::sync::Lazy;
use regex::Regex;

static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[\w-]+\b").expect("Invalid word token regex"));

/// Lower-case `text` and rejoin its word tokens with single spaces.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Number of words in an already-normalized term.
pub fn word_count(term: &str) -> usize {
    term.split_whitespace().count()
}
