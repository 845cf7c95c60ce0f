//! Approximate sub-word token estimation.
//!
//! Counts runs of word characters and individual punctuation symbols. The
//! result is a relative size estimate used for budgeting, not a tokenizer.

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w+\b|[^\w\s]").expect("token pattern is valid"));

/// Estimate the number of tokens in `text`.
///
/// Empty and whitespace-only input yields 0. The estimate is additive over
/// whitespace: `estimate_tokens("a\nb") == estimate_tokens("a") + estimate_tokens("b")`.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }
    TOKEN_RE.find_iter(text).count()
}
