//! Trademark marking of six-letter words.

use once_cell::sync::Lazy;
use regex::Regex;

// Capture group followed by the trademark sign.
const MARKED_WORD: &str = "${1}\u{2122}";

static SIX_LETTER_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z]{6})\b").expect("six-letter word pattern is valid"));

/// Append `™` to every standalone run of exactly six ASCII letters.
///
/// Runs that are part of a longer word (letters, digits or `_` on either
/// side) are left alone. Everything else in `text` is copied unchanged.
pub fn transform(text: &str) -> String {
    SIX_LETTER_WORD.replace_all(text, MARKED_WORD).into_owned()
}

/// Text inside these elements is never rendered as prose.
pub fn is_excluded_parent(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style")
}
