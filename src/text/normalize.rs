//! Canonical form used for every text comparison.
//!
//! Rules, in order: lowercase, collapse whitespace runs to one ASCII
//! space, fold quote variants to `"`, fold dash variants to `-`, trim.
//! Casing is per code point (`char::to_lowercase`), never locale or
//! context sensitive, so the result is stable under reapplication.

/// Characters folded to a straight double quote.
const QUOTE_VARIANTS: &[char] = &[
    '"', '\'', '`', '\u{2018}', '\u{2019}', '\u{201A}', '\u{201B}', '\u{201C}', '\u{201D}',
    '\u{201E}', '\u{201F}', '\u{2032}', '\u{2033}', '\u{00AB}', '\u{00BB}',
];

/// Characters folded to an ASCII hyphen.
const DASH_VARIANTS: &[char] = &['\u{2012}', '\u{2013}', '\u{2014}', '\u{2015}', '\u{2212}'];

/// Normalize text for comparison.
///
/// Pure and idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }

        // Leading whitespace is dropped, interior runs become one space
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;

        out.push(fold_punctuation(c));
    }

    out
}

/// Lowercase per code point without any other rewriting.
///
/// Used for case-insensitive containment checks where whitespace and
/// punctuation must stay untouched.
pub fn lowercase(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

fn fold_punctuation(c: char) -> char {
    if QUOTE_VARIANTS.contains(&c) {
        '"'
    } else if DASH_VARIANTS.contains(&c) {
        '-'
    } else {
        c
    }
}
