//! Span computation utilities for source attribution
//!
//! This module provides functions for locating matches in the raw
//! document text, computing hashes, resolving page locations and
//! converting byte offsets to line/column positions.
//!
//! # Offsets
//!
//! - **UTF-8 byte offsets**: spans are byte indices into the raw text
//! - **Char indices**: the normalized-to-original mapping works on code
//!   points, because normalization is defined per code point
//! - **Approximate recovery**: spans recovered from normalized positions
//!   are scaled by the length ratio and snapped to word boundaries, so
//!   they are diagnostics rather than exact provenance

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use super::types::MatchSpan;

/// Location reported when no page can be determined
pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// Characters of context kept around a span
pub const ANCHOR_WINDOW: usize = 80;

static PAGE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[Page (\d+)\]").expect("invalid page marker pattern"));

static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("invalid sentence pattern"));

/// An inline `[Page N]` marker in the raw document text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMarker {
    pub page: u32,
    /// Byte offset of `[`
    pub start: usize,
    /// Byte offset just past `]`
    pub end: usize,
}

/// Find every page marker, in text order
pub fn find_page_markers(text: &str) -> Vec<PageMarker> {
    PAGE_MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let page = caps.get(1)?.as_str().parse().ok()?;
            Some(PageMarker {
                page,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Page whose content range contains byte `offset`.
///
/// A page's content runs from the end of its marker to the start of the
/// next marker (or the end of the text). Offsets before the first
/// marker or inside a marker belong to no page.
pub fn page_at(markers: &[PageMarker], text_len: usize, offset: usize) -> Option<u32> {
    markers.iter().enumerate().find_map(|(i, marker)| {
        let page_end = markers.get(i + 1).map_or(text_len, |next| next.start);
        (marker.end <= offset && offset < page_end).then_some(marker.page)
    })
}

/// Resolve the location reported for a match.
///
/// A non-blank hint always wins. Otherwise the match offset is mapped to
/// a page via the markers, falling back to [`UNKNOWN_LOCATION`].
///
/// Marker text belongs to no page, so a match that starts inside a
/// marker (a quote of `"Page 1"` found in `"[Page 1]"`) resolves to
/// [`UNKNOWN_LOCATION`].
pub fn resolve_location(
    hint: Option<&str>,
    offset: Option<usize>,
    markers: &[PageMarker],
    text_len: usize,
) -> String {
    if let Some(hint) = hint.filter(|h| !h.trim().is_empty()) {
        return hint.to_string();
    }

    offset
        .and_then(|offset| page_at(markers, text_len, offset))
        .map(|page| format!("Page {}", page))
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
}

/// Trimmed sentence byte ranges, in text order.
///
/// Page markers are hard boundaries: a sentence never spans one, and the
/// marker text itself belongs to no sentence. Within a page, sentences
/// end after `.`, `!` or `?` followed by whitespace; the punctuation is
/// kept with the sentence.
pub fn sentence_spans(text: &str, markers: &[PageMarker]) -> Vec<(usize, usize)> {
    let mut regions = Vec::new();
    let mut cursor = 0;
    for marker in markers {
        regions.push((cursor, marker.start));
        cursor = marker.end;
    }
    regions.push((cursor, text.len()));

    let mut spans = Vec::new();
    for (region_start, region_end) in regions {
        let region = &text[region_start..region_end];
        let mut sentence_start = 0;

        for m in SENTENCE_BREAK.find_iter(region) {
            // punctuation is a single ASCII byte
            push_trimmed(&mut spans, text, region_start + sentence_start, region_start + m.start() + 1);
            sentence_start = m.end();
        }
        push_trimmed(&mut spans, text, region_start + sentence_start, region_end);
    }

    spans
}

fn push_trimmed(spans: &mut Vec<(usize, usize)>, text: &str, start: usize, end: usize) {
    if let Some(span) = trim_range(text, start, end) {
        spans.push(span);
    }
}

/// Shrink a byte range to exclude surrounding whitespace.
/// Returns `None` when nothing but whitespace is left.
pub fn trim_range(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let slice = &text[start..end];
    let trimmed_start = slice.trim_start();
    let lead = slice.len() - trimmed_start.len();
    let trimmed = trimmed_start.trim_end();
    if trimmed.is_empty() {
        return None;
    }
    Some((start + lead, start + lead + trimmed.len()))
}

/// Approximate the original char range of a normalized char range.
///
/// Positions are scaled by `original_len / normalized_len`, then the
/// start is moved back to the beginning of its word and the end forward
/// to the next whitespace or period. The result is trimmed; `None`
/// means only whitespace was selected.
pub fn approximate_original_range(
    original: &[char],
    normalized_len: usize,
    norm_start: usize,
    norm_end: usize,
) -> Option<(usize, usize)> {
    let len = original.len();
    let ratio = if normalized_len == 0 {
        1.0
    } else {
        len as f64 / normalized_len as f64
    };

    let mut start = ((norm_start as f64 * ratio) as usize).min(len);
    let mut end = ((norm_end as f64 * ratio) as usize).min(len);

    while start > 0 && !is_word_break(original[start - 1]) {
        start -= 1;
    }
    while end > 0 && end < len && !is_word_break(original[end - 1]) && original[end - 1] != '.' {
        end += 1;
    }

    while start < end && original[start].is_whitespace() {
        start += 1;
    }
    while end > start && original[end - 1].is_whitespace() {
        end -= 1;
    }

    (start < end).then_some((start, end))
}

fn is_word_break(c: char) -> bool {
    matches!(c, ' ' | '\n' | '\t')
}

/// Build the span record for `text[start..end]`
pub fn locate_span(text: &str, start: usize, end: usize) -> MatchSpan {
    let pos = offset_to_line_col(text, start);
    MatchSpan {
        utf8_byte_offset: [start, end],
        slice_sha256: compute_slice_hash(text.as_bytes(), start, end),
        anchor_text: extract_anchor_text(text, start, end, ANCHOR_WINDOW),
        line: pos.line,
        col: pos.col,
    }
}

/// Compute SHA256 hash of a byte slice, returning hex string with prefix
///
/// # Returns
/// * String in format "sha256:abc123..."
pub fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    format!("sha256:{}", hex::encode(result))
}

/// Compute slice hash for a span
pub fn compute_slice_hash(text: &[u8], start: usize, end: usize) -> String {
    compute_hash(&text[start..end])
}

/// Extract anchor text around a span
///
/// Returns about `window` characters of context around the span, with
/// an ellipsis on each side that was cut.
///
/// # Arguments
/// * `text` - The full document text
/// * `start` - Start byte offset of span
/// * `end` - End byte offset of span
/// * `window` - Total bytes of context
pub fn extract_anchor_text(text: &str, start: usize, end: usize, window: usize) -> String {
    let len = text.len();

    let span_len = end - start;
    let remaining = window.saturating_sub(span_len);
    let each_side = remaining / 2;

    let mut anchor_start = start.saturating_sub(each_side);
    while anchor_start > 0 && !text.is_char_boundary(anchor_start) {
        anchor_start -= 1;
    }

    let mut anchor_end = (end + each_side).min(len);
    while anchor_end < len && !text.is_char_boundary(anchor_end) {
        anchor_end += 1;
    }

    let anchor = &text[anchor_start..anchor_end];
    let prefix = if anchor_start > 0 { "..." } else { "" };
    let suffix = if anchor_end < len { "..." } else { "" };

    format!("{}{}{}", prefix, anchor, suffix)
}

/// Line and column position (1-indexed for editor compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    pub col: usize,
}

/// Convert byte offset to line/column position
///
/// Column counts characters, not bytes.
pub fn offset_to_line_col(text: &str, offset: usize) -> LineCol {
    let offset = offset.min(text.len());
    let prefix = &text[..offset];

    let line = prefix.matches('\n').count() + 1;
    let line_start = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let col = text[line_start..offset].chars().count() + 1;

    LineCol { line, col }
}
