//! Source attribution verification.
//!
//! A claimed quotation is checked against the raw document text with
//! strategies ordered from strictest to loosest:
//!
//! 1. exact substring of the raw text
//! 2. substring after normalization (case, whitespace, quotes, dashes)
//! 3. best sliding window by similarity ratio, classified against the
//!    fuzzy and partial thresholds
//! 4. key phrases of the claim found in the document
//!
//! Anything left over is unverified, and an unverified claim with low
//! similarity is flagged as a likely hallucination.

use once_cell::sync::OnceCell;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::phrases::extract_key_phrases;
use super::spans::{
    approximate_original_range, find_page_markers, locate_span, resolve_location,
    sentence_spans, trim_range, PageMarker,
};
use super::types::{AttributionClaim, VerificationOutcome, VerificationStatus};
use crate::config::SettingsError;
use crate::text::{lowercase, normalize, BlockMatcher};

/// Confidence of a match found only after normalization
pub const NORMALIZED_MATCH_CONFIDENCE: f64 = 0.95;

/// Key-phrase matches are weaker evidence than direct similarity
const KEY_PHRASE_WEIGHT: f64 = 0.7;

/// Unverified claims keep their best window as matched text above this
const UNVERIFIED_MATCH_FLOOR: f64 = 0.3;

/// Window lengths tried, as multiples of the claim length
const WINDOW_MULTIPLIERS: [f64; 4] = [1.0, 1.2, 1.5, 0.8];

/// Verifier thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Minimum similarity for a fuzzy match to count as verified
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,

    /// Minimum similarity for a partial match
    #[serde(default = "default_partial_threshold")]
    pub partial_threshold: f64,

    /// Claims shorter than this (trimmed, in characters) get a warning issue
    #[serde(default = "default_min_claim_chars")]
    pub min_claim_chars: usize,

    /// Key phrases extracted per claim
    #[serde(default = "default_max_key_phrases")]
    pub max_key_phrases: usize,
}

fn default_fuzzy_threshold() -> f64 {
    0.85
}
fn default_partial_threshold() -> f64 {
    0.70
}
fn default_min_claim_chars() -> usize {
    10
}
fn default_max_key_phrases() -> usize {
    10
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: default_fuzzy_threshold(),
            partial_threshold: default_partial_threshold(),
            min_claim_chars: default_min_claim_chars(),
            max_key_phrases: default_max_key_phrases(),
        }
    }
}

impl VerifierConfig {
    /// Check `0 < partial_threshold < fuzzy_threshold <= 1`
    pub fn validate(&self) -> Result<(), SettingsError> {
        let (partial, fuzzy) = (self.partial_threshold, self.fuzzy_threshold);
        if !(0.0 < partial && partial < fuzzy && fuzzy <= 1.0) {
            return Err(SettingsError::InvalidThresholds { partial, fuzzy });
        }
        if self.max_key_phrases == 0 {
            return Err(SettingsError::ZeroKeyPhraseLimit);
        }
        Ok(())
    }
}

/// Raw document text prepared for repeated verification.
///
/// Normalization and the char index tables are computed once and shared
/// by every claim checked against the same document.
#[derive(Debug)]
pub struct SourceText<'a> {
    raw: &'a str,
    chars: Vec<char>,
    /// Byte offset of each char, plus the total length
    char_starts: Vec<usize>,
    normalized: String,
    normalized_chars: Vec<char>,
    lowered: String,
    markers: Vec<PageMarker>,
    sentences: OnceCell<Vec<(usize, usize)>>,
}

impl<'a> SourceText<'a> {
    pub fn new(raw: &'a str) -> Self {
        let (char_starts, chars): (Vec<usize>, Vec<char>) = raw.char_indices().unzip();
        let mut char_starts = char_starts;
        char_starts.push(raw.len());

        let normalized = normalize(raw);
        let normalized_chars = normalized.chars().collect();

        Self {
            raw,
            chars,
            char_starts,
            normalized,
            normalized_chars,
            lowered: lowercase(raw),
            markers: find_page_markers(raw),
            sentences: OnceCell::new(),
        }
    }

    pub fn raw(&self) -> &str {
        self.raw
    }

    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }

    pub fn page_markers(&self) -> &[PageMarker] {
        &self.markers
    }

    fn location(&self, hint: Option<&str>, offset: Option<usize>) -> String {
        resolve_location(hint, offset, &self.markers, self.raw.len())
    }

    /// Byte range in the raw text approximating a normalized char range.
    /// A range starting inside a page marker starts after it instead.
    fn original_range(&self, norm_start: usize, norm_end: usize) -> Option<(usize, usize)> {
        let (start, end) = approximate_original_range(
            &self.chars,
            self.normalized_chars.len(),
            norm_start,
            norm_end,
        )?;
        let (start, end) = (self.char_starts[start], self.char_starts[end]);

        match self.markers.iter().find(|m| m.start <= start && start < m.end) {
            Some(marker) if marker.end < end => trim_range(self.raw, marker.end, end),
            Some(_) => None,
            None => Some((start, end)),
        }
    }

    /// First sentence whose normalized form contains `normalized_quote`
    fn sentence_containing(&self, normalized_quote: &str) -> Option<(usize, usize)> {
        self.sentences
            .get_or_init(|| sentence_spans(self.raw, &self.markers))
            .iter()
            .copied()
            .find(|&(start, end)| normalize(&self.raw[start..end]).contains(normalized_quote))
    }

    /// Byte offset of the first case-insensitive occurrence of `phrase`
    fn find_ignore_case(&self, phrase: &str) -> Option<usize> {
        RegexBuilder::new(&regex::escape(phrase))
            .case_insensitive(true)
            .build()
            .ok()?
            .find(self.raw)
            .map(|m| m.start())
    }
}

/// Best-scoring window of the sliding search, in normalized char indices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowMatch {
    pub score: f64,
    pub start: usize,
    pub end: usize,
}

/// Slide windows of several lengths over `haystack` and keep the one
/// most similar to `needle`.
///
/// Each window length is `needle.len()` times a multiplier, clipped to
/// the haystack, and windows advance by a quarter of their length. Only
/// a strictly better score replaces the current best, so the earliest
/// window wins ties. Windows whose [`BlockMatcher::quick_ratio`] cannot
/// beat the best score are skipped without changing the result.
pub fn best_window(needle: &[char], haystack: &[char]) -> Option<WindowMatch> {
    if needle.is_empty() || haystack.is_empty() {
        return None;
    }

    let mut matcher = BlockMatcher::new(needle);
    let mut best: Option<WindowMatch> = None;
    let mut best_score = 0.0;

    for multiplier in WINDOW_MULTIPLIERS {
        let window = ((needle.len() as f64 * multiplier) as usize).min(haystack.len());
        if window == 0 {
            continue;
        }
        let step = (window / 4).max(1);

        for start in (0..=haystack.len() - window).step_by(step) {
            let candidate = &haystack[start..start + window];
            if matcher.quick_ratio(candidate) <= best_score {
                continue;
            }

            let score = matcher.ratio(candidate);
            if score > best_score {
                best_score = score;
                best = Some(WindowMatch {
                    score,
                    start,
                    end: start + window,
                });
            }
        }
    }

    best
}

/// Checks claimed quotations against document text
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    config: VerifierConfig,
}

impl Verifier {
    /// Create a verifier, rejecting invalid thresholds
    pub fn new(config: VerifierConfig) -> Result<Self, SettingsError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify one claim against raw document text.
    pub fn verify_text(&self, claim: &AttributionClaim, document_text: &str) -> VerificationOutcome {
        self.verify(claim, &SourceText::new(document_text))
    }

    /// Verify one claim against a prepared document.
    pub fn verify(&self, claim: &AttributionClaim, source: &SourceText<'_>) -> VerificationOutcome {
        let quote = claim.quoted_text.as_str();
        let hint = claim.location_hint.as_deref();

        if quote.trim().is_empty() {
            debug!("{}: empty source text", claim.claim_id);
            return VerificationOutcome::empty(claim);
        }

        if source.is_blank() {
            debug!("{}: no document text, skipping", claim.claim_id);
            return VerificationOutcome::skipped(claim, "No document text available for verification");
        }

        let mut issues = Vec::new();
        let quote_chars = quote.trim().chars().count();
        if quote_chars < self.config.min_claim_chars {
            issues.push(format!("Source text very short ({} chars)", quote_chars));
        }

        if let Some(start) = source.raw.find(quote) {
            debug!("{}: exact match at byte {}", claim.claim_id, start);
            return matched_outcome(
                claim,
                VerificationStatus::Verified,
                1.0,
                source,
                Some((start, start + quote.len())),
                issues,
            );
        }

        let normalized_quote = normalize(quote);

        if let Some(norm_byte) = source.normalized.find(&normalized_quote) {
            debug!("{}: normalized match", claim.claim_id);
            let range = source.sentence_containing(&normalized_quote).or_else(|| {
                let norm_start = source.normalized[..norm_byte].chars().count();
                let norm_end = norm_start + normalized_quote.chars().count();
                source.original_range(norm_start, norm_end)
            });

            issues.push("Matched after normalization".to_string());
            return matched_outcome(
                claim,
                VerificationStatus::Verified,
                NORMALIZED_MATCH_CONFIDENCE,
                source,
                range,
                issues,
            );
        }

        let needle: Vec<char> = normalized_quote.chars().collect();
        let window = best_window(&needle, &source.normalized_chars);
        let similarity = window.map_or(0.0, |w| w.score);
        let window_range = window.and_then(|w| source.original_range(w.start, w.end));
        debug!("{}: best similarity {:.3}", claim.claim_id, similarity);

        if similarity >= self.config.fuzzy_threshold {
            issues.push(format!("Fuzzy match (similarity: {:.2}%)", similarity * 100.0));
            return matched_outcome(
                claim,
                VerificationStatus::Verified,
                similarity,
                source,
                window_range,
                issues,
            );
        }

        if similarity >= self.config.partial_threshold {
            issues.push(format!("Partial match only (similarity: {:.2}%)", similarity * 100.0));
            return matched_outcome(
                claim,
                VerificationStatus::Partial,
                similarity,
                source,
                window_range,
                issues,
            );
        }

        let phrases = extract_key_phrases(quote, self.config.max_key_phrases);
        let found: Vec<&String> = phrases
            .iter()
            .filter(|p| source.lowered.contains(&lowercase(p)))
            .collect();

        if !phrases.is_empty() && found.len() * 2 >= phrases.len() {
            debug!(
                "{}: {}/{} key phrases found",
                claim.claim_id,
                found.len(),
                phrases.len()
            );
            let offset = found.first().and_then(|p| source.find_ignore_case(p));
            issues.push(format!("Found {}/{} key phrases", found.len(), phrases.len()));

            return VerificationOutcome::new(
                claim,
                VerificationStatus::Partial,
                found.len() as f64 / phrases.len() as f64 * KEY_PHRASE_WEIGHT,
                None,
                Some(source.location(hint, offset)),
                issues,
            );
        }

        issues.push("POSSIBLE HALLUCINATION: Source text not found in document".to_string());
        issues.push(format!("Best similarity found: {:.2}%", similarity * 100.0));

        let matched = window_range
            .filter(|_| similarity > UNVERIFIED_MATCH_FLOOR)
            .map(|(start, end)| (source.raw[start..end].to_string(), locate_span(source.raw, start, end)));

        let outcome = VerificationOutcome::new(
            claim,
            VerificationStatus::Unverified,
            similarity,
            matched,
            None,
            issues,
        );
        if outcome.is_hallucination {
            warn!(
                "{}: possible hallucination (best similarity {:.2}%)",
                claim.claim_id,
                similarity * 100.0
            );
        }
        outcome
    }
}

/// Outcome whose matched text is `range` of the raw document.
/// Without a range the location falls back to the hint.
fn matched_outcome(
    claim: &AttributionClaim,
    status: VerificationStatus,
    confidence: f64,
    source: &SourceText<'_>,
    range: Option<(usize, usize)>,
    issues: Vec<String>,
) -> VerificationOutcome {
    let hint = claim.location_hint.as_deref();
    let location = source.location(hint, range.map(|(start, _)| start));
    let matched = range.map(|(start, end)| {
        (
            source.raw[start..end].to_string(),
            locate_span(source.raw, start, end),
        )
    });

    VerificationOutcome::new(claim, status, confidence, matched, Some(location), issues)
}

/// Verify one claim with the default thresholds.
pub fn verify_claim(claim: &AttributionClaim, document_text: &str) -> VerificationOutcome {
    Verifier::default().verify_text(claim, document_text)
}
