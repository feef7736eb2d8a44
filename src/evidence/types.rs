//! Verification data types
//!
//! These types make up the verification report and the run-log schema.

use serde::{Deserialize, Serialize, Serializer};

/// Outcome class for one claimed quotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Exact, normalized or high-similarity match found
    Verified,
    /// Moderate similarity or enough key phrases found
    Partial,
    /// Not found; possible hallucination
    Unverified,
    /// Claim carried no quoted text
    Empty,
    /// Verification could not be performed
    Skipped,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Verified => "verified",
            VerificationStatus::Partial => "partial",
            VerificationStatus::Unverified => "unverified",
            VerificationStatus::Empty => "empty",
            VerificationStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A quotation asserted to appear verbatim in the source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionClaim {
    /// Identifier of the record the quote belongs to
    pub claim_id: String,
    /// The quoted text
    pub quoted_text: String,
    /// Caller-supplied location, e.g. "Section 3.1"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_hint: Option<String>,
}

impl AttributionClaim {
    pub fn new(claim_id: impl Into<String>, quoted_text: impl Into<String>) -> Self {
        Self {
            claim_id: claim_id.into(),
            quoted_text: quoted_text.into(),
            location_hint: None,
        }
    }

    /// Attach a location hint
    pub fn with_location(mut self, hint: impl Into<String>) -> Self {
        self.location_hint = Some(hint.into());
        self
    }
}

/// Where the matched text sits in the raw document text.
///
/// Best-effort: spans recovered from normalized or fuzzy matches are
/// approximations snapped to word boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSpan {
    /// UTF-8 byte offset range [start, end] into the raw document text
    pub utf8_byte_offset: [usize; 2],
    /// SHA256 hash of the slice bytes
    pub slice_sha256: String,
    /// Context around the span (~80 chars)
    pub anchor_text: String,
    /// 1-based line of the span start
    pub line: usize,
    /// 1-based column (in characters) of the span start
    pub col: usize,
}

impl MatchSpan {
    pub fn start(&self) -> usize {
        self.utf8_byte_offset[0]
    }

    pub fn end(&self) -> usize {
        self.utf8_byte_offset[1]
    }
}

/// Result of verifying one claim. Built once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationOutcome {
    /// Identifier of the verified claim
    pub claim_id: String,
    /// Outcome class
    pub status: VerificationStatus,
    /// Confidence in [0, 1]
    #[serde(serialize_with = "serialize_rounded")]
    pub confidence: f64,
    /// The quoted text as supplied
    pub quoted_text: String,
    /// Text actually found in the document
    pub matched_text: Option<String>,
    /// Where the match was found ("Page 3", a hint, or "Unknown location")
    pub matched_location: Option<String>,
    /// Diagnostics, in the order they were raised
    pub issues: Vec<String>,
    /// Status is verified or partial
    pub is_verified: bool,
    /// Unverified with confidence below 0.5
    pub is_hallucination: bool,
    /// Byte span of `matched_text` (present when it came from the document)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<MatchSpan>,
}

/// Confidence under which an unverified claim counts as a hallucination
pub const HALLUCINATION_CONFIDENCE: f64 = 0.5;

impl VerificationOutcome {
    /// Create an outcome, deriving the verified and hallucination flags
    pub fn new(
        claim: &AttributionClaim,
        status: VerificationStatus,
        confidence: f64,
        matched: Option<(String, MatchSpan)>,
        matched_location: Option<String>,
        issues: Vec<String>,
    ) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        let (matched_text, span) = match matched {
            Some((text, span)) => (Some(text), Some(span)),
            None => (None, None),
        };

        Self {
            claim_id: claim.claim_id.clone(),
            status,
            confidence,
            quoted_text: claim.quoted_text.clone(),
            matched_text,
            matched_location,
            issues,
            is_verified: matches!(
                status,
                VerificationStatus::Verified | VerificationStatus::Partial
            ),
            is_hallucination: status == VerificationStatus::Unverified
                && confidence < HALLUCINATION_CONFIDENCE,
            span,
        }
    }

    /// Outcome for a claim with no quoted text
    pub fn empty(claim: &AttributionClaim) -> Self {
        Self::new(
            claim,
            VerificationStatus::Empty,
            0.0,
            None,
            None,
            vec!["No source text provided".to_string()],
        )
    }

    /// Outcome for a claim that could not be checked
    pub fn skipped(claim: &AttributionClaim, issue: impl Into<String>) -> Self {
        Self::new(
            claim,
            VerificationStatus::Skipped,
            0.0,
            None,
            None,
            vec![issue.into()],
        )
    }
}

fn serialize_rounded<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 1000.0).round() / 1000.0)
}

/// Run-log events for verifications.jsonl
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VerificationEvent {
    /// A document's obligations were verified
    VerificationCompleted {
        document: String,
        document_sha256: String,
        total_claims: usize,
        verified_count: usize,
        partial_count: usize,
        unverified_count: usize,
        empty_count: usize,
        skipped_count: usize,
        verification_rate: f64,
        hallucination_ids: Vec<String>,
        ts: String,
    },
}
