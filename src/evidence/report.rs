//! Per-document aggregation of verification outcomes.

use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::spans::compute_hash;
use super::types::{AttributionClaim, VerificationEvent, VerificationOutcome, VerificationStatus};
use super::verifier::{SourceText, Verifier};
use crate::document::Document;

/// Name recorded for documents verified from an in-memory string
const IN_MEMORY_DOCUMENT: &str = "<memory>";

/// Verification results for one document. Built once, read-only after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentVerificationSummary {
    /// Document path or display name
    pub document: String,
    /// SHA256 of the raw text the claims were checked against
    pub document_sha256: String,
    pub verified_at: DateTime<Utc>,
    pub total_claims: usize,
    pub verified_count: usize,
    pub partial_count: usize,
    pub unverified_count: usize,
    pub empty_count: usize,
    pub skipped_count: usize,
    /// (verified + partial) / (total - empty), 1.0 when nothing was verifiable
    pub verification_rate: f64,
    pub has_hallucinations: bool,
    /// One outcome per claim, in claim order
    pub outcomes: Vec<VerificationOutcome>,
}

impl DocumentVerificationSummary {
    /// Aggregate outcomes into counts and derived rates
    pub fn from_outcomes(
        document: impl Into<String>,
        document_sha256: impl Into<String>,
        outcomes: Vec<VerificationOutcome>,
    ) -> Self {
        let count = |status: VerificationStatus| outcomes.iter().filter(|o| o.status == status).count();

        let total_claims = outcomes.len();
        let verified_count = count(VerificationStatus::Verified);
        let partial_count = count(VerificationStatus::Partial);
        let unverified_count = count(VerificationStatus::Unverified);
        let empty_count = count(VerificationStatus::Empty);
        let skipped_count = count(VerificationStatus::Skipped);

        let verifiable = total_claims - empty_count;
        let verification_rate = if verifiable == 0 {
            1.0
        } else {
            (verified_count + partial_count) as f64 / verifiable as f64
        };

        Self {
            document: document.into(),
            document_sha256: document_sha256.into(),
            verified_at: Utc::now(),
            total_claims,
            verified_count,
            partial_count,
            unverified_count,
            empty_count,
            skipped_count,
            verification_rate,
            has_hallucinations: outcomes.iter().any(|o| o.is_hallucination),
            outcomes,
        }
    }

    /// Outcomes flagged as likely hallucinations
    pub fn hallucinations(&self) -> impl Iterator<Item = &VerificationOutcome> {
        self.outcomes.iter().filter(|o| o.is_hallucination)
    }

    /// Partial matches, which deserve human review
    pub fn partial_matches(&self) -> impl Iterator<Item = &VerificationOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == VerificationStatus::Partial)
    }

    /// Run-log event describing this summary
    pub fn to_event(&self) -> VerificationEvent {
        VerificationEvent::VerificationCompleted {
            document: self.document.clone(),
            document_sha256: self.document_sha256.clone(),
            total_claims: self.total_claims,
            verified_count: self.verified_count,
            partial_count: self.partial_count,
            unverified_count: self.unverified_count,
            empty_count: self.empty_count,
            skipped_count: self.skipped_count,
            verification_rate: self.verification_rate,
            hallucination_ids: self.hallucinations().map(|o| o.claim_id.clone()).collect(),
            ts: self.verified_at.to_rfc3339(),
        }
    }
}

impl Verifier {
    /// Verify every claim against a loaded document.
    pub fn verify_document(
        &self,
        claims: &[AttributionClaim],
        document: &Document,
    ) -> DocumentVerificationSummary {
        self.verify_named(claims, &document.raw_text(), document.display_name())
    }

    /// Verify every claim against raw document text.
    pub fn verify_all(&self, claims: &[AttributionClaim], document_text: &str) -> DocumentVerificationSummary {
        self.verify_named(claims, document_text, IN_MEMORY_DOCUMENT.to_string())
    }

    fn verify_named(
        &self,
        claims: &[AttributionClaim],
        document_text: &str,
        document: String,
    ) -> DocumentVerificationSummary {
        let source = SourceText::new(document_text);
        let outcomes = verify_isolated(claims, |claim| self.verify(claim, &source));

        let summary = DocumentVerificationSummary::from_outcomes(
            document,
            compute_hash(document_text.as_bytes()),
            outcomes,
        );

        info!(
            "Verified {} claims in {}: {:.1}% verification rate",
            summary.total_claims,
            summary.document,
            summary.verification_rate * 100.0
        );
        if summary.has_hallucinations {
            warn!(
                "{} possible hallucination(s) in {}",
                summary.hallucinations().count(),
                summary.document
            );
        }

        summary
    }
}

/// Run `verify` over every claim in parallel, keeping claim order.
///
/// A claim whose verification panics is reported as skipped and the
/// others are unaffected.
fn verify_isolated<F>(claims: &[AttributionClaim], verify: F) -> Vec<VerificationOutcome>
where
    F: Fn(&AttributionClaim) -> VerificationOutcome + Sync,
{
    claims
        .par_iter()
        .map(|claim| {
            catch_unwind(AssertUnwindSafe(|| verify(claim))).unwrap_or_else(|_| {
                warn!("{}: verification panicked, marking as skipped", claim.claim_id);
                VerificationOutcome::skipped(claim, "Verification failed")
            })
        })
        .collect()
}
