//! Verification Integration Tests
//!
//! End-to-end checks of the escalating matching strategies and the
//! per-document summary, using the public API only.

use clauseguard::evidence::{parse_obligations, to_claims, UNKNOWN_LOCATION};
use clauseguard::{
    AttributionClaim, Document, PageMap, VerificationStatus, Verifier, VerifierConfig,
};

const WORKED_EXAMPLE: &str =
    "[Page 1]\nTenant shall pay rent of $500 monthly.\n\n[Page 2]\nLandlord shall repair the roof.";

fn lease() -> Document {
    let pages: PageMap = [
        (
            1,
            "RESIDENTIAL LEASE AGREEMENT\n\n1. RENT\nTenant shall pay rent of $1,500.00 on the first day of each month. \
             Rent paid after the fifth day of the month incurs a late fee of $75.",
        ),
        (
            2,
            "2. MAINTENANCE\nLandlord shall maintain the roof, plumbing and electrical systems in good working order. \
             Tenant shall keep the premises clean and sanitary.",
        ),
        (
            3,
            "3. TERMINATION\nEither party may terminate this lease with sixty (60) days written notice delivered to the other party.",
        ),
    ]
    .into_iter()
    .map(|(page, text)| (page, text.to_string()))
    .collect();

    Document::from_pages(pages).unwrap()
}

fn claim(id: &str, text: &str) -> AttributionClaim {
    AttributionClaim::new(id, text)
}

#[test]
fn test_worked_example_verified() {
    let outcome = Verifier::default().verify_text(
        &claim("OBL-001", "Tenant shall pay rent of $500 monthly."),
        WORKED_EXAMPLE,
    );

    assert_eq!(outcome.status, VerificationStatus::Verified);
    assert_eq!(outcome.confidence, 1.0);
    assert_eq!(outcome.matched_location.as_deref(), Some("Page 1"));
    assert!(outcome.is_verified);
    assert!(!outcome.is_hallucination);
}

#[test]
fn test_worked_example_hallucination() {
    let outcome = Verifier::default()
        .verify_text(&claim("OBL-002", "Tenant owes a $50,000 penalty."), WORKED_EXAMPLE);

    assert_eq!(outcome.status, VerificationStatus::Unverified);
    assert!(outcome.confidence < 0.5);
    assert!(outcome.is_hallucination);
    assert!(outcome
        .issues
        .iter()
        .any(|i| i.starts_with("POSSIBLE HALLUCINATION")));
}

#[test]
fn test_lease_strategies() {
    let doc = lease();
    let claims = vec![
        claim(
            "exact",
            "Landlord shall maintain the roof, plumbing and electrical systems in good working order.",
        ),
        claim("normalized", "Tenant shall keep the   premises CLEAN and sanitary."),
        claim(
            "fuzzy",
            "Landlord shall maintain the roof, plumbing and electric systems in good working order.",
        ),
        claim("partial", "Rent paid late after the fifth day incurs a fee of $75."),
        claim(
            "key-phrases",
            "Tenant must pay rent of $1,500.00 on the first of every month or a late fee of $75 applies.",
        ),
        claim(
            "hallucinated",
            "Landlord shall provide free parking for two vehicles at no additional cost.",
        ),
        claim("empty", ""),
    ];

    let summary = Verifier::default().verify_document(&claims, &doc);
    let by_id = |id: &str| {
        summary
            .outcomes
            .iter()
            .find(|o| o.claim_id == id)
            .unwrap()
    };

    let exact = by_id("exact");
    assert_eq!(exact.status, VerificationStatus::Verified);
    assert_eq!(exact.confidence, 1.0);
    assert_eq!(exact.matched_location.as_deref(), Some("Page 2"));

    let normalized = by_id("normalized");
    assert_eq!(normalized.status, VerificationStatus::Verified);
    assert_eq!(normalized.confidence, 0.95);
    assert_eq!(
        normalized.matched_text.as_deref(),
        Some("Tenant shall keep the premises clean and sanitary.")
    );
    assert_eq!(normalized.matched_location.as_deref(), Some("Page 2"));

    let fuzzy = by_id("fuzzy");
    assert_eq!(fuzzy.status, VerificationStatus::Verified);
    assert!(fuzzy.confidence >= 0.85 && fuzzy.confidence < 1.0);
    assert_eq!(fuzzy.matched_location.as_deref(), Some("Page 2"));
    assert!(fuzzy
        .matched_text
        .as_deref()
        .unwrap()
        .contains("electrical systems"));

    let partial = by_id("partial");
    assert_eq!(partial.status, VerificationStatus::Partial);
    assert!(partial.confidence >= 0.70 && partial.confidence < 0.85);
    assert_eq!(partial.matched_location.as_deref(), Some("Page 1"));
    assert!(partial.issues[0].starts_with("Partial match only"));

    let phrases = by_id("key-phrases");
    assert_eq!(phrases.status, VerificationStatus::Partial);
    assert_eq!(phrases.issues, vec!["Found 7/10 key phrases"]);
    assert!((phrases.confidence - 0.49).abs() < 1e-9);
    assert!(phrases.matched_text.is_none());
    assert_eq!(phrases.matched_location.as_deref(), Some("Page 1"));

    let hallucinated = by_id("hallucinated");
    assert_eq!(hallucinated.status, VerificationStatus::Unverified);
    assert!(hallucinated.is_hallucination);
    assert!(hallucinated.matched_location.is_none());

    assert_eq!(by_id("empty").status, VerificationStatus::Empty);

    assert_eq!(summary.total_claims, 7);
    assert_eq!(summary.verified_count, 3);
    assert_eq!(summary.partial_count, 2);
    assert_eq!(summary.unverified_count, 1);
    assert_eq!(summary.empty_count, 1);
    assert!((summary.verification_rate - 5.0 / 6.0).abs() < 1e-9);
    assert!(summary.has_hallucinations);
    assert_eq!(summary.hallucinations().count(), 1);
}

#[test]
fn test_location_hint_is_preferred() {
    let doc = lease();
    let claims = vec![AttributionClaim::new(
        "OBL-001",
        "Tenant shall keep the premises clean and sanitary.",
    )
    .with_location("Section 2")];

    let summary = Verifier::default().verify_document(&claims, &doc);
    assert_eq!(
        summary.outcomes[0].matched_location.as_deref(),
        Some("Section 2")
    );
}

#[test]
fn test_unknown_location_without_markers() {
    let outcome = Verifier::default().verify_text(
        &claim("OBL-001", "Tenant shall pay rent."),
        "Tenant shall pay rent. Landlord shall repair.",
    );
    assert_eq!(outcome.status, VerificationStatus::Verified);
    assert_eq!(outcome.matched_location.as_deref(), Some(UNKNOWN_LOCATION));
}

#[test]
fn test_zero_claims_rate_is_one() {
    let summary = Verifier::default().verify_document(&[], &lease());
    assert_eq!(summary.total_claims, 0);
    assert_eq!(summary.verification_rate, 1.0);
    assert!(!summary.has_hallucinations);
}

#[test]
fn test_empty_document_skips_claims() {
    let claims = vec![claim("OBL-001", "Tenant shall pay rent.")];
    let summary = Verifier::default().verify_all(&claims, "");

    assert_eq!(summary.skipped_count, 1);
    assert_eq!(summary.outcomes[0].status, VerificationStatus::Skipped);
    assert!(!summary.has_hallucinations);
    // skipped claims are verifiable but not verified
    assert_eq!(summary.verification_rate, 0.0);
}

#[test]
fn test_malformed_records_do_not_abort() {
    let obligations = parse_obligations(
        r#"{"obligations": [
            "not an object",
            {"id": "OBL-002", "source_text": "Tenant shall keep the premises clean and sanitary.", "source_location": null}
        ]}"#,
    )
    .unwrap();

    let summary = Verifier::default().verify_document(&to_claims(&obligations), &lease());
    assert_eq!(summary.outcomes[0].status, VerificationStatus::Empty);
    assert_eq!(summary.outcomes[1].status, VerificationStatus::Verified);
    assert_eq!(summary.verification_rate, 1.0);
}

#[test]
fn test_stricter_thresholds_demote_fuzzy_match() {
    let strict = Verifier::new(VerifierConfig {
        fuzzy_threshold: 0.99,
        partial_threshold: 0.9,
        ..Default::default()
    })
    .unwrap();

    let outcome = strict.verify_text(
        &claim(
            "OBL-001",
            "Landlord shall maintain the roof, plumbing and electric systems in good working order.",
        ),
        &lease().raw_text(),
    );
    assert_eq!(outcome.status, VerificationStatus::Partial);
    assert!(outcome.confidence > 0.9 && outcome.confidence < 0.99);
}

#[test]
fn test_match_span_points_into_raw_text() {
    let doc = lease();
    let raw = doc.raw_text();
    let outcome = Verifier::default().verify_text(
        &claim("OBL-001", "late fee of $75"),
        &raw,
    );

    let span = outcome.span.unwrap();
    assert_eq!(&raw[span.start()..span.end()], "late fee of $75");
    assert_eq!(
        span.slice_sha256,
        clauseguard::evidence::compute_hash(b"late fee of $75")
    );
    assert!(span.anchor_text.contains("late fee of $75"));
}
