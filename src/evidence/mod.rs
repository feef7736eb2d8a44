//! Source attribution for extracted obligations
//!
//! The extraction step quotes the contract for every obligation it
//! returns. This module checks each quote against the original text
//! instead of trusting it, and aggregates the results per document.
//!
//! # Design Principles
//!
//! - **Escalating strategies**: exact, normalized, fuzzy window, then
//!   key phrases; the first that succeeds decides the status.
//! - **Hallucinations are data**: an unverified quote is an outcome with
//!   a confidence and issues, never an error.
//! - **Per-claim isolation**: claims share no state, are verified in
//!   parallel, and one failing claim cannot affect another.
//! - **Best-effort spans**: matched text recovered from normalized
//!   positions is approximate; the slice hash pins what was reported.
//!
//! # Example
//!
//! ```
//! use clauseguard::evidence::{AttributionClaim, Verifier, VerificationStatus};
//!
//! let document = "[Page 1]\nTenant shall pay rent of $500 monthly.";
//! let claim = AttributionClaim::new("OBL-001", "Tenant shall pay rent of $500 monthly.");
//!
//! let outcome = Verifier::default().verify_text(&claim, document);
//! assert_eq!(outcome.status, VerificationStatus::Verified);
//! assert_eq!(outcome.matched_location.as_deref(), Some("Page 1"));
//! ```

pub mod claims;
pub mod phrases;
pub mod report;
pub mod spans;
pub mod types;
pub mod verifier;

pub use claims::{
    load_obligations, parse_obligations, to_claims, ClaimsError, Obligation, SourceQuote,
};
pub use phrases::extract_key_phrases;
pub use report::DocumentVerificationSummary;
pub use spans::{
    compute_hash, compute_slice_hash, extract_anchor_text, offset_to_line_col, LineCol,
    UNKNOWN_LOCATION,
};
pub use types::{
    AttributionClaim, MatchSpan, VerificationEvent, VerificationOutcome, VerificationStatus,
};
pub use verifier::{best_window, verify_claim, SourceText, Verifier, VerifierConfig};
