//! clauseguard - Contract segmentation and source-attribution verification
//!
//! Obligations extracted from a contract by a language model carry a
//! quoted `source_text`. Models paraphrase and sometimes invent those
//! quotes, so this crate checks every one against the original text
//! instead of trusting it.
//!
//! # Pipeline
//!
//! - `document`: page-indexed contract text with `[Page N]` markers
//! - `segment`: overlapping, paragraph-aligned chunks sized for the model
//! - `evidence`: per-quote verification and per-document aggregation
//! - `text`: normalization and the similarity ratio both of them use
//!
//! # Usage
//!
//! ```bash
//! # Split a contract into model-sized chunks
//! clauseguard segment lease.txt --chunk-size 4000
//!
//! # Verify extracted obligations (exit code 2 on hallucinations)
//! clauseguard verify lease.txt --obligations lease_obligations.json
//!
//! # Check a single quote
//! clauseguard check lease.txt --quote "Tenant shall pay rent of $500 monthly."
//! ```

pub mod cli;
pub mod config;
pub mod document;
pub mod evidence;
pub mod segment;
pub mod text;

// Re-export main types at crate root for convenience
pub use config::SettingsError;
pub use document::{Document, DocumentError, PageMap, SectionMarker};
pub use evidence::{
    AttributionClaim, DocumentVerificationSummary, VerificationOutcome, VerificationStatus,
    Verifier, VerifierConfig,
};
pub use segment::{Chunk, Segmenter, SegmenterConfig};
