//! Text canonicalization and similarity scoring.
//!
//! Both are comparison-only tools: normalized text is never shown to a
//! user and similarity scores are never computed on raw text.

pub mod normalize;
pub mod similarity;

pub use normalize::{lowercase, normalize};
pub use similarity::{similarity, BlockMatcher};
