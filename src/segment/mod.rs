//! Splitting documents into overlapping, page-tagged chunks.

pub mod chunk;
pub mod chunker;

pub use chunk::Chunk;
pub use chunker::{Segmenter, SegmenterConfig};
