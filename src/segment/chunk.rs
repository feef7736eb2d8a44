//! Chunk data type.

use serde::{Deserialize, Serialize};

/// A bounded slice of document text sized for a fixed-context consumer.
///
/// Chunks after the first start with an overlap excerpt copied from the
/// tail of the previous chunk, followed by a blank line.
/// `overlap_len` is the byte length of that prefix (separator included),
/// so `&text[overlap_len..]` is the content this chunk contributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text (overlap prefix included)
    pub text: String,

    /// First page contributing text, overlap included
    pub start_page: u32,

    /// Last page contributing text
    pub end_page: u32,

    /// 0-based position in the document's chunk sequence
    pub index: usize,

    /// Length of the whole sequence
    pub total_chunks: usize,

    /// Section headings found in this chunk's paragraphs
    #[serde(default)]
    pub sections: Vec<String>,

    /// Byte length of the overlap prefix (0 for the first chunk)
    #[serde(default)]
    pub overlap_len: usize,
}

impl Chunk {
    /// Human-readable page span, e.g. "Page 3" or "Pages 3-5"
    pub fn source_location(&self) -> String {
        if self.start_page == self.end_page {
            format!("Page {}", self.start_page)
        } else {
            format!("Pages {}-{}", self.start_page, self.end_page)
        }
    }

    /// Number of characters in the chunk text
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// The overlap excerpt carried over from the previous chunk
    pub fn overlap_text(&self) -> &str {
        self.text[..self.overlap_len].trim_end()
    }

    /// Text this chunk adds beyond the carried-over overlap
    pub fn fresh_text(&self) -> &str {
        &self.text[self.overlap_len..]
    }
}
