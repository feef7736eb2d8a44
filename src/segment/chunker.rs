//! Boundary-aware document segmentation.
//!
//! Paragraphs are packed greedily into chunks of roughly
//! `target_chunk_size` characters. A paragraph is never split: when the
//! next one would overflow a non-empty buffer the buffer is closed, and
//! a paragraph larger than the target simply becomes its own chunk.
//!
//! Each new chunk is seeded with the tail of the previous one, trimmed
//! back to a sentence or paragraph boundary, so a consumer reading
//! chunk `k + 1` still sees how chunk `k` ended.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::chunk::Chunk;
use crate::config::SettingsError;
use crate::document::{detect_sections, Document, PageMap, SectionMarker};

/// Separator placed between paragraphs (and after the overlap seed)
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Sentence endings the overlap seed may start after
const SENTENCE_BOUNDARIES: [&str; 3] = [". ", ".\n", ".\t"];

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("invalid paragraph pattern"));

/// Segmenter parameters, in characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Target chunk length (default: 4000, roughly 1000 tokens)
    #[serde(default = "default_target_chunk_size")]
    pub target_chunk_size: usize,

    /// Maximum characters carried over between chunks (default: 200)
    #[serde(default = "default_overlap_size")]
    pub overlap_size: usize,
}

fn default_target_chunk_size() -> usize {
    4000
}
fn default_overlap_size() -> usize {
    200
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            target_chunk_size: default_target_chunk_size(),
            overlap_size: default_overlap_size(),
        }
    }
}

impl SegmenterConfig {
    /// Check `0 <= overlap_size < target_chunk_size`
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.target_chunk_size == 0 {
            return Err(SettingsError::ZeroChunkSize);
        }
        if self.overlap_size >= self.target_chunk_size {
            return Err(SettingsError::OverlapTooLarge {
                overlap: self.overlap_size,
                target: self.target_chunk_size,
            });
        }
        Ok(())
    }
}

/// Splits page-indexed documents into overlapping chunks.
///
/// A chunk holding several paragraphs never exceeds `target_chunk_size`.
/// A chunk opened by a flush holds the overlap seed, a separator and the
/// paragraph that triggered the flush, without a second size check, so
/// chunks stay within `1.2 * target_chunk_size` only while
/// `overlap_size <= 0.2 * target_chunk_size - 2` (the defaults, 4000 and
/// 200, satisfy this). A single paragraph longer than the target is
/// always emitted whole.
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Segmenter {
    /// Create a segmenter, rejecting invalid sizes
    pub fn new(config: SegmenterConfig) -> Result<Self, SettingsError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Segment a loaded document using its detected sections.
    pub fn segment(&self, document: &Document) -> Vec<Chunk> {
        let chunks = self.segment_with_sections(&document.pages, &document.sections);
        info!(
            "Segmented {} into {} chunks",
            document.display_name(),
            chunks.len()
        );
        chunks
    }

    /// Segment a bare page map, detecting sections on the fly.
    pub fn segment_pages(&self, pages: &PageMap) -> Vec<Chunk> {
        let sections: Vec<SectionMarker> = pages
            .iter()
            .flat_map(|(&page, text)| detect_sections(text, page))
            .collect();
        self.segment_with_sections(pages, &sections)
    }

    /// Segment pages with precomputed section markers.
    ///
    /// An input without any non-blank paragraph yields no chunks; callers
    /// must report that rather than carry on with nothing.
    pub fn segment_with_sections(&self, pages: &PageMap, sections: &[SectionMarker]) -> Vec<Chunk> {
        let paragraphs = split_paragraphs(pages, sections);
        if paragraphs.is_empty() {
            warn!("No non-blank paragraphs to segment");
            return Vec::new();
        }

        let target = self.config.target_chunk_size;
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut buffer = ChunkBuffer::default();

        for para in &paragraphs {
            let para_chars = para.text.chars().count();

            if !buffer.is_empty()
                && buffer.chars + PARAGRAPH_SEPARATOR.len() + para_chars > target
            {
                let closed = buffer.close(chunks.len());
                debug!(
                    "Closed chunk {} ({} chars, {})",
                    closed.index,
                    closed.char_count(),
                    closed.source_location()
                );

                let seed = overlap_seed(&closed.text, self.config.overlap_size);
                let seed_page = buffer.page_at(closed.text.len() - seed.len());
                buffer = ChunkBuffer::seeded(seed, seed_page);
                chunks.push(closed);
            }

            buffer.push(para);
        }

        if !buffer.is_empty() {
            chunks.push(buffer.close(chunks.len()));
        }

        // Closing pass: the sequence length is only known now
        let total = chunks.len();
        for chunk in &mut chunks {
            chunk.total_chunks = total;
        }

        chunks
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self {
            config: SegmenterConfig::default(),
        }
    }
}

/// A trimmed, non-empty paragraph tagged with its page
#[derive(Debug)]
struct Paragraph<'a> {
    page: u32,
    text: &'a str,
    sections: Vec<&'a str>,
}

fn split_paragraphs<'a>(pages: &'a PageMap, sections: &'a [SectionMarker]) -> Vec<Paragraph<'a>> {
    let mut paragraphs = Vec::new();

    for (&page, text) in pages {
        let page_sections: Vec<&str> = sections
            .iter()
            .filter(|s| s.page == page)
            .map(|s| s.name.as_str())
            .collect();

        for raw in PARAGRAPH_BREAK.split(text) {
            let para = raw.trim();
            if para.is_empty() {
                continue;
            }

            let para_sections = page_sections
                .iter()
                .copied()
                .filter(|s| para.contains(s) || s.contains(para))
                .collect();

            paragraphs.push(Paragraph {
                page,
                text: para,
                sections: para_sections,
            });
        }
    }

    paragraphs
}

/// Chunk under construction
#[derive(Debug, Default)]
struct ChunkBuffer {
    text: String,
    chars: usize,
    overlap_len: usize,
    /// (byte offset where a piece starts, page it came from)
    pieces: Vec<(usize, u32)>,
    sections: Vec<String>,
}

impl ChunkBuffer {
    fn seeded(seed: &str, page: u32) -> Self {
        let mut buffer = Self::default();
        if !seed.is_empty() {
            buffer.text.push_str(seed);
            buffer.text.push_str(PARAGRAPH_SEPARATOR);
            buffer.chars = seed.chars().count() + PARAGRAPH_SEPARATOR.len();
            buffer.overlap_len = buffer.text.len();
            buffer.pieces.push((0, page));
        }
        buffer
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn push(&mut self, para: &Paragraph<'_>) {
        if !self.text.is_empty() && self.text.len() > self.overlap_len {
            self.text.push_str(PARAGRAPH_SEPARATOR);
            self.chars += PARAGRAPH_SEPARATOR.len();
        }

        self.pieces.push((self.text.len(), para.page));
        self.text.push_str(para.text);
        self.chars += para.text.chars().count();

        for name in &para.sections {
            if !self.sections.iter().any(|s| s == name) {
                self.sections.push((*name).to_string());
            }
        }
    }

    /// Page of the piece containing byte `offset`
    fn page_at(&self, offset: usize) -> u32 {
        self.pieces
            .iter()
            .take_while(|(start, _)| *start <= offset)
            .last()
            .or_else(|| self.pieces.first())
            .map(|(_, page)| *page)
            .unwrap_or(1)
    }

    fn close(&self, index: usize) -> Chunk {
        let pages = self.pieces.iter().map(|(_, page)| *page);
        let start_page = pages.clone().min().unwrap_or(1);
        let end_page = pages.max().unwrap_or(start_page);

        Chunk {
            text: self.text.clone(),
            start_page,
            end_page,
            index,
            total_chunks: 0,
            sections: self.sections.clone(),
            overlap_len: self.overlap_len,
        }
    }
}

/// Tail of `text` carried into the next chunk.
///
/// Takes the last `overlap` characters, then drops everything up to the
/// last sentence boundary in that excerpt, or failing that the last
/// paragraph break. Text no longer than `overlap` is carried whole.
fn overlap_seed(text: &str, overlap: usize) -> &str {
    if overlap == 0 {
        return "";
    }

    let total = text.chars().count();
    if total <= overlap {
        return text.trim();
    }

    let excerpt_start = text
        .char_indices()
        .nth(total - overlap)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let excerpt = &text[excerpt_start..];

    let sentence_end = SENTENCE_BOUNDARIES
        .iter()
        .filter_map(|b| excerpt.rfind(b))
        .max()
        .filter(|&pos| pos > 0);
    if let Some(pos) = sentence_end {
        return excerpt[pos + 2..].trim();
    }

    if let Some(pos) = excerpt.rfind(PARAGRAPH_SEPARATOR).filter(|&pos| pos > 0) {
        return excerpt[pos + PARAGRAPH_SEPARATOR.len()..].trim();
    }

    excerpt.trim()
}
