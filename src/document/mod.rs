//! Page-indexed contract text.
//!
//! A document is an ordered mapping of page number to extracted page
//! text plus the section headings detected on those pages. The raw
//! text handed to the verifier is rendered from the same pages with a
//! `[Page N]` marker in front of every page so that match offsets can
//! be mapped back to page numbers.

pub mod loader;
pub mod sections;

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

pub use loader::{load_document, pages_from_plain_text, parse_document};
pub use sections::{detect_sections, SectionMarker};

/// Page number (1-based) to raw page text. Gaps are allowed.
pub type PageMap = BTreeMap<u32, String>;

/// Input-shape errors for documents
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read document {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported document type: {extension} (expected .txt, .text or .json)")]
    UnsupportedFormat { extension: String },

    #[error("Malformed page map: {reason}")]
    MalformedPageMap { reason: String },

    #[error("No text extracted from {0}. The file may be scanned or image-based and require OCR.")]
    NoExtractableText(String),
}

/// A contract split into pages
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// File the document was loaded from, if any
    pub source: Option<PathBuf>,

    /// Page text keyed by page number
    pub pages: PageMap,

    /// Headings detected across all pages, in page order
    pub sections: Vec<SectionMarker>,
}

impl Document {
    /// Build a document from a page map, detecting section headings.
    pub fn from_pages(pages: PageMap) -> Result<Self, DocumentError> {
        if pages.contains_key(&0) {
            return Err(DocumentError::MalformedPageMap {
                reason: "page numbers start at 1".to_string(),
            });
        }

        let sections = pages
            .iter()
            .flat_map(|(&page, text)| detect_sections(text, page))
            .collect();

        Ok(Self {
            source: None,
            pages,
            sections,
        })
    }

    /// Attach the originating file path
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Render the verifier's view of the document.
    ///
    /// Every page becomes `"[Page N]\n" + text`; pages are joined with a
    /// blank line.
    pub fn raw_text(&self) -> String {
        self.pages
            .iter()
            .map(|(page, text)| format!("[Page {}]\n{}", page, text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Number of pages in the map (including blank ones)
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total characters of page text, markers excluded
    pub fn char_count(&self) -> usize {
        self.pages.values().map(|t| t.chars().count()).sum()
    }

    /// True when no page carries any non-whitespace text
    pub fn is_blank(&self) -> bool {
        self.pages.values().all(|t| t.trim().is_empty())
    }

    /// Display name for logs and reports
    pub fn display_name(&self) -> String {
        self.source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(entries: &[(u32, &str)]) -> PageMap {
        entries
            .iter()
            .map(|(n, t)| (*n, t.to_string()))
            .collect()
    }

    #[test]
    fn test_raw_text_marker_convention() {
        let doc = Document::from_pages(pages(&[
            (2, "Landlord shall repair the roof."),
            (1, "Tenant shall pay rent of $500 monthly."),
        ]))
        .unwrap();

        assert_eq!(
            doc.raw_text(),
            "[Page 1]\nTenant shall pay rent of $500 monthly.\n\n[Page 2]\nLandlord shall repair the roof."
        );
    }

    #[test]
    fn test_page_zero_rejected() {
        let result = Document::from_pages(pages(&[(0, "text")]));
        assert!(matches!(result, Err(DocumentError::MalformedPageMap { .. })));
    }

    #[test]
    fn test_sections_detected_per_page() {
        let doc = Document::from_pages(pages(&[
            (1, "LEASE AGREEMENT\n\nThe parties agree."),
            (3, "ARTICLE II: RENT\nRent is due."),
        ]))
        .unwrap();

        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].page, 1);
        assert_eq!(doc.sections[1].name, "ARTICLE II: RENT");
        assert_eq!(doc.sections[1].page, 3);
    }

    #[test]
    fn test_blank_detection() {
        let doc = Document::from_pages(pages(&[(1, "  \n"), (2, "")])).unwrap();
        assert!(doc.is_blank());
        assert_eq!(doc.page_count(), 2);
    }
}
