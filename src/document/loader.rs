//! Reading documents from disk.
//!
//! Supported inputs:
//! - `.txt` / `.text`: form feeds (as written by `pdftotext`) separate
//!   pages; without them, pages are simulated at paragraph boundaries
//! - `.json`: `{"1": "page text", ...}` or `["page one", "page two"]`
//!
//! PDF parsing and OCR happen upstream; a `.pdf` is rejected here.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use super::{Document, DocumentError, PageMap};

/// Target characters per simulated page for plain text without form feeds
pub const SIMULATED_PAGE_CHARS: usize = 3000;

const FORM_FEED: char = '\u{000C}';

/// Load and parse a document file.
pub fn load_document(path: &Path) -> Result<Document, DocumentError> {
    if !path.exists() {
        return Err(DocumentError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_document(path, &content)
}

/// Parse already-read file content according to the path's extension.
///
/// Fails with [`DocumentError::NoExtractableText`] when every page is
/// blank, so callers never mistake an empty input for a document with
/// nothing to verify.
pub fn parse_document(path: &Path, content: &str) -> Result<Document, DocumentError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let pages = match extension.as_str() {
        "txt" | "text" => pages_from_plain_text(content),
        "json" => pages_from_json(content)?,
        _ => return Err(DocumentError::UnsupportedFormat { extension }),
    };

    let document = Document::from_pages(pages)?.with_source(path);

    if document.is_blank() {
        return Err(DocumentError::NoExtractableText(document.display_name()));
    }

    debug!(
        "Loaded {} ({} pages, {} sections)",
        document.display_name(),
        document.page_count(),
        document.sections.len()
    );

    Ok(document)
}

/// Split plain text into pages.
pub fn pages_from_plain_text(content: &str) -> PageMap {
    if content.contains(FORM_FEED) {
        let mut parts: Vec<&str> = content.split(FORM_FEED).collect();
        // pdftotext terminates the last page with a form feed too
        if parts.len() > 1 && parts.last().is_some_and(|p| p.trim().is_empty()) {
            parts.pop();
        }

        return parts
            .into_iter()
            .enumerate()
            .map(|(i, text)| (i as u32 + 1, text.trim().to_string()))
            .collect();
    }

    simulate_pages(content, SIMULATED_PAGE_CHARS)
}

/// Group blank-line-separated paragraphs into pages of roughly
/// `page_chars` characters.
fn simulate_pages(content: &str, page_chars: usize) -> PageMap {
    let mut pages = PageMap::new();
    let mut page_num = 1;
    let mut current = String::new();

    for para in content.split("\n\n") {
        if !current.is_empty() && current.chars().count() + para.chars().count() > page_chars {
            pages.insert(page_num, current.trim().to_string());
            page_num += 1;
            current = para.to_string();
        } else if current.is_empty() {
            current = para.to_string();
        } else {
            current.push_str("\n\n");
            current.push_str(para);
        }
    }

    if !current.trim().is_empty() {
        pages.insert(page_num, current.trim().to_string());
    }

    pages
}

fn pages_from_json(content: &str) -> Result<PageMap, DocumentError> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| DocumentError::MalformedPageMap {
            reason: format!("invalid JSON: {}", e),
        })?;

    match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(key, text)| -> Result<(u32, String), DocumentError> {
                let page = key
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| DocumentError::MalformedPageMap {
                        reason: format!("page key {:?} is not a positive integer", key),
                    })?;
                Ok((page, page_text(text, &key)?))
            })
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, text)| -> Result<(u32, String), DocumentError> {
                let page = i as u32 + 1;
                Ok((page, page_text(text, &page.to_string())?))
            })
            .collect(),
        _ => Err(DocumentError::MalformedPageMap {
            reason: "expected an object of page texts or an array of page texts".to_string(),
        }),
    }
}

fn page_text(value: Value, page: &str) -> Result<String, DocumentError> {
    match value {
        Value::String(text) => Ok(text),
        Value::Null => Ok(String::new()),
        other => Err(DocumentError::MalformedPageMap {
            reason: format!("page {} text must be a string, got {}", page, other),
        }),
    }
}
