//! Legal heading detection.
//!
//! Headings are advisory metadata: they are attached to chunks for the
//! downstream consumer's context and never decide where a chunk ends.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A detected structural heading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMarker {
    /// Heading text as it appears on the line (trimmed)
    pub name: String,
    /// Page the heading was found on
    pub page: u32,
    /// 0-based line index within the page text
    pub line: usize,
}

static HEADING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // ARTICLE I: Title
        r"^(?:ARTICLE|SECTION|PART)\s+[IVXLCDM\d]+[.:]\s*(.+)$",
        // 1. DEFINITIONS
        r"^(\d+\.)\s+([A-Z][A-Z\s]+)$",
        // 1.1 Subsection
        r"^(\d+\.\d+)\s+(.+)$",
        // ALL CAPS HEADERS
        r"^([A-Z][A-Z\s]{2,})$",
        // EXHIBIT A
        r"^((?:EXHIBIT|SCHEDULE|APPENDIX)\s+[A-Z\d]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid heading pattern"))
    .collect()
});

/// Detect heading lines in one page of text.
pub fn detect_sections(text: &str, page: u32) -> Vec<SectionMarker> {
    text.split('\n')
        .enumerate()
        .filter_map(|(line_no, line)| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            is_heading(line).then(|| SectionMarker {
                name: line.to_string(),
                page,
                line: line_no,
            })
        })
        .collect()
}

/// True when a trimmed line looks like a legal heading
pub fn is_heading(line: &str) -> bool {
    HEADING_PATTERNS.iter().any(|p| p.is_match(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_patterns() {
        assert!(is_heading("ARTICLE IV: TERMINATION"));
        assert!(is_heading("SECTION 12. Notices"));
        assert!(is_heading("1. DEFINITIONS"));
        assert!(is_heading("3.2 Late fees apply after five days"));
        assert!(is_heading("RENTAL AGREEMENT"));
        assert!(is_heading("EXHIBIT B"));
        assert!(is_heading("SCHEDULE 1 - Equipment"));

        assert!(!is_heading("Tenant shall pay rent monthly."));
        assert!(!is_heading("AB"));
        assert!(!is_heading("1. Definitions of terms"));
    }

    #[test]
    fn test_detect_records_line_offsets() {
        let text = "LEASE\n\n1. RENT\nTenant shall pay rent.\n  2.1 Late Fees  ";
        let markers = detect_sections(text, 4);

        let names: Vec<_> = markers.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["LEASE", "1. RENT", "2.1 Late Fees"]);
        assert_eq!(markers[0].line, 0);
        assert_eq!(markers[1].line, 2);
        assert_eq!(markers[2].line, 4);
        assert!(markers.iter().all(|m| m.page == 4));
    }

    #[test]
    fn test_empty_page_has_no_sections() {
        assert!(detect_sections("", 1).is_empty());
        assert!(detect_sections("\n \n", 1).is_empty());
    }
}
