//! Segmentation Integration Tests
//!
//! Tests for chunk packing, overlap seeding and page/section metadata.

use clauseguard::{Chunk, Document, PageMap, Segmenter, SegmenterConfig};

fn segmenter(target: usize, overlap: usize) -> Segmenter {
    Segmenter::new(SegmenterConfig {
        target_chunk_size: target,
        overlap_size: overlap,
    })
    .unwrap()
}

fn clause(n: usize) -> String {
    format!(
        "Clause {}: the tenant shall comply with obligation number {} in full.",
        n, n
    )
}

/// Three pages of four numbered clauses each
fn numbered_pages() -> PageMap {
    (1..=3u32)
        .map(|page| {
            let text = (0..4)
                .map(|i| clause((page as usize - 1) * 4 + i + 1))
                .collect::<Vec<_>>()
                .join("\n\n");
            (page, text)
        })
        .collect()
}

fn reconstruct(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(Chunk::fresh_text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[test]
fn test_short_document_single_chunk() {
    let pages: PageMap = [(1, "Tenant shall pay rent.".to_string())].into_iter().collect();
    let chunks = Segmenter::default().segment_pages(&pages);

    assert_eq!(chunks.len(), 1);
    let chunk = &chunks[0];
    assert_eq!(chunk.text, "Tenant shall pay rent.");
    assert_eq!(chunk.index, 0);
    assert_eq!(chunk.total_chunks, 1);
    assert_eq!(chunk.overlap_len, 0);
    assert_eq!(chunk.source_location(), "Page 1");
}

#[test]
fn test_blank_pages_produce_no_chunks() {
    let pages: PageMap = [(1, "   ".to_string()), (2, "\n\n".to_string())]
        .into_iter()
        .collect();
    assert!(Segmenter::default().segment_pages(&pages).is_empty());
    assert!(Segmenter::default().segment_pages(&PageMap::new()).is_empty());
}

#[test]
fn test_fresh_text_covers_every_paragraph_in_order() {
    let pages = numbered_pages();
    let chunks = segmenter(160, 40).segment_pages(&pages);

    let expected = (1..=12).map(clause).collect::<Vec<_>>().join("\n\n");
    assert!(chunks.len() > 1);
    assert_eq!(reconstruct(&chunks), expected);
}

#[test]
fn test_chunk_metadata_is_consistent() {
    let chunks = segmenter(160, 40).segment_pages(&numbered_pages());
    let total = chunks.len();

    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.index, i);
        assert_eq!(chunk.total_chunks, total);
        assert!(chunk.start_page <= chunk.end_page);
        assert!(chunk.end_page <= 3);

        // several paragraphs only share a chunk while it stays within bounds
        if chunk.fresh_text().contains("\n\n") {
            assert!(chunk.char_count() <= 160, "chunk {} too long", i);
        }
    }

    assert_eq!(chunks[0].overlap_len, 0);
    assert_eq!(chunks[0].start_page, 1);
    assert_eq!(chunks[total - 1].end_page, 3);
}

#[test]
fn test_overlap_carries_previous_tail() {
    let chunks = segmenter(160, 40).segment_pages(&numbered_pages());

    for pair in chunks.windows(2) {
        let overlap = pair[1].overlap_text();
        if !overlap.is_empty() {
            assert!(overlap.chars().count() <= 40);
            assert!(pair[0].text.ends_with(overlap));
        }
    }
}

#[test]
fn test_oversized_paragraph_is_not_split() {
    let long = "The tenant shall indemnify the landlord against all claims ".repeat(8);
    let long = long.trim().to_string();
    let pages: PageMap = [(1, format!("Short opening clause.\n\n{}\n\nShort closing clause.", long))]
        .into_iter()
        .collect();

    let chunks = segmenter(100, 20).segment_pages(&pages);

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].text, "Short opening clause.");
    assert_eq!(chunks[1].fresh_text(), long);
    assert!(chunks[1].char_count() > 100);
    assert_eq!(chunks[2].fresh_text(), "Short closing clause.");
}

#[test]
fn test_chunk_spanning_pages() {
    let pages: PageMap = [
        (1, "Tenant shall pay rent.".to_string()),
        (2, "Landlord shall repair the roof.".to_string()),
    ]
    .into_iter()
    .collect();

    let chunks = Segmenter::default().segment_pages(&pages);
    assert_eq!(chunks.len(), 1);
    assert_eq!(
        chunks[0].text,
        "Tenant shall pay rent.\n\nLandlord shall repair the roof."
    );
    assert_eq!(chunks[0].source_location(), "Pages 1-2");
}

#[test]
fn test_document_sections_attached_to_chunks() {
    let pages: PageMap = [
        (
            1,
            "1. RENT\nTenant shall pay rent of $500 monthly.".to_string(),
        ),
        (
            2,
            "2. MAINTENANCE\nLandlord shall repair the roof.".to_string(),
        ),
    ]
    .into_iter()
    .collect();
    let document = Document::from_pages(pages).unwrap();

    let chunks = segmenter(60, 10).segment(&document);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].sections, vec!["1. RENT".to_string()]);
    assert_eq!(chunks[1].sections, vec!["2. MAINTENANCE".to_string()]);
    assert_eq!(chunks[1].end_page, 2);
}

#[test]
fn test_invalid_settings_rejected() {
    assert!(Segmenter::new(SegmenterConfig {
        target_chunk_size: 0,
        overlap_size: 0,
    })
    .is_err());
    assert!(Segmenter::new(SegmenterConfig {
        target_chunk_size: 100,
        overlap_size: 100,
    })
    .is_err());
}

#[test]
fn test_seeded_chunks_stay_within_bound() {
    let paragraph = |i: usize| format!("Clause {:02}. {}", i, "x".repeat(84));
    let pages: PageMap = [(
        1,
        (0..10).map(paragraph).collect::<Vec<_>>().join("\n\n"),
    )]
    .into_iter()
    .collect();

    // overlap at 0.2 * target - 2
    let chunks = segmenter(100, 18).segment_pages(&pages);

    assert_eq!(chunks.len(), 10);
    for chunk in &chunks[1..] {
        assert!(chunk.overlap_len > 0);
        assert!(chunk.char_count() <= 120, "chunk {} has {} chars", chunk.index, chunk.char_count());
    }
}
