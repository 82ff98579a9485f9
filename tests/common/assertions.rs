//! Custom assertions for merged and redacted documents.
//!
//! Domain-specific checks with readable failure messages: page counts,
//! drawn-rectangle geometry, and word survival (the occlusion caveat).

use blackout::{extract_words, PagePolicy};
use lopdf::content::Content;
use lopdf::{Document, Object};
use std::path::Path;

/// Asserts that a file exists and is loadable PDF.
pub fn assert_valid_pdf(pdf_path: &Path) {
    assert!(
        pdf_path.exists(),
        "PDF should exist at '{}'",
        pdf_path.display()
    );
    Document::load(pdf_path)
        .unwrap_or_else(|e| panic!("PDF at '{}' should load: {e}", pdf_path.display()));
}

/// Asserts the document has exactly `expected` pages.
pub fn assert_page_count(bytes: &[u8], expected: usize) {
    let doc = Document::load_mem(bytes).expect("output should be loadable PDF");
    let actual = doc.get_pages().len();
    assert_eq!(
        actual, expected,
        "expected {expected} page(s), found {actual}"
    );
}

/// Words extracted from the document, in page order.
pub fn words_of(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("output should be loadable PDF");
    extract_words(&doc, PagePolicy::Abort)
        .expect("output pages should decode")
        .into_iter()
        .flat_map(|page| page.words.into_iter().map(|w| w.text))
        .collect()
}

/// All `re` operands drawn on the given 1-based page, as (x, y, w, h).
pub fn rectangles_on_page(bytes: &[u8], page: u32) -> Vec<(f32, f32, f32, f32)> {
    let doc = Document::load_mem(bytes).expect("output should be loadable PDF");
    let page_id = *doc
        .get_pages()
        .get(&page)
        .unwrap_or_else(|| panic!("page {page} should exist"));
    let content_data = doc
        .get_page_content(page_id)
        .expect("page content should be readable");
    let content = Content::decode(&content_data).expect("page content should decode");

    content
        .operations
        .iter()
        .filter(|op| op.operator == "re")
        .map(|op| {
            let v: Vec<f32> = op
                .operands
                .iter()
                .map(|o| match o {
                    Object::Integer(i) => *i as f32,
                    Object::Real(r) => *r,
                    other => panic!("non-numeric re operand {other:?}"),
                })
                .collect();
            assert_eq!(v.len(), 4, "re should carry four operands");
            (v[0], v[1], v[2], v[3])
        })
        .collect()
}

/// Asserts a word is still extractable from the document. Used both for
/// merge content checks and to pin down the occlusion caveat: redaction
/// draws over text, it does not remove it.
pub fn assert_word_present(bytes: &[u8], word: &str) {
    let words = words_of(bytes);
    assert!(
        words.iter().any(|w| w == word),
        "word '{word}' should be extractable; found {words:?}"
    );
}
