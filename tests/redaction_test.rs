//! Redaction pipeline integration tests.
//!
//! Exercises the full extract, match, translate, render path over
//! fixture documents with exactly known geometry, and pins down the two
//! load-bearing behaviors: the coordinate-space translation of drawn
//! rectangles, and the fact that occlusion leaves the text extractable.

use blackout::{BlackoutError, RedactionOptions, RedactionPipeline, SourceUrl};

mod common;
use common::*;

fn source(id: &str) -> SourceUrl {
    SourceUrl::parse(id).expect("valid test source")
}

fn run_redaction(bytes: &[u8], query: &str) -> Vec<u8> {
    RedactionPipeline::new(RedactionOptions::new())
        .run(&source("fixture.pdf"), bytes, query)
        .expect("redaction should succeed")
}

#[test]
fn test_rectangle_lands_at_translated_coordinates() {
    // "Secret" at 20pt from x=50, baseline 676: with the fallback metrics
    // (ascent 0.8, descent -0.2, width 500/1000) the extracted box is
    // (50, 100, 60, 20) in top-left space on a 792pt page, so the drawn
    // rectangle must sit at y = 792 - 100 = 692 in render space.
    let bytes = ContentPdfBuilder::new()
        .with_page(vec![("Secret", 50.0, 676.0, 20.0)])
        .build_bytes();

    let redacted = run_redaction(&bytes, "Secret");

    let rects = rectangles_on_page(&redacted, 1);
    assert_eq!(rects.len(), 1, "exactly one rectangle expected");
    let (x, y, w, h) = rects[0];
    assert!((x - 50.0).abs() < 0.01, "x was {x}");
    assert!((y - 692.0).abs() < 0.01, "y was {y}");
    assert!((w - 60.0).abs() < 0.01, "w was {w}");
    assert!((h - 20.0).abs() < 0.01, "h was {h}");
}

#[test]
fn test_zero_matches_returns_input_unchanged() {
    let bytes = ContentPdfBuilder::new()
        .with_page(vec![("nothing", 50.0, 700.0, 12.0), ("here", 120.0, 700.0, 12.0)])
        .build_bytes();

    let redacted = run_redaction(&bytes, "absent");
    assert_eq!(redacted, bytes, "no-match output must be byte-identical");
}

#[test]
fn test_matching_is_case_insensitive_end_to_end() {
    let bytes = ContentPdfBuilder::new()
        .with_page(vec![("Secret", 50.0, 700.0, 12.0)])
        .build_bytes();

    let redacted = run_redaction(&bytes, "sEcReT");
    assert_eq!(rectangles_on_page(&redacted, 1).len(), 1);
}

#[test]
fn test_substring_matches_are_covered() {
    let bytes = ContentPdfBuilder::new()
        .with_page(vec![
            ("cat", 50.0, 700.0, 12.0),
            ("concatenate", 100.0, 700.0, 12.0),
            ("CATALOG", 200.0, 700.0, 12.0),
            ("dog", 300.0, 700.0, 12.0),
        ])
        .build_bytes();

    let redacted = run_redaction(&bytes, "cat");
    assert_eq!(rectangles_on_page(&redacted, 1).len(), 3);
}

#[test]
fn test_every_page_gets_its_own_rectangles() {
    let bytes = ContentPdfBuilder::new()
        .with_page(vec![("secret", 50.0, 700.0, 12.0)])
        .with_page(vec![("harmless", 50.0, 700.0, 12.0)])
        .with_page(vec![
            ("secret", 50.0, 700.0, 12.0),
            ("secrets", 150.0, 700.0, 12.0),
        ])
        .build_bytes();

    let redacted = run_redaction(&bytes, "secret");

    assert_page_count(&redacted, 3);
    assert_eq!(rectangles_on_page(&redacted, 1).len(), 1);
    assert_eq!(rectangles_on_page(&redacted, 2).len(), 0);
    assert_eq!(rectangles_on_page(&redacted, 3).len(), 2);
}

#[test]
fn test_page_count_and_text_survive_redaction() {
    let bytes = ContentPdfBuilder::new()
        .with_page(vec![("keep", 50.0, 700.0, 12.0), ("hide", 120.0, 700.0, 12.0)])
        .with_page(vec![("keep", 50.0, 700.0, 12.0)])
        .build_bytes();

    let redacted = run_redaction(&bytes, "hide");

    assert_page_count(&redacted, 2);
    assert_word_present(&redacted, "keep");
    // The documented caveat: occlusion draws over text, it does not
    // remove it. The covered word still extracts.
    assert_word_present(&redacted, "hide");
}

#[test]
fn test_taller_page_uses_its_own_height() {
    // A4-height page: 842pt. Word top at 842 - (700 + 0.8 * 10) = 134,
    // so the rectangle lands back at 708 in render space.
    let bytes = ContentPdfBuilder::new()
        .with_page_height(842)
        .with_page(vec![("secret", 50.0, 700.0, 10.0)])
        .build_bytes();

    let redacted = run_redaction(&bytes, "secret");
    let rects = rectangles_on_page(&redacted, 1);
    assert_eq!(rects.len(), 1);
    let (_, y, _, _) = rects[0];
    assert!((y - 708.0).abs() < 0.01, "y was {y}");
}

#[test]
fn test_garbage_input_is_a_parse_error() {
    let result = RedactionPipeline::new(RedactionOptions::new()).run(
        &source("http://host/broken.pdf"),
        b"not a pdf at all",
        "secret",
    );
    match result {
        Err(BlackoutError::Parse { source_id, .. }) => {
            assert_eq!(source_id, "http://host/broken.pdf");
        }
        other => panic!("expected Parse error, got {other:?}"),
    }
}
