//! Query matching over extracted words.
//!
//! Matching is deliberately plain: a word matches when its text contains
//! the query as a case-insensitive substring. No tokenization, no fuzzy
//! distance, no regular expressions. "apple" matches both "Apple" and
//! "apples", and "cat" matches "concatenate".

use crate::extract::PageWords;
use crate::geometry::TextSpaceBox;

/// The matched boxes of one page, still in text-extraction space.
#[derive(Debug, Clone)]
pub struct PageMatches {
    /// 1-based page number.
    pub page: u32,
    /// Page height, carried along for the render-space translation.
    pub height: f64,
    pub boxes: Vec<TextSpaceBox>,
}

/// All matches of one redaction request, grouped per page in page order.
/// Discarded after rendering.
#[derive(Debug, Clone, Default)]
pub struct MatchSet {
    pub pages: Vec<PageMatches>,
}

impl MatchSet {
    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|p| p.boxes.is_empty())
    }

    /// Total matched boxes across all pages.
    pub fn len(&self) -> usize {
        self.pages.iter().map(|p| p.boxes.len()).sum()
    }
}

/// Filters extracted words against a query string.
///
/// Pure function over its inputs. The query is case-folded once; every
/// word is folded and tested for containment. Callers must reject empty
/// queries before this point, since an empty string would match every
/// word.
pub fn find_matches(pages: &[PageWords], query: &str) -> MatchSet {
    debug_assert!(!query.is_empty(), "empty query must be rejected upstream");
    let needle = query.to_lowercase();

    let pages = pages
        .iter()
        .map(|page| PageMatches {
            page: page.page,
            height: page.height,
            boxes: page
                .words
                .iter()
                .filter(|w| w.text.to_lowercase().contains(&needle))
                .map(|w| w.bbox)
                .collect(),
        })
        .collect();

    MatchSet { pages }
}
