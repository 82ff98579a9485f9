//! Word-level text geometry extraction.
//!
//! Walks an open document page by page, decoding each page's content
//! stream once and interpreting its text operators into [`Word`]s. All
//! bounding boxes come out in text-extraction space: origin at the page's
//! top-left corner, Y growing downward, units in points. They must pass
//! through [`crate::geometry::to_render_space`] before anything draws
//! with them.

pub mod fonts;
mod interpreter;

use lopdf::Document;
use log::warn;

use crate::error::{BlackoutError, BlackoutResult};
use crate::geometry::TextSpaceBox;
use crate::page::page_height;

/// One extracted token on a page.
#[derive(Debug, Clone)]
pub struct Word {
    pub text: String,
    /// Extent in text-extraction space (top-left origin, Y down).
    pub bbox: TextSpaceBox,
}

/// All words of one page, with the geometry needed to translate them.
#[derive(Debug, Clone)]
pub struct PageWords {
    /// 1-based page number, in document order.
    pub page: u32,
    /// Page height in points, for the render-space translation.
    pub height: f64,
    pub words: Vec<Word>,
}

/// What to do when a single page's content stream cannot be decoded.
///
/// The rest of the document may be perfectly usable; whether that is good
/// enough is the caller's call, so the choice is explicit configuration
/// rather than a hard-coded behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PagePolicy {
    /// Fail the whole request on the first undecodable page.
    #[default]
    Abort,
    /// Log a warning naming the page and continue without its words. A
    /// skipped page cannot be matched, so nothing on it gets redacted.
    Skip,
}

/// Lazy per-page word extraction over an open document.
///
/// Yields one [`PageWords`] per page, in page order, parsing each page's
/// content exactly once as it is reached. The iterator is finite and not
/// restartable; collect it if you need to look twice.
pub struct WordStream<'a> {
    doc: &'a Document,
    pages: std::vec::IntoIter<(u32, lopdf::ObjectId)>,
}

impl<'a> WordStream<'a> {
    pub fn new(doc: &'a Document) -> Self {
        let pages: Vec<(u32, lopdf::ObjectId)> = doc.get_pages().into_iter().collect();
        Self {
            doc,
            pages: pages.into_iter(),
        }
    }
}

impl Iterator for WordStream<'_> {
    type Item = BlackoutResult<PageWords>;

    fn next(&mut self) -> Option<Self::Item> {
        let (page, page_id) = self.pages.next()?;
        let height = page_height(self.doc, page_id);
        let result = interpreter::collect_page_words(self.doc, page_id, height)
            .map(|words| PageWords {
                page,
                height,
                words,
            })
            .map_err(|reason| BlackoutError::PageDecode { page, reason });
        Some(result)
    }
}

/// Extracts the words of every page, applying `policy` to pages whose
/// content cannot be decoded.
pub fn extract_words(doc: &Document, policy: PagePolicy) -> BlackoutResult<Vec<PageWords>> {
    let mut pages = Vec::new();
    for page in WordStream::new(doc) {
        match page {
            Ok(words) => pages.push(words),
            Err(e) => match policy {
                PagePolicy::Abort => return Err(e),
                PagePolicy::Skip => warn!("skipping page: {e}"),
            },
        }
    }
    Ok(pages)
}
