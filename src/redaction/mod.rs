//! The redaction pipeline: extract, match, translate, render.
//!
//! Redaction here is **visual occlusion**. The drawn rectangles cover the
//! matched text on every conforming renderer, but the glyphs stay in the
//! page's content stream and remain recoverable by any text extractor.
//! Callers needing guaranteed removal must rewrite content streams, which
//! this crate deliberately does not do.

pub mod renderer;

pub use renderer::draw_redactions;

use lopdf::Document;
use log::{debug, info};

use crate::error::{BlackoutError, BlackoutResult};
use crate::extract::{extract_words, PagePolicy};
use crate::matcher::find_matches;
use crate::source::SourceUrl;

/// Tuning for one redaction run.
#[derive(Debug, Clone)]
pub struct RedactionOptions {
    /// What to do with pages whose content cannot be decoded.
    pub page_policy: PagePolicy,
    /// Fill color of the drawn rectangles, RGB in [0, 1]. Opaque black by
    /// default.
    pub fill_color: (f32, f32, f32),
}

impl RedactionOptions {
    pub fn new() -> Self {
        Self {
            page_policy: PagePolicy::Abort,
            fill_color: (0.0, 0.0, 0.0),
        }
    }

    /// Sets the undecodable-page policy.
    pub fn with_page_policy(mut self, policy: PagePolicy) -> Self {
        self.page_policy = policy;
        self
    }

    /// Sets the rectangle fill color.
    pub fn with_fill_color(mut self, color: (f32, f32, f32)) -> Self {
        self.fill_color = color;
        self
    }
}

impl Default for RedactionOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the four redaction stages over one fetched document.
#[derive(Debug, Clone, Default)]
pub struct RedactionPipeline {
    options: RedactionOptions,
}

impl RedactionPipeline {
    pub fn new(options: RedactionOptions) -> Self {
        Self { options }
    }

    /// Obscures every word containing `query` and returns the serialized
    /// result. A query with zero matches returns the input bytes
    /// untouched.
    pub fn run(&self, source: &SourceUrl, bytes: &[u8], query: &str) -> BlackoutResult<Vec<u8>> {
        let mut doc = Document::load_mem(bytes).map_err(|e| BlackoutError::Parse {
            source_id: source.to_string(),
            reason: e.to_string(),
        })?;

        let pages = extract_words(&doc, self.options.page_policy)?;
        debug!(
            "extracted {} word(s) across {} page(s)",
            pages.iter().map(|p| p.words.len()).sum::<usize>(),
            pages.len()
        );

        let matches = find_matches(&pages, query);
        if matches.is_empty() {
            info!("no occurrences of the query in {source}; document returned unchanged");
            return Ok(bytes.to_vec());
        }

        let drawn = draw_redactions(&mut doc, &matches, self.options.fill_color)?;
        info!("obscured {drawn} occurrence(s) in {source}");

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| BlackoutError::Serialization {
                reason: e.to_string(),
            })?;
        Ok(output)
    }
}
