//! PDF merge and text blackout toolkit.
//!
//! This library fetches PDF documents from http(s) URLs or local paths
//! and performs two transformations:
//!
//! - **Merge**: concatenate any number of documents into one, preserving
//!   input order and in-document page order. All-or-nothing: one bad
//!   input fails the whole request with an error naming it.
//! - **Redact**: find every word containing a query string
//!   (case-insensitive substring) and draw an opaque rectangle over its
//!   bounding box.
//!
//! # Coordinate spaces
//!
//! Word geometry is extracted in top-left-origin space (Y down) and pages
//! are drawn in bottom-left-origin space (Y up). The two are separate
//! types ([`TextSpaceBox`], [`RenderSpaceBox`]) and
//! [`geometry::to_render_space`] is the only conversion between them, so
//! a raw extracted box can never reach the drawing surface.
//!
//! # Security caveat
//!
//! Redaction is **visual occlusion only**. The rectangle covers the text
//! wherever the page is rendered faithfully, but the original glyphs
//! remain in the document's content stream and can be recovered by text
//! extraction or copy/paste. If leaked bytes matter, this is not the tool
//! that removes them.
//!
//! # Quick start
//!
//! ```no_run
//! use blackout::{DocumentService, MergeRequest, RedactRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = DocumentService::new();
//!
//! let merged = service.merge(&MergeRequest::new(vec![
//!     "https://example.com/a.pdf".into(),
//!     "https://example.com/b.pdf".into(),
//! ]))?;
//! std::fs::write(&merged.file_name, &merged.bytes)?;
//!
//! let redacted = service.redact(&RedactRequest::new(
//!     "https://example.com/report.pdf",
//!     "confidential",
//! ))?;
//! std::fs::write(&redacted.file_name, &redacted.bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod extract;
pub mod geometry;
pub mod matcher;
pub mod merge;
pub mod page;
pub mod redaction;
pub mod request;
pub mod service;
pub mod source;

// Re-exports for convenient access
pub use error::{BlackoutError, BlackoutResult};
pub use extract::{extract_words, PagePolicy, PageWords, Word};
pub use geometry::{RenderSpaceBox, TextSpaceBox};
pub use matcher::{find_matches, MatchSet};
pub use merge::merge_documents;
pub use redaction::{RedactionOptions, RedactionPipeline};
pub use request::{MergeRequest, PdfPayload, RedactRequest, PDF_MEDIA_TYPE};
pub use service::DocumentService;
pub use source::{DocumentSource, HttpSource, SourceOptions, SourceUrl};
