//! High-level entry points for the merge and redact operations.
//!
//! `DocumentService` wires request validation, source resolution, and the
//! processing pipelines together. It is generic over [`DocumentSource`]
//! so tests can drive both operations against in-memory sources and prove
//! that invalid requests never reach the network.

use log::{debug, info};

use crate::error::{BlackoutError, BlackoutResult};
use crate::merge::merge_documents;
use crate::redaction::{RedactionOptions, RedactionPipeline};
use crate::request::{MergeRequest, PdfPayload, RedactRequest};
use crate::source::{DocumentSource, HttpSource, SourceOptions, SourceUrl};

/// Stateless per-request processor; concurrent requests need nothing more
/// than their own service value (or a shared reference, since processing
/// never mutates it).
pub struct DocumentService<S = HttpSource> {
    source: S,
    redaction: RedactionOptions,
}

impl DocumentService<HttpSource> {
    /// Service with the default fetch layer.
    pub fn new() -> Self {
        Self::with_source(HttpSource::default())
    }

    /// Service with a custom fetch timeout.
    pub fn with_source_options(options: &SourceOptions) -> BlackoutResult<Self> {
        Ok(Self::with_source(HttpSource::with_options(options)?))
    }
}

impl Default for DocumentService<HttpSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DocumentSource> DocumentService<S> {
    /// Service over an arbitrary resolver (tests use in-memory stubs).
    pub fn with_source(source: S) -> Self {
        Self {
            source,
            redaction: RedactionOptions::default(),
        }
    }

    /// Replaces the redaction options.
    pub fn with_redaction_options(mut self, options: RedactionOptions) -> Self {
        self.redaction = options;
        self
    }

    /// Concatenates the requested documents into one.
    ///
    /// Validation and scheme checks run before any fetch. Inputs are then
    /// resolved sequentially; the first failure aborts the whole request
    /// with an error naming the offending identifier, and no partial
    /// document is ever produced.
    pub fn merge(&self, request: &MergeRequest) -> BlackoutResult<PdfPayload> {
        request.validate()?;
        let sources: Vec<SourceUrl> = request
            .pdf_urls
            .iter()
            .map(|raw| SourceUrl::parse(raw))
            .collect::<BlackoutResult<_>>()?;

        info!("merging {} document(s)", sources.len());
        let mut inputs = Vec::with_capacity(sources.len());
        for source in sources {
            let bytes = self.source.fetch(&source)?;
            debug!("fetched {source} ({} bytes)", bytes.len());
            inputs.push((source, bytes));
        }

        let merged = merge_documents(&inputs)?;
        Ok(PdfPayload::merged(merged))
    }

    /// Obscures every occurrence of the query text in the requested
    /// document.
    pub fn redact(&self, request: &RedactRequest) -> BlackoutResult<PdfPayload> {
        request.validate()?;
        let source = SourceUrl::parse(&request.pdf_url)?;

        info!("redacting '{}' in {source}", request.search_text);
        let bytes = self.source.fetch(&source)?;
        debug!("fetched {source} ({} bytes)", bytes.len());

        let pipeline = RedactionPipeline::new(self.redaction.clone());
        let output = pipeline.run(&source, &bytes, &request.search_text)?;
        Ok(PdfPayload::redacted(output))
    }

    /// Plain-text dump of a document, for verification and debugging.
    ///
    /// Also a working demonstration of the redaction caveat: text under a
    /// drawn rectangle still extracts.
    pub fn extract_text(&self, raw_source: &str) -> BlackoutResult<String> {
        let source = SourceUrl::parse(raw_source)?;
        let bytes = self.source.fetch(&source)?;
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| BlackoutError::Parse {
            source_id: source.to_string(),
            reason: e.to_string(),
        })
    }
}
