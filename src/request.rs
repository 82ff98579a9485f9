//! Transport-agnostic request and response contracts.
//!
//! These are the data shapes a hosting layer (HTTP handler, CLI, queue
//! worker) marshals into and out of. Validation lives here so that a bad
//! request is rejected before any source is resolved or any document
//! handle is opened.

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::{BlackoutError, BlackoutResult};

/// Media type of every successful payload.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Request to concatenate documents, in list order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    /// Ordered source identifiers; at least one is required.
    pub pdf_urls: Vec<String>,
}

impl MergeRequest {
    pub fn new(pdf_urls: Vec<String>) -> Self {
        Self { pdf_urls }
    }

    /// Rejects the request before any I/O happens.
    pub fn validate(&self) -> BlackoutResult<()> {
        if self.pdf_urls.is_empty() {
            return Err(BlackoutError::invalid_request("no PDF URLs provided"));
        }
        if self.pdf_urls.iter().any(|u| u.trim().is_empty()) {
            return Err(BlackoutError::invalid_request(
                "'pdfUrls' must not contain empty entries",
            ));
        }
        Ok(())
    }
}

/// Request to obscure every occurrence of a text string in one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactRequest {
    /// Source identifier: http(s) URL, file URL, or local path.
    pub pdf_url: String,
    /// Non-empty text to search for (case-insensitive substring).
    pub search_text: String,
}

impl RedactRequest {
    pub fn new(pdf_url: impl Into<String>, search_text: impl Into<String>) -> Self {
        Self {
            pdf_url: pdf_url.into(),
            search_text: search_text.into(),
        }
    }

    /// Rejects the request before any I/O happens.
    pub fn validate(&self) -> BlackoutResult<()> {
        if self.pdf_url.trim().is_empty() || self.search_text.trim().is_empty() {
            return Err(BlackoutError::invalid_request(
                "'pdfUrl' and 'searchText' must be provided",
            ));
        }
        Ok(())
    }
}

/// A finished document ready to hand back to the caller.
#[derive(Debug, Clone)]
pub struct PdfPayload {
    /// Serialized PDF bytes.
    pub bytes: Vec<u8>,
    /// Always [`PDF_MEDIA_TYPE`].
    pub media_type: &'static str,
    /// Generated filename embedding the creation timestamp.
    pub file_name: String,
}

impl PdfPayload {
    /// Payload for a merge result (`merged_YYYYmmddHHMMSS.pdf`).
    pub fn merged(bytes: Vec<u8>) -> Self {
        Self::stamped("merged", bytes)
    }

    /// Payload for a redaction result (`redacted_YYYYmmddHHMMSS.pdf`).
    pub fn redacted(bytes: Vec<u8>) -> Self {
        Self::stamped("redacted", bytes)
    }

    fn stamped(prefix: &str, bytes: Vec<u8>) -> Self {
        let stamp = Local::now().format("%Y%m%d%H%M%S");
        Self {
            bytes,
            media_type: PDF_MEDIA_TYPE,
            file_name: format!("{prefix}_{stamp}.pdf"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_url_list_rejected() {
        let request = MergeRequest::new(Vec::new());
        assert!(matches!(
            request.validate(),
            Err(BlackoutError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_blank_url_entry_rejected() {
        let request = MergeRequest::new(vec!["http://a/1.pdf".into(), "  ".into()]);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_empty_query_rejected() {
        let request = RedactRequest::new("http://a/1.pdf", "");
        assert!(matches!(
            request.validate(),
            Err(BlackoutError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_valid_requests_pass() {
        assert!(MergeRequest::new(vec!["http://a/1.pdf".into()])
            .validate()
            .is_ok());
        assert!(RedactRequest::new("file:///tmp/a.pdf", "secret")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_request_json_field_names() {
        let json = r#"{"pdfUrl":"http://a/1.pdf","searchText":"secret"}"#;
        let request: RedactRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.pdf_url, "http://a/1.pdf");
        assert_eq!(request.search_text, "secret");

        let json = r#"{"pdfUrls":["http://a/1.pdf","http://a/2.pdf"]}"#;
        let request: MergeRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.pdf_urls.len(), 2);
    }

    #[test]
    fn test_payload_filename_embeds_timestamp() {
        let payload = PdfPayload::merged(vec![1, 2, 3]);
        assert!(payload.file_name.starts_with("merged_"));
        assert!(payload.file_name.ends_with(".pdf"));
        // merged_ + 14 digit stamp + .pdf
        assert_eq!(payload.file_name.len(), "merged_".len() + 14 + ".pdf".len());
        assert_eq!(payload.media_type, "application/pdf");
    }
}
