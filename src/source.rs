//! Document source resolution: identifier validation and byte retrieval.
//!
//! A source identifier is classified before any I/O happens. Only `http`,
//! `https`, and local file references are accepted; everything else is
//! rejected with [`BlackoutError::UnsupportedScheme`] without touching the
//! network or the filesystem.
//!
//! Retrieval itself sits behind the [`DocumentSource`] trait so the
//! pipelines can be exercised against in-memory stubs in tests.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use url::Url;

use crate::error::{BlackoutError, BlackoutResult};

/// Default timeout applied to remote fetches.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

static SHARED_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .expect("default HTTP client")
});

/// Options for the fetch layer.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Timeout for a single remote fetch. A request that exceeds it fails
    /// with [`BlackoutError::SourceUnavailable`] instead of hanging.
    pub timeout: Duration,
}

impl SourceOptions {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the remote fetch timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a validated source identifier points.
#[derive(Debug, Clone)]
enum SourceTarget {
    Remote(Url),
    Local(PathBuf),
}

/// A source identifier that passed scheme validation.
///
/// Keeps the raw identifier string alongside the classified target so
/// failure messages can name the input exactly as the caller wrote it.
#[derive(Debug, Clone)]
pub struct SourceUrl {
    raw: String,
    target: SourceTarget,
}

impl SourceUrl {
    /// Classifies an identifier without performing any I/O.
    ///
    /// `http`/`https` URLs become remote sources, `file` URLs and bare
    /// filesystem paths become local sources, and any other scheme is
    /// rejected with [`BlackoutError::UnsupportedScheme`].
    pub fn parse(raw: &str) -> BlackoutResult<Self> {
        if raw.trim().is_empty() {
            return Err(BlackoutError::invalid_request("empty source identifier"));
        }

        let target = match Url::parse(raw) {
            Ok(url) => match url.scheme() {
                "http" | "https" => SourceTarget::Remote(url),
                "file" => {
                    let path = url.to_file_path().map_err(|_| {
                        BlackoutError::invalid_request(format!(
                            "file URL '{raw}' has no usable local path"
                        ))
                    })?;
                    SourceTarget::Local(path)
                }
                other => {
                    return Err(BlackoutError::UnsupportedScheme {
                        source_id: raw.to_string(),
                        scheme: other.to_string(),
                    })
                }
            },
            // No scheme at all: treat as a plain local path.
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                SourceTarget::Local(PathBuf::from(raw))
            }
            Err(e) => {
                return Err(BlackoutError::invalid_request(format!(
                    "malformed source identifier '{raw}': {e}"
                )))
            }
        };

        Ok(Self {
            raw: raw.to_string(),
            target,
        })
    }

    /// The identifier exactly as the caller supplied it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True if fetching this source goes over the network.
    pub fn is_remote(&self) -> bool {
        matches!(self.target, SourceTarget::Remote(_))
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Resolves a validated source identifier to document bytes.
pub trait DocumentSource: Send + Sync {
    fn fetch(&self, source: &SourceUrl) -> BlackoutResult<Vec<u8>>;
}

/// The production resolver: blocking HTTP for remote sources, the
/// filesystem for local ones.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Builds a resolver with its own client configured from `options`.
    pub fn with_options(options: &SourceOptions) -> BlackoutResult<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| BlackoutError::source_unavailable("<client>", e))?;
        Ok(Self { client })
    }
}

impl Default for HttpSource {
    /// Uses the shared client with the default timeout.
    fn default() -> Self {
        Self {
            client: SHARED_CLIENT.clone(),
        }
    }
}

impl DocumentSource for HttpSource {
    fn fetch(&self, source: &SourceUrl) -> BlackoutResult<Vec<u8>> {
        match &source.target {
            SourceTarget::Remote(url) => {
                debug!("fetching {url}");
                let response = self
                    .client
                    .get(url.as_str())
                    .send()
                    .map_err(|e| BlackoutError::source_unavailable(source.as_str(), e))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(BlackoutError::source_unavailable(
                        source.as_str(),
                        format!("HTTP status {status}"),
                    ));
                }

                let bytes = response
                    .bytes()
                    .map_err(|e| BlackoutError::source_unavailable(source.as_str(), e))?;
                Ok(bytes.to_vec())
            }
            SourceTarget::Local(path) => {
                debug!("reading {}", path.display());
                std::fs::read(path)
                    .map_err(|e| BlackoutError::source_unavailable(source.as_str(), e))
            }
        }
    }
}
