//! Command-line interface for the blackout library.
//!
//! Exposes the merge and redaction pipelines over local files and
//! http(s)/file URLs, plus a text-extraction subcommand for verifying
//! results (and for demonstrating that occluded text still extracts).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use blackout::{
    DocumentService, HttpSource, MergeRequest, PagePolicy, RedactRequest, RedactionOptions,
    SourceOptions,
};

/// PDF merge and text blackout tool.
///
/// Fetches documents from http(s) URLs or local paths, concatenates them
/// or covers matched text with opaque rectangles.
#[derive(Parser)]
#[command(name = "blackout")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Timeout in seconds for remote fetches
    #[arg(long, value_name = "SECONDS", global = true, default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge two or more PDFs into one, in argument order
    Merge {
        /// Output PDF file path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// JSON request body ({"pdfUrls": [...]}) instead of positional
        /// sources
        #[arg(long, value_name = "FILE", conflicts_with = "inputs")]
        request: Option<PathBuf>,

        /// Source identifiers (http(s) URL, file URL, or local path)
        #[arg(value_name = "SOURCE", required_unless_present = "request")]
        inputs: Vec<String>,
    },

    /// Cover every occurrence of a text string with an opaque rectangle
    Redact {
        /// Output PDF file path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// JSON request body ({"pdfUrl": ..., "searchText": ...}) instead
        /// of --query and SOURCE
        #[arg(long, value_name = "FILE", conflicts_with_all = ["query", "source"])]
        request: Option<PathBuf>,

        /// Text to search for (case-insensitive substring)
        #[arg(short, long, value_name = "TEXT", required_unless_present = "request")]
        query: Option<String>,

        /// Skip pages whose content cannot be decoded instead of failing
        #[arg(long)]
        skip_bad_pages: bool,

        /// Source identifier (http(s) URL, file URL, or local path)
        #[arg(value_name = "SOURCE", required_unless_present = "request")]
        source: Option<String>,
    },

    /// Extract plain text from a PDF (for debugging and verification)
    Extract {
        /// Source identifier (http(s) URL, file URL, or local path)
        #[arg(short, long, value_name = "SOURCE")]
        input: String,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Command handler owning the configured service.
struct CommandHandler {
    service: DocumentService<HttpSource>,
    verbose: bool,
}

impl CommandHandler {
    fn new(verbose: bool, timeout: Duration) -> Result<Self> {
        let options = SourceOptions::new().with_timeout(timeout);
        let service = DocumentService::with_source_options(&options)
            .context("failed to initialize the fetch layer")?;
        Ok(Self { service, verbose })
    }

    fn with_redaction_options(mut self, options: RedactionOptions) -> Self {
        self.service = self.service.with_redaction_options(options);
        self
    }

    fn merge(&self, request: MergeRequest, output: &Path) -> Result<()> {
        if self.verbose {
            println!("Inputs: {} document(s)", request.pdf_urls.len());
            println!("Output: {}", output.display());
        }

        let input_count = request.pdf_urls.len();
        let payload = self.service.merge(&request).context("merge failed")?;

        std::fs::write(output, &payload.bytes)
            .with_context(|| format!("failed to write {}", output.display()))?;

        println!(
            "✓ Merged {input_count} document(s) → {} ({})",
            output.display(),
            payload.file_name
        );
        Ok(())
    }

    fn redact(&self, request: RedactRequest, output: &Path) -> Result<()> {
        if self.verbose {
            println!("Source: {}", request.pdf_url);
            println!("Query:  {}", request.search_text);
            println!("Output: {}", output.display());
        }

        let query = request.search_text.clone();
        let payload = self.service.redact(&request).context("redaction failed")?;

        std::fs::write(output, &payload.bytes)
            .with_context(|| format!("failed to write {}", output.display()))?;

        println!("✓ Redacted '{query}' → {}", output.display());
        println!("  Note: occlusion is visual; underlying text remains extractable.");
        Ok(())
    }

    fn extract(&self, input: &str, output: Option<&Path>) -> Result<()> {
        let text = self
            .service
            .extract_text(input)
            .context("text extraction failed")?;

        if let Some(output_path) = output {
            std::fs::write(output_path, &text)
                .with_context(|| format!("failed to write {}", output_path.display()))?;
            println!(
                "✓ Extracted {} characters → {}",
                text.len(),
                output_path.display()
            );
        } else {
            println!("{text}");
        }
        Ok(())
    }
}

/// Reads a JSON request body from a file.
fn read_request<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read request file {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("invalid request JSON in {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let handler = CommandHandler::new(cli.verbose, Duration::from_secs(cli.timeout))?;

    match &cli.command {
        Commands::Merge {
            output,
            request,
            inputs,
        } => {
            let merge_request = match request {
                Some(path) => read_request::<MergeRequest>(path)?,
                None => MergeRequest::new(inputs.clone()),
            };
            handler.merge(merge_request, output)?;
        }
        Commands::Redact {
            output,
            request,
            query,
            skip_bad_pages,
            source,
        } => {
            let policy = if *skip_bad_pages {
                PagePolicy::Skip
            } else {
                PagePolicy::Abort
            };
            let handler =
                handler.with_redaction_options(RedactionOptions::new().with_page_policy(policy));

            let redact_request = match request {
                Some(path) => read_request::<RedactRequest>(path)?,
                // Both are present when --request is absent; clap enforces it.
                None => RedactRequest::new(
                    source.clone().unwrap_or_default(),
                    query.clone().unwrap_or_default(),
                ),
            };
            handler.redact(redact_request, output)?;
        }
        Commands::Extract { input, output } => {
            handler.extract(input, output.as_deref())?;
        }
    }

    Ok(())
}
