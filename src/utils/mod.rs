//! Utility modules supporting the fetch and export paths.
//!
//! - [`format_citation`]: Render a record as an APA, MLA, Chicago or BibTeX citation
//! - [`HttpClient`]: Shared reqwest client with timeouts and a crate user agent
//! - [`RetryConfig`]: Configuration for retry logic with exponential backoff
//! - [`with_retry`]: Execute an operation with automatic retry on transient errors
//! - [`sanitize_file_stem`]: Turn a label into a safe output file stem
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use zotero_analyzer::sources::SourceError;
//! use zotero_analyzer::utils::{with_retry, RetryConfig};
//!
//! # async fn fetch_page() -> Result<String, SourceError> { Ok("page".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), SourceError> {
//! let config = RetryConfig::with_max_retries(3);
//! let page = with_retry(config, || fetch_page()).await?;
//! # Ok(())
//! # }
//! ```

mod cite;
mod http;
mod retry;
mod validate;

pub use cite::{format_citation, surname, CitationStyle};
pub use http::{HttpClient, DEFAULT_TIMEOUT_SECS};
pub use retry::{with_retry, RetryConfig, TransientError};
pub use validate::{sanitize_file_stem, validate_item_key, validate_library_id, InputError};
