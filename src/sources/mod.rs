//! Reference-library sources.
//!
//! This module defines the [`LibrarySource`] trait that every library backend
//! implements. [`ZoteroSource`] talks to the Zotero Web API; [`MockSource`]
//! serves records from memory for tests and demos.
//!
//! Sources turn remote payloads into [`Record`]s. They are the only part of
//! the crate that performs I/O against the network or sees credentials.

pub mod mock;
pub mod zotero;

pub use mock::MockSource;
pub use zotero::{LibraryType, ZoteroSource};

use crate::models::{Collection, FilterSpec, Record};
use async_trait::async_trait;

/// The LibrarySource trait defines the interface for reference libraries.
///
/// `fetch_items` may push parts of the [`FilterSpec`] to the remote side (for
/// example collection scoping) but callers still run the full filter over the
/// result, so a source is free to ignore constraints it cannot express.
#[async_trait]
pub trait LibrarySource: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g. "zotero")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Fetch top-level items, at most `limit` of them when given
    async fn fetch_items(
        &self,
        spec: &FilterSpec,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, SourceError>;

    /// Quick full-text search over titles, creators and years
    async fn search_items(&self, query: &str, limit: usize) -> Result<Vec<Record>, SourceError>;

    /// All collections in the library
    async fn collections(&self) -> Result<Vec<Collection>, SourceError>;

    /// All tag names in the library
    async fn tags(&self) -> Result<Vec<String>, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Payload could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Credentials rejected or missing
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limit exceeded, with the server's suggested wait in seconds
    #[error("Rate limit exceeded")]
    RateLimit(Option<u64>),

    /// Library, collection or item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success response from the service
    #[error("API error: {0}")]
    Api(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}
