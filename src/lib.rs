//! # Zotero Analyzer
//!
//! Fetch bibliographic records from a Zotero library, filter and categorize
//! them, and export the result as JSON, Markdown, or a context document for
//! language-model prompts. The pipeline is available as a library, a CLI, and
//! a Model Context Protocol (MCP) server.
//!
//! ## Architecture
//!
//! - [`models`]: Records, filter specs, categories and export selectors
//! - [`analysis`]: Record filtering and keyword categorization
//! - [`export`]: JSON, Markdown and LLM-context serializers plus file writing
//! - [`sources`]: The [`sources::LibrarySource`] trait, the Zotero client and a mock
//! - [`analyzer`]: [`LibraryAnalyzer`], which runs the pipeline over a source
//! - [`mcp`]: MCP tools and server
//! - [`config`]: Layered configuration and category files
//! - [`utils`]: HTTP client, retries, citations and input validation
//!
//! ```rust
//! use zotero_analyzer::analysis::{categorize, filter_set};
//! use zotero_analyzer::export::{build_llm_context, serialize_json};
//! use zotero_analyzer::models::{Category, ContextType, FilterSpec, ItemType, RecordBuilder};
//!
//! let records = vec![
//!     RecordBuilder::new("ABCD2345", "Diffusion Policy", ItemType::ConferencePaper)
//!         .author("Cheng Chi")
//!         .year(2023)
//!         .build(),
//!     RecordBuilder::new("EFGH6789", "Attention Is All You Need", ItemType::ConferencePaper)
//!         .author("Ashish Vaswani")
//!         .year(2017)
//!         .build(),
//! ];
//!
//! let recent = filter_set(&records, &FilterSpec::new().year_range(2020, 2024));
//! assert_eq!(recent.len(), 1);
//!
//! let set = categorize(recent, &[Category::new("Robot Learning", ["policy"])]);
//! assert_eq!(set.get("Robot Learning").map(|b| b.len()), Some(1));
//!
//! let context = build_llm_context(&set, ContextType::RelatedWorks);
//! assert!(context.contains("Diffusion Policy"));
//! assert!(serialize_json(&records).is_ok());
//! ```

pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod export;
pub mod mcp;
pub mod models;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use analyzer::{AnalysisReport, AnalyzerError, LibraryAnalyzer};
pub use models::{CategorizedSet, Category, FilterSpec, Record};
pub use sources::{LibrarySource, SourceError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
