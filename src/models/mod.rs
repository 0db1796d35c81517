//! Core data models for library records, filters and categories.

mod category;
mod export;
mod filter;
mod record;

pub use category::{CategorizedSet, Category, CategoryBucket, UNCATEGORIZED, UNCATEGORIZED_DESCRIPTION};
pub use export::{ContextType, ExportFormat};
pub use filter::{FilterSpec, YearRange, YearRangeParseError};
pub use record::{Collection, ItemType, Record, RecordBuilder, ValidationError};
