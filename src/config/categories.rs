//! Category definition files.
//!
//! A category file is a JSON array:
//!
//! ```json
//! [
//!   {
//!     "name": "Diffusion Models",
//!     "description": "Generative policies and planners",
//!     "keywords": ["diffusion", "denoising"]
//!   }
//! ]
//! ```

use std::collections::HashSet;
use std::path::Path;

use super::ConfigError;
use crate::models::{Category, UNCATEGORIZED};

/// Read and validate a category file
pub fn load_categories(path: &Path) -> Result<Vec<Category>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let categories = parse_categories(&content)?;
    tracing::debug!(
        "Loaded {} categories from {}",
        categories.len(),
        path.display()
    );
    Ok(categories)
}

/// Parse and validate category definitions from JSON text
///
/// Names must be non-blank, unique (case-insensitive) and must not be the
/// reserved `Uncategorized`. Each category needs at least one non-blank
/// keyword.
pub fn parse_categories(json: &str) -> Result<Vec<Category>, ConfigError> {
    let categories: Vec<Category> = serde_json::from_str(json)?;
    validate_categories(&categories)?;
    Ok(categories)
}

/// Check names and keywords of already-parsed categories
pub fn validate_categories(categories: &[Category]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for (index, category) in categories.iter().enumerate() {
        let invalid = |reason: String| ConfigError::InvalidCategory { index, reason };
        let name = category.name.trim();

        if name.is_empty() {
            return Err(invalid("name is empty".to_string()));
        }
        if name.eq_ignore_ascii_case(UNCATEGORIZED) {
            return Err(invalid(format!("'{}' is a reserved name", UNCATEGORIZED)));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(invalid(format!("duplicate name '{}'", name)));
        }
        if category.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(invalid(format!("'{}' has no keywords", name)));
        }
    }

    Ok(())
}
