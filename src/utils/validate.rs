//! Input validation for library identifiers, item keys and file names.
//!
//! Identifiers end up in request paths and user-chosen names end up in
//! output file names, so both are checked before use.

use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, PartialEq)]
pub enum InputError {
    #[error("Invalid library ID '{0}': expected a numeric Zotero user or group ID")]
    InvalidLibraryId(String),

    #[error("Invalid item key '{0}': expected 8 alphanumeric characters")]
    InvalidItemKey(String),

    #[error("Invalid file name: nothing usable left after sanitizing '{0}'")]
    InvalidFilename(String),
}

/// Validate a Zotero library ID (a user or group number)
pub fn validate_library_id(id: &str) -> Result<String, InputError> {
    let id = id.trim();
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(InputError::InvalidLibraryId(id.to_string()));
    }
    Ok(id.to_string())
}

/// Validate a Zotero object key (items and collections share the format)
pub fn validate_item_key(key: &str) -> Result<String, InputError> {
    let key = key.trim();
    if key.len() != 8 || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(InputError::InvalidItemKey(key.to_string()));
    }
    Ok(key.to_string())
}

/// Turn an arbitrary label into a safe file stem
///
/// Keeps alphanumerics, dashes and underscores; runs of anything else
/// (whitespace, path separators, dots) collapse to one underscore. The
/// result is trimmed of underscores, lowercased and capped in length.
pub fn sanitize_file_stem(label: &str) -> Result<String, InputError> {
    const MAX_STEM_LENGTH: usize = 100;

    let mut sanitized = String::new();
    let mut pending_sep = false;
    for ch in label.trim().chars() {
        if ch.is_alphanumeric() || ch == '-' || ch == '_' {
            if pending_sep && !sanitized.is_empty() {
                sanitized.push('_');
            }
            pending_sep = false;
            sanitized.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }

    let sanitized: String = sanitized
        .trim_matches('_')
        .chars()
        .take(MAX_STEM_LENGTH)
        .collect();

    if sanitized.is_empty() {
        return Err(InputError::InvalidFilename(label.to_string()));
    }
    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_library_id() {
        assert_eq!(validate_library_id(" 1234567 ").unwrap(), "1234567");
        assert!(validate_library_id("").is_err());
        assert!(validate_library_id("12/../34").is_err());
        assert!(validate_library_id("abc").is_err());
    }

    #[test]
    fn test_validate_item_key() {
        assert!(validate_item_key("ABCD2345").is_ok());
        assert!(validate_item_key("ABC").is_err());
        assert!(validate_item_key("ABCD/345").is_err());
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(
            sanitize_file_stem("Diffusion Models").unwrap(),
            "diffusion_models"
        );
        assert_eq!(
            sanitize_file_stem("search_robot learning?").unwrap(),
            "search_robot_learning"
        );
        assert_eq!(sanitize_file_stem("../../etc/passwd").unwrap(), "etc_passwd");
        assert_eq!(sanitize_file_stem("  RL / Control  ").unwrap(), "rl_control");
    }

    #[test]
    fn test_sanitize_file_stem_rejects_empty() {
        assert!(sanitize_file_stem("").is_err());
        assert!(sanitize_file_stem("../..").is_err());
        assert!(sanitize_file_stem("???").is_err());
    }

    #[test]
    fn test_sanitize_file_stem_caps_length() {
        let long = "a".repeat(300);
        assert_eq!(sanitize_file_stem(&long).unwrap().len(), 100);
    }
}
