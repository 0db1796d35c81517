//! Export format selectors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Artifact format for exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Markdown,
    #[default]
    Both,
}

impl ExportFormat {
    /// Whether JSON output is requested
    pub fn includes_json(self) -> bool {
        matches!(self, ExportFormat::Json | ExportFormat::Both)
    }

    /// Whether Markdown output is requested
    pub fn includes_markdown(self) -> bool {
        matches!(self, ExportFormat::Markdown | ExportFormat::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "markdown",
            ExportFormat::Both => "both",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "both" => Ok(ExportFormat::Both),
            other => Err(format!(
                "Unknown export format '{}': expected json, markdown or both",
                other
            )),
        }
    }
}

/// Template used for the consolidated LLM context document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    /// Compact per-category bullet lists for drafting a related-works section
    #[default]
    RelatedWorks,
    /// Full per-record detail for drafting a literature review
    LiteratureReview,
}

impl ContextType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContextType::RelatedWorks => "related_works",
            ContextType::LiteratureReview => "literature_review",
        }
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "related_works" => Ok(ContextType::RelatedWorks),
            "literature_review" => Ok(ContextType::LiteratureReview),
            other => Err(format!(
                "Unknown context type '{}': expected related_works or literature_review",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_parse() {
        assert_eq!("JSON".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert_eq!("md".parse::<ExportFormat>(), Ok(ExportFormat::Markdown));
        assert!("xml".parse::<ExportFormat>().is_err());
        assert!(ExportFormat::Both.includes_json());
        assert!(!ExportFormat::Json.includes_markdown());
    }

    #[test]
    fn test_context_type_serde() {
        let json = serde_json::to_string(&ContextType::LiteratureReview).unwrap();
        assert_eq!(json, "\"literature_review\"");
        assert_eq!(
            "related-works".parse::<ContextType>(),
            Ok(ContextType::RelatedWorks)
        );
    }
}
