//! Serialization of records and categorized sets into text artifacts.
//!
//! The serializers are pure: they build strings in memory and fail only for
//! records that are missing a key or title. [`ContentExporter`] writes their
//! output under an output directory.
//!
//! ```rust
//! use zotero_analyzer::export::serialize_markdown;
//! use zotero_analyzer::models::{ItemType, RecordBuilder};
//!
//! let record = RecordBuilder::new("ABCD2345", "Diffusion Policy", ItemType::ConferencePaper)
//!     .author("Cheng Chi")
//!     .year(2023)
//!     .build();
//! let md = serialize_markdown(&[record]).unwrap();
//! assert!(md.starts_with("## Diffusion Policy\n"));
//! ```

mod json;
mod llm_context;
mod markdown;

pub use json::serialize_json;
pub use llm_context::{build_llm_context, SUMMARY_MAX_CHARS};
pub use markdown::serialize_markdown;

use serde::Serialize;
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{CategorizedSet, ContextType, ExportFormat, Record, ValidationError};
use crate::utils::sanitize_file_stem;

/// Errors that can occur while exporting
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// A record cannot be exported
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Writing an artifact failed
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding failed
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A file name could not be derived from a label
    #[error("Invalid output name: {0}")]
    InvalidName(String),
}

pub(crate) fn validate_all<'r>(
    records: impl Iterator<Item = &'r Record>,
) -> Result<(), ValidationError> {
    records.map(Record::validate).collect()
}

/// Categorized output in one or both formats
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategorizedExport {
    pub json: Option<String>,
    pub markdown: Option<String>,
}

/// Render `set` in the requested format(s), one section per bucket
pub fn serialize_categorized(
    set: &CategorizedSet<'_>,
    format: ExportFormat,
) -> Result<CategorizedExport, ExportError> {
    validate_all(set.buckets().iter().flat_map(|b| b.records()))?;

    Ok(CategorizedExport {
        json: if format.includes_json() {
            Some(json::categorized_json(set)?)
        } else {
            None
        },
        markdown: format
            .includes_markdown()
            .then(|| markdown::categorized_markdown(set)),
    })
}

/// Files written by one export call, as `(label, path)` pairs in write order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportedFiles {
    files: Vec<(String, PathBuf)>,
}

impl ExportedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, label: impl Into<String>, path: PathBuf) {
        self.files.push((label.into(), path));
    }

    /// Append another export's files
    pub fn extend(&mut self, other: ExportedFiles) {
        self.files.extend(other.files);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.files.iter().map(|(l, p)| (l.as_str(), p.as_path()))
    }

    /// Path written under `label`
    pub fn get(&self, label: &str) -> Option<&Path> {
        self.iter().find(|(l, _)| *l == label).map(|(_, p)| p)
    }

    pub fn paths(&self) -> Vec<&Path> {
        self.iter().map(|(_, p)| p).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Writes export artifacts under an output directory
///
/// The directory is created on first write.
#[derive(Debug, Clone)]
pub struct ContentExporter {
    output_dir: PathBuf,
}

impl ContentExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write_file(&self, file_name: &str, contents: &str) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ExportError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self.output_dir.join(file_name);
        fs::write(&path, contents).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!("Wrote {}", path.display());
        Ok(path)
    }

    /// Write `records` as `<stem>.json` and/or `<stem>.md`
    pub fn export_items<R: Borrow<Record>>(
        &self,
        records: &[R],
        format: ExportFormat,
        stem: &str,
    ) -> Result<ExportedFiles, ExportError> {
        let stem = sanitize_file_stem(stem).map_err(|e| ExportError::InvalidName(e.to_string()))?;
        let mut files = ExportedFiles::new();

        if format.includes_json() {
            let path = self.write_file(&format!("{}.json", stem), &serialize_json(records)?)?;
            files.push("json", path);
        }
        if format.includes_markdown() {
            let path = self.write_file(&format!("{}.md", stem), &serialize_markdown(records)?)?;
            files.push("markdown", path);
        }
        Ok(files)
    }

    /// Write the whole categorized set plus one file per non-empty bucket
    ///
    /// Combined output goes to `categorized_literature.{json,md}`; bucket
    /// files are named `category_<name>.{json,md}`.
    pub fn export_categorized(
        &self,
        set: &CategorizedSet<'_>,
        format: ExportFormat,
    ) -> Result<ExportedFiles, ExportError> {
        let rendered = serialize_categorized(set, format)?;
        let mut files = ExportedFiles::new();

        if let Some(json) = &rendered.json {
            files.push("categorized json", self.write_file("categorized_literature.json", json)?);
        }
        if let Some(markdown) = &rendered.markdown {
            files.push(
                "categorized markdown",
                self.write_file("categorized_literature.md", markdown)?,
            );
        }

        let mut used_stems = HashSet::new();
        for bucket in set.buckets().iter().filter(|b| !b.is_empty()) {
            let base = sanitize_file_stem(&bucket.name)
                .unwrap_or_else(|_| "unnamed".to_string());
            let mut stem = format!("category_{}", base);
            let mut n = 2;
            while !used_stems.insert(stem.clone()) {
                stem = format!("category_{}_{}", base, n);
                n += 1;
            }

            let records: Vec<&Record> = bucket.records().collect();
            for (label, path) in self.export_items(&records, format, &stem)?.files {
                files.push(format!("{} {}", bucket.name, label), path);
            }
        }

        Ok(files)
    }

    /// Write the LLM context document as `llm_context_<type>.md`
    pub fn export_llm_context(
        &self,
        set: &CategorizedSet<'_>,
        context_type: ContextType,
    ) -> Result<ExportedFiles, ExportError> {
        validate_all(set.buckets().iter().flat_map(|b| b.records()))?;
        let document = build_llm_context(set, context_type);

        let mut files = ExportedFiles::new();
        let path = self.write_file(&format!("llm_context_{}.md", context_type.as_str()), &document)?;
        files.push("llm context", path);
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::categorize;
    use crate::models::{Category, ItemType, RecordBuilder};
    use tempfile::tempdir;

    fn records() -> Vec<Record> {
        vec![
            RecordBuilder::new("A", "Diffusion Policy", ItemType::ConferencePaper)
                .author("Cheng Chi")
                .year(2023)
                .build(),
            RecordBuilder::new("B", "Graph Search", ItemType::JournalArticle)
                .author("Ada Lovelace")
                .build(),
        ]
    }

    #[test]
    fn test_serialize_categorized_formats() {
        let records = records();
        let set = categorize(&records, &[Category::new("Diffusion", ["diffusion"])]);

        let json_only = serialize_categorized(&set, ExportFormat::Json).unwrap();
        assert!(json_only.markdown.is_none());
        let value: serde_json::Value =
            serde_json::from_str(json_only.json.as_deref().unwrap()).unwrap();
        assert_eq!(value[0]["name"], "Diffusion");
        assert_eq!(value[0]["item_count"], 1);
        assert_eq!(value[1]["name"], "Uncategorized");
        assert_eq!(value[1]["items"][0]["key"], "B");

        let both = serialize_categorized(&set, ExportFormat::Both).unwrap();
        assert!(both.json.is_some() && both.markdown.is_some());
    }

    #[test]
    fn test_categorized_json_round_trips_to_same_context() {
        let records = records();
        let set = categorize(&records, &[Category::new("Diffusion", ["diffusion"])]);
        let json = serialize_categorized(&set, ExportFormat::Json)
            .unwrap()
            .json
            .unwrap();

        let decoded: CategorizedSet<'static> = serde_json::from_str(&json).unwrap();
        for context_type in [ContextType::RelatedWorks, ContextType::LiteratureReview] {
            assert_eq!(
                build_llm_context(&decoded, context_type),
                build_llm_context(&set, context_type)
            );
        }
    }

    #[test]
    fn test_export_items_writes_requested_files() {
        let dir = tempdir().unwrap();
        let exporter = ContentExporter::new(dir.path().join("nested/out"));

        let files = exporter
            .export_items(&records(), ExportFormat::Both, "Filtered Items")
            .unwrap();

        assert_eq!(files.len(), 2);
        let json_path = files.get("json").unwrap();
        assert_eq!(json_path, dir.path().join("nested/out/filtered_items.json"));
        let contents = fs::read_to_string(json_path).unwrap();
        assert!(contents.contains("\"Diffusion Policy\""));
        assert!(files.get("markdown").unwrap().exists());
    }

    #[test]
    fn test_export_categorized_writes_bucket_files() {
        let dir = tempdir().unwrap();
        let exporter = ContentExporter::new(dir.path());
        let records = records();
        let set = categorize(
            &records,
            &[
                Category::new("Diffusion", ["diffusion"]),
                Category::new("Empty", ["nothing"]),
            ],
        );

        let files = exporter.export_categorized(&set, ExportFormat::Markdown).unwrap();
        let names: Vec<String> = files
            .paths()
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(
            names,
            vec![
                "categorized_literature.md",
                "category_diffusion.md",
                "category_uncategorized.md"
            ]
        );
    }

    #[test]
    fn test_export_llm_context() {
        let dir = tempdir().unwrap();
        let exporter = ContentExporter::new(dir.path());
        let records = records();
        let set = categorize(&records, &[]);

        let files = exporter
            .export_llm_context(&set, ContextType::RelatedWorks)
            .unwrap();
        let path = files.get("llm context").unwrap();
        assert!(path.ends_with("llm_context_related_works.md"));
        assert!(fs::read_to_string(path)
            .unwrap()
            .starts_with("# Related Works Context"));
    }

    #[test]
    fn test_unwritable_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let exporter = ContentExporter::new(blocker.join("out"));
        let err = exporter
            .export_items(&records(), ExportFormat::Json, "items")
            .unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }

    #[test]
    fn test_invalid_record_blocks_export() {
        let dir = tempdir().unwrap();
        let exporter = ContentExporter::new(dir.path());
        let bad = vec![Record::new("", "No key", ItemType::Book)];

        let err = exporter
            .export_items(&bad, ExportFormat::Markdown, "items")
            .unwrap_err();
        assert!(matches!(err, ExportError::Validation(_)));
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
