//! Fetch, filter, categorize and export in one place.
//!
//! [`LibraryAnalyzer`] owns a [`LibrarySource`] and a [`ContentExporter`].
//! The CLI and the MCP server both drive the pipeline through it.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::analysis::{categorize, filter_set};
use crate::export::{ContentExporter, ExportError, ExportedFiles};
use crate::models::{
    CategorizedSet, Category, Collection, ContextType, ExportFormat, FilterSpec, Record,
};
use crate::sources::{LibrarySource, SourceError};

/// Errors surfaced by the pipeline
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Result of a categorize-and-export run
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Records that passed the filter, in source order
    pub records: Vec<Record>,

    /// Records grouped by category
    pub categorized: CategorizedSet<'static>,

    /// Every file written, categorized output first and LLM context last
    pub files: ExportedFiles,
}

/// Library pipeline over one source
#[derive(Debug)]
pub struct LibraryAnalyzer {
    source: Arc<dyn LibrarySource>,
    exporter: ContentExporter,
    collections: RwLock<Option<Vec<Collection>>>,
    tags: RwLock<Option<Vec<String>>>,
}

impl LibraryAnalyzer {
    pub fn new(source: Arc<dyn LibrarySource>, exporter: ContentExporter) -> Self {
        Self {
            source,
            exporter,
            collections: RwLock::new(None),
            tags: RwLock::new(None),
        }
    }

    pub fn source(&self) -> &dyn LibrarySource {
        self.source.as_ref()
    }

    pub fn exporter(&self) -> &ContentExporter {
        &self.exporter
    }

    /// Fetch up to `limit` items and keep those matching `spec`
    ///
    /// The limit caps what is fetched, so fewer than `limit` records may
    /// survive the filter.
    pub async fn fetch(
        &self,
        spec: &FilterSpec,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, AnalyzerError> {
        let fetched = self.source.fetch_items(spec, limit).await?;
        let kept: Vec<Record> = filter_set(&fetched, spec).into_iter().cloned().collect();

        tracing::info!(
            "Fetched {} items from {}, {} match the filter",
            fetched.len(),
            self.source.name(),
            kept.len()
        );
        Ok(kept)
    }

    /// Quick search through the source
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Record>, AnalyzerError> {
        let records = self.source.search_items(query, limit).await?;
        tracing::info!("Search '{}' returned {} items", query, records.len());
        Ok(records)
    }

    /// Library collections, cached after the first successful call
    pub async fn collections(&self, refresh: bool) -> Result<Vec<Collection>, AnalyzerError> {
        if !refresh {
            if let Some(cached) = self.collections.read().await.as_ref() {
                return Ok(cached.clone());
            }
        }
        let collections = self.source.collections().await?;
        *self.collections.write().await = Some(collections.clone());
        Ok(collections)
    }

    /// Library tags, cached after the first successful call
    pub async fn tags(&self, refresh: bool) -> Result<Vec<String>, AnalyzerError> {
        if !refresh {
            if let Some(cached) = self.tags.read().await.as_ref() {
                return Ok(cached.clone());
            }
        }
        let tags = self.source.tags().await?;
        *self.tags.write().await = Some(tags.clone());
        Ok(tags)
    }

    /// Fetch, categorize and write the categorized and LLM context files
    pub async fn analyze(
        &self,
        spec: &FilterSpec,
        limit: Option<usize>,
        categories: &[Category],
        format: ExportFormat,
        context_type: ContextType,
    ) -> Result<AnalysisReport, AnalyzerError> {
        let records = self.fetch(spec, limit).await?;
        let categorized = categorize(&records, categories).into_owned();

        let mut files = self.exporter.export_categorized(&categorized, format)?;
        files.extend(self.exporter.export_llm_context(&categorized, context_type)?);

        Ok(AnalysisReport {
            records,
            categorized,
            files,
        })
    }

    /// Write `records` as `<stem>.json` and/or `<stem>.md`
    pub fn export_items(
        &self,
        records: &[Record],
        format: ExportFormat,
        stem: &str,
    ) -> Result<ExportedFiles, AnalyzerError> {
        Ok(self.exporter.export_items(records, format, stem)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::make_record;
    use crate::sources::MockSource;
    use tempfile::tempdir;

    fn analyzer(source: Arc<MockSource>, dir: &std::path::Path) -> LibraryAnalyzer {
        LibraryAnalyzer::new(source, ContentExporter::new(dir))
    }

    #[tokio::test]
    async fn test_fetch_applies_filter() {
        let dir = tempdir().unwrap();
        let source = Arc::new(MockSource::with_records(vec![
            make_record("A", "Diffusion Policy", 2023),
            make_record("B", "Graph Search", 2015),
            make_record("C", "Diffusion Planning", 2019),
        ]));
        let analyzer = analyzer(source, dir.path());

        let spec = FilterSpec::new().keywords(["diffusion"]).year_range(2020, 2024);
        let records = analyzer.fetch(&spec, None).await.unwrap();
        let keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["A"]);
    }

    #[tokio::test]
    async fn test_source_error_passes_through() {
        let dir = tempdir().unwrap();
        let source = Arc::new(MockSource::new());
        source.fail_with("boom");
        let analyzer = analyzer(source, dir.path());

        let err = analyzer.fetch(&FilterSpec::new(), None).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Source(_)));
    }

    #[tokio::test]
    async fn test_collections_are_cached() {
        let dir = tempdir().unwrap();
        let source = Arc::new(MockSource::new());
        source.set_collections(vec![Collection {
            key: "COLL0001".to_string(),
            name: "Robotics".to_string(),
            parent: None,
        }]);
        let analyzer = analyzer(source.clone(), dir.path());

        assert_eq!(analyzer.collections(false).await.unwrap().len(), 1);
        source.set_collections(Vec::new());
        assert_eq!(analyzer.collections(false).await.unwrap().len(), 1);
        assert!(analyzer.collections(true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_writes_files() {
        let dir = tempdir().unwrap();
        let source = Arc::new(MockSource::with_records(vec![
            make_record("A", "Diffusion Policy", 2023),
            make_record("B", "Graph Search", 2015),
        ]));
        let analyzer = analyzer(source, dir.path());

        let report = analyzer
            .analyze(
                &FilterSpec::new(),
                None,
                &[Category::new("Diffusion", ["diffusion"])],
                ExportFormat::Markdown,
                ContextType::RelatedWorks,
            )
            .await
            .unwrap();

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.categorized.get("Diffusion").unwrap().len(), 1);
        assert_eq!(report.categorized.uncategorized().len(), 1);
        assert!(report.files.get("categorized markdown").is_some());
        assert!(report
            .files
            .get("llm context")
            .unwrap()
            .ends_with("llm_context_related_works.md"));
    }
}
