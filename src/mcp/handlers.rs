//! Tool handlers backed by a [`LibraryAnalyzer`].

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use super::tools::ToolHandler;
use crate::analyzer::LibraryAnalyzer;
use crate::config::validate_categories;
use crate::export::{build_llm_context, ExportedFiles};
use crate::models::{
    CategorizedSet, Category, ContextType, ExportFormat, FilterSpec, ItemType, YearRange,
};

const DEFAULT_SEARCH_LIMIT: usize = 20;
const DEFAULT_TAG_LIMIT: usize = 100;

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn parse_args<T: for<'de> Deserialize<'de>>(args: Value) -> Result<T, String> {
    // Clients may send no arguments at all for tools without required fields
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {}", e))
}

fn files_json(files: &ExportedFiles) -> Value {
    Value::Array(
        files
            .iter()
            .map(|(label, path)| json!({ "label": label, "path": path.display().to_string() }))
            .collect(),
    )
}

/// Year range given either as `[start, end]` or as `"start-end"`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YearRangeArg {
    Pair([i32; 2]),
    Text(String),
}

impl YearRangeArg {
    fn into_range(self) -> Result<YearRange, String> {
        match self {
            YearRangeArg::Pair([start, end]) if start <= end => Ok(YearRange::new(start, end)),
            YearRangeArg::Pair([start, end]) => Err(format!(
                "Invalid year range [{}, {}]: start is after end",
                start, end
            )),
            YearRangeArg::Text(text) => YearRange::from_str(&text).map_err(|e| e.to_string()),
        }
    }
}

/// Filter fields shared by the fetch and categorize tools
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FilterArgs {
    tags: Vec<String>,
    collections: Vec<String>,
    authors: Vec<String>,
    keywords: Vec<String>,
    year_range: Option<YearRangeArg>,
    item_type: Option<String>,
    item_types: Vec<String>,
    title_contains: Option<String>,
}

impl FilterArgs {
    fn into_spec(self) -> Result<FilterSpec, String> {
        let item_types = self
            .item_type
            .into_iter()
            .chain(self.item_types)
            .filter_map(|t| ItemType::from_str(&t).ok());

        let mut spec = FilterSpec::new()
            .tags(self.tags)
            .collections(self.collections)
            .authors(self.authors)
            .keywords(self.keywords)
            .item_types(item_types);
        if let Some(range) = self.year_range {
            spec.year_range = Some(range.into_range()?);
        }
        if let Some(text) = self.title_contains.filter(|t| !t.trim().is_empty()) {
            spec = spec.title_contains(text);
        }
        Ok(spec)
    }
}

#[derive(Debug, Deserialize)]
struct FetchArgs {
    #[serde(flatten)]
    filter: FilterArgs,
    limit: Option<usize>,
}

/// Handler for `fetch_literature`
#[derive(Debug)]
pub struct FetchLiteratureHandler {
    pub analyzer: Arc<LibraryAnalyzer>,
}

#[async_trait::async_trait]
impl ToolHandler for FetchLiteratureHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let args: FetchArgs = parse_args(args)?;
        let spec = args.filter.into_spec()?;

        let records = self
            .analyzer
            .fetch(&spec, args.limit)
            .await
            .map_err(|e| e.to_string())?;

        Ok(json!({
            "success": true,
            "count": records.len(),
            "items": records,
            "timestamp": timestamp(),
        }))
    }
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    limit: Option<usize>,
}

/// Handler for `search_literature`
#[derive(Debug)]
pub struct SearchLiteratureHandler {
    pub analyzer: Arc<LibraryAnalyzer>,
}

#[async_trait::async_trait]
impl ToolHandler for SearchLiteratureHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let args: SearchArgs = parse_args(args)?;
        let records = self
            .analyzer
            .search(&args.query, args.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
            .await
            .map_err(|e| e.to_string())?;

        Ok(json!({
            "success": true,
            "query": args.query,
            "count": records.len(),
            "items": records,
            "timestamp": timestamp(),
        }))
    }
}

fn default_categorize_format() -> ExportFormat {
    ExportFormat::Markdown
}

#[derive(Debug, Deserialize)]
struct CategorizeArgs {
    categories: Vec<Category>,
    #[serde(default)]
    filter_criteria: Option<FilterArgs>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default = "default_categorize_format")]
    export_format: ExportFormat,
    #[serde(default)]
    context_type: ContextType,
}

/// Handler for `categorize_literature`
#[derive(Debug)]
pub struct CategorizeLiteratureHandler {
    pub analyzer: Arc<LibraryAnalyzer>,
}

#[async_trait::async_trait]
impl ToolHandler for CategorizeLiteratureHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let args: CategorizeArgs = parse_args(args)?;
        validate_categories(&args.categories).map_err(|e| e.to_string())?;
        let spec = args.filter_criteria.unwrap_or_default().into_spec()?;

        let report = self
            .analyzer
            .analyze(
                &spec,
                args.limit,
                &args.categories,
                args.export_format,
                args.context_type,
            )
            .await
            .map_err(|e| e.to_string())?;

        let category_counts: BTreeMap<&str, usize> = report
            .categorized
            .buckets()
            .iter()
            .map(|b| (b.name.as_str(), b.len()))
            .collect();

        Ok(json!({
            "success": true,
            "categories": report.categorized,
            "category_counts": category_counts,
            "item_count": report.records.len(),
            "total_items": report.categorized.total_assignments(),
            "exported_files": files_json(&report.files),
            "llm_context_file": report.files.get("llm context").map(|p| p.display().to_string()),
            "timestamp": timestamp(),
        }))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListArgs {
    limit: Option<usize>,
    refresh: bool,
}

/// Handler for `get_collections`
#[derive(Debug)]
pub struct GetCollectionsHandler {
    pub analyzer: Arc<LibraryAnalyzer>,
}

#[async_trait::async_trait]
impl ToolHandler for GetCollectionsHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let args: ListArgs = parse_args(args)?;
        let collections = self
            .analyzer
            .collections(args.refresh)
            .await
            .map_err(|e| e.to_string())?;

        Ok(json!({
            "success": true,
            "count": collections.len(),
            "collections": collections,
            "timestamp": timestamp(),
        }))
    }
}

/// Handler for `get_tags`
#[derive(Debug)]
pub struct GetTagsHandler {
    pub analyzer: Arc<LibraryAnalyzer>,
}

#[async_trait::async_trait]
impl ToolHandler for GetTagsHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let args: ListArgs = parse_args(args)?;
        let tags = self
            .analyzer
            .tags(args.refresh)
            .await
            .map_err(|e| e.to_string())?;
        let limit = args.limit.unwrap_or(DEFAULT_TAG_LIMIT);
        let returned: Vec<&String> = tags.iter().take(limit).collect();

        Ok(json!({
            "success": true,
            "tags": returned,
            "total_count": tags.len(),
            "returned_count": returned.len(),
            "timestamp": timestamp(),
        }))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LlmOutputFormat {
    #[default]
    Markdown,
    Json,
}

#[derive(Debug, Deserialize)]
struct ExportForLlmArgs {
    categorized_data: Value,
    #[serde(default)]
    context_type: ContextType,
    #[serde(default)]
    format: LlmOutputFormat,
}

/// Decode categorized data from a bucket array, a name-to-bucket map, or a
/// whole `categorize_literature` response
fn decode_categorized(data: Value) -> Result<CategorizedSet<'static>, String> {
    let buckets = match data {
        Value::Object(mut map) if map.contains_key("categories") => {
            return decode_categorized(map.remove("categories").unwrap_or(Value::Null));
        }
        Value::Object(map) => Value::Array(map.into_iter().map(|(_, v)| v).collect()),
        Value::Array(items) => Value::Array(items),
        other => {
            return Err(format!(
                "categorized_data must be an array or object, got {}",
                other
            ))
        }
    };
    serde_json::from_value(buckets).map_err(|e| format!("Invalid categorized_data: {}", e))
}

/// Handler for `export_for_llm`
///
/// Re-renders categorized data without touching the library.
#[derive(Debug)]
pub struct ExportForLlmHandler {
    pub analyzer: Arc<LibraryAnalyzer>,
}

#[async_trait::async_trait]
impl ToolHandler for ExportForLlmHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let args: ExportForLlmArgs = parse_args(args)?;
        let set = decode_categorized(args.categorized_data)?;

        match args.format {
            LlmOutputFormat::Markdown => {
                let files = self
                    .analyzer
                    .exporter()
                    .export_llm_context(&set, args.context_type)
                    .map_err(|e| e.to_string())?;

                Ok(json!({
                    "success": true,
                    "format": "markdown",
                    "context_type": args.context_type,
                    "content": build_llm_context(&set, args.context_type),
                    "file_path": files.get("llm context").map(|p| p.display().to_string()),
                    "timestamp": timestamp(),
                }))
            }
            LlmOutputFormat::Json => Ok(json!({
                "success": true,
                "format": "json",
                "content": {
                    "context_type": args.context_type,
                    "generated_at": timestamp(),
                    "categories": set,
                },
                "timestamp": timestamp(),
            })),
        }
    }
}
