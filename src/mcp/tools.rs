//! Tool registry for MCP tools.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use super::handlers::{
    CategorizeLiteratureHandler, ExportForLlmHandler, FetchLiteratureHandler,
    GetCollectionsHandler, GetTagsHandler, SearchLiteratureHandler,
};
use crate::analyzer::LibraryAnalyzer;
use crate::models::ItemType;

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "fetch_literature")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

/// Schema properties shared by the fetch and categorize tools
fn filter_properties() -> Value {
    let item_types: Vec<&str> = ItemType::known().iter().map(|t| t.id()).collect();
    json!({
        "tags": {
            "type": "array",
            "items": {"type": "string"},
            "description": "Keep items carrying any of these tags"
        },
        "collections": {
            "type": "array",
            "items": {"type": "string"},
            "description": "Keep items in any of these collections (by name)"
        },
        "authors": {
            "type": "array",
            "items": {"type": "string"},
            "description": "Keep items with an author name containing any of these strings"
        },
        "keywords": {
            "type": "array",
            "items": {"type": "string"},
            "description": "Keep items whose title or abstract contains any of these strings"
        },
        "year_range": {
            "type": "array",
            "items": {"type": "integer"},
            "minItems": 2,
            "maxItems": 2,
            "description": "Inclusive publication year range [start, end]"
        },
        "item_type": {
            "type": "string",
            "enum": item_types,
            "description": "Keep only this item type"
        },
        "title_contains": {
            "type": "string",
            "description": "Keep items whose title contains this string"
        }
    })
}

fn category_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "description": {"type": "string"},
            "keywords": {"type": "array", "items": {"type": "string"}}
        },
        "required": ["name", "keywords"]
    })
}

/// Registry for all MCP tools
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a registry with every library tool bound to `analyzer`
    pub fn new(analyzer: Arc<LibraryAnalyzer>) -> Self {
        let mut registry = Self::default();
        registry.register_library_tools(&analyzer);
        registry
    }

    fn register_library_tools(&mut self, analyzer: &Arc<LibraryAnalyzer>) {
        let source_name = analyzer.source().name().to_string();

        let mut fetch_properties = filter_properties();
        fetch_properties["limit"] = json!({
            "type": "integer",
            "description": "Maximum number of items to fetch before filtering"
        });
        self.register(Tool {
            name: "fetch_literature".to_string(),
            description: format!(
                "Fetch literature items from the {} library with filtering options",
                source_name
            ),
            input_schema: json!({
                "type": "object",
                "properties": fetch_properties
            }),
            handler: Arc::new(FetchLiteratureHandler {
                analyzer: analyzer.clone(),
            }),
        });

        self.register(Tool {
            name: "search_literature".to_string(),
            description: format!("Search literature items in the {} library", source_name),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of results",
                        "default": 20
                    }
                },
                "required": ["query"]
            }),
            handler: Arc::new(SearchLiteratureHandler {
                analyzer: analyzer.clone(),
            }),
        });

        self.register(Tool {
            name: "categorize_literature".to_string(),
            description: "Fetch items, group them into keyword-defined categories, and write \
                          categorized exports plus an LLM context file"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "categories": {
                        "type": "array",
                        "items": category_schema(),
                        "description": "Literature categories with keywords for classification"
                    },
                    "filter_criteria": {
                        "type": "object",
                        "properties": filter_properties(),
                        "description": "Optional filter criteria for items"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of items to fetch before filtering"
                    },
                    "export_format": {
                        "type": "string",
                        "enum": ["json", "markdown", "both"],
                        "default": "markdown"
                    },
                    "context_type": {
                        "type": "string",
                        "enum": ["related_works", "literature_review"],
                        "default": "related_works"
                    }
                },
                "required": ["categories"]
            }),
            handler: Arc::new(CategorizeLiteratureHandler {
                analyzer: analyzer.clone(),
            }),
        });

        self.register(Tool {
            name: "get_collections".to_string(),
            description: format!("Get all collections from the {} library", source_name),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "refresh": {
                        "type": "boolean",
                        "description": "Bypass the cached list",
                        "default": false
                    }
                }
            }),
            handler: Arc::new(GetCollectionsHandler {
                analyzer: analyzer.clone(),
            }),
        });

        self.register(Tool {
            name: "get_tags".to_string(),
            description: format!("Get all tags from the {} library", source_name),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of tags to return",
                        "default": 100
                    },
                    "refresh": {
                        "type": "boolean",
                        "description": "Bypass the cached list",
                        "default": false
                    }
                }
            }),
            handler: Arc::new(GetTagsHandler {
                analyzer: analyzer.clone(),
            }),
        });

        self.register(Tool {
            name: "export_for_llm".to_string(),
            description: "Render categorized literature from categorize_literature as an \
                          LLM-ready context document. Does not contact the library."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "categorized_data": {
                        "description": "The categories value returned by categorize_literature",
                        "oneOf": [{"type": "array"}, {"type": "object"}]
                    },
                    "context_type": {
                        "type": "string",
                        "enum": ["related_works", "literature_review"],
                        "default": "related_works"
                    },
                    "format": {
                        "type": "string",
                        "enum": ["markdown", "json"],
                        "default": "markdown"
                    }
                },
                "required": ["categorized_data"]
            }),
            handler: Arc::new(ExportForLlmHandler {
                analyzer: analyzer.clone(),
            }),
        });
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools, sorted by name
    pub fn all(&self) -> Vec<&Tool> {
        let mut tools: Vec<&Tool> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Tool '{}' not found", name))?;

        tracing::debug!("Executing tool {}", name);
        tool.handler.execute(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ContentExporter;
    use crate::models::{Collection, Record, RecordBuilder};
    use crate::sources::MockSource;
    use tempfile::{tempdir, TempDir};

    fn library() -> Vec<Record> {
        vec![
            RecordBuilder::new("AAAA1111", "Diffusion Policy", ItemType::ConferencePaper)
                .author("Cheng Chi")
                .abstract_text("Visuomotor policy learning via action diffusion.")
                .year(2023)
                .tags(["robotics", "diffusion"])
                .build(),
            RecordBuilder::new("BBBB2222", "Attention Is All You Need", ItemType::ConferencePaper)
                .author("Ashish Vaswani")
                .year(2017)
                .tag("transformers")
                .build(),
            RecordBuilder::new("CCCC3333", "Graph Search Revisited", ItemType::JournalArticle)
                .author("Ada Lovelace")
                .year(2021)
                .build(),
        ]
    }

    fn registry() -> (ToolRegistry, TempDir) {
        let dir = tempdir().unwrap();
        let source = Arc::new(MockSource::with_records(library()));
        source.set_collections(vec![Collection {
            key: "COLL0001".to_string(),
            name: "Robotics".to_string(),
            parent: None,
        }]);
        let analyzer = Arc::new(LibraryAnalyzer::new(
            source,
            ContentExporter::new(dir.path()),
        ));
        (ToolRegistry::new(analyzer), dir)
    }

    #[test]
    fn test_registers_all_tools() {
        let (registry, _dir) = registry();
        let names: Vec<&str> = registry.all().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "categorize_literature",
                "export_for_llm",
                "fetch_literature",
                "get_collections",
                "get_tags",
                "search_literature"
            ]
        );
        for tool in registry.all() {
            assert_eq!(tool.input_schema["type"], "object");
        }
    }

    #[tokio::test]
    async fn test_fetch_literature_filters() {
        let (registry, _dir) = registry();
        let result = registry
            .execute(
                "fetch_literature",
                json!({"year_range": [2020, 2024], "tags": ["robotics"]}),
            )
            .await
            .unwrap();

        assert_eq!(result["success"], true);
        assert_eq!(result["count"], 1);
        assert_eq!(result["items"][0]["key"], "AAAA1111");
        assert!(chrono::DateTime::parse_from_rfc3339(result["timestamp"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let (registry, _dir) = registry();
        let err = registry
            .execute("search_literature", json!({}))
            .await
            .unwrap_err();
        assert!(err.contains("query"));

        let result = registry
            .execute("search_literature", json!({"query": "attention"}))
            .await
            .unwrap();
        assert_eq!(result["count"], 1);
        assert_eq!(result["query"], "attention");
    }

    #[tokio::test]
    async fn test_categorize_then_export_for_llm() {
        let (registry, dir) = registry();
        let categorized = registry
            .execute(
                "categorize_literature",
                json!({
                    "categories": [
                        {"name": "Robot Learning", "keywords": ["policy", "robot"]},
                        {"name": "Transformers", "description": "Sequence models", "keywords": ["attention"]}
                    ]
                }),
            )
            .await
            .unwrap();

        assert_eq!(categorized["category_counts"]["Robot Learning"], 1);
        assert_eq!(categorized["category_counts"]["Uncategorized"], 1);
        assert_eq!(categorized["item_count"], 3);
        assert!(dir.path().join("categorized_literature.md").exists());
        assert!(dir.path().join("llm_context_related_works.md").exists());

        let exported = registry
            .execute(
                "export_for_llm",
                json!({
                    "categorized_data": categorized["categories"].clone(),
                    "context_type": "literature_review"
                }),
            )
            .await
            .unwrap();
        let content = exported["content"].as_str().unwrap();
        assert!(content.starts_with("# Literature Review Context"));
        assert!(content.contains("### Attention Is All You Need"));
        assert!(dir.path().join("llm_context_literature_review.md").exists());
    }

    #[tokio::test]
    async fn test_categorize_rejects_reserved_name() {
        let (registry, _dir) = registry();
        let err = registry
            .execute(
                "categorize_literature",
                json!({"categories": [{"name": "Uncategorized", "keywords": ["x"]}]}),
            )
            .await
            .unwrap_err();
        assert!(err.contains("reserved"));
    }

    #[tokio::test]
    async fn test_collections_and_tags() {
        let (registry, _dir) = registry();

        let collections = registry.execute("get_collections", Value::Null).await.unwrap();
        assert_eq!(collections["count"], 1);
        assert_eq!(collections["collections"][0]["name"], "Robotics");

        let tags = registry
            .execute("get_tags", json!({"limit": 2}))
            .await
            .unwrap();
        assert_eq!(tags["total_count"], 3);
        assert_eq!(tags["returned_count"], 2);
        assert_eq!(tags["tags"], json!(["diffusion", "robotics"]));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (registry, _dir) = registry();
        let err = registry.execute("download_paper", json!({})).await.unwrap_err();
        assert!(err.contains("not found"));
    }
}
