//! Integration tests for Zotero Analyzer
//!
//! These tests drive the full pipeline through the public API, the MCP tool
//! registry and a mocked Zotero Web API.

use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use zotero_analyzer::config::parse_categories;
use zotero_analyzer::export::ContentExporter;
use zotero_analyzer::mcp::{McpServer, ToolRegistry};
use zotero_analyzer::models::{
    Collection, ContextType, ExportFormat, FilterSpec, ItemType, RecordBuilder, UNCATEGORIZED,
};
use zotero_analyzer::sources::{LibrarySource, LibraryType, MockSource, ZoteroSource};
use zotero_analyzer::utils::RetryConfig;
use zotero_analyzer::{LibraryAnalyzer, Record};

fn library() -> Vec<Record> {
    vec![
        RecordBuilder::new("DIFF0001", "Diffusion Policy", ItemType::ConferencePaper)
            .authors(["Cheng Chi", "Shuran Song"])
            .abstract_text("Visuomotor policy learning via action diffusion.")
            .year(2023)
            .tags(["robotics", "diffusion"])
            .collection("Thesis")
            .build(),
        RecordBuilder::new("TRAN0001", "Attention Is All You Need", ItemType::ConferencePaper)
            .author("Ashish Vaswani")
            .abstract_text("The dominant sequence transduction models are recurrent.")
            .year(2017)
            .tag("transformers")
            .build(),
        RecordBuilder::new("ROBO0001", "Robot Learning from Demonstration", ItemType::JournalArticle)
            .author("Brenna Argall")
            .abstract_text("A survey of policy learning from demonstration.")
            .year(2009)
            .tag("robotics")
            .collection("Thesis")
            .build(),
        RecordBuilder::new("GRPH0001", "Graph Search Revisited", ItemType::Book)
            .author("Ada Lovelace")
            .year(2021)
            .build(),
    ]
}

const CATEGORIES: &str = r#"[
    {"name": "Robot Learning", "keywords": ["policy", "demonstration"], "description": "Learning for robots"},
    {"name": "Generative Models", "keywords": ["diffusion"]}
]"#;

fn analyzer_in(dir: &std::path::Path) -> Arc<LibraryAnalyzer> {
    let source = MockSource::with_records(library());
    source.set_collections(vec![Collection {
        key: "COLL0001".to_string(),
        name: "Thesis".to_string(),
        parent: None,
    }]);
    Arc::new(LibraryAnalyzer::new(
        Arc::new(source),
        ContentExporter::new(dir),
    ))
}

#[tokio::test]
async fn test_filter_and_export_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = analyzer_in(dir.path());

    let spec = FilterSpec::new()
        .tags(["Robotics"])
        .year_range(2015, 2024);
    let records = analyzer.fetch(&spec, None).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key, "DIFF0001");

    let files = analyzer
        .export_items(&records, ExportFormat::Both, "filtered_items")
        .unwrap();
    assert_eq!(files.len(), 2);

    let json = std::fs::read_to_string(dir.path().join("filtered_items.json")).unwrap();
    let parsed: Vec<Record> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, records);

    let markdown = std::fs::read_to_string(dir.path().join("filtered_items.md")).unwrap();
    assert!(markdown.contains("Diffusion Policy"));
    assert!(!markdown.contains("Attention Is All You Need"));
}

#[tokio::test]
async fn test_analyze_writes_categorized_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let analyzer = analyzer_in(dir.path());
    let categories = parse_categories(CATEGORIES).unwrap();

    let report = analyzer
        .analyze(
            &FilterSpec::new(),
            None,
            &categories,
            ExportFormat::Both,
            ContextType::RelatedWorks,
        )
        .await
        .unwrap();

    assert_eq!(report.records.len(), 4);
    let count = |name: &str| report.categorized.get(name).map(|b| b.len());
    assert_eq!(count("Robot Learning"), Some(2));
    assert_eq!(count("Generative Models"), Some(1));
    assert_eq!(count(UNCATEGORIZED), Some(2));
    // Diffusion Policy sits in both named buckets
    assert_eq!(report.categorized.total_assignments(), 5);

    for name in [
        "categorized_literature.json",
        "categorized_literature.md",
        "category_robot_learning.json",
        "category_generative_models.md",
        "category_uncategorized.json",
        "llm_context_related_works.md",
    ] {
        assert!(dir.path().join(name).exists(), "missing {}", name);
    }

    let context = std::fs::read_to_string(dir.path().join("llm_context_related_works.md")).unwrap();
    assert!(context.starts_with("# Related Works Context"));
    assert!(context.contains("## Robot Learning"));
    assert!(context.contains("Learning for robots"));
    assert!(context.contains("Chi et al., 2023"));
}

#[tokio::test]
async fn test_tool_registry_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ToolRegistry::new(analyzer_in(dir.path()));

    let fetched = registry
        .execute(
            "fetch_literature",
            json!({"collections": ["thesis"], "year_range": "2000-2010"}),
        )
        .await
        .unwrap();
    assert_eq!(fetched["count"], 1);
    assert_eq!(fetched["items"][0]["key"], "ROBO0001");

    let categorized = registry
        .execute(
            "categorize_literature",
            json!({
                "categories": serde_json::from_str::<serde_json::Value>(CATEGORIES).unwrap(),
                "context_type": "literature_review"
            }),
        )
        .await
        .unwrap();
    assert_eq!(categorized["success"], true);
    assert_eq!(categorized["item_count"], 4);
    assert_eq!(categorized["category_counts"]["Robot Learning"], 2);
    let llm_file = categorized["llm_context_file"].as_str().unwrap();
    assert!(llm_file.ends_with("llm_context_literature_review.md"));

    let exported = registry
        .execute(
            "export_for_llm",
            json!({"categorized_data": categorized, "format": "json"}),
        )
        .await
        .unwrap();
    let buckets = exported["content"]["categories"].as_array().unwrap();
    assert_eq!(buckets.len(), 3);
    assert_eq!(buckets[2]["name"], UNCATEGORIZED);
}

#[tokio::test]
async fn test_tool_registry_reports_source_failure() {
    let dir = tempfile::tempdir().unwrap();
    let source = MockSource::with_records(library());
    source.fail_with("connection reset");
    let registry = ToolRegistry::new(Arc::new(LibraryAnalyzer::new(
        Arc::new(source),
        ContentExporter::new(dir.path()),
    )));

    let err = registry
        .execute("fetch_literature", json!({}))
        .await
        .unwrap_err();
    assert!(err.contains("connection reset"));
}

#[test]
fn test_mcp_server_creation() {
    let dir = tempfile::tempdir().unwrap();
    let server = McpServer::new(analyzer_in(dir.path()));
    assert!(server.is_ok());
}

#[test]
fn test_invalid_categories_rejected() {
    let reserved = r#"[{"name": "uncategorized", "keywords": ["x"]}]"#;
    assert!(parse_categories(reserved).is_err());

    let blank = r#"[{"name": "Empty", "keywords": ["  "]}]"#;
    assert!(parse_categories(blank).is_err());
}

fn zotero_item(key: &str, title: &str, year: &str, tags: &[&str]) -> serde_json::Value {
    let tags: Vec<serde_json::Value> = tags.iter().map(|t| json!({"tag": t})).collect();
    json!({
        "key": key,
        "version": 1,
        "data": {
            "key": key,
            "itemType": "journalArticle",
            "title": title,
            "creators": [{"creatorType": "author", "firstName": "Cheng", "lastName": "Chi"}],
            "abstractNote": "An abstract.",
            "date": year,
            "tags": tags,
            "collections": [],
            "publicationTitle": "RSS"
        }
    })
}

#[tokio::test]
async fn test_zotero_source_through_analyzer() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/groups/42/collections")
        .match_query(Matcher::Any)
        .match_header("Zotero-API-Key", "group-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let items = server
        .mock("GET", "/groups/42/items/top")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                zotero_item("ITEM0001", "Diffusion Policy", "2023-03-07", &["robotics"]),
                zotero_item("ITEM0002", "Old Robots", "1999", &["robotics"]),
                {"key": "NOTE0001", "version": 1, "data": {"key": "NOTE0001", "itemType": "note", "note": "x"}}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let source = ZoteroSource::new("42", LibraryType::Group, "group-key")
        .unwrap()
        .with_api_base(server.url())
        .with_retry_config(RetryConfig {
            max_attempts: 1,
            ..RetryConfig::default()
        });
    assert_eq!(source.name(), "Zotero");

    let dir = tempfile::tempdir().unwrap();
    let analyzer = LibraryAnalyzer::new(Arc::new(source), ContentExporter::new(dir.path()));

    let records = analyzer
        .fetch(&FilterSpec::new().year_range(2020, 2024), None)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Diffusion Policy");
    assert_eq!(records[0].year, Some(2023));
    assert_eq!(records[0].authors, vec!["Cheng Chi"]);

    items.assert_async().await;
}

#[tokio::test]
async fn test_zotero_unauthorized_is_reported() {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/users/7/collections")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body("Forbidden")
        .create_async()
        .await;

    let source = ZoteroSource::new("7", LibraryType::User, "bad-key")
        .unwrap()
        .with_api_base(server.url())
        .with_retry_config(RetryConfig {
            max_attempts: 1,
            ..RetryConfig::default()
        });

    let result = source.fetch_items(&FilterSpec::new(), Some(10)).await;
    assert!(result.is_err());
}
