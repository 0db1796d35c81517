//! Basic usage example for the Zotero Analyzer library.
//!
//! This example fetches items from a Zotero library, keeps the recent ones,
//! groups them into keyword categories and writes the LLM context document.
//! Set `ZOTERO_LIBRARY_ID` and `ZOTERO_API_KEY` (or a `.env` file) first.

use std::sync::Arc;
use zotero_analyzer::config::load_config;
use zotero_analyzer::export::ContentExporter;
use zotero_analyzer::models::{Category, ContextType, ExportFormat, FilterSpec};
use zotero_analyzer::LibraryAnalyzer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(None)?;
    let source = config.zotero_source()?;

    let analyzer = LibraryAnalyzer::new(
        Arc::new(source),
        ContentExporter::new(config.output.directory.clone()),
    );

    // Items published since 2020
    let spec = FilterSpec::new().year_range(2020, 2026);

    let categories = vec![
        Category::new("Robot Learning", ["policy", "imitation", "reinforcement"])
            .with_description("Learning-based control for robots"),
        Category::new("Generative Models", ["diffusion", "generative", "flow matching"]),
        Category::new("Language Models", ["language model", "transformer", "llm"]),
    ];

    println!("Fetching up to 200 items...");
    let report = analyzer
        .analyze(
            &spec,
            Some(200),
            &categories,
            ExportFormat::Markdown,
            ContextType::RelatedWorks,
        )
        .await?;

    println!("Kept {} items\n", report.records.len());
    for bucket in report.categorized.buckets() {
        println!("{:<20} {:>4} items", bucket.name, bucket.len());
    }

    println!("\nWritten files:");
    for (label, path) in report.files.iter() {
        println!("  {}: {}", label, path.display());
    }

    Ok(())
}
