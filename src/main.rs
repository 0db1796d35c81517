use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zotero_analyzer::config::{
    env_var_help, load_categories, load_config, user_config_path, Config, LOCAL_CONFIG_FILE,
};
use zotero_analyzer::export::{ContentExporter, ExportedFiles};
use zotero_analyzer::mcp::McpServer;
use zotero_analyzer::models::{
    CategorizedSet, Category, Collection, ContextType, ExportFormat, FilterSpec, ItemType, Record,
    YearRange,
};
use zotero_analyzer::sources::LibraryType;
use zotero_analyzer::ui::{self, Spinner, Status};
use zotero_analyzer::utils::{surname, CitationStyle};
use zotero_analyzer::LibraryAnalyzer;

/// Zotero Analyzer - Filter, categorize and export Zotero libraries for literature reviews
#[derive(Parser, Debug)]
#[command(name = "zotero-analyzer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Filter, categorize and export Zotero libraries for literature reviews", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if ui::is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

/// Library selection; each flag overrides the configured value
#[derive(Args, Debug, Default)]
struct LibraryArgs {
    /// Zotero library ID
    #[arg(long)]
    library_id: Option<String>,

    /// Library type: user or group
    #[arg(long)]
    library_type: Option<LibraryType>,

    /// Zotero API key (or set ZOTERO_API_KEY)
    #[arg(long)]
    api_key: Option<String>,
}

impl LibraryArgs {
    fn apply(self, config: &mut Config) {
        if let Some(id) = self.library_id {
            config.zotero.library_id = Some(id);
        }
        if let Some(library_type) = self.library_type {
            config.zotero.library_type = library_type;
        }
        if let Some(key) = self.api_key {
            config.zotero.api_key = Some(key);
        }
    }
}

/// Record filter flags; list flags take comma-separated values
#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Keep items carrying any of these tags
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,

    /// Keep items in any of these collections (by name)
    #[arg(long, value_delimiter = ',')]
    collections: Vec<String>,

    /// Keep items with an author containing any of these strings
    #[arg(long, value_delimiter = ',')]
    authors: Vec<String>,

    /// Keep items whose title or abstract contains any of these strings
    #[arg(long, value_delimiter = ',')]
    keywords: Vec<String>,

    /// Keep items whose title contains this string
    #[arg(long)]
    title_contains: Option<String>,

    /// Inclusive publication year range (e.g., 2020-2023)
    #[arg(long)]
    year_range: Option<YearRange>,

    /// Keep items of these types (Zotero ids, e.g. journalArticle)
    #[arg(long = "item-type", value_delimiter = ',')]
    item_types: Vec<ItemType>,
}

impl FilterArgs {
    fn into_spec(self) -> FilterSpec {
        let trimmed = |values: Vec<String>| -> Vec<String> {
            values
                .into_iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect()
        };

        let mut spec = FilterSpec::new()
            .tags(trimmed(self.tags))
            .collections(trimmed(self.collections))
            .authors(trimmed(self.authors))
            .keywords(trimmed(self.keywords))
            .item_types(self.item_types);
        spec.year_range = self.year_range;
        spec.title_contains = self.title_contains.filter(|t| !t.trim().is_empty());
        spec
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch, filter and export items; categorize them with --categories-file
    #[command(alias = "f")]
    Fetch {
        #[command(flatten)]
        library: LibraryArgs,

        #[command(flatten)]
        filter: FilterArgs,

        /// Maximum number of items to fetch
        #[arg(long, short)]
        limit: Option<usize>,

        /// Output directory for exported files
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Export format: json, markdown or both
        #[arg(long)]
        format: Option<ExportFormat>,

        /// JSON file with category definitions
        #[arg(long)]
        categories_file: Option<PathBuf>,

        /// LLM context template: related_works or literature_review
        #[arg(long)]
        context_type: Option<ContextType>,

        /// Citation style: apa, mla, chicago or bibtex
        #[arg(long)]
        citation_style: Option<CitationStyle>,
    },

    /// Search items and export the results
    #[command(alias = "s")]
    Search {
        /// Search query string
        query: String,

        #[command(flatten)]
        library: LibraryArgs,

        /// Maximum number of results
        #[arg(long, short, default_value_t = 20)]
        limit: usize,

        /// Output directory for exported files
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Export format: json, markdown or both
        #[arg(long)]
        format: Option<ExportFormat>,
    },

    /// List collections in the library
    Collections {
        #[command(flatten)]
        library: LibraryArgs,
    },

    /// List tags in the library
    Tags {
        #[command(flatten)]
        library: LibraryArgs,

        /// Maximum number of tags to show
        #[arg(long, short, default_value_t = 50)]
        limit: usize,
    },

    /// Validate a category definition file
    ValidateCategories {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// Run the MCP server
    Serve {
        #[command(flatten)]
        library: LibraryArgs,

        /// Serve over streamable HTTP instead of stdio
        #[arg(long)]
        http: bool,

        /// Host to bind in HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind in HTTP mode
        #[arg(long, default_value_t = 3000)]
        port: u16,

        /// Output directory for files written by tools
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination (default: the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn print_env_vars() {
    println!("Environment Variables");
    println!("=====================");
    println!();
    for (name, description) in env_var_help() {
        println!("  {:<36} {}", name, description);
    }
    println!();
    println!("A .env file in the working directory is loaded before the environment is read.");
    println!();
    println!("Example:");
    println!("  export ZOTERO_LIBRARY_ID=\"1234567\"");
    println!("  export ZOTERO_API_KEY=\"your-key-here\"");
    println!("  export ZOTERO_ANALYZER__OUTPUT__FORMAT=\"markdown\"");
    std::process::exit(0);
}

/// Filter directive for the crate's own logs
fn log_directive(verbose: u8, quiet: bool, configured: &str) -> String {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => configured,
            1 => "debug",
            _ => "trace",
        }
    };
    format!("zotero_analyzer={}", level.to_lowercase())
}

fn build_analyzer(config: &Config) -> Result<Arc<LibraryAnalyzer>> {
    let source = config
        .zotero_source()
        .context("Cannot connect to Zotero (see --env for configuration)")?;
    Ok(Arc::new(LibraryAnalyzer::new(
        Arc::new(source),
        ContentExporter::new(config.output.directory.clone()),
    )))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.env {
        print_env_vars();
    }

    let mut config = load_config(cli.config.as_deref())?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| log_directive(cli.verbose, cli.quiet, &config.logging.level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let output = cli.output.resolve();
    let quiet = cli.quiet;

    match cli.command {
        Some(Commands::Fetch {
            library,
            filter,
            limit,
            output_dir,
            format,
            categories_file,
            context_type,
            citation_style,
        }) => {
            library.apply(&mut config);
            if let Some(dir) = output_dir {
                config.output.directory = dir;
            }
            if let Some(style) = citation_style {
                config.output.citation_style = style;
            }
            let format = format.unwrap_or(config.output.format);
            let context_type = context_type.unwrap_or(config.output.context_type);
            let limit = limit.or(config.fetch.default_limit);
            let spec = filter.into_spec();

            // Fail on a bad category file before touching the network
            let categories = categories_file
                .as_deref()
                .map(load_categories)
                .transpose()?;

            let analyzer = build_analyzer(&config)?;
            let spinner = Spinner::new("Fetching items from Zotero...", quiet);

            match categories {
                Some(categories) => {
                    let report = analyzer
                        .analyze(&spec, limit, &categories, format, context_type)
                        .await;
                    let report = match report {
                        Ok(report) => report,
                        Err(e) => {
                            spinner.finish_with_error("Fetch failed");
                            return Err(e.into());
                        }
                    };
                    spinner.finish_with_success(&format!("Fetched {} items", report.records.len()));
                    output_categories(&report.categorized, output);
                    print_files(&report.files, quiet);
                }
                None => {
                    let records = match analyzer.fetch(&spec, limit).await {
                        Ok(records) => records,
                        Err(e) => {
                            spinner.finish_with_error("Fetch failed");
                            return Err(e.into());
                        }
                    };
                    spinner.finish_with_success(&format!("Fetched {} items", records.len()));
                    let files = analyzer.export_items(&records, format, "filtered_items")?;
                    output_records(&records, output);
                    print_files(&files, quiet);
                }
            }
        }

        Some(Commands::Search {
            query,
            library,
            limit,
            output_dir,
            format,
        }) => {
            library.apply(&mut config);
            if let Some(dir) = output_dir {
                config.output.directory = dir;
            }
            let format = format.unwrap_or(config.output.format);

            let analyzer = build_analyzer(&config)?;
            let spinner = Spinner::new(&format!("Searching for '{}'...", query), quiet);
            let records = match analyzer.search(&query, limit).await {
                Ok(records) => records,
                Err(e) => {
                    spinner.finish_with_error("Search failed");
                    return Err(e.into());
                }
            };
            spinner.finish_and_clear();

            if records.is_empty() {
                if !quiet {
                    ui::print_status(Status::Warning, &format!("No items found matching '{}'", query));
                }
                return Ok(());
            }
            if !quiet {
                ui::print_status(
                    Status::Search,
                    &format!("Found {} items matching '{}'", records.len(), query),
                );
            }
            output_records(&records, output);

            let files = analyzer.export_items(&records, format, &format!("search_{}", query))?;
            print_files(&files, quiet);
        }

        Some(Commands::Collections { library }) => {
            library.apply(&mut config);
            let analyzer = build_analyzer(&config)?;
            let collections = analyzer.collections(false).await?;

            if collections.is_empty() && !quiet {
                ui::print_status(Status::Warning, "No collections found");
            }
            output_collections(&collections, output);
        }

        Some(Commands::Tags { library, limit }) => {
            library.apply(&mut config);
            let analyzer = build_analyzer(&config)?;
            let tags = analyzer.tags(false).await?;
            let shown: Vec<&String> = tags.iter().take(limit).collect();

            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shown)?),
                _ => {
                    if tags.is_empty() {
                        if !quiet {
                            ui::print_status(Status::Warning, "No tags found");
                        }
                    } else {
                        if !quiet {
                            ui::print_status(
                                Status::Info,
                                &format!(
                                    "Found {} tags (showing first {})",
                                    ui::format_number(tags.len()),
                                    shown.len()
                                ),
                            );
                        }
                        for tag in shown {
                            println!("  • {}", tag);
                        }
                    }
                }
            }
        }

        Some(Commands::ValidateCategories { file }) => {
            let categories = load_categories(&file)
                .with_context(|| format!("Invalid categories file {}", file.display()))?;
            if !quiet {
                ui::print_status(
                    Status::Success,
                    &format!("Categories file is valid with {} categories", categories.len()),
                );
            }
            output_category_definitions(&categories, output);
        }

        Some(Commands::Serve {
            library,
            http,
            host,
            port,
            output_dir,
        }) => {
            library.apply(&mut config);
            if let Some(dir) = output_dir {
                config.output.directory = dir;
            }
            let server = McpServer::new(build_analyzer(&config)?)?;

            if http {
                let addr = format!("{}:{}", host, port);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!("MCP server listening on {}", bound_addr);

                handle
                    .await
                    .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
            } else {
                server.run().await?;
            }
        }

        Some(Commands::InitConfig { path, force }) => {
            let path = path
                .or_else(user_config_path)
                .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save(&path)?;
            if !quiet {
                ui::print_status(
                    Status::Success,
                    &format!("Wrote default configuration to {}", path.display()),
                );
            }
        }

        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

fn print_files(files: &ExportedFiles, quiet: bool) {
    if quiet || files.is_empty() {
        return;
    }
    eprintln!();
    eprintln!("{}", "Exported files:".bold().green());
    for (label, path) in files.iter() {
        eprintln!("  {}: {}", label, path.display().blue());
    }
}

/// `Surname et al.` style author summary for tables
fn short_authors(record: &Record) -> String {
    match record.authors.as_slice() {
        [] => "Unknown".to_string(),
        [only] => surname(only).to_string(),
        [first, second] => format!("{} & {}", surname(first), surname(second)),
        [first, ..] => format!("{} et al.", surname(first)),
    }
}

fn output_records(records: &[Record], format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(records) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to encode records: {}", e),
        },
        OutputFormat::Plain => {
            for record in records {
                ui::print_record(record);
                ui::print_divider();
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Title", "Authors", "Year", "Type", "Journal"]);

            for record in records {
                table.add_row(vec![
                    Cell::new(ui::truncate_with_ellipsis(&record.title, 50))
                        .add_attribute(Attribute::Bold),
                    Cell::new(ui::truncate_with_ellipsis(&short_authors(record), 30)),
                    Cell::new(record.year.map(|y| y.to_string()).unwrap_or_else(|| "N/A".to_string())),
                    Cell::new(record.item_type.name()),
                    Cell::new(ui::truncate_with_ellipsis(
                        record.journal.as_deref().unwrap_or("N/A"),
                        30,
                    )),
                ]);
            }
            println!("{table}");
        }
    }
}

fn output_categories(set: &CategorizedSet<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let summary: Vec<serde_json::Value> = set
                .buckets()
                .iter()
                .map(|b| {
                    serde_json::json!({
                        "name": b.name,
                        "description": b.description,
                        "item_count": b.len(),
                    })
                })
                .collect();
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Failed to encode categories: {}", e),
            }
        }
        OutputFormat::Plain => {
            for bucket in set.buckets() {
                println!("{}\t{}", bucket.name, bucket.len());
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            use comfy_table::{Cell, CellAlignment, Table};
            ui::print_section("Literature Categories");
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Category", "Items", "Description"]);

            for bucket in set.buckets() {
                table.add_row(vec![
                    Cell::new(&bucket.name),
                    Cell::new(bucket.len()).set_alignment(CellAlignment::Right),
                    Cell::new(bucket.description.as_deref().unwrap_or("No description")),
                ]);
            }
            println!("{table}");
        }
    }
}

fn output_collections(collections: &[Collection], format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(collections) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to encode collections: {}", e),
        },
        OutputFormat::Plain => {
            for collection in collections {
                println!("{}\t{}", collection.key, collection.name);
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            use comfy_table::Table;
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Collection Name", "Collection Key", "Parent"]);

            for collection in collections {
                let parent = collection
                    .parent
                    .as_deref()
                    .and_then(|key| collections.iter().find(|c| c.key == key))
                    .map(|c| c.name.as_str())
                    .unwrap_or("");
                table.add_row(vec![collection.name.as_str(), collection.key.as_str(), parent]);
            }
            println!("{table}");
        }
    }
}

fn output_category_definitions(categories: &[Category], format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(categories) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to encode categories: {}", e),
        },
        OutputFormat::Plain => {
            for category in categories {
                println!("{}\t{}", category.name, category.keywords.join(", "));
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            use comfy_table::Table;
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Name", "Keywords", "Description"]);

            for category in categories {
                table.add_row(vec![
                    category.name.clone(),
                    category.keywords.join(", "),
                    category
                        .description
                        .clone()
                        .unwrap_or_else(|| "No description".to_string()),
                ]);
            }
            println!("{table}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["zotero-analyzer"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert_eq!(cli.output, OutputFormat::Auto);
        assert!(cli.config.is_none());
        assert!(!cli.env);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["zotero-analyzer", "-v"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["zotero-analyzer", "-vv"]);
        assert_eq!(cli.verbose, 2);

        let cli = Cli::parse_from(["zotero-analyzer", "tags", "--verbose"]);
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_cli_output_format() {
        let cli = Cli::parse_from(["zotero-analyzer", "-o", "json"]);
        assert_eq!(cli.output, OutputFormat::Json);

        let cli = Cli::parse_from(["zotero-analyzer", "--output", "table"]);
        assert_eq!(cli.output, OutputFormat::Table);
    }

    #[test]
    fn test_cli_config_flag() {
        let cli = Cli::parse_from(["zotero-analyzer", "--config", "/path/to/config.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.toml")));
    }

    #[test]
    fn test_cli_fetch_command() {
        let cli = Cli::parse_from([
            "zotero-analyzer",
            "fetch",
            "--library-id",
            "12345",
            "--library-type",
            "group",
            "--tags",
            "robotics, ml",
            "--year-range",
            "2020-2023",
            "--item-type",
            "journalArticle,conferencePaper",
            "--format",
            "markdown",
            "--context-type",
            "literature_review",
        ]);
        match cli.command {
            Some(Commands::Fetch {
                library,
                filter,
                format,
                context_type,
                limit,
                ..
            }) => {
                assert_eq!(library.library_id.as_deref(), Some("12345"));
                assert_eq!(library.library_type, Some(LibraryType::Group));
                assert_eq!(format, Some(ExportFormat::Markdown));
                assert_eq!(context_type, Some(ContextType::LiteratureReview));
                assert!(limit.is_none());

                let spec = filter.into_spec();
                assert_eq!(spec.tags, vec!["robotics", "ml"]);
                assert_eq!(spec.year_range, Some(YearRange::new(2020, 2023)));
                assert_eq!(
                    spec.item_types,
                    vec![ItemType::JournalArticle, ItemType::ConferencePaper]
                );
            }
            _ => panic!("Expected Fetch command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_year_range() {
        let result = Cli::try_parse_from(["zotero-analyzer", "fetch", "--year-range", "2023-2020"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_search_command() {
        let cli = Cli::parse_from(["zotero-analyzer", "search", "diffusion policy"]);
        match &cli.command {
            Some(Commands::Search { query, limit, .. }) => {
                assert_eq!(query, "diffusion policy");
                assert_eq!(*limit, 20);
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_tags_command() {
        let cli = Cli::parse_from(["zotero-analyzer", "tags"]);
        match &cli.command {
            Some(Commands::Tags { limit, .. }) => assert_eq!(*limit, 50),
            _ => panic!("Expected Tags command"),
        }
    }

    #[test]
    fn test_cli_validate_categories_command() {
        let cli = Cli::parse_from(["zotero-analyzer", "validate-categories", "cats.json"]);
        match &cli.command {
            Some(Commands::ValidateCategories { file }) => {
                assert_eq!(file, &PathBuf::from("cats.json"));
            }
            _ => panic!("Expected ValidateCategories command"),
        }
    }

    #[test]
    fn test_cli_serve_command() {
        let cli = Cli::parse_from(["zotero-analyzer", "serve"]);
        match &cli.command {
            Some(Commands::Serve {
                http, port, host, ..
            }) => {
                assert!(!*http);
                assert_eq!(*port, 3000);
                assert_eq!(host, "127.0.0.1");
            }
            _ => panic!("Expected Serve command"),
        }

        let cli = Cli::parse_from(["zotero-analyzer", "serve", "--http", "--port", "8080"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Serve { http: true, port: 8080, .. })
        ));
    }

    #[test]
    fn test_cli_init_config_command() {
        let cli = Cli::parse_from(["zotero-analyzer", "init-config", "--path", "cfg.toml", "--force"]);
        match &cli.command {
            Some(Commands::InitConfig { path, force }) => {
                assert_eq!(path.as_deref(), Some(std::path::Path::new("cfg.toml")));
                assert!(*force);
            }
            _ => panic!("Expected InitConfig command"),
        }
    }

    #[test]
    fn test_library_args_override_config() {
        let mut config = Config::default();
        config.zotero.library_id = Some("111".to_string());
        config.zotero.api_key = Some("from-config".to_string());

        LibraryArgs {
            library_id: Some("222".to_string()),
            library_type: None,
            api_key: None,
        }
        .apply(&mut config);

        assert_eq!(config.zotero.library_id.as_deref(), Some("222"));
        assert_eq!(config.zotero.api_key.as_deref(), Some("from-config"));
        assert_eq!(config.zotero.library_type, LibraryType::User);
    }

    #[test]
    fn test_log_directive() {
        assert_eq!(log_directive(0, false, "INFO"), "zotero_analyzer=info");
        assert_eq!(log_directive(1, false, "warn"), "zotero_analyzer=debug");
        assert_eq!(log_directive(3, false, "warn"), "zotero_analyzer=trace");
        assert_eq!(log_directive(2, true, "warn"), "zotero_analyzer=error");
    }

    #[test]
    fn test_short_authors() {
        let mut record = Record::new("K", "T", ItemType::Book);
        assert_eq!(short_authors(&record), "Unknown");
        record.authors = vec!["Cheng Chi".to_string(), "Song, Shuran".to_string()];
        assert_eq!(short_authors(&record), "Chi & Song");
        record.authors.push("Ada Lovelace".to_string());
        assert_eq!(short_authors(&record), "Chi et al.");
    }
}
