//! Configuration management.
//!
//! Settings are layered with the `config` crate, lowest priority first:
//!
//! 1. built-in defaults
//! 2. a TOML file (`--config`, the user config directory, or
//!    `./zotero-analyzer.toml`)
//! 3. `ZOTERO_ANALYZER__SECTION__KEY` environment variables
//! 4. the plain variables `ZOTERO_LIBRARY_ID`, `ZOTERO_API_KEY`,
//!    `ZOTERO_LIBRARY_TYPE`, `DEFAULT_OUTPUT_DIR`, `DEFAULT_LIMIT` and
//!    `ZOTERODB_LOG_LEVEL`
//!
//! # Configuration File Format
//!
//! ```toml
//! [zotero]
//! library_id = "1234567"
//! library_type = "user"
//! api_key = "your-api-key"
//! base_url = "https://api.zotero.org"
//!
//! [output]
//! directory = "output"
//! format = "both"
//! context_type = "related_works"
//! citation_style = "apa"
//!
//! [fetch]
//! default_limit = 200
//! page_size = 100
//! max_retries = 3
//! timeout_secs = 30
//!
//! [logging]
//! level = "info"
//! ```

pub mod categories;

pub use categories::{load_categories, parse_categories, validate_categories};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{ContextType, ExportFormat};
use crate::sources::zotero::{MAX_PAGE_SIZE, ZOTERO_API_BASE};
use crate::sources::{LibraryType, SourceError, ZoteroSource};
use crate::utils::{CitationStyle, HttpClient, RetryConfig};

/// Prefix of structured environment overrides
pub const ENV_PREFIX: &str = "ZOTERO_ANALYZER";

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "zotero-analyzer.toml";

/// Plain environment variables and the keys they override
const LEGACY_ENV_VARS: &[(&str, &str)] = &[
    ("ZOTERO_LIBRARY_ID", "zotero.library_id"),
    ("ZOTERO_API_KEY", "zotero.api_key"),
    ("ZOTERO_LIBRARY_TYPE", "zotero.library_type"),
    ("DEFAULT_OUTPUT_DIR", "output.directory"),
    ("DEFAULT_LIMIT", "fetch.default_limit"),
    ("ZOTERODB_LOG_LEVEL", "logging.level"),
];

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Library credentials and API endpoint
    pub zotero: ZoteroConfig,

    /// Where and how exports are written
    pub output: OutputConfig,

    /// Request behavior
    pub fetch: FetchConfig,

    /// Log verbosity
    pub logging: LoggingConfig,
}

/// Zotero library settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoteroConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_id: Option<String>,

    pub library_type: LibraryType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub base_url: String,
}

impl Default for ZoteroConfig {
    fn default() -> Self {
        Self {
            library_id: None,
            library_type: LibraryType::default(),
            api_key: None,
            base_url: ZOTERO_API_BASE.to_string(),
        }
    }
}

/// Export settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub format: ExportFormat,
    pub context_type: ContextType,
    pub citation_style: CitationStyle,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            format: ExportFormat::default(),
            context_type: ContextType::default(),
            citation_style: CitationStyle::default(),
        }
    }
}

/// Fetch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Item cap applied when the caller gives none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_limit: Option<usize>,

    pub page_size: usize,

    /// Retries after the first attempt for transient failures
    pub max_retries: u32,

    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            default_limit: None,
            page_size: MAX_PAGE_SIZE,
            max_retries: 3,
            timeout_secs: crate::utils::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid category at index {index}: {reason}")]
    InvalidCategory { index: usize, reason: String },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Missing Zotero credentials: set {0}")]
    MissingCredentials(String),

    #[error(transparent)]
    Source(#[from] SourceError),
}

impl Config {
    /// Render as a TOML document
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write as TOML to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Retry policy for Zotero requests
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::with_max_retries(self.fetch.max_retries)
    }

    /// Build a Zotero source from the configured credentials
    pub fn zotero_source(&self) -> Result<ZoteroSource, ConfigError> {
        let library_id = self
            .zotero
            .library_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingCredentials("ZOTERO_LIBRARY_ID".to_string()))?;
        let api_key = self
            .zotero
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingCredentials("ZOTERO_API_KEY".to_string()))?;

        let base_url = url::Url::parse(&self.zotero.base_url).map_err(|e| {
            SourceError::InvalidRequest(format!("Invalid base_url '{}': {}", self.zotero.base_url, e))
        })?;

        let client = HttpClient::with_timeout(Duration::from_secs(self.fetch.timeout_secs))
            .map_err(SourceError::from)?;

        let source = ZoteroSource::new(library_id, self.zotero.library_type, api_key)?
            .with_http_client(client)
            .with_api_base(base_url.as_str())
            .with_page_size(self.fetch.page_size)
            .with_citation_style(self.output.citation_style)
            .with_retry_config(self.retry_config());
        Ok(source)
    }
}

/// Path of the per-user config file
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("zotero-analyzer").join("config.toml"))
}

/// First existing config file in the default locations
pub fn find_config_file() -> Option<PathBuf> {
    user_config_path()
        .into_iter()
        .chain(std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE)))
        .find(|p| p.is_file())
}

/// Load configuration from the process environment
///
/// `path` overrides the default file lookup. A `.env` file in the working
/// directory is read first and never overrides variables already set.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let _ = dotenvy::dotenv();

    let file = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config_file(),
    };
    if let Some(p) = &file {
        tracing::info!("Using config file: {}", p.display());
    }

    build_config(file.as_deref(), None)
}

/// Layer `file` and environment variables over the defaults
///
/// `env` replaces the process environment when given.
fn build_config(
    file: Option<&Path>,
    env: Option<HashMap<String, String>>,
) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = file {
        builder = builder.add_source(config::File::from(path).format(config::FileFormat::Toml));
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .source(env.clone()),
    );

    for (var, key) in LEGACY_ENV_VARS {
        let value = match &env {
            Some(map) => map.get(*var).cloned(),
            None => std::env::var(var).ok(),
        };
        builder = builder.set_override_option(*key, value.filter(|v| !v.trim().is_empty()))?;
    }

    Ok(builder.build()?.try_deserialize()?)
}

/// Environment variables the application reads, with descriptions
pub fn env_var_help() -> Vec<(&'static str, &'static str)> {
    vec![
        ("ZOTERO_LIBRARY_ID", "Zotero user or group library ID"),
        ("ZOTERO_API_KEY", "Zotero Web API key"),
        ("ZOTERO_LIBRARY_TYPE", "Library type: user or group (default: user)"),
        ("DEFAULT_OUTPUT_DIR", "Directory for exported files (default: output)"),
        ("DEFAULT_LIMIT", "Maximum items to fetch when --limit is not given"),
        ("ZOTERODB_LOG_LEVEL", "Log level when -v and RUST_LOG are unset (default: info)"),
        (
            "ZOTERO_ANALYZER__<SECTION>__<KEY>",
            "Any config file key, e.g. ZOTERO_ANALYZER__FETCH__PAGE_SIZE",
        ),
        ("RUST_LOG", "tracing filter directive, overrides everything else"),
    ]
}
