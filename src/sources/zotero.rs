//! Zotero Web API v3 source implementation.

use async_trait::async_trait;
use regex::Regex;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::models::{Collection, FilterSpec, ItemType, Record, RecordBuilder};
use crate::sources::{LibrarySource, SourceError};
use crate::utils::{
    format_citation, validate_item_key, validate_library_id, with_retry, CitationStyle,
    HttpClient, RetryConfig,
};

pub const ZOTERO_API_BASE: &str = "https://api.zotero.org";
const ZOTERO_API_VERSION: &str = "3";

/// Largest page the Zotero API serves
pub const MAX_PAGE_SIZE: usize = 100;

/// Whether a library belongs to a user or a group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryType {
    #[default]
    User,
    Group,
}

impl LibraryType {
    /// Path segment used in API URLs
    pub fn path_segment(&self) -> &'static str {
        match self {
            LibraryType::User => "users",
            LibraryType::Group => "groups",
        }
    }
}

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryType::User => write!(f, "user"),
            LibraryType::Group => write!(f, "group"),
        }
    }
}

impl FromStr for LibraryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" | "users" => Ok(LibraryType::User),
            "group" | "groups" => Ok(LibraryType::Group),
            other => Err(format!(
                "Unknown library type '{}': expected user or group",
                other
            )),
        }
    }
}

/// Zotero library source
///
/// Uses the Zotero Web API v3 with an API key.
#[derive(Debug, Clone)]
pub struct ZoteroSource {
    client: HttpClient,
    api_base: String,
    library_id: String,
    library_type: LibraryType,
    api_key: String,
    page_size: usize,
    citation_style: CitationStyle,
    retry: RetryConfig,
}

impl ZoteroSource {
    /// Create a source for the given library
    pub fn new(
        library_id: &str,
        library_type: LibraryType,
        api_key: impl Into<String>,
    ) -> Result<Self, SourceError> {
        let library_id =
            validate_library_id(library_id).map_err(|e| SourceError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client: HttpClient::new()?,
            api_base: ZOTERO_API_BASE.to_string(),
            library_id,
            library_type,
            api_key: api_key.into(),
            page_size: MAX_PAGE_SIZE,
            citation_style: CitationStyle::default(),
            retry: RetryConfig::default(),
        })
    }

    /// Point the source at a different API root
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the page size, clamped to what the API serves
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Set the style used to fill `Record::citation`
    pub fn with_citation_style(mut self, style: CitationStyle) -> Self {
        self.citation_style = style;
        self
    }

    /// Set the retry policy for each request
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Use a preconfigured HTTP client
    pub fn with_http_client(mut self, client: HttpClient) -> Self {
        self.client = client;
        self
    }

    /// Library-scoped URL for an endpoint
    fn build_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}/{}{}",
            self.api_base,
            self.library_type.path_segment(),
            self.library_id,
            endpoint
        )
    }

    /// Issue one GET and decode the JSON array it returns
    async fn request_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, SourceError> {
        let response = self
            .client
            .client()
            .get(self.build_url(endpoint))
            .header("Zotero-API-Key", &self.api_key)
            .header("Zotero-API-Version", ZOTERO_API_VERSION)
            .query(params)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to reach Zotero: {}", e)))?;

        let response = check_status(response, endpoint).await?;

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse {} response: {}", endpoint, e)))
    }

    /// Fetch pages of `endpoint` until a short page or `limit`
    async fn fetch_paginated<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        extra_params: &[(&str, String)],
        limit: Option<usize>,
    ) -> Result<Vec<T>, SourceError> {
        let mut all = Vec::new();
        let mut start = 0usize;

        loop {
            let batch_size = match limit {
                Some(limit) => {
                    let remaining = limit.saturating_sub(all.len());
                    if remaining == 0 {
                        break;
                    }
                    remaining.min(self.page_size)
                }
                None => self.page_size,
            };

            let mut params = extra_params.to_vec();
            params.push(("start", start.to_string()));
            params.push(("limit", batch_size.to_string()));
            let params = params.as_slice();

            let batch: Vec<T> =
                with_retry(self.retry, move || self.request_page(endpoint, params)).await?;
            let fetched = batch.len();
            start += fetched;
            all.extend(batch);

            tracing::info!("Fetched {} from {} (total: {})", fetched, endpoint, all.len());

            if fetched < batch_size {
                break;
            }
        }

        Ok(all)
    }

    /// Map of collection key to name
    async fn collection_names(&self) -> Result<HashMap<String, String>, SourceError> {
        Ok(self
            .collections()
            .await?
            .into_iter()
            .map(|c| (c.key, c.name))
            .collect())
    }

    /// Convert payloads, dropping notes, attachments and untitled items
    fn convert_items(&self, items: Vec<ZoteroItem>, names: &HashMap<String, String>) -> Vec<Record> {
        items
            .into_iter()
            .filter_map(|item| item_to_record(item, names, self.citation_style))
            .collect()
    }
}

/// Map a non-success response to the matching error
async fn check_status(
    response: reqwest::Response,
    endpoint: &str,
) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = ["Retry-After", "Backoff"].iter().find_map(|name| {
        response
            .headers()
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
    });
    let body = response.text().await.unwrap_or_default();
    let detail = format!("{} {}", status, body.trim()).trim_end().to_string();

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SourceError::Unauthorized(detail),
        StatusCode::NOT_FOUND => SourceError::NotFound(format!("{}: {}", endpoint, detail)),
        StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimit(retry_after),
        // Zotero answers 503 with Retry-After while it sheds load
        StatusCode::SERVICE_UNAVAILABLE if retry_after.is_some() => SourceError::RateLimit(retry_after),
        _ => SourceError::Api(detail),
    })
}

#[async_trait]
impl LibrarySource for ZoteroSource {
    fn id(&self) -> &str {
        "zotero"
    }

    fn name(&self) -> &str {
        "Zotero"
    }

    async fn fetch_items(
        &self,
        spec: &FilterSpec,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, SourceError> {
        let names = self.collection_names().await?;

        let items: Vec<ZoteroItem> = if spec.collections.is_empty() {
            self.fetch_paginated("/items/top", &[], limit).await?
        } else {
            let mut items = Vec::new();
            let mut seen = HashSet::new();

            for wanted in &spec.collections {
                let key = names
                    .iter()
                    .find(|(_, name)| name.to_lowercase() == wanted.to_lowercase())
                    .map(|(key, _)| key.clone());
                let Some(key) = key else {
                    tracing::warn!("Collection '{}' not found in library", wanted);
                    continue;
                };

                let endpoint = format!("/collections/{}/items/top", urlencoding::encode(&key));
                let batch: Vec<ZoteroItem> = self.fetch_paginated(&endpoint, &[], limit).await?;
                for item in batch {
                    if seen.insert(item.key.clone()) {
                        items.push(item);
                    }
                }
            }

            if let Some(limit) = limit {
                items.truncate(limit);
            }
            items
        };

        let records = self.convert_items(items, &names);
        tracing::info!("Fetched {} records from Zotero", records.len());
        Ok(records)
    }

    async fn search_items(&self, query: &str, limit: usize) -> Result<Vec<Record>, SourceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SourceError::InvalidRequest("Search query is empty".to_string()));
        }

        let names = self.collection_names().await?;
        let items: Vec<ZoteroItem> = self
            .fetch_paginated("/items", &[("q", query.to_string())], Some(limit))
            .await?;
        Ok(self.convert_items(items, &names))
    }

    async fn collections(&self) -> Result<Vec<Collection>, SourceError> {
        let payload: Vec<CollectionPayload> =
            self.fetch_paginated("/collections", &[], None).await?;

        Ok(payload
            .into_iter()
            .map(|c| Collection {
                key: c.key,
                name: c.data.name,
                parent: c
                    .data
                    .parent_collection
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .map(String::from),
            })
            .collect())
    }

    async fn tags(&self) -> Result<Vec<String>, SourceError> {
        let payload: Vec<TagPayload> = self.fetch_paginated("/tags", &[], None).await?;
        Ok(payload.into_iter().map(|t| t.tag).collect())
    }
}

// ========== Payload types ==========

#[derive(Debug, Deserialize)]
struct ZoteroItem {
    key: String,
    data: ItemData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ItemData {
    item_type: String,
    title: String,
    creators: Vec<Creator>,
    abstract_note: String,
    date: String,
    tags: Vec<TagEntry>,
    collections: Vec<String>,
    #[serde(rename = "DOI")]
    doi: String,
    url: String,
    publication_title: String,
    proceedings_title: String,
    book_title: String,
    volume: String,
    issue: String,
    pages: String,
    date_added: String,
    date_modified: String,
    extra: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Creator {
    creator_type: String,
    first_name: String,
    last_name: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    tag: String,
}

#[derive(Debug, Deserialize)]
struct CollectionPayload {
    key: String,
    data: CollectionData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionData {
    name: String,
    // `false` for top-level collections, otherwise the parent key
    #[serde(default)]
    parent_collection: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TagPayload {
    tag: String,
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

/// First plausible publication year in a free-form Zotero date
fn extract_year(date: &str) -> Option<i32> {
    static YEAR_RE: OnceLock<Regex> = OnceLock::new();
    let re = YEAR_RE.get_or_init(|| Regex::new(r"\b(19|20)\d{2}\b").expect("valid year regex"));
    re.find(date).and_then(|m| m.as_str().parse().ok())
}

/// Display names of author and editor creators
fn creator_names(creators: &[Creator]) -> Vec<String> {
    creators
        .iter()
        .filter(|c| c.creator_type == "author" || c.creator_type == "editor")
        .filter_map(|c| match &c.name {
            Some(name) => non_empty(name.clone()),
            None => non_empty(format!("{} {}", c.first_name.trim(), c.last_name.trim())),
        })
        .collect()
}

/// Build a record from an item payload
///
/// Returns `None` for notes, attachments and items without a title.
fn item_to_record(
    item: ZoteroItem,
    collection_names: &HashMap<String, String>,
    style: CitationStyle,
) -> Option<Record> {
    let ZoteroItem { key, data } = item;

    let Ok(key) = validate_item_key(&key) else {
        tracing::warn!("Skipping item with malformed key '{}'", key);
        return None;
    };
    if matches!(data.item_type.as_str(), "note" | "attachment" | "annotation") {
        tracing::debug!("Skipping {} item {}", data.item_type, key);
        return None;
    }
    if data.title.trim().is_empty() {
        tracing::warn!("Skipping item {} without a title", key);
        return None;
    }

    let item_type = ItemType::from_str(&data.item_type).unwrap_or(ItemType::Document);
    let mut builder = RecordBuilder::new(key, data.title.trim(), item_type)
        .authors(creator_names(&data.creators))
        .tags(
            data.tags
                .into_iter()
                .filter_map(|t| non_empty(t.tag)),
        );

    if let Some(abstract_text) = non_empty(data.abstract_note) {
        builder = builder.abstract_text(abstract_text);
    }
    if let Some(year) = extract_year(&data.date) {
        builder = builder.year(year);
    }
    for collection_key in &data.collections {
        match collection_names.get(collection_key) {
            Some(name) => builder = builder.collection(name.clone()),
            None => tracing::debug!("Unknown collection key {}", collection_key),
        }
    }
    if let Some(doi) = non_empty(data.doi) {
        builder = builder.doi(doi);
    }
    if let Some(url) = non_empty(data.url) {
        builder = builder.url(url);
    }
    let journal = non_empty(data.publication_title)
        .or_else(|| non_empty(data.proceedings_title))
        .or_else(|| non_empty(data.book_title));
    if let Some(journal) = journal {
        builder = builder.journal(journal);
    }

    let extras = [
        ("volume", data.volume),
        ("issue", data.issue),
        ("pages", data.pages),
        ("date_added", data.date_added),
        ("date_modified", data.date_modified),
        ("extra", data.extra),
    ];
    for (name, value) in extras {
        if let Some(value) = non_empty(value) {
            builder = builder.extra(name, serde_json::Value::String(value));
        }
    }

    let mut record = builder.build();
    record.citation = Some(format_citation(&record, style));
    Some(record)
}
