//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::models::{Collection, FilterSpec, ItemType, Record, RecordBuilder};
use crate::sources::{LibrarySource, SourceError};

/// An in-memory source that serves predefined records.
///
/// `fetch_items` applies only the limit; filtering is left to the caller.
/// `search_items` matches the query against titles, case-insensitively.
#[derive(Debug, Default)]
pub struct MockSource {
    records: Mutex<Vec<Record>>,
    collections: Mutex<Vec<Collection>>,
    failure: Mutex<Option<String>>,
}

impl MockSource {
    /// Create an empty mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock source serving `records`.
    pub fn with_records(records: Vec<Record>) -> Self {
        let source = Self::new();
        source.set_records(records);
        source
    }

    /// Replace the records to return.
    pub fn set_records(&self, records: Vec<Record>) {
        *lock(&self.records) = records;
    }

    /// Replace the collections to return.
    pub fn set_collections(&self, collections: Vec<Collection>) {
        *lock(&self.collections) = collections;
    }

    /// Make every call fail with an API error carrying `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *lock(&self.failure) = Some(message.into());
    }

    /// Clear the configured records and failure.
    pub fn clear(&self) {
        lock(&self.records).clear();
        *lock(&self.failure) = None;
    }

    fn check_failure(&self) -> Result<(), SourceError> {
        match &*lock(&self.failure) {
            Some(message) => Err(SourceError::Api(message.clone())),
            None => Ok(()),
        }
    }
}

/// Locks a mutex, recovering the data if a previous holder panicked
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl LibrarySource for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Library"
    }

    async fn fetch_items(
        &self,
        _spec: &FilterSpec,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, SourceError> {
        self.check_failure()?;
        let records = lock(&self.records);
        let take = limit.unwrap_or(records.len());
        Ok(records.iter().take(take).cloned().collect())
    }

    async fn search_items(&self, query: &str, limit: usize) -> Result<Vec<Record>, SourceError> {
        self.check_failure()?;
        let query = query.to_lowercase();
        Ok(lock(&self.records)
            .iter()
            .filter(|r| r.title.to_lowercase().contains(&query))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn collections(&self) -> Result<Vec<Collection>, SourceError> {
        self.check_failure()?;
        Ok(lock(&self.collections).clone())
    }

    async fn tags(&self) -> Result<Vec<String>, SourceError> {
        self.check_failure()?;
        let mut tags: Vec<String> = Vec::new();
        for record in lock(&self.records).iter() {
            for tag in &record.tags {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }
        tags.sort();
        Ok(tags)
    }
}

/// Helper function to create a mock record for testing.
pub fn make_record(key: &str, title: &str, year: i32) -> Record {
    RecordBuilder::new(key, title, ItemType::JournalArticle)
        .author("Test Author")
        .year(year)
        .url(format!("https://example.com/{}", key))
        .build()
}
