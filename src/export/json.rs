//! JSON rendering of records and categorized sets.

use serde::Serialize;
use std::borrow::Borrow;

use super::{validate_all, ExportError};
use crate::models::{CategorizedSet, Record};

/// Pretty JSON array of records, one object per record
///
/// Every attribute is present; unset optionals render as `null`. Key order is
/// fixed, so decoding and re-encoding the output is byte-identical.
pub fn serialize_json<R: Borrow<Record>>(records: &[R]) -> Result<String, ExportError> {
    validate_all(records.iter().map(Borrow::borrow))?;
    let records: Vec<&Record> = records.iter().map(Borrow::borrow).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// One bucket as written to categorized JSON
#[derive(Debug, Serialize)]
struct BucketJson<'s> {
    name: &'s str,
    description: Option<&'s str>,
    keywords: &'s [String],
    item_count: usize,
    items: Vec<&'s Record>,
}

/// Pretty JSON array of buckets in bucket order
pub(crate) fn categorized_json(set: &CategorizedSet<'_>) -> Result<String, ExportError> {
    let buckets: Vec<BucketJson<'_>> = set
        .buckets()
        .iter()
        .map(|bucket| BucketJson {
            name: &bucket.name,
            description: bucket.description.as_deref(),
            keywords: &bucket.keywords,
            item_count: bucket.len(),
            items: bucket.records().collect(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&buckets)?)
}
