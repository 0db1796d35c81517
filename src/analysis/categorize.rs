//! Keyword-driven categorization.
//!
//! Assignment is non-exclusive: a record joins every category with a keyword
//! that occurs in its title, abstract or tags. Records matching no category
//! land in the reserved [`UNCATEGORIZED`](crate::models::UNCATEGORIZED) bucket.

use std::borrow::Cow;

use crate::models::{CategorizedSet, Category, Record};

/// Lowercased keywords of one category, blanks dropped
struct Matcher {
    keywords: Vec<String>,
}

impl Matcher {
    fn new(category: &Category) -> Self {
        Self {
            keywords: category
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

/// Text a record is classified on: title, abstract and tags, lowercased
fn classification_text(record: &Record) -> String {
    format!(
        "{} {} {}",
        record.title,
        record.abstract_text(),
        record.tags.join(" ")
    )
    .to_lowercase()
}

/// Group `records` into one bucket per category plus the reserved bucket
///
/// Bucket order follows `categories`; within a bucket records keep their
/// input order.
pub fn categorize<'a, I>(records: I, categories: &[Category]) -> CategorizedSet<'a>
where
    I: IntoIterator<Item = &'a Record>,
{
    let matchers: Vec<Matcher> = categories.iter().map(Matcher::new).collect();
    let mut set = CategorizedSet::new(categories);

    for record in records {
        let text = classification_text(record);
        let mut assigned = false;

        for (bucket, matcher) in set.buckets_mut().iter_mut().zip(&matchers) {
            if matcher.matches(&text) {
                bucket.items.push(Cow::Borrowed(record));
                assigned = true;
            }
        }

        if !assigned {
            set.uncategorized_mut().items.push(Cow::Borrowed(record));
        }
    }

    tracing::debug!(
        "Categorized into {} buckets ({} assignments, {} uncategorized)",
        set.len(),
        set.total_assignments(),
        set.uncategorized().len()
    );
    set
}
