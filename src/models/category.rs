//! Category definitions and categorization results.

use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Cow;

use super::Record;

/// Name of the reserved bucket for records matching no category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Description of the reserved bucket
pub const UNCATEGORIZED_DESCRIPTION: &str = "Items that don't match any specified category";

/// A named, keyword-defined grouping for records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category name (section heading in exports)
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,

    /// Keywords, matched as case-insensitive substrings
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Category {
    /// Create a category without a description
    pub fn new<I, S>(name: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            description: None,
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One category together with the records assigned to it
///
/// Records are borrowed when the bucket comes out of categorization and owned
/// when it was decoded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBucket<'a> {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub items: Vec<Cow<'a, Record>>,
}

impl<'a> CategoryBucket<'a> {
    /// Empty bucket for `category`
    pub fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone(),
            keywords: category.keywords.clone(),
            items: Vec::new(),
        }
    }

    /// Empty reserved bucket
    pub fn uncategorized() -> Self {
        Self {
            name: UNCATEGORIZED.to_string(),
            description: Some(UNCATEGORIZED_DESCRIPTION.to_string()),
            keywords: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Whether this is the reserved bucket
    pub fn is_uncategorized(&self) -> bool {
        self.name == UNCATEGORIZED
    }

    /// Number of records in the bucket
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the bucket holds no records
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the records
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.items.iter().map(|r| r.as_ref())
    }

    /// Detach from the borrowed records
    pub fn into_owned(self) -> CategoryBucket<'static> {
        CategoryBucket {
            name: self.name,
            description: self.description,
            keywords: self.keywords,
            items: self
                .items
                .into_iter()
                .map(|r| Cow::Owned(r.into_owned()))
                .collect(),
        }
    }
}

/// Ordered grouping of records by category
///
/// Buckets keep the caller's category order; the reserved
/// [`UNCATEGORIZED`] bucket is always present and always last.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Vec<CategoryBucket<'a>>")]
pub struct CategorizedSet<'a> {
    buckets: Vec<CategoryBucket<'a>>,
}

impl<'a> CategorizedSet<'a> {
    /// Empty buckets for `categories`, followed by the reserved bucket
    pub fn new(categories: &[Category]) -> Self {
        let mut buckets: Vec<CategoryBucket<'a>> =
            categories.iter().map(CategoryBucket::from_category).collect();
        buckets.push(CategoryBucket::uncategorized());
        Self { buckets }
    }

    /// Buckets in iteration order
    pub fn buckets(&self) -> &[CategoryBucket<'a>] {
        &self.buckets
    }

    pub(crate) fn buckets_mut(&mut self) -> &mut [CategoryBucket<'a>] {
        &mut self.buckets
    }

    /// First bucket with this name
    pub fn get(&self, name: &str) -> Option<&CategoryBucket<'a>> {
        self.buckets.iter().find(|b| b.name == name)
    }

    /// The reserved bucket
    pub fn uncategorized(&self) -> &CategoryBucket<'a> {
        // `new` and `From<Vec<_>>` both guarantee the reserved bucket is last
        &self.buckets[self.buckets.len() - 1]
    }

    pub(crate) fn uncategorized_mut(&mut self) -> &mut CategoryBucket<'a> {
        let last = self.buckets.len() - 1;
        &mut self.buckets[last]
    }

    /// Number of buckets, including the reserved one
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Always false: the reserved bucket is always present
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Sum of bucket sizes; counts a multi-category record once per bucket
    pub fn total_assignments(&self) -> usize {
        self.buckets.iter().map(|b| b.len()).sum()
    }

    /// Detach from the borrowed records
    pub fn into_owned(self) -> CategorizedSet<'static> {
        CategorizedSet {
            buckets: self
                .buckets
                .into_iter()
                .map(CategoryBucket::into_owned)
                .collect(),
        }
    }
}

impl<'a> From<Vec<CategoryBucket<'a>>> for CategorizedSet<'a> {
    /// Moves any reserved bucket to the end, adding an empty one if absent
    fn from(buckets: Vec<CategoryBucket<'a>>) -> Self {
        let (mut reserved, mut buckets): (Vec<_>, Vec<_>) =
            buckets.into_iter().partition(|b| b.is_uncategorized());

        let mut uncategorized = if reserved.is_empty() {
            CategoryBucket::uncategorized()
        } else {
            reserved.remove(0)
        };
        for extra in reserved {
            uncategorized.items.extend(extra.items);
        }

        buckets.push(uncategorized);
        Self { buckets }
    }
}

impl Serialize for CategorizedSet<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.buckets.serialize(serializer)
    }
}
