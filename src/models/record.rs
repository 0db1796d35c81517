//! Record model representing one entry of a reference library.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Zotero item type
///
/// Serialized as the Zotero item-type id. Ids this enum does not know about are
/// kept verbatim in [`ItemType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemType {
    JournalArticle,
    ConferencePaper,
    Preprint,
    Book,
    BookSection,
    Thesis,
    Report,
    Webpage,
    BlogPost,
    ForumPost,
    Patent,
    Case,
    Statute,
    Presentation,
    ComputerProgram,
    Dataset,
    NewspaperArticle,
    MagazineArticle,
    EncyclopediaArticle,
    Manuscript,
    Interview,
    Letter,
    Document,
    #[serde(untagged)]
    Other(String),
}

impl ItemType {
    /// Returns the Zotero item-type id
    pub fn id(&self) -> &str {
        match self {
            ItemType::JournalArticle => "journalArticle",
            ItemType::ConferencePaper => "conferencePaper",
            ItemType::Preprint => "preprint",
            ItemType::Book => "book",
            ItemType::BookSection => "bookSection",
            ItemType::Thesis => "thesis",
            ItemType::Report => "report",
            ItemType::Webpage => "webpage",
            ItemType::BlogPost => "blogPost",
            ItemType::ForumPost => "forumPost",
            ItemType::Patent => "patent",
            ItemType::Case => "case",
            ItemType::Statute => "statute",
            ItemType::Presentation => "presentation",
            ItemType::ComputerProgram => "computerProgram",
            ItemType::Dataset => "dataset",
            ItemType::NewspaperArticle => "newspaperArticle",
            ItemType::MagazineArticle => "magazineArticle",
            ItemType::EncyclopediaArticle => "encyclopediaArticle",
            ItemType::Manuscript => "manuscript",
            ItemType::Interview => "interview",
            ItemType::Letter => "letter",
            ItemType::Document => "document",
            ItemType::Other(s) => s,
        }
    }

    /// Returns a human-readable name
    pub fn name(&self) -> &str {
        match self {
            ItemType::JournalArticle => "Journal Article",
            ItemType::ConferencePaper => "Conference Paper",
            ItemType::Preprint => "Preprint",
            ItemType::Book => "Book",
            ItemType::BookSection => "Book Section",
            ItemType::Thesis => "Thesis",
            ItemType::Report => "Report",
            ItemType::Webpage => "Web Page",
            ItemType::BlogPost => "Blog Post",
            ItemType::ForumPost => "Forum Post",
            ItemType::Patent => "Patent",
            ItemType::Case => "Case",
            ItemType::Statute => "Statute",
            ItemType::Presentation => "Presentation",
            ItemType::ComputerProgram => "Software",
            ItemType::Dataset => "Dataset",
            ItemType::NewspaperArticle => "Newspaper Article",
            ItemType::MagazineArticle => "Magazine Article",
            ItemType::EncyclopediaArticle => "Encyclopedia Article",
            ItemType::Manuscript => "Manuscript",
            ItemType::Interview => "Interview",
            ItemType::Letter => "Letter",
            ItemType::Document => "Document",
            ItemType::Other(s) => s,
        }
    }

    /// All known item types, in declaration order
    pub fn known() -> &'static [ItemType] {
        &[
            ItemType::JournalArticle,
            ItemType::ConferencePaper,
            ItemType::Preprint,
            ItemType::Book,
            ItemType::BookSection,
            ItemType::Thesis,
            ItemType::Report,
            ItemType::Webpage,
            ItemType::BlogPost,
            ItemType::ForumPost,
            ItemType::Patent,
            ItemType::Case,
            ItemType::Statute,
            ItemType::Presentation,
            ItemType::ComputerProgram,
            ItemType::Dataset,
            ItemType::NewspaperArticle,
            ItemType::MagazineArticle,
            ItemType::EncyclopediaArticle,
            ItemType::Manuscript,
            ItemType::Interview,
            ItemType::Letter,
            ItemType::Document,
        ]
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for ItemType {
    type Err = std::convert::Infallible;

    /// Matches known ids case-insensitively; anything else becomes `Other`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(ItemType::known()
            .iter()
            .find(|t| t.id().eq_ignore_ascii_case(s))
            .cloned()
            .unwrap_or_else(|| ItemType::Other(s.to_string())))
    }
}

/// Errors raised for records that cannot be exported
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Record is missing its identifier (title: {title:?})")]
    MissingKey { title: String },

    #[error("Record {key} is missing its title")]
    MissingTitle { key: String },

    #[error("Record {key} has invalid year {year}: expected four digits")]
    InvalidYear { key: String, year: i32 },
}

/// One bibliographic entry
///
/// Records are built once from the remote payload and never mutated by the
/// filter/categorize/export pipeline. Field order here is the JSON key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier within a fetched set (the Zotero item key)
    pub key: String,

    /// Title
    pub title: String,

    /// Author names, in byline order
    #[serde(default)]
    pub authors: Vec<String>,

    /// Abstract text
    #[serde(default)]
    pub r#abstract: Option<String>,

    /// Publication year
    #[serde(default)]
    pub year: Option<i32>,

    /// Item type
    pub item_type: ItemType,

    /// Free-text tags, case preserved
    #[serde(default)]
    pub tags: Vec<String>,

    /// Names of the collections containing this item
    #[serde(default)]
    pub collections: Vec<String>,

    /// Digital Object Identifier
    #[serde(default)]
    pub doi: Option<String>,

    /// Landing page URL
    #[serde(default)]
    pub url: Option<String>,

    /// Journal, proceedings or other publication title
    #[serde(default)]
    pub journal: Option<String>,

    /// Formatted citation
    #[serde(default)]
    pub citation: Option<String>,

    /// Open-ended metadata
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Record {
    /// Create a record with the required fields
    pub fn new(key: impl Into<String>, title: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            authors: Vec::new(),
            r#abstract: None,
            year: None,
            item_type,
            tags: Vec::new(),
            collections: Vec::new(),
            doi: None,
            url: None,
            journal: None,
            citation: None,
            extra: BTreeMap::new(),
        }
    }

    /// Abstract text, or the empty string
    pub fn abstract_text(&self) -> &str {
        self.r#abstract.as_deref().unwrap_or("")
    }

    /// First listed author
    pub fn first_author(&self) -> Option<&str> {
        self.authors.first().map(|s| s.as_str())
    }

    /// Whether the record carries the tag, compared case-insensitively
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.to_lowercase() == tag.to_lowercase())
    }

    /// Whether the record is in the collection, compared case-insensitively
    pub fn in_collection(&self, collection: &str) -> bool {
        self.collections
            .iter()
            .any(|c| c.to_lowercase() == collection.to_lowercase())
    }

    /// Check the fields every exported record must have
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.key.trim().is_empty() {
            return Err(ValidationError::MissingKey {
                title: self.title.clone(),
            });
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle {
                key: self.key.clone(),
            });
        }
        if let Some(year) = self.year {
            if !(1000..=9999).contains(&year) {
                return Err(ValidationError::InvalidYear {
                    key: self.key.clone(),
                    year,
                });
            }
        }
        Ok(())
    }
}

/// Builder for constructing Record objects
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Create a new builder with required fields
    pub fn new(key: impl Into<String>, title: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            record: Record::new(key, title, item_type),
        }
    }

    /// Add one author
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.record.authors.push(author.into());
        self
    }

    /// Set all authors
    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Set abstract
    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.record.r#abstract = Some(abstract_text.into());
        self
    }

    /// Set publication year
    pub fn year(mut self, year: i32) -> Self {
        self.record.year = Some(year);
        self
    }

    /// Add one tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.record.tags.push(tag.into());
        self
    }

    /// Set all tags
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Add one collection name
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.record.collections.push(collection.into());
        self
    }

    /// Set DOI
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.record.doi = Some(doi.into());
        self
    }

    /// Set URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.record.url = Some(url.into());
        self
    }

    /// Set publication title
    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.record.journal = Some(journal.into());
        self
    }

    /// Set formatted citation
    pub fn citation(mut self, citation: impl Into<String>) -> Self {
        self.record.citation = Some(citation.into());
        self
    }

    /// Add extra metadata
    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.record.extra.insert(key.into(), value);
        self
    }

    /// Build the Record
    pub fn build(self) -> Record {
        self.record
    }
}

/// A collection as listed by the remote library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection key
    pub key: String,

    /// Display name
    pub name: String,

    /// Key of the parent collection, if nested
    pub parent: Option<String>,
}
