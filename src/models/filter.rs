//! Filter specification models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ItemType;

/// Inclusive publication-year range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    /// Create a range covering `start..=end`
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Whether `year` lies inside the range
    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Error parsing a year range such as `2020-2023`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid year range '{0}': expected START-END with START <= END, e.g. 2020-2023")]
pub struct YearRangeParseError(pub String);

impl FromStr for YearRange {
    type Err = YearRangeParseError;

    /// Accepts `START-END` or a single year
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || YearRangeParseError(s.to_string());
        let trimmed = s.trim();

        let (start, end) = match trimmed.split_once('-') {
            Some((a, b)) => (
                a.trim().parse::<i32>().map_err(|_| err())?,
                b.trim().parse::<i32>().map_err(|_| err())?,
            ),
            None => {
                let year = trimmed.parse::<i32>().map_err(|_| err())?;
                (year, year)
            }
        };

        if start > end {
            return Err(err());
        }
        Ok(YearRange::new(start, end))
    }
}

/// A conjunction of optional constraints over records
///
/// An empty list or `None` leaves that dimension unconstrained. Within one
/// list the values are alternatives: a record needs only one matching tag,
/// one matching collection, and so on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Record must carry at least one of these tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Record must be in at least one of these collections
    #[serde(default)]
    pub collections: Vec<String>,

    /// Some author name must contain one of these strings
    #[serde(default)]
    pub authors: Vec<String>,

    /// Title or abstract must contain one of these strings
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Publication year must fall in this range
    #[serde(default)]
    pub year_range: Option<YearRange>,

    /// Item type must be one of these
    #[serde(default)]
    pub item_types: Vec<ItemType>,

    /// Title must contain this string
    #[serde(default)]
    pub title_contains: Option<String>,
}

impl FilterSpec {
    /// Create an unconstrained spec
    pub fn new() -> Self {
        Self::default()
    }

    /// Require one of these tags
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Require one of these collections
    pub fn collections<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collections = collections.into_iter().map(Into::into).collect();
        self
    }

    /// Require an author matching one of these substrings
    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Require one of these keywords in title or abstract
    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Require a publication year in `start..=end`
    pub fn year_range(mut self, start: i32, end: i32) -> Self {
        self.year_range = Some(YearRange::new(start, end));
        self
    }

    /// Require one of these item types
    pub fn item_types<I>(mut self, item_types: I) -> Self
    where
        I: IntoIterator<Item = ItemType>,
    {
        self.item_types = item_types.into_iter().collect();
        self
    }

    /// Require the title to contain `text`
    pub fn title_contains(mut self, text: impl Into<String>) -> Self {
        self.title_contains = Some(text.into());
        self
    }

    /// Whether no constraint is set
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
            && self.collections.is_empty()
            && self.authors.is_empty()
            && self.keywords.is_empty()
            && self.year_range.is_none()
            && self.item_types.is_empty()
            && self.title_contains.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_range_parse() {
        assert_eq!("2020-2023".parse::<YearRange>(), Ok(YearRange::new(2020, 2023)));
        assert_eq!(" 2021 ".parse::<YearRange>(), Ok(YearRange::new(2021, 2021)));
        assert!("2023-2020".parse::<YearRange>().is_err());
        assert!("recent".parse::<YearRange>().is_err());
        assert!("2020-".parse::<YearRange>().is_err());
    }

    #[test]
    fn test_year_range_contains() {
        let range = YearRange::new(2023, 2024);
        assert!(range.contains(2023));
        assert!(range.contains(2024));
        assert!(!range.contains(2022));
    }

    #[test]
    fn test_filter_spec_builder() {
        let spec = FilterSpec::new()
            .tags(["robotics"])
            .year_range(2020, 2024)
            .item_types([ItemType::JournalArticle]);

        assert_eq!(spec.tags, vec!["robotics"]);
        assert_eq!(spec.year_range, Some(YearRange::new(2020, 2024)));
        assert!(!spec.is_empty());
        assert!(FilterSpec::new().is_empty());
    }

    #[test]
    fn test_filter_spec_deserialize_partial() {
        let spec: FilterSpec = serde_json::from_value(serde_json::json!({
            "keywords": ["diffusion"],
            "year_range": {"start": 2022, "end": 2024}
        }))
        .unwrap();

        assert_eq!(spec.keywords, vec!["diffusion"]);
        assert!(spec.tags.is_empty());
        assert_eq!(spec.year_range, Some(YearRange::new(2022, 2024)));
    }
}
