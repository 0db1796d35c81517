//! Filter evaluation over records.
//!
//! Every non-empty constraint of a [`FilterSpec`] must hold; the values inside
//! one constraint are alternatives. Text comparisons ignore case. A record
//! without a year never satisfies a year range.

use crate::models::{FilterSpec, ItemType, Record, YearRange};

/// One dimension of a [`FilterSpec`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Tags,
    Collections,
    Authors,
    Keywords,
    YearRange,
    ItemTypes,
    TitleContains,
}

impl Constraint {
    pub const ALL: [Constraint; 7] = [
        Constraint::Tags,
        Constraint::Collections,
        Constraint::Authors,
        Constraint::Keywords,
        Constraint::YearRange,
        Constraint::ItemTypes,
        Constraint::TitleContains,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Constraint::Tags => "tags",
            Constraint::Collections => "collections",
            Constraint::Authors => "authors",
            Constraint::Keywords => "keywords",
            Constraint::YearRange => "year_range",
            Constraint::ItemTypes => "item_types",
            Constraint::TitleContains => "title_contains",
        }
    }
}

/// Lowercased copy of a spec, built once per evaluation pass
struct PreparedSpec<'s> {
    tags: Vec<String>,
    collections: Vec<String>,
    authors: Vec<String>,
    keywords: Vec<String>,
    year_range: Option<YearRange>,
    item_types: &'s [ItemType],
    title_contains: Option<String>,
}

impl<'s> PreparedSpec<'s> {
    fn new(spec: &'s FilterSpec) -> Self {
        Self {
            tags: lowercase_all(&spec.tags),
            collections: lowercase_all(&spec.collections),
            authors: lowercase_all(&spec.authors),
            keywords: lowercase_all(&spec.keywords),
            year_range: spec.year_range,
            item_types: &spec.item_types,
            title_contains: spec.title_contains.as_ref().map(|t| t.to_lowercase()),
        }
    }

    /// Whether `record` satisfies one constraint; unset constraints always hold
    fn satisfies(&self, record: &Record, constraint: Constraint) -> bool {
        match constraint {
            Constraint::Tags => {
                self.tags.is_empty()
                    || record
                        .tags
                        .iter()
                        .any(|t| self.tags.contains(&t.to_lowercase()))
            }
            Constraint::Collections => {
                self.collections.is_empty()
                    || record
                        .collections
                        .iter()
                        .any(|c| self.collections.contains(&c.to_lowercase()))
            }
            Constraint::Authors => {
                self.authors.is_empty()
                    || record.authors.iter().any(|author| {
                        let author = author.to_lowercase();
                        self.authors.iter().any(|wanted| author.contains(wanted.as_str()))
                    })
            }
            Constraint::Keywords => {
                if self.keywords.is_empty() {
                    return true;
                }
                let text = format!("{} {}", record.title, record.abstract_text()).to_lowercase();
                self.keywords.iter().any(|k| text.contains(k.as_str()))
            }
            Constraint::YearRange => match self.year_range {
                None => true,
                Some(range) => record.year.is_some_and(|y| range.contains(y)),
            },
            Constraint::ItemTypes => {
                self.item_types.is_empty() || self.item_types.contains(&record.item_type)
            }
            Constraint::TitleContains => match &self.title_contains {
                None => true,
                Some(text) => record.title.to_lowercase().contains(text.as_str()),
            },
        }
    }

    fn matches(&self, record: &Record) -> bool {
        Constraint::ALL.iter().all(|c| self.satisfies(record, *c))
    }

    fn failed(&self, record: &Record) -> Vec<Constraint> {
        Constraint::ALL
            .into_iter()
            .filter(|c| !self.satisfies(record, *c))
            .collect()
    }
}

fn lowercase_all(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

/// Whether `record` satisfies every constraint of `spec`
pub fn matches(record: &Record, spec: &FilterSpec) -> bool {
    PreparedSpec::new(spec).matches(record)
}

/// The constraints `record` fails; empty exactly when [`matches`] is true
pub fn explain(record: &Record, spec: &FilterSpec) -> Vec<Constraint> {
    PreparedSpec::new(spec).failed(record)
}

/// Records satisfying `spec`, in input order
///
/// Accepts any iterator of record references, so the output of one call can
/// be fed straight back into another.
pub fn filter_set<'a, I>(records: I, spec: &FilterSpec) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    let prepared = PreparedSpec::new(spec);
    let mut kept = Vec::new();
    let mut total = 0usize;

    for record in records {
        total += 1;
        if prepared.matches(record) {
            kept.push(record);
        } else if tracing::enabled!(tracing::Level::TRACE) {
            let failed: Vec<&str> = prepared.failed(record).into_iter().map(Constraint::name).collect();
            tracing::trace!("Excluded {}: fails {}", record.key, failed.join(", "));
        }
    }

    tracing::debug!("Filter kept {} of {} records", kept.len(), total);
    kept
}
