//! Citation formatting in various styles.
//!
//! Supports APA 7th, MLA 9th, Chicago 17th, and BibTeX formats.

use crate::models::{ItemType, Record};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Citation style
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationStyle {
    /// APA 7th edition
    #[default]
    Apa,
    /// MLA 9th edition
    Mla,
    /// Chicago 17th edition (author-date)
    Chicago,
    /// BibTeX
    Bibtex,
}

impl CitationStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            CitationStyle::Apa => "apa",
            CitationStyle::Mla => "mla",
            CitationStyle::Chicago => "chicago",
            CitationStyle::Bibtex => "bibtex",
        }
    }
}

impl FromStr for CitationStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "apa" => Ok(CitationStyle::Apa),
            "mla" => Ok(CitationStyle::Mla),
            "chicago" => Ok(CitationStyle::Chicago),
            "bibtex" | "bib" => Ok(CitationStyle::Bibtex),
            other => Err(format!(
                "Unknown citation style '{}': expected apa, mla, chicago or bibtex",
                other
            )),
        }
    }
}

impl fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CitationStyle::Apa => write!(f, "APA 7th"),
            CitationStyle::Mla => write!(f, "MLA 9th"),
            CitationStyle::Chicago => write!(f, "Chicago 17th"),
            CitationStyle::Bibtex => write!(f, "BibTeX"),
        }
    }
}

/// Format a record citation in the specified style
pub fn format_citation(record: &Record, style: CitationStyle) -> String {
    match style {
        CitationStyle::Apa => format_apa(record),
        CitationStyle::Mla => format_mla(record),
        CitationStyle::Chicago => format_chicago(record),
        CitationStyle::Bibtex => format_bibtex(record),
    }
}

/// Split an author name into (last, given names)
///
/// Accepts both "Last, First" and "First Last".
fn split_name(author: &str) -> (&str, Option<&str>) {
    if let Some((last, first)) = author.split_once(',') {
        let first = first.trim();
        return (last.trim(), (!first.is_empty()).then_some(first));
    }
    let author = author.trim();
    match author.rsplit_once(char::is_whitespace) {
        Some((first, last)) => (last.trim(), Some(first.trim())),
        None => (author, None),
    }
}

/// Last name of an author, as used in reference markers
pub fn surname(author: &str) -> &str {
    split_name(author).0
}

fn format_author_apa_single(author: &str) -> String {
    match split_name(author) {
        (last, Some(first)) => {
            let initials: Vec<String> = first
                .split_whitespace()
                .filter_map(|n| n.chars().next())
                .map(|c| format!("{}.", c))
                .collect();
            format!("{}, {}", last, initials.join(" "))
        }
        (last, None) => last.to_string(),
    }
}

/// Format authors as "Last, F. M., & Last, F. M."
fn format_authors_apa(authors: &[String]) -> String {
    match authors {
        [] => "Anonymous".to_string(),
        [one] => format_author_apa_single(one),
        [a, b] => format!(
            "{}, & {}",
            format_author_apa_single(a),
            format_author_apa_single(b)
        ),
        _ => {
            // APA: up to 20 authors, then ellipsis and the final author
            let formatted: Vec<String> = authors
                .iter()
                .map(|a| format_author_apa_single(a))
                .collect();
            let last = &formatted[formatted.len() - 1];
            if formatted.len() <= 20 {
                format!("{}, & {}", formatted[..formatted.len() - 1].join(", "), last)
            } else {
                format!("{}, ... {}", formatted[..19].join(", "), last)
            }
        }
    }
}

fn format_author_inverted(author: &str) -> String {
    match split_name(author) {
        (last, Some(first)) => format!("{}, {}", last, first),
        (last, None) => last.to_string(),
    }
}

fn format_author_natural(author: &str) -> String {
    match split_name(author) {
        (last, Some(first)) => format!("{} {}", first, last),
        (last, None) => last.to_string(),
    }
}

/// Format authors as "Last, First, and First Last"
fn format_authors_mla(authors: &[String]) -> String {
    match authors {
        [] => "Anonymous".to_string(),
        [one] => format_author_inverted(one),
        [a, b] => format!(
            "{}, and {}",
            format_author_inverted(a),
            format_author_natural(b)
        ),
        [first, ..] => format!("{}, et al", format_author_inverted(first)),
    }
}

/// Format authors as "Last, First, and First Last"
fn format_authors_chicago(authors: &[String]) -> String {
    match authors {
        [] => "Anonymous".to_string(),
        [one] => format_author_inverted(one),
        [a, b] => format!(
            "{}, and {}",
            format_author_inverted(a),
            format_author_natural(b)
        ),
        [first, ..] => format!("{}, et al.", format_author_inverted(first)),
    }
}

fn year_or_nd(record: &Record) -> String {
    record
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "n.d.".to_string())
}

/// Where the work appeared: the publication title, or the item type
fn container(record: &Record) -> &str {
    record
        .journal
        .as_deref()
        .filter(|j| !j.trim().is_empty())
        .unwrap_or_else(|| record.item_type.name())
}

fn strip_terminal_period(s: &str) -> &str {
    s.strip_suffix('.').unwrap_or(s)
}

/// Format record in APA 7th edition
/// Format: Author, A. A., & Author, B. B. (Year). Title. Source. DOI
fn format_apa(record: &Record) -> String {
    let authors = format_authors_apa(&record.authors);
    let mut citation = format!(
        "{}. ({}). {}. {}.",
        strip_terminal_period(&authors),
        year_or_nd(record),
        strip_terminal_period(&record.title),
        container(record)
    );
    if let Some(doi) = record.doi.as_deref() {
        citation.push_str(&format!(" https://doi.org/{}", doi));
    }
    citation
}

/// Format record in MLA 9th edition
/// Format: Author. "Title." Source, Year, DOI.
fn format_mla(record: &Record) -> String {
    let authors = format_authors_mla(&record.authors);
    let title = strip_terminal_period(&record.title);
    let year = year_or_nd(record);

    match record.doi.as_deref() {
        Some(doi) => format!(
            "{}. \"{}.\" {}, {}, https://doi.org/{}.",
            strip_terminal_period(&authors),
            title,
            container(record),
            year,
            doi
        ),
        None => format!(
            "{}. \"{}.\" {}, {}.",
            strip_terminal_period(&authors),
            title,
            container(record),
            year
        ),
    }
}

/// Format record in Chicago 17th edition (author-date)
/// Format: Author. Year. "Title." Source. DOI.
fn format_chicago(record: &Record) -> String {
    let authors = format_authors_chicago(&record.authors);
    let title = strip_terminal_period(&record.title);
    let year = year_or_nd(record);

    match record.doi.as_deref() {
        Some(doi) => format!(
            "{}. {}. \"{}.\" {}. https://doi.org/{}.",
            strip_terminal_period(&authors),
            year,
            title,
            container(record),
            doi
        ),
        None => format!(
            "{}. {}. \"{}.\" {}.",
            strip_terminal_period(&authors),
            year,
            title,
            container(record)
        ),
    }
}

/// BibTeX entry type for a Zotero item type
fn bibtex_entry_type(item_type: &ItemType) -> &'static str {
    match item_type {
        ItemType::JournalArticle | ItemType::MagazineArticle | ItemType::NewspaperArticle => {
            "article"
        }
        ItemType::ConferencePaper => "inproceedings",
        ItemType::Book => "book",
        ItemType::BookSection => "incollection",
        ItemType::Thesis => "phdthesis",
        ItemType::Report => "techreport",
        _ => "misc",
    }
}

/// Generate a BibTeX entry
/// Format: @article{key,
///   author = {Last, First and Last, First},
///   title = {Title},
///   journal = {Source},
///   year = {Year},
///   doi = {DOI}
/// }
fn format_bibtex(record: &Record) -> String {
    // Citation key: FirstAuthorLastYearTitleWords
    let last_name: String = record
        .first_author()
        .map(surname)
        .unwrap_or("unknown")
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();
    let year = record.year.map(|y| y.to_string()).unwrap_or_default();
    let title_key: String = record
        .title
        .split_whitespace()
        .take(3)
        .flat_map(|w| w.chars().filter(|c| c.is_alphanumeric()))
        .collect();
    let key = format!("{}{}{}", last_name, year, title_key);

    let authors = record
        .authors
        .iter()
        .map(|a| format_author_inverted(a))
        .collect::<Vec<_>>()
        .join(" and ");

    let mut fields = vec![
        format!("  author = {{{}}}", authors),
        format!("  title = {{{}}}", record.title),
    ];
    if let Some(journal) = record.journal.as_deref() {
        let field = match record.item_type {
            ItemType::ConferencePaper | ItemType::BookSection => "booktitle",
            _ => "journal",
        };
        fields.push(format!("  {} = {{{}}}", field, journal));
    }
    if let Some(year) = record.year {
        fields.push(format!("  year = {{{}}}", year));
    }
    if let Some(doi) = record.doi.as_deref() {
        fields.push(format!("  doi = {{{}}}", doi));
    }
    if let Some(url) = record.url.as_deref() {
        fields.push(format!("  url = {{{}}}", url));
    }

    format!(
        "@{}{{{},\n{}\n}}",
        bibtex_entry_type(&record.item_type),
        key,
        fields.join(",\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordBuilder;

    fn sample() -> Record {
        RecordBuilder::new("K1", "Diffusion Policy", ItemType::JournalArticle)
            .authors(["Cheng Chi", "Shuran Song"])
            .year(2023)
            .journal("Robotics: Science and Systems")
            .doi("10.15607/RSS.2023.XIX.026")
            .build()
    }

    #[test]
    fn test_apa() {
        assert_eq!(
            format_citation(&sample(), CitationStyle::Apa),
            "Chi, C., & Song, S. (2023). Diffusion Policy. Robotics: Science and Systems. \
             https://doi.org/10.15607/RSS.2023.XIX.026"
        );
    }

    #[test]
    fn test_apa_without_authors_or_year() {
        let record = Record::new("K2", "Untitled Notes", ItemType::Manuscript);
        assert_eq!(
            format_citation(&record, CitationStyle::Apa),
            "Anonymous. (n.d.). Untitled Notes. Manuscript."
        );
    }

    #[test]
    fn test_mla_and_chicago() {
        let record = sample();
        assert_eq!(
            format_citation(&record, CitationStyle::Mla),
            "Chi, Cheng, and Shuran Song. \"Diffusion Policy.\" Robotics: Science and Systems, \
             2023, https://doi.org/10.15607/RSS.2023.XIX.026."
        );
        assert!(format_citation(&record, CitationStyle::Chicago)
            .starts_with("Chi, Cheng, and Shuran Song. 2023. \"Diffusion Policy.\""));
    }

    #[test]
    fn test_bibtex() {
        let bib = format_citation(&sample(), CitationStyle::Bibtex);
        assert!(bib.starts_with("@article{Chi2023DiffusionPolicy,\n"));
        assert!(bib.contains("  author = {Chi, Cheng and Song, Shuran}"));
        assert!(bib.contains("  journal = {Robotics: Science and Systems}"));
        assert!(bib.ends_with("}"));
    }

    #[test]
    fn test_inverted_names_are_understood() {
        assert_eq!(surname("Song, Shuran"), "Song");
        assert_eq!(surname("Shuran Song"), "Song");
        assert_eq!(surname("Plato"), "Plato");
        assert_eq!(format_author_apa_single("van Rossum, Guido"), "van Rossum, G.");
    }

    #[test]
    fn test_style_parse() {
        assert_eq!("MLA".parse::<CitationStyle>(), Ok(CitationStyle::Mla));
        assert_eq!("bib".parse::<CitationStyle>(), Ok(CitationStyle::Bibtex));
        assert!("harvard".parse::<CitationStyle>().is_err());
    }
}
