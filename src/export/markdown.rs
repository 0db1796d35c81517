//! Markdown rendering of records and categorized sets.
//!
//! The record layout is read by downstream language-model prompts, so field
//! order, labels and separators are fixed:
//!
//! ```text
//! ## <title>
//!
//! **Authors:** <a>; <b>
//! **Year:** <year | n.d.>
//! **Item Type:** <item type id>
//! **DOI:** <doi>
//! **Tags:** <a>, <b>
//!
//! > <abstract>
//!
//! **Citation:** <citation>
//! ```
//!
//! The DOI line, the abstract block and the citation block are left out when
//! the record has no value for them. Records are separated by a `---` rule.

use std::borrow::Borrow;

use super::{validate_all, ExportError};
use crate::models::{CategorizedSet, Record};

const RECORD_SEPARATOR: &str = "\n---\n\n";

/// Markdown document with one section per record
///
/// Ends with a single newline; empty input renders as the empty string.
pub fn serialize_markdown<R: Borrow<Record>>(records: &[R]) -> Result<String, ExportError> {
    validate_all(records.iter().map(Borrow::borrow))?;
    Ok(render_records(records.iter().map(Borrow::borrow)))
}

pub(crate) fn render_records<'r>(records: impl Iterator<Item = &'r Record>) -> String {
    records
        .map(render_record)
        .collect::<Vec<_>>()
        .join(RECORD_SEPARATOR)
}

/// One record section, ending with a newline
fn render_record(record: &Record) -> String {
    let mut out = format!("## {}\n\n", record.title.trim());

    let authors = if record.authors.is_empty() {
        "Unknown".to_string()
    } else {
        record.authors.join("; ")
    };
    out.push_str(&format!("**Authors:** {}\n", authors));

    let year = record
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "n.d.".to_string());
    out.push_str(&format!("**Year:** {}\n", year));
    out.push_str(&format!("**Item Type:** {}\n", record.item_type.id()));

    if let Some(doi) = present(record.doi.as_deref()) {
        out.push_str(&format!("**DOI:** {}\n", doi));
    }

    let tags = if record.tags.is_empty() {
        "none".to_string()
    } else {
        record.tags.join(", ")
    };
    out.push_str(&format!("**Tags:** {}\n", tags));

    if let Some(abstract_text) = present(record.r#abstract.as_deref()) {
        out.push('\n');
        for line in abstract_text.trim().lines() {
            out.push_str("> ");
            out.push_str(line);
            out.push('\n');
        }
    }

    if let Some(citation) = present(record.citation.as_deref()) {
        out.push_str(&format!("\n**Citation:** {}\n", citation));
    }

    out
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Markdown document with one `#` section per bucket, in bucket order
pub(crate) fn categorized_markdown(set: &CategorizedSet<'_>) -> String {
    set.buckets()
        .iter()
        .map(|bucket| {
            let mut section = format!("# {}\n\n", bucket.name);
            if let Some(description) = present(bucket.description.as_deref()) {
                section.push_str(description.trim());
                section.push_str("\n\n");
            }
            if bucket.is_empty() {
                section.push_str("_No items._\n");
            } else {
                section.push_str(&render_records(bucket.records()));
            }
            section
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ItemType, RecordBuilder};
    use std::borrow::Cow;

    fn full_record() -> Record {
        RecordBuilder::new("K1", "Diffusion Policy", ItemType::ConferencePaper)
            .authors(["Cheng Chi", "Shuran Song"])
            .abstract_text("First line.\nSecond line.")
            .year(2023)
            .doi("10.1234/dp")
            .tags(["robotics", "generative"])
            .citation("Chi, C., & Song, S. (2023). Diffusion Policy.")
            .build()
    }

    #[test]
    fn test_full_record_layout() {
        let md = serialize_markdown(&[full_record()]).unwrap();
        assert_eq!(
            md,
            "## Diffusion Policy\n\
             \n\
             **Authors:** Cheng Chi; Shuran Song\n\
             **Year:** 2023\n\
             **Item Type:** conferencePaper\n\
             **DOI:** 10.1234/dp\n\
             **Tags:** robotics, generative\n\
             \n\
             > First line.\n\
             > Second line.\n\
             \n\
             **Citation:** Chi, C., & Song, S. (2023). Diffusion Policy.\n"
        );
    }

    #[test]
    fn test_sparse_record_omits_optional_blocks() {
        let record = Record::new("K2", "Notes on Planning", ItemType::Report);
        let md = serialize_markdown(&[record]).unwrap();
        assert_eq!(
            md,
            "## Notes on Planning\n\
             \n\
             **Authors:** Unknown\n\
             **Year:** n.d.\n\
             **Item Type:** report\n\
             **Tags:** none\n"
        );
    }

    #[test]
    fn test_records_separated_by_rule() {
        let records = vec![full_record(), Record::new("K2", "Second", ItemType::Book)];
        let md = serialize_markdown(&records).unwrap();

        assert_eq!(md.matches("\n---\n\n").count(), 1);
        assert!(md.contains("Diffusion Policy.\n\n---\n\n## Second\n"));
        assert!(md.ends_with("**Tags:** none\n"));
        assert!(!md.ends_with("\n\n"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(serialize_markdown::<Record>(&[]).unwrap(), "");
    }

    #[test]
    fn test_categorized_sections() {
        let record = full_record();
        let mut set = CategorizedSet::new(&[
            Category::new("Diffusion", ["diffusion"]).with_description("Generative policies"),
            Category::new("Empty", ["nothing"]),
        ]);
        set.buckets_mut()[0].items.push(Cow::Borrowed(&record));

        let md = categorized_markdown(&set);
        assert!(md.starts_with("# Diffusion\n\nGenerative policies\n\n## Diffusion Policy\n"));
        assert!(md.contains("\n# Empty\n\n_No items._\n"));
        assert!(md.ends_with(
            "# Uncategorized\n\nItems that don't match any specified category\n\n_No items._\n"
        ));
    }
}
