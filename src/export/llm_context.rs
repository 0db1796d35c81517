//! Consolidated context documents for language-model prompts.

use std::collections::HashSet;

use crate::models::{CategorizedSet, CategoryBucket, ContextType, Record};
use crate::utils::surname;

/// Longest abstract summary, in characters, before it is cut off
pub const SUMMARY_MAX_CHARS: usize = 200;

/// Render `set` as a single document for an LLM
///
/// Empty buckets are left out. The document ends with a single newline.
pub fn build_llm_context(set: &CategorizedSet<'_>, context_type: ContextType) -> String {
    let buckets: Vec<&CategoryBucket<'_>> = set.buckets().iter().filter(|b| !b.is_empty()).collect();
    let record_count = set
        .buckets()
        .iter()
        .flat_map(|b| b.records().map(|r| r.key.as_str()))
        .collect::<HashSet<_>>()
        .len();

    let mut sections = Vec::with_capacity(buckets.len() + 2);
    match context_type {
        ContextType::RelatedWorks => {
            sections.push("# Related Works Context".to_string());
            sections.push(format!(
                "The following {} references are grouped into {} topics. Each entry gives the \
                 title, an author-year citation marker and a one-line summary of the abstract.",
                record_count,
                buckets.len()
            ));
            sections.extend(buckets.iter().map(|b| related_works_section(b)));
        }
        ContextType::LiteratureReview => {
            sections.push("# Literature Review Context".to_string());
            sections.push(format!(
                "The following {} references are grouped into {} topics, with full metadata \
                 and abstracts for drafting a literature review.",
                record_count,
                buckets.len()
            ));
            sections.extend(buckets.iter().map(|b| literature_review_section(b)));
        }
    }

    let mut document = sections.join("\n\n");
    document.push('\n');
    document
}

fn section_heading(bucket: &CategoryBucket<'_>) -> String {
    let mut heading = format!("## {}", bucket.name);
    if let Some(description) = bucket.description.as_deref().filter(|d| !d.trim().is_empty()) {
        heading.push_str("\n\n");
        heading.push_str(description.trim());
    }
    heading
}

fn related_works_section(bucket: &CategoryBucket<'_>) -> String {
    let entries: Vec<String> = bucket
        .records()
        .map(|r| {
            format!(
                "- **{}** ({}): {}",
                r.title.trim(),
                citation_marker(r),
                summarize(r.r#abstract.as_deref())
            )
        })
        .collect();
    format!("{}\n\n{}", section_heading(bucket), entries.join("\n"))
}

fn literature_review_section(bucket: &CategoryBucket<'_>) -> String {
    let mut parts = vec![section_heading(bucket)];
    for record in bucket.records() {
        let mut entry = format!("### {}\n\n", record.title.trim());
        let authors = if record.authors.is_empty() {
            "Unknown".to_string()
        } else {
            record.authors.join("; ")
        };
        entry.push_str(&format!("- **Authors:** {}\n", authors));
        entry.push_str(&format!("- **Year:** {}\n", year_label(record)));
        if let Some(journal) = record.journal.as_deref().filter(|j| !j.trim().is_empty()) {
            entry.push_str(&format!("- **Published in:** {}\n", journal));
        }
        if !record.tags.is_empty() {
            entry.push_str(&format!("- **Tags:** {}\n", record.tags.join(", ")));
        }
        match record.r#abstract.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            Some(abstract_text) => entry.push_str(&format!("\n{}", abstract_text)),
            None => entry.push_str("\nNo abstract available."),
        }
        parts.push(entry);
    }
    parts.join("\n\n")
}

fn year_label(record: &Record) -> String {
    record
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "n.d.".to_string())
}

/// Inline marker such as `Chi et al., 2023`
fn citation_marker(record: &Record) -> String {
    let author = match record.authors.as_slice() {
        [] => "Unknown".to_string(),
        [only] => surname(only).to_string(),
        [first, ..] => format!("{} et al.", surname(first)),
    };
    format!("{}, {}", author, year_label(record))
}

/// Abstract with whitespace collapsed, cut to [`SUMMARY_MAX_CHARS`]
fn summarize(abstract_text: Option<&str>) -> String {
    let collapsed = abstract_text
        .unwrap_or("")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if collapsed.is_empty() {
        return "No abstract available.".to_string();
    }
    if collapsed.chars().count() <= SUMMARY_MAX_CHARS {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(SUMMARY_MAX_CHARS).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::categorize;
    use crate::models::{Category, ItemType, RecordBuilder};

    fn records() -> Vec<Record> {
        vec![
            RecordBuilder::new("A", "Diffusion Policy", ItemType::ConferencePaper)
                .authors(["Cheng Chi", "Shuran Song"])
                .abstract_text("Visuomotor   policy\nlearning via action diffusion.")
                .year(2023)
                .journal("RSS")
                .build(),
            RecordBuilder::new("B", "Planning with Diffusion", ItemType::Preprint)
                .author("Michael Janner")
                .build(),
        ]
    }

    #[test]
    fn test_related_works_layout() {
        let records = records();
        let categories = vec![
            Category::new("Diffusion", ["diffusion"]).with_description("Generative models"),
            Category::new("Transformers", ["attention"]),
        ];
        let set = categorize(&records, &categories);

        let context = build_llm_context(&set, ContextType::RelatedWorks);
        assert!(context.starts_with("# Related Works Context\n\nThe following 2 references"));
        assert!(context.contains(
            "## Diffusion\n\nGenerative models\n\n\
             - **Diffusion Policy** (Chi et al., 2023): Visuomotor policy learning via action diffusion.\n\
             - **Planning with Diffusion** (Janner, n.d.): No abstract available.\n"
        ));
        assert!(!context.contains("## Transformers"));
        assert!(!context.contains("## Uncategorized"));
        assert!(context.ends_with("No abstract available.\n"));
    }

    #[test]
    fn test_summary_truncation() {
        let exact = "a".repeat(SUMMARY_MAX_CHARS);
        assert_eq!(summarize(Some(&exact)), exact);

        let long = "é".repeat(SUMMARY_MAX_CHARS + 1);
        let summary = summarize(Some(&long));
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), SUMMARY_MAX_CHARS + 3);

        assert_eq!(summarize(Some("   ")), "No abstract available.");
        assert_eq!(summarize(None), "No abstract available.");
    }

    #[test]
    fn test_citation_marker() {
        let records = records();
        assert_eq!(citation_marker(&records[0]), "Chi et al., 2023");
        assert_eq!(citation_marker(&records[1]), "Janner, n.d.");
        assert_eq!(
            citation_marker(&Record::new("C", "Anon", ItemType::Book)),
            "Unknown, n.d."
        );
    }

    #[test]
    fn test_literature_review_layout() {
        let records = records();
        let set = categorize(&records, &[]);

        let context = build_llm_context(&set, ContextType::LiteratureReview);
        assert!(context.starts_with("# Literature Review Context\n\n"));
        assert!(context.contains("## Uncategorized\n\nItems that don't match any specified category"));
        assert!(context.contains(
            "### Diffusion Policy\n\n\
             - **Authors:** Cheng Chi; Shuran Song\n\
             - **Year:** 2023\n\
             - **Published in:** RSS\n\
             \n\
             Visuomotor   policy\nlearning via action diffusion."
        ));
    }

    #[test]
    fn test_empty_set() {
        let set = categorize(std::iter::empty::<&Record>(), &[]);
        let context = build_llm_context(&set, ContextType::RelatedWorks);
        assert!(context.contains("The following 0 references are grouped into 0 topics."));
        assert!(context.ends_with("abstract.\n"));
    }
}
