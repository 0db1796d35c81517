//! CLI UI utilities for terminal output.
//!
//! Colored status lines, record summaries and spinners. Status lines and
//! spinners go to stderr so stdout stays clean for tables and JSON.

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::models::{ItemType, Record};

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Icon for an item type.
pub fn item_type_icon(item_type: &ItemType) -> &'static str {
    match item_type {
        ItemType::JournalArticle | ItemType::MagazineArticle | ItemType::NewspaperArticle => "📰",
        ItemType::ConferencePaper | ItemType::Presentation => "🎤",
        ItemType::Preprint | ItemType::Manuscript => "📝",
        ItemType::Book | ItemType::BookSection => "📚",
        ItemType::Thesis => "🎓",
        ItemType::Report => "📊",
        ItemType::Webpage | ItemType::BlogPost | ItemType::ForumPost => "🌐",
        ItemType::Patent => "💡",
        ItemType::ComputerProgram => "💻",
        ItemType::Dataset => "🗄️",
        _ => "📄",
    }
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Search => "🔍",
        Status::Write => "↓",
    }
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Search,
    Write,
}

/// Print a styled status line to stderr.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => eprintln!("{} {}", icon.green().bold(), msg),
        Status::Error => eprintln!("{} {}", icon.red().bold(), msg),
        Status::Warning => eprintln!("{} {}", icon.yellow().bold(), msg),
        Status::Info => eprintln!("{} {}", icon.cyan().bold(), msg),
        Status::Search => eprintln!("{} {}", icon.yellow(), msg),
        Status::Write => eprintln!("{} {}", icon.magenta(), msg),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Print a one-record summary: title line, then authors, year and tags.
pub fn print_record(record: &Record) {
    let year = record
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "n.d.".to_string());
    let authors = if record.authors.is_empty() {
        "Unknown".to_string()
    } else {
        record.authors.join("; ")
    };

    println!(
        "{} {} {}",
        item_type_icon(&record.item_type),
        truncate_with_ellipsis(&record.title, 70).blue().bold(),
        format!("[{}]", record.key).dimmed()
    );
    println!(
        "   {} ({})",
        truncate_with_ellipsis(&authors, 60),
        year.yellow()
    );
    if !record.tags.is_empty() {
        println!("   {}", truncate_with_ellipsis(&record.tags.join(", "), 70).green());
    }
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "─".repeat(80).dimmed());
}

/// Format a number with commas.
pub fn format_number(n: usize) -> String {
    n.to_string()
        .chars()
        .rev()
        .collect::<Vec<_>>()
        .chunks(3)
        .map(|c| c.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(",")
        .chars()
        .rev()
        .collect()
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    let char_widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, unicode_width::UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    let total_width: usize = char_widths.iter().map(|(_, w)| *w).sum();
    if total_width <= max_width {
        return text.to_string();
    }

    let mut current_width = 0;
    let mut end_idx = 0;
    for (i, (_, w)) in char_widths.iter().enumerate() {
        if current_width + w > max_width - 3 {
            break;
        }
        current_width += w;
        end_idx = i + 1;
    }

    if end_idx == 0 {
        return "...".to_string();
    }

    let truncated: String = char_widths[..end_idx].iter().map(|(c, _)| *c).collect();
    format!("{}...", truncated)
}

fn spinner_style(template: &str, tick_chars: &str) -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::with_template(template)
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
        .tick_chars(tick_chars)
}

/// Loading spinner on stderr.
///
/// Hidden when stderr is not a terminal or when `quiet` is set.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str, quiet: bool) -> Self {
        let pb = if quiet || !std::io::stderr().is_terminal() {
            indicatif::ProgressBar::hidden()
        } else {
            indicatif::ProgressBar::new_spinner()
        };
        pb.set_style(spinner_style("{spinner:.cyan} {msg}", "⠁⠂⠄⡀⢀⠠⠐⠈ "));
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Set the message.
    pub fn set_message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    /// Finish with success message.
    pub fn finish_with_success(&self, msg: &str) {
        self.pb.set_style(spinner_style("{spinner:.green} {msg}", "✓✓"));
        self.pb.finish_with_message(msg.to_string());
    }

    /// Finish with error message.
    pub fn finish_with_error(&self, msg: &str) {
        self.pb.set_style(spinner_style("{spinner:.red} {msg}", "✗✗"));
        self.pb.finish_with_message(msg.to_string());
    }

    /// Clear the spinner without a final message.
    pub fn finish_and_clear(&self) {
        self.pb.finish_and_clear();
    }
}
