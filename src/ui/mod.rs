//! Terminal output for the command-line interface.
//!
//! Status lines, a batch progress bar, article boxes and the result table.

use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::models::Article;

/// Get the current terminal width.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(100)
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Search,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Search => "🔍",
    }
}

/// Print a styled status message to stderr.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => eprintln!("{} {}", icon.green().bold(), msg),
        Status::Error => eprintln!("{} {}", icon.red().bold(), msg),
        Status::Warning => eprintln!("{} {}", icon.yellow().bold(), msg),
        Status::Info => eprintln!("{} {}", icon.cyan().bold(), msg),
        Status::Search => eprintln!("{} {}", icon.yellow(), msg),
    }
}

/// Print search results header.
pub fn print_search_header(query: &str, count: usize, duration: Duration) {
    println!();
    println!(
        "{} Search results for: {}",
        status_icon(Status::Search).yellow().bold(),
        query.cyan().bold()
    );
    println!(
        "{} Found {} articles in {:.2}s",
        "─".repeat(30).dimmed(),
        format_number(count).green().bold(),
        duration.as_secs_f64().white()
    );
    println!();
}

/// Print one article as a block with the start of its abstract.
pub fn print_article_box(index: usize, article: &Article) {
    let width = terminal_width().clamp(40, 120);
    let year = year_label(article);

    println!();
    println!(
        "{} {}",
        format!("[{}]", index).dimmed(),
        article.title().blue().bold()
    );
    println!(
        "  Authors: {}",
        truncate_with_ellipsis(&author_list(article), width - 11)
    );
    println!(
        "  Journal: {} ({})",
        article.journal().green(),
        year.yellow()
    );
    println!("  PMID:    {}", article.pmid());
    if let Some(doi) = article.doi() {
        println!("  DOI:     {}", doi);
    }
    if article.citation_count() > 0 {
        println!(
            "  Cited by: {}",
            article.citation_count().to_string().yellow()
        );
    }
    if article.has_abstract() {
        println!(
            "  {}",
            truncate_with_ellipsis(article.abstract_text(), (width - 2) * 2)
        );
    }
    if let Some(url) = article.url() {
        println!("  {}", url.dimmed());
    }
    println!("{}", "─".repeat(width).dimmed());
}

/// Result table with one row per article.
pub fn render_table(articles: &[Article]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_header(vec!["PMID", "Title", "Authors", "Journal", "Year"]);
    if is_terminal() {
        table.set_content_arrangement(ContentArrangement::Dynamic);
    }

    for article in articles {
        table.add_row(vec![
            Cell::new(article.pmid()),
            Cell::new(truncate_with_ellipsis(article.title(), 60))
                .add_attribute(Attribute::Bold),
            Cell::new(truncate_with_ellipsis(&author_list(article), 30)),
            Cell::new(truncate_with_ellipsis(
                article.journal_abbrev().unwrap_or(article.journal()),
                25,
            )),
            Cell::new(year_label(article)),
        ]);
    }
    table
}

/// One line per article for plain output.
pub fn plain_line(article: &Article) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        article.pmid(),
        year_label(article),
        article.title(),
        article.url().unwrap_or_default()
    )
}

fn author_list(article: &Article) -> String {
    article
        .authors()
        .iter()
        .map(|a| a.display_name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn year_label(article: &Article) -> String {
    article
        .publication_date()
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "????".to_string())
}

/// Progress bar driven by the searcher's `(processed, total)` callback
pub struct SearchProgress {
    pb: indicatif::ProgressBar,
}

impl SearchProgress {
    /// Create a progress bar; hidden when `visible` is false
    pub fn new(visible: bool) -> Self {
        let pb = if visible {
            indicatif::ProgressBar::new(0)
        } else {
            indicatif::ProgressBar::hidden()
        };
        let style = indicatif::ProgressStyle::with_template(
            "{spinner:.cyan} {msg} {bar:40.cyan/blue} {pos}/{len} ({percent}%)",
        )
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
        pb.set_style(style);
        pb.set_message("Fetching articles");
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Update with the searcher's counters
    pub fn update(&self, current: usize, total: usize) {
        self.pb.set_length(total as u64);
        self.pb.set_position(current as u64);
    }

    /// Finish with success message.
    pub fn finish_with_success(&self, msg: &str) {
        self.pb.finish_with_message(format!("✓ {}", msg));
    }

    /// Finish with error message.
    pub fn finish_with_error(&self, msg: &str) {
        self.pb.abandon_with_message(format!("✗ {}", msg));
    }
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

    let truncated: String = char_widths[..end_idx].iter().map(|(c, _)| *c).collect();
    format!("{}...", truncated)
}
