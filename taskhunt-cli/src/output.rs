//! Output formatting for CLI

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use serde::Serialize;
use taskhunt_sdk::Difficulty;

/// Tags shown on a list row before the rest collapse into "+N"
pub const MAX_LIST_TAGS: usize = 3;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Compact format (single line per item)
    Compact,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
            Self::Compact => write!(f, "compact"),
        }
    }
}

/// Output writer that handles different formats
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format }
    }

    /// Human-oriented output, as opposed to a machine-readable format
    pub fn is_table(&self) -> bool {
        self.format == OutputFormat::Table
    }

    /// Write a single item
    pub fn write<T: Serialize + TableDisplay>(&self, item: &T) -> Result<()> {
        match self.format {
            OutputFormat::Table => {
                item.display_single();
            }
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(item)?;
                println!("{}", json);
            }
            OutputFormat::Yaml => {
                let yaml = serde_yaml::to_string(item)?;
                print!("{}", yaml);
            }
            OutputFormat::Compact => {
                item.display_compact();
            }
        }
        Ok(())
    }

    /// Write a list of items
    pub fn write_list<T: Serialize + TableDisplay>(&self, items: &[T], headers: &[&str]) -> Result<()> {
        match self.format {
            OutputFormat::Table => {
                if items.is_empty() {
                    println!("{}", "No items found.".dimmed());
                    return Ok(());
                }

                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.apply_modifier(UTF8_ROUND_CORNERS);

                let header_cells: Vec<Cell> = headers
                    .iter()
                    .map(|h| Cell::new(h).fg(Color::Cyan))
                    .collect();
                table.set_header(header_cells);

                for item in items {
                    table.add_row(item.to_row());
                }

                println!("{table}");
            }
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(items)?;
                println!("{}", json);
            }
            OutputFormat::Yaml => {
                let yaml = serde_yaml::to_string(items)?;
                print!("{}", yaml);
            }
            OutputFormat::Compact => {
                for item in items {
                    item.display_compact();
                }
            }
        }
        Ok(())
    }

    /// Write a success message
    pub fn success(&self, message: &str) {
        if self.is_table() {
            println!("{} {}", "✓".green(), message);
        } else {
            println!("{}", message);
        }
    }

    /// Write an error message
    pub fn error(&self, message: &str) {
        if self.is_table() {
            eprintln!("{} {}", "✗".red(), message);
        } else {
            eprintln!("Error: {}", message);
        }
    }

    /// Write a warning message. Goes to stderr so machine-readable
    /// output on stdout stays parseable.
    pub fn warning(&self, message: &str) {
        if self.is_table() {
            eprintln!("{} {}", "⚠".yellow(), message);
        } else {
            eprintln!("Warning: {}", message);
        }
    }

    /// Write an info message
    pub fn info(&self, message: &str) {
        if self.is_table() {
            println!("{} {}", "ℹ".blue(), message);
        } else {
            eprintln!("{}", message);
        }
    }

    /// Start a spinner for long operations
    pub fn spinner(&self, message: &str) -> Option<indicatif::ProgressBar> {
        if !self.is_table() {
            return None;
        }

        let pb = indicatif::ProgressBar::new_spinner();
        if let Ok(style) = indicatif::ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    }
}

/// Trait for displaying items in a table
pub trait TableDisplay {
    /// Convert item to a table row
    fn to_row(&self) -> Vec<Cell>;

    /// Display a single item in detail
    fn display_single(&self);

    /// Display in compact format
    fn display_compact(&self);
}

/// Print a key-value pair in detail format
pub fn print_field(key: &str, value: &str) {
    println!("  {}: {}", key.cyan(), value);
}

/// Print an optional key-value pair
pub fn print_optional_field(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        print_field(key, v);
    }
}

/// Print a list field; nothing when the list is empty
pub fn print_list_field(key: &str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    println!("  {}:", key.cyan());
    for v in values {
        println!("    - {}", v);
    }
}

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", title.bold().underline());
}

/// Format a timestamp for display
pub fn format_timestamp(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Difficulty label colored by its bucket
pub fn difficulty_badge(difficulty: &str) -> String {
    match Difficulty::classify(Some(difficulty)) {
        Difficulty::Easy => difficulty.green().to_string(),
        Difficulty::Medium => difficulty.yellow().to_string(),
        Difficulty::Hard => difficulty.red().to_string(),
        Difficulty::Other => difficulty.dimmed().to_string(),
    }
}

/// Table cell for a difficulty, colored by its bucket
pub fn difficulty_cell(difficulty: Option<&str>) -> Cell {
    let Some(label) = difficulty else {
        return Cell::new("-");
    };
    let cell = Cell::new(label);
    match Difficulty::classify(Some(label)) {
        Difficulty::Easy => cell.fg(Color::Green),
        Difficulty::Medium => cell.fg(Color::Yellow),
        Difficulty::Hard => cell.fg(Color::Red),
        Difficulty::Other => cell,
    }
}

/// Pull request state with color
pub fn pr_state_badge(state: &str) -> String {
    match state.to_lowercase().as_str() {
        "open" => state.green().to_string(),
        "merged" => state.magenta().to_string(),
        "closed" => state.red().to_string(),
        _ => state.to_string(),
    }
}

/// First tags of a list, with the remainder collapsed into "+N"
pub fn format_tags(tags: &[String]) -> String {
    let mut shown: Vec<String> = tags.iter().take(MAX_LIST_TAGS).cloned().collect();
    let hidden = tags.len().saturating_sub(MAX_LIST_TAGS);
    if hidden > 0 {
        shown.push(format!("+{}", hidden));
    }
    shown.join(" ")
}

/// Cut text to `max` characters, marking the cut with an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// "1 task", "2 tasks"
pub fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// Minutes without a trailing ".0"
pub fn format_minutes(minutes: f64) -> String {
    format!("{} min", format_number(minutes))
}

/// Whole numbers without a decimal point, others as given
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_format_tags_collapses_overflow() {
        assert_eq!(format_tags(&[]), "");
        assert_eq!(format_tags(&tags(&["a", "b", "c"])), "a b c");
        assert_eq!(format_tags(&tags(&["a", "b", "c", "d", "e"])), "a b c +2");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("  short  ", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("héllo wörld", 6), "héllo…");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(0, "task"), "0 tasks");
        assert_eq!(pluralize(1, "task"), "1 task");
        assert_eq!(pluralize(12, "task"), "12 tasks");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(5.0), "5 min");
        assert_eq!(format_minutes(15.5), "15.5 min");
    }

    #[test]
    fn test_difficulty_badge_keeps_label() {
        colored::control::set_override(false);
        assert_eq!(difficulty_badge("Hard"), "Hard");
        assert_eq!(difficulty_badge("extreme"), "extreme");
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Yaml.to_string(), "yaml");
        assert_eq!(OutputFormat::Compact.to_string(), "compact");
    }
}
