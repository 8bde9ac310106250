// crates/nexus-cli/src/output.rs
//
// Output formatting utilities for the NexusLink CLI.
// Supports table and JSON output modes.

use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Print a list either as a table of `R` rows or as the raw JSON records.
pub fn print_list<T, R>(format: OutputFormat, records: &[T], to_row: impl Fn(&T) -> R, empty: &str)
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Json => println!("{}", format_json(records)),
        OutputFormat::Table if records.is_empty() => println!("{}", empty),
        OutputFormat::Table => {
            let rows: Vec<R> = records.iter().map(to_row).collect();
            println!("{}", format_table(&rows));
        }
    }
}

/// Two-column key/value row for single-record views.
#[derive(Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl FieldRow {
    pub fn new(field: &str, value: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Shorten a string to `max_len` characters, appending "..." if cut.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let cut: String = s.chars().take(max_len).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_table_has_headers() {
        let rows = vec![FieldRow::new("Total Rounds", 12), FieldRow::new("Success Rate", "75.0%")];
        let table = format_table(&rows);
        assert!(table.contains("Field"));
        assert!(table.contains("Value"));
        assert!(table.contains("Total Rounds"));
        assert!(table.contains("75.0%"));
    }

    #[test]
    fn test_format_json_is_pretty() {
        let json = format_json(&serde_json::json!({ "accepted": true }));
        assert_eq!(json, "{\n  \"accepted\": true\n}");
    }

    #[test]
    fn test_output_format_from_flag() {
        assert_eq!(OutputFormat::from_json_flag(true), OutputFormat::Json);
        assert_eq!(OutputFormat::from_json_flag(false), OutputFormat::Table);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("0xabcdef", 4), "0xab...");
        assert_eq!(truncate("short", 10), "short");
    }
}
