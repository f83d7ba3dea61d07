use clap::ValueEnum;
use comfy_table::{presets, Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    fn message(&self, kind: &str, symbol: String, msg: &str) {
        match self.format {
            OutputFormat::Human => {
                if symbol.is_empty() {
                    println!("{}", msg);
                } else {
                    println!("{} {}", symbol, msg);
                }
            }
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&envelope(kind, msg));
            }
        }
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            self.message("success", "✓".green().to_string(), msg.as_ref());
        }
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            self.message("info", String::new(), msg.as_ref());
        }
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            self.message("warning", "⚠".yellow().to_string(), msg.as_ref());
        }
    }

    /// Shown even in quiet mode
    pub fn error(&self, msg: impl AsRef<str>) {
        match self.format {
            OutputFormat::Human => eprintln!("{} {}", "✗".red(), msg.as_ref()),
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&envelope("error", msg.as_ref()));
            }
        }
    }

    /// Structured result for the json formats
    pub fn json(&self, data: &serde_json::Value) {
        if self.quiet && self.is_human() {
            return;
        }
        self.print_json(data);
    }

    /// Two-column table under a cyan title, human format only
    pub fn table(&self, title: &str, rows: &[(&str, String)]) {
        if self.quiet || !self.is_human() {
            return;
        }
        let mut table = Table::new();
        table.set_header(vec![
            Cell::new(title).fg(Color::Cyan).add_attribute(Attribute::Bold),
            Cell::new(""),
        ]);
        for (key, value) in rows {
            table.add_row(vec![Cell::new(key), Cell::new(value)]);
        }
        table.load_preset(presets::UTF8_FULL);
        table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
        println!("{}", table);
    }

    fn print_json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(data).unwrap_or_default()),
            OutputFormat::JsonPretty => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default())
            }
            OutputFormat::Human => println!("{}", data),
        }
    }
}

/// Json line for a status message
fn envelope(kind: &str, msg: &str) -> serde_json::Value {
    json!({ "type": kind, "message": msg })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope() {
        assert_eq!(
            envelope("error", "Mapping refresh failed: offline"),
            json!({ "type": "error", "message": "Mapping refresh failed: offline" })
        );
    }
}
