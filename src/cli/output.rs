//! Output formatting for CLI commands
//!
//! Commands print through [`Output`]: JSON mode emits one serialized value,
//! text mode emits headings, aligned [`Table`]s and `label: value` fields.
//! Text-only helpers are silent in JSON mode so a command can call them
//! unconditionally after its JSON early return.

use std::fmt::{self, Display};

use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Width of the label column in `field` lines
const FIELD_WIDTH: usize = 18;

/// Horizontal alignment of a table column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// One column of a text table
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub title: &'static str,
    pub width: usize,
    pub align: Align,
}

impl Column {
    pub const fn left(title: &'static str, width: usize) -> Self {
        Self {
            title,
            width,
            align: Align::Left,
        }
    }

    pub const fn right(title: &'static str, width: usize) -> Self {
        Self {
            title,
            width,
            align: Align::Right,
        }
    }

    fn pad(&self, cell: &str) -> String {
        match self.align {
            Align::Left => format!("{:<width$}", cell, width = self.width),
            Align::Right => format!("{:>width$}", cell, width = self.width),
        }
    }
}

/// A text table with a header row and a rule under it
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: &[Column]) -> Self {
        Self {
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    /// Adds a row; missing cells are blank, extra cells are dropped
    pub fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn line(&self, cells: &[&str]) -> String {
        let padded: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| col.pad(cells.get(i).copied().unwrap_or("")))
            .collect();
        padded.join(" ").trim_end().to_string()
    }

    fn rule_width(&self) -> usize {
        let widths: usize = self.columns.iter().map(|c| c.width).sum();
        widths + self.columns.len().saturating_sub(1)
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let titles: Vec<&str> = self.columns.iter().map(|c| c.title).collect();
        writeln!(f, "{}", self.line(&titles))?;
        writeln!(f, "{}", "-".repeat(self.rule_width()))?;
        for row in &self.rows {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            writeln!(f, "{}", self.line(&cells))?;
        }
        Ok(())
    }
}

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
    verbose: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    fn is_text(&self) -> bool {
        self.format == OutputFormat::Text
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
        }
    }

    /// Prints structured data; pretty-printed in text mode
    pub fn data<T: Serialize>(&self, data: &T) {
        let json = match self.format {
            OutputFormat::Text => serde_json::to_string_pretty(data),
            OutputFormat::Json => serde_json::to_string(data),
        };
        if let Ok(json) = json {
            println!("{}", json);
        }
    }

    /// Prints a plain line (text only)
    pub fn line(&self, message: impl Display) {
        if self.is_text() {
            println!("{}", message);
        }
    }

    /// Prints a section heading (text only)
    pub fn heading(&self, title: &str) {
        if self.is_text() {
            println!("{}", title);
            println!("{}", "-".repeat(title.chars().count().max(20)));
        }
    }

    /// Prints a blank line and a heading, separating it from what came before
    pub fn section(&self, title: &str) {
        if self.is_text() {
            println!();
        }
        self.heading(title);
    }

    /// Prints a table under a `title (count):` caption (text only)
    pub fn table(&self, title: &str, table: &Table) {
        if self.is_text() {
            println!("{} ({}):", title, table.len());
            print!("{}", table);
        }
    }

    /// Prints an aligned `label: value` line (text only)
    pub fn field(&self, label: &str, value: impl Display) {
        if self.is_text() {
            println!("{}", field_line(label, value));
        }
    }

    /// Prints one `- item` line per entry (text only)
    pub fn bullets<T: Display>(&self, items: &[T]) {
        if self.is_text() {
            for item in items {
                println!("- {}", item);
            }
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Returns true if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Prints a verbose message (only when --verbose is set)
    pub fn verbose(&self, message: &str) {
        self.verbose_ctx("planner", message);
    }

    /// Prints a verbose message with context (only when --verbose is set)
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        if self.verbose {
            eprintln!("[verbose:{}] {}", context, message);
        }
    }
}

fn field_line(label: &str, value: impl Display) -> String {
    format!("{:<width$}{}", format!("{}:", label), value, width = FIELD_WIDTH)
}
