//! Table formatting utilities for CLI list commands
//!
//! List commands build [`TableRow`]s of typed [`CellValue`]s and hand them to
//! a [`TableFormatter`], which renders TSV (the default on a terminal), CSV,
//! Markdown or bare ids. YAML and JSON are printed from the records
//! themselves by the caller.

use chrono::{DateTime, Local, Utc};
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::truncate_str;
use crate::cli::OutputFormat;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Numeric database id (cyan)
    Id(i64),
    /// Plain text, truncated to the column width
    Text(String),
    /// Workflow status with color coding
    Status(String),
    /// DateTime displayed as local date only
    Date(DateTime<Utc>),
    /// Optional DateTime displayed as local date and time
    DateTime(Option<DateTime<Utc>>),
    /// Integer count
    Number(i64),
    /// Float value with precision
    Float(f64, usize),
    /// Percentage, colored by how far along it is
    Percent(f64),
    /// Tags/labels as comma-separated
    Tags(Vec<String>),
    /// Empty/placeholder
    Empty,
}

fn status_style(s: &str) -> console::StyledObject<&str> {
    match s {
        "validated" | "active" | "completed" | "valid" => style(s).green(),
        "submitted" | "in_progress" | "pending" | "paused" => style(s).yellow(),
        "rejected" | "overdue" | "revoked" | "expired" => style(s).red(),
        "draft" | "not_started" | "archived" => style(s).dim(),
        _ => style(s).white(),
    }
}

impl CellValue {
    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => format!("{:<width$}", style(id).cyan(), width = width),
            CellValue::Status(s) => format!("{:<width$}", status_style(s), width = width),
            CellValue::Percent(p) => {
                let text = format!("{:.1}%", p);
                let styled = if *p >= 80.0 {
                    style(text).green()
                } else if *p >= 40.0 {
                    style(text).yellow()
                } else {
                    style(text).red()
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Number(_) | CellValue::Float(..) => {
                format!("{:<width$}", self.raw(), width = width)
            }
            CellValue::Empty => format!("{:<width$}", style("-").dim(), width = width),
            _ => {
                let truncated = truncate_str(&self.raw(), width.saturating_sub(2));
                format!("{:<width$}", truncated, width = width)
            }
        }
    }

    /// Format for Markdown output
    pub fn format_md(&self) -> String {
        match self {
            CellValue::Status(s) => format!("`{}`", s),
            CellValue::Empty => "-".to_string(),
            _ => self.raw().replace('|', "\\|"),
        }
    }

    /// Unstyled value, used for CSV and width calculation
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(id) => id.to_string(),
            CellValue::Text(s) | CellValue::Status(s) => s.clone(),
            CellValue::Date(dt) => dt.with_timezone(&Local).format("%Y-%m-%d").to_string(),
            CellValue::DateTime(Some(dt)) => {
                dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
            }
            CellValue::DateTime(None) | CellValue::Empty => String::new(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Float(f, precision) => format!("{:.prec$}", f, prec = precision),
            CellValue::Percent(p) => format!("{:.1}%", p),
            CellValue::Tags(tags) => tags.join(", "),
        }
    }

    /// Display width in characters
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Empty | CellValue::DateTime(None) => 1,
            _ => self.raw().chars().count(),
        }
    }
}

/// Column definition for table output
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    /// Upper bound on the rendered width
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub id: i64,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'static str) -> Self {
        Self {
            columns,
            entity_name,
            show_summary: true,
        }
    }

    /// Drop the "N record(s) found." line
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    /// Output rows in the specified format
    pub fn output<I>(&self, rows: I, format: OutputFormat) -> Result<()>
    where
        I: IntoIterator<Item = TableRow>,
    {
        let rows: Vec<TableRow> = rows.into_iter().collect();

        match format {
            OutputFormat::Csv => self.output_csv(&rows)?,
            OutputFormat::Md => self.output_md(&rows),
            OutputFormat::Id => self.output_ids(&rows),
            _ => self.output_tsv(&rows),
        }
        Ok(())
    }

    /// Column widths sized to content, capped at each column's width
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| {
                let max_content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(CellValue::display_width)
                    .max()
                    .unwrap_or(0);
                col.header
                    .len()
                    .max(max_content.saturating_add(2))
                    .min(col.width)
            })
            .collect()
    }

    fn output_tsv(&self, rows: &[TableRow]) {
        let widths = self.calculate_widths(rows);

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<width$}", style(col.header).bold(), width = w))
            .collect();
        println!("{}", header.join(" "));

        let total_width: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        println!("{}", "-".repeat(total_width));

        for row in rows {
            let parts: Vec<String> = self
                .columns
                .iter()
                .zip(&widths)
                .map(|(col, w)| match row.get(col.key) {
                    Some(value) => value.format_tsv(*w),
                    None => format!("{:<width$}", "-", width = w),
                })
                .collect();
            println!("{}", parts.join(" "));
        }

        if self.show_summary {
            println!();
            println!(
                "{} {}(s) found.",
                style(rows.len()).cyan(),
                self.entity_name
            );
        }
    }

    fn output_csv(&self, rows: &[TableRow]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(std::io::stdout());
        writer
            .write_record(self.columns.iter().map(|c| c.key))
            .into_diagnostic()?;
        for row in rows {
            writer
                .write_record(
                    self.columns
                        .iter()
                        .map(|col| row.get(col.key).map(CellValue::raw).unwrap_or_default()),
                )
                .into_diagnostic()?;
        }
        writer.flush().into_diagnostic()?;
        Ok(())
    }

    fn output_md(&self, rows: &[TableRow]) {
        let headers: Vec<&str> = self.columns.iter().map(|c| c.header).collect();
        println!("| {} |", headers.join(" | "));
        let separators: Vec<&str> = headers.iter().map(|_| "---").collect();
        println!("|{}|", separators.join("|"));

        for row in rows {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|col| {
                    row.get(col.key)
                        .map(CellValue::format_md)
                        .unwrap_or_else(|| "-".to_string())
                })
                .collect();
            println!("| {} |", values.join(" | "));
        }
    }

    fn output_ids(&self, rows: &[TableRow]) {
        for row in rows {
            println!("{}", row.id);
        }
    }
}
