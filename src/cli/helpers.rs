//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::OutputFormat;

/// Truncate a string to max_len characters, adding "..." if truncated
///
/// Counts characters rather than bytes so accented supplier names never
/// split inside a code point.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Display an optional value, "-" when absent
pub fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

/// Print a record as YAML or JSON
///
/// `Auto` falls back to YAML, which is the full-fidelity format for `show`.
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            let yaml = serde_yml::to_string(value).into_diagnostic()?;
            print!("{}", yaml);
        }
    }
    Ok(())
}

/// Ask before a destructive action unless `--yes` was given
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

/// Print the "cancelled" line used when a confirmation is declined
pub fn print_cancelled() {
    println!("{} Cancelled", style("!").yellow());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
    }

    #[test]
    fn test_truncate_str_multibyte() {
        assert_eq!(truncate_str("Société Générale", 8), "Socié...");
        assert_eq!(truncate_str("Müller", 6), "Müller");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(Some("FR")), "FR");
        assert_eq!(or_dash(Some("  ")), "-");
        assert_eq!(or_dash(None), "-");
    }

    #[test]
    fn test_confirm_assume_yes() {
        assert!(confirm("Delete everything?", true).unwrap());
    }
}
