//! Classify command for checking how titles are categorized.
//!
//! Useful when tuning category, exclusion and fallback rules in
//! `config.toml`: no calendar access is needed.

use std::io::Write;

use anyhow::{Context, Result};
use ts_core::{CategoryName, Categorizer, Classification};

use crate::{ClassifyArgs, Config};

/// Formats one classification as `title -> category, category`.
pub fn format_classification(title: &str, classification: &Classification) -> String {
    match classification {
        Classification::Tagged { categories } => {
            let names = categories
                .iter()
                .map(CategoryName::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            format!("{title} -> {names}")
        }
        Classification::Discarded { trigger } => {
            format!("{title} -> (discarded, matched '{trigger}')")
        }
    }
}

/// Runs the classify command.
pub fn run<W: Write>(writer: &mut W, args: &ClassifyArgs, config: &Config) -> Result<()> {
    let categorizer =
        Categorizer::new(config.categories.clone()).context("invalid category configuration")?;

    for title in &args.titles {
        let classification = categorizer.classify(title);
        if args.json {
            let line = serde_json::json!({
                "title": title,
                "classification": classification,
            });
            writeln!(writer, "{line}")?;
        } else {
            writeln!(writer, "{}", format_classification(title, &classification))?;
        }
    }

    Ok(())
}
