//! `rules` subcommand: print or write the default segment rule table

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use crate::pipeline::SegmentTable;

/// Emit the default table as pretty JSON, to stdout or to `output`
pub fn run_rules(output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(&SegmentTable::default())
        .context("Failed to serialize segment rules")?;

    match output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", json))
                .with_context(|| format!("Failed to write rules to {}", path.display()))?;
            println!(
                "{} Default segment rules written to {}",
                style("✓").green(),
                style(path.display()).dim()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Read and validate a segment rule table from a JSON file
pub fn load_rules(path: &Path) -> Result<SegmentTable> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rules file: {}", path.display()))?;
    SegmentTable::from_json_str(&json)
        .with_context(|| format!("Invalid rules file: {}", path.display()))
}
