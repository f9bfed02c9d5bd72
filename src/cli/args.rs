//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::pipeline::{ColumnMapping, RankMethod, ScoringConfig, DEFAULT_BINS, MAX_BINS};

/// rfmseg - Segment customers by Recency, Frequency and Monetary value
#[derive(Parser, Debug)]
#[command(name = "rfmseg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Input order file (CSV or Parquet), one row per invoice line
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output table path (CSV or Parquet, determined by extension).
    /// Defaults to the input directory with an '_rfm' suffix (e.g., orders.csv → orders_rfm.csv).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of quantile bins per metric (1-9). Scores range from 1 to this value.
    #[arg(short = 'k', long, default_value_t = DEFAULT_BINS, value_parser = validate_bins)]
    pub bins: usize,

    /// Column holding the customer identifier. Rows with an empty value are skipped.
    #[arg(long, default_value = "CustomerID")]
    pub customer_column: String,

    /// Column holding the invoice identifier
    #[arg(long, default_value = "InvoiceNo")]
    pub invoice_column: String,

    /// Column holding the invoice timestamp
    #[arg(long, default_value = "InvoiceDate")]
    pub date_column: String,

    /// Column holding the line quantity (negative for returns)
    #[arg(long, default_value = "Quantity")]
    pub quantity_column: String,

    /// Column holding the unit price
    #[arg(long, default_value = "UnitPrice")]
    pub price_column: String,

    /// Bin monetary value by rank (ties broken by customer order) instead of by value.
    /// Avoids errors when many customers share the same spend.
    #[arg(long, default_value = "false")]
    pub rank_monetary: bool,

    /// JSON file with a custom segment rule table (see the `rules` subcommand for the format)
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Skip writing the JSON summary report
    #[arg(long, default_value = "false")]
    pub no_report: bool,

    /// Package the table and summary report into a zip archive
    #[arg(long, default_value = "false")]
    pub bundle: bool,

    /// Skip interactive confirmation prompts (existing outputs are overwritten)
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,

    /// Show debug diagnostics on stderr (RUST_LOG overrides)
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the default segment rule table as JSON, as a starting point for --rules
    Rules {
        /// Write the table to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn input(&self) -> Option<&PathBuf> {
        self.input.as_ref()
    }

    /// Get the output path, deriving from input if not explicitly provided.
    /// The derived path will be in the same directory as the input with an '_rfm' suffix.
    pub fn output_path(&self) -> Option<PathBuf> {
        let input = self.input.as_ref()?;
        Some(
            self.output
                .clone()
                .unwrap_or_else(|| sibling_path(input, "_rfm.csv")),
        )
    }

    /// JSON summary path, or `None` when reporting is disabled
    pub fn report_path(&self) -> Option<PathBuf> {
        if self.no_report {
            return None;
        }
        let input = self.input.as_ref()?;
        Some(sibling_path(input, "_rfm_summary.json"))
    }

    /// Zip bundle path, or `None` unless `--bundle` was given
    pub fn bundle_path(&self) -> Option<PathBuf> {
        if !self.bundle {
            return None;
        }
        let input = self.input.as_ref()?;
        Some(sibling_path(input, "_rfm.zip"))
    }

    pub fn scoring_config(&self) -> ScoringConfig {
        let mut config = ScoringConfig::with_bins(self.bins);
        if self.rank_monetary {
            config.monetary = RankMethod::First;
        }
        config
    }

    pub fn column_mapping(&self) -> ColumnMapping {
        ColumnMapping {
            customer: self.customer_column.clone(),
            invoice: self.invoice_column.clone(),
            timestamp: self.date_column.clone(),
            quantity: self.quantity_column.clone(),
            unit_price: self.price_column.clone(),
        }
    }
}

/// `<dir>/<input stem><suffix>`
fn sibling_path(input: &Path, suffix: &str) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    parent.join(format!("{}{}", stem, suffix))
}

/// Validator for the bin count
fn validate_bins(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid bin count", s))?;

    if !(1..=MAX_BINS).contains(&value) {
        Err(format!(
            "bins must be between 1 and {}, got {}",
            MAX_BINS, value
        ))
    } else {
        Ok(value)
    }
}
