//! Error types for the segmentation pipeline.
//!
//! Each variant captures a specific failure mode of ingestion, aggregation,
//! scoring or segment classification. File handling and reporting wrap these
//! in `anyhow` at the CLI boundary.

use std::fmt;

use polars::prelude::PolarsError;
use serde::Serialize;
use thiserror::Error;

/// The three behavioral metrics scored by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Recency,
    Frequency,
    Monetary,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Recency => write!(f, "recency"),
            Metric::Frequency => write!(f, "frequency"),
            Metric::Monetary => write!(f, "monetary"),
        }
    }
}

/// Errors that can occur while computing a segmentation.
#[derive(Debug, Error)]
pub enum RfmError {
    /// A required field of an input row could not be parsed.
    ///
    /// `row` is the zero-based position of the row in the input sequence.
    #[error("Malformed record at row {row}: field '{field}' value '{value}' {reason}")]
    MalformedRecord {
        row: usize,
        field: &'static str,
        value: String,
        reason: String,
    },

    /// No valid records survived ingestion, so no snapshot instant exists.
    #[error("No valid transaction records to segment (all rows empty or missing a customer id)")]
    EmptyDataset,

    /// Repeated quantile edges leave some of the requested bins empty.
    #[error(
        "Cannot split {metric} into {bins} quantile bins: too many identical values, \
         only {populated_bins} of {bins} bin(s) would be populated. Try a smaller bin count"
    )]
    DegenerateDistribution {
        metric: Metric,
        bins: usize,
        populated_bins: usize,
    },

    /// A customer's summed line totals left the finite range.
    #[error("Monetary total of customer '{0}' is not a finite number")]
    NonFiniteMonetary(String),

    /// Bin count outside the supported range (one digit per score).
    #[error("Bin count must be between 1 and 9, got {0}")]
    InvalidBinCount(usize),

    /// A segment rule table failed validation.
    #[error("Invalid segment rule table: {0}")]
    InvalidRuleTable(String),

    /// A mapped input column does not exist in the dataset.
    #[error("Column '{0}' not found in dataset")]
    MissingColumn(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}
