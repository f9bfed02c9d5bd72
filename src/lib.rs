//! rfmseg: RFM Customer Segmentation Library
//!
//! Scores customers on Recency, Frequency and Monetary value from
//! transactional order data using quantile binning, and maps the composite
//! score to named segments through an ordered threshold table.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
