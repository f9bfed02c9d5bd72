//! Output files: the scored table, the JSON summary report and the zip bundle

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use polars::prelude::{CsvWriter, ParquetWriter, SerWriter};
use serde::Serialize;

use crate::pipeline::{ScoringConfig, SegmentTable, SegmentationResult, SegmentationSummary};

/// Metadata about the run
#[derive(Debug, Serialize)]
pub struct ReportMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    pub rfmseg_version: String,
    pub input_file: String,
    /// Reference instant recency was measured against
    pub snapshot: String,
    pub scoring: ScoringConfig,
    pub transactions: usize,
    pub dropped_missing_customer: usize,
}

/// Complete JSON report
#[derive(Debug, Serialize)]
pub struct SummaryReport<'a> {
    pub metadata: ReportMetadata,
    pub segment_rules: &'a SegmentTable,
    pub summary: &'a SegmentationSummary,
}

/// Save the scored table (CSV or Parquet based on extension)
pub fn save_table(result: &SegmentationResult, path: &Path) -> Result<()> {
    let mut df = result
        .to_dataframe()
        .context("Failed to build the result table")?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            CsvWriter::new(&mut file)
                .finish(&mut df)
                .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        }
        "parquet" => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            ParquetWriter::new(file)
                .finish(&mut df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
        }
        _ => anyhow::bail!(
            "Unsupported output format: {}. Supported formats: csv, parquet",
            extension
        ),
    }

    Ok(())
}

/// Write the JSON summary report
pub fn export_summary_json(
    result: &SegmentationResult,
    summary: &SegmentationSummary,
    scoring: &ScoringConfig,
    table: &SegmentTable,
    input_file: &Path,
    output_path: &Path,
) -> Result<()> {
    let report = SummaryReport {
        metadata: ReportMetadata {
            timestamp: Utc::now().to_rfc3339(),
            rfmseg_version: env!("CARGO_PKG_VERSION").to_string(),
            input_file: input_file.display().to_string(),
            snapshot: result.snapshot.format("%Y-%m-%dT%H:%M:%S").to_string(),
            scoring: scoring.clone(),
            transactions: result.transaction_count,
            dropped_missing_customer: result.dropped_missing_customer,
        },
        segment_rules: table,
        summary,
    };

    let json =
        serde_json::to_string_pretty(&report).context("Failed to serialize summary to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write summary to {}", output_path.display()))?;

    Ok(())
}

/// Package output files into a zip archive, keeping the originals
pub fn package_bundle(files: &[&Path], zip_path: &Path) -> Result<()> {
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    let zip_file = File::create(zip_path)
        .with_context(|| format!("Failed to create zip file: {}", zip_path.display()))?;

    let mut zip = ZipWriter::new(zip_file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for path in files {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Invalid file name: {}", path.display()))?;
        zip.start_file(filename, options)
            .with_context(|| format!("Failed to add {} to zip", filename))?;

        let mut content = Vec::new();
        File::open(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?
            .read_to_end(&mut content)?;
        zip.write_all(&content)?;
    }

    zip.finish().context("Failed to finalize zip file")?;

    Ok(())
}
