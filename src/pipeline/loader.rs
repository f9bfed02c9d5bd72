//! Dataset loader for CSV and Parquet order files

use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::debug;

use super::error::RfmError;
use super::ingest::RawTransaction;

/// Source column names for each transaction field.
///
/// Defaults match the classic online-retail export
/// (`CustomerID, InvoiceNo, InvoiceDate, Quantity, UnitPrice`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub customer: String,
    pub invoice: String,
    pub timestamp: String,
    pub quantity: String,
    pub unit_price: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            customer: "CustomerID".to_string(),
            invoice: "InvoiceNo".to_string(),
            timestamp: "InvoiceDate".to_string(),
            quantity: "Quantity".to_string(),
            unit_price: "UnitPrice".to_string(),
        }
    }
}

impl ColumnMapping {
    /// Mapped names in field order: customer, invoice, timestamp, quantity, unit price
    pub fn columns(&self) -> [&str; 5] {
        [
            self.customer.as_str(),
            self.invoice.as_str(),
            self.timestamp.as_str(),
            self.quantity.as_str(),
            self.unit_price.as_str(),
        ]
    }
}

/// Load a dataset from a file (CSV or Parquet based on extension).
///
/// CSV columns are all read as text so that identifiers such as `C536379`
/// and ids with blanks never trip schema inference; typing happens during
/// ingestion.
pub fn load_dataset(path: &Path) -> Result<LazyFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_infer_schema_length(Some(0))
            .finish()
            .with_context(|| format!("Failed to load CSV file: {}", path.display()))?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
        _ => anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv, parquet",
            extension
        ),
    };

    Ok(lf)
}

/// Column names of a dataset, without reading its rows
pub fn get_column_names(path: &Path) -> Result<Vec<String>> {
    let schema = load_dataset(path)?
        .collect_schema()
        .with_context(|| format!("Failed to read schema of {}", path.display()))?;
    Ok(schema.iter_names().map(|s| s.to_string()).collect())
}

/// Read the mapped columns of an order file as raw transaction rows.
///
/// Fails with [`RfmError::MissingColumn`] (wrapped) when a mapped column is
/// absent, before any row data is read.
pub fn read_raw_transactions(path: &Path, mapping: &ColumnMapping) -> Result<Vec<RawTransaction>> {
    let lf = load_dataset(path)?;
    let schema = lf
        .clone()
        .collect_schema()
        .with_context(|| format!("Failed to read schema of {}", path.display()))?;

    for name in mapping.columns() {
        if schema.get(name).is_none() {
            return Err(RfmError::MissingColumn(name.to_string()))
                .with_context(|| format!("Column mapping does not match {}", path.display()));
        }
    }

    let df = lf
        .select(mapping.columns().map(col))
        .collect()
        .with_context(|| format!("Failed to read rows of {}", path.display()))?;

    debug!(rows = df.height(), path = %path.display(), "loaded order rows");

    Ok(extract_raw_transactions(&df, mapping)?)
}

/// Convert the mapped columns of a DataFrame into raw rows.
///
/// Non-text columns are cast to their string form, so a float-typed
/// customer column yields e.g. `"17850.0"` (normalized during ingestion).
pub fn extract_raw_transactions(
    df: &DataFrame,
    mapping: &ColumnMapping,
) -> Result<Vec<RawTransaction>, RfmError> {
    let mut columns = Vec::with_capacity(5);
    for name in mapping.columns() {
        let column = df
            .column(name)
            .map_err(|_| RfmError::MissingColumn(name.to_string()))?;
        columns.push(column.cast(&DataType::String)?);
    }

    let [customer, invoice, timestamp, quantity, unit_price] = [
        columns[0].str()?,
        columns[1].str()?,
        columns[2].str()?,
        columns[3].str()?,
        columns[4].str()?,
    ];

    let owned = |v: Option<&str>| v.map(str::to_string);

    Ok(customer
        .iter()
        .zip(invoice.iter())
        .zip(timestamp.iter())
        .zip(quantity.iter())
        .zip(unit_price.iter())
        .map(|((((c, i), t), q), p)| RawTransaction {
            customer_id: owned(c),
            invoice_id: owned(i),
            invoice_timestamp: owned(t),
            quantity: owned(q),
            unit_price: owned(p),
        })
        .collect())
}
