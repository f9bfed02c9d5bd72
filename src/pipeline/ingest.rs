//! Record ingestion: validation and normalization of raw transaction rows
//!
//! Rows without a customer identifier are dropped (they cannot be attributed to
//! anyone). Every other row must parse cleanly: a malformed timestamp, quantity
//! or unit price fails the whole ingestion with the offending row position.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use tracing::debug;

use super::error::RfmError;

/// Date-time layouts tried in order after RFC 3339
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Date-only layouts, interpreted as midnight
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Largest float that still maps exactly onto an integer identifier
const MAX_EXACT_FLOAT_ID: f64 = 9_007_199_254_740_992.0;

/// One unparsed line item, as read from a file or handed over by a caller.
///
/// Every field is optional text; typing and validation happen in
/// [`ingest_transactions`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTransaction {
    pub customer_id: Option<String>,
    pub invoice_id: Option<String>,
    pub invoice_timestamp: Option<String>,
    pub quantity: Option<String>,
    pub unit_price: Option<String>,
}

impl RawTransaction {
    /// Convenience constructor for fully populated rows
    pub fn new(
        customer_id: Option<&str>,
        invoice_id: &str,
        invoice_timestamp: &str,
        quantity: &str,
        unit_price: &str,
    ) -> Self {
        Self {
            customer_id: customer_id.map(str::to_string),
            invoice_id: Some(invoice_id.to_string()),
            invoice_timestamp: Some(invoice_timestamp.to_string()),
            quantity: Some(quantity.to_string()),
            unit_price: Some(unit_price.to_string()),
        }
    }
}

/// Normalized customer identifier.
///
/// Identifiers that are integers order numerically and come before any
/// non-integer identifier; the rest order textually. This is the grouping
/// order of the aggregator and the "first-seen" order used to break rank ties.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomerId {
    text: String,
    numeric: Option<i64>,
}

impl CustomerId {
    /// Normalize a raw identifier. Returns `None` for blank input.
    ///
    /// Integral floats such as `"17850.0"` (float-typed id columns) are
    /// rewritten to their integer form.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let text = match trimmed.parse::<f64>() {
            Ok(v)
                if trimmed.contains('.')
                    && v.is_finite()
                    && v.fract() == 0.0
                    && v.abs() < MAX_EXACT_FLOAT_ID =>
            {
                format!("{}", v as i64)
            }
            _ => trimmed.to_string(),
        };
        let numeric = text.parse::<i64>().ok();

        Some(Self { text, numeric })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl Ord for CustomerId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric, other.numeric) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.text.cmp(&other.text)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.text.cmp(&other.text),
        }
    }
}

impl PartialOrd for CustomerId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for CustomerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

/// A validated line item
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub customer_id: CustomerId,
    pub invoice_id: String,
    pub invoice_timestamp: NaiveDateTime,
    /// Negative quantities are returns and are kept
    pub quantity: i64,
    pub unit_price: f64,
}

impl Transaction {
    /// `quantity × unit_price`
    pub fn line_total(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

/// Output of the ingestion step
#[derive(Debug, Clone, Default)]
pub struct IngestedTransactions {
    pub transactions: Vec<Transaction>,
    /// Rows skipped because the customer identifier was missing or blank
    pub dropped_missing_customer: usize,
}

/// Validate and normalize raw rows into transactions.
///
/// # Errors
/// `RfmError::MalformedRecord` for the first row (with a customer id) whose
/// invoice id, timestamp, quantity or unit price is missing or unparseable,
/// or whose line total overflows.
pub fn ingest_transactions(rows: &[RawTransaction]) -> Result<IngestedTransactions, RfmError> {
    let mut transactions = Vec::with_capacity(rows.len());
    let mut dropped_missing_customer = 0usize;

    for (row, raw) in rows.iter().enumerate() {
        let Some(customer_id) = raw.customer_id.as_deref().and_then(CustomerId::parse) else {
            dropped_missing_customer += 1;
            continue;
        };

        let invoice_id = required(row, "invoiceId", raw.invoice_id.as_deref())?.to_string();

        let ts_text = required(row, "invoiceTimestamp", raw.invoice_timestamp.as_deref())?;
        let invoice_timestamp = parse_timestamp(ts_text)
            .ok_or_else(|| malformed(row, "invoiceTimestamp", ts_text, "is not a recognized timestamp"))?;

        let qty_text = required(row, "quantity", raw.quantity.as_deref())?;
        let quantity = parse_quantity(qty_text)
            .ok_or_else(|| malformed(row, "quantity", qty_text, "is not an integer"))?;

        let price_text = required(row, "unitPrice", raw.unit_price.as_deref())?;
        let unit_price = match price_text.parse::<f64>() {
            Ok(p) if p.is_finite() && p >= 0.0 => p,
            Ok(_) => {
                return Err(malformed(row, "unitPrice", price_text, "must be a finite non-negative number"))
            }
            Err(_) => return Err(malformed(row, "unitPrice", price_text, "is not a number")),
        };
        if !(quantity as f64 * unit_price).is_finite() {
            return Err(malformed(row, "unitPrice", price_text, "gives a non-finite line total"));
        }

        transactions.push(Transaction {
            customer_id,
            invoice_id,
            invoice_timestamp,
            quantity,
            unit_price,
        });
    }

    debug!(
        kept = transactions.len(),
        dropped_missing_customer, "ingested transaction rows"
    );

    Ok(IngestedTransactions {
        transactions,
        dropped_missing_customer,
    })
}

/// Parse an invoice timestamp in any supported layout.
///
/// RFC 3339 values with an offset are converted to UTC.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Integers, or decimals with no fractional part (`"6.0"`)
fn parse_quantity(text: &str) -> Option<i64> {
    if let Ok(q) = text.parse::<i64>() {
        return Some(q);
    }
    match text.parse::<f64>() {
        Ok(q) if q.is_finite() && q.fract() == 0.0 && q.abs() < MAX_EXACT_FLOAT_ID => Some(q as i64),
        _ => None,
    }
}

fn required<'a>(row: usize, field: &'static str, value: Option<&'a str>) -> Result<&'a str, RfmError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(malformed(row, field, "", "is missing")),
    }
}

fn malformed(row: usize, field: &'static str, value: &str, reason: &str) -> RfmError {
    RfmError::MalformedRecord {
        row,
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
