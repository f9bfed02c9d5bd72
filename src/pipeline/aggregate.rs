//! Per-customer Recency / Frequency / Monetary aggregation

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use super::error::RfmError;
use super::ingest::{CustomerId, Transaction};

/// Behavioral metrics for one customer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerMetrics {
    pub customer_id: CustomerId,
    /// Whole days between the snapshot instant and the latest transaction
    pub recency_days: i64,
    /// Number of line items
    pub frequency: u64,
    /// Sum of line totals (negative when returns dominate)
    pub monetary: f64,
}

/// Aggregation output: the snapshot used plus one entry per customer
#[derive(Debug, Clone)]
pub struct AggregatedMetrics {
    pub snapshot: NaiveDateTime,
    /// Sorted by customer id
    pub customers: Vec<CustomerMetrics>,
}

/// The reference instant for recency: latest invoice timestamp plus one day.
pub fn snapshot_instant(transactions: &[Transaction]) -> Result<NaiveDateTime, RfmError> {
    transactions
        .iter()
        .map(|tx| tx.invoice_timestamp)
        .max()
        .map(|latest| latest + Duration::days(1))
        .ok_or(RfmError::EmptyDataset)
}

/// Derive the snapshot instant and aggregate metrics against it.
pub fn aggregate_metrics(transactions: &[Transaction]) -> Result<AggregatedMetrics, RfmError> {
    let snapshot = snapshot_instant(transactions)?;
    let customers = aggregate_with_snapshot(transactions, snapshot)?;

    info!(
        customers = customers.len(),
        transactions = transactions.len(),
        %snapshot,
        "aggregated customer metrics"
    );

    Ok(AggregatedMetrics { snapshot, customers })
}

/// Group transactions by customer and reduce each group.
///
/// `snapshot` must not precede any transaction timestamp; use
/// [`snapshot_instant`] to derive it. Groups are reduced in parallel, but
/// each group sums its line totals in input order so results are identical
/// from run to run.
pub fn aggregate_with_snapshot(
    transactions: &[Transaction],
    snapshot: NaiveDateTime,
) -> Result<Vec<CustomerMetrics>, RfmError> {
    if transactions.is_empty() {
        return Err(RfmError::EmptyDataset);
    }

    let mut groups: BTreeMap<&CustomerId, Vec<usize>> = BTreeMap::new();
    for (idx, tx) in transactions.iter().enumerate() {
        groups.entry(&tx.customer_id).or_default().push(idx);
    }
    let groups: Vec<(&CustomerId, Vec<usize>)> = groups.into_iter().collect();

    groups
        .par_iter()
        .map(|(customer_id, indices)| {
            let (last_seen, monetary) = indices.iter().map(|&i| &transactions[i]).fold(
                (NaiveDateTime::MIN, 0.0f64),
                |(last, sum), tx| (last.max(tx.invoice_timestamp), sum + tx.line_total()),
            );
            if !monetary.is_finite() {
                return Err(RfmError::NonFiniteMonetary(customer_id.to_string()));
            }

            Ok(CustomerMetrics {
                customer_id: (*customer_id).clone(),
                recency_days: (snapshot - last_seen).num_days(),
                frequency: indices.len() as u64,
                monetary,
            })
        })
        .collect()
}
