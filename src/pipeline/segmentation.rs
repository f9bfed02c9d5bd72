//! End-to-end segmentation: ingest, aggregate, score, classify, project

use serde::Serialize;
use tracing::{debug, info};

use super::aggregate::aggregate_metrics;
use super::error::RfmError;
use super::ingest::{ingest_transactions, RawTransaction};
use super::projection::{project, SegmentationResult};
use super::scoring::{score_customers, ScoringConfig};
use super::segment::SegmentTable;

/// Everything that parameterizes one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SegmentationConfig {
    pub scoring: ScoringConfig,
    pub segments: SegmentTable,
}

/// Run the full pipeline over raw rows.
///
/// Pure with respect to its inputs: the snapshot instant is derived from the
/// rows themselves, so the same rows and config always give the same result.
pub fn compute_segmentation(
    rows: &[RawTransaction],
    config: &SegmentationConfig,
) -> Result<SegmentationResult, RfmError> {
    config.scoring.validate()?;

    let ingested = ingest_transactions(rows)?;
    if ingested.dropped_missing_customer > 0 {
        info!(
            dropped = ingested.dropped_missing_customer,
            "skipped rows without a customer id"
        );
    }

    let aggregated = aggregate_metrics(&ingested.transactions)?;
    let scores = score_customers(&aggregated.customers, &config.scoring)?;
    let customers = project(aggregated.customers, &scores, &config.segments);

    debug!(
        customers = customers.len(),
        bins = config.scoring.bins,
        "segmentation complete"
    );

    Ok(SegmentationResult {
        snapshot: aggregated.snapshot,
        bins: config.scoring.bins,
        transaction_count: ingested.transactions.len(),
        dropped_missing_customer: ingested.dropped_missing_customer,
        customers,
    })
}
