//! Result projection: the per-customer scored table and its summary aggregates

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::Serialize;

use super::aggregate::CustomerMetrics;
use super::ingest::CustomerId;
use super::scoring::RfmScores;
use super::segment::{CompositeScore, SegmentTable};

/// Header of the exported table, in column order
pub const TABLE_COLUMNS: [&str; 9] = [
    "customerId",
    "recencyDays",
    "frequency",
    "monetary",
    "rScore",
    "fScore",
    "mScore",
    "compositeScore",
    "segment",
];

/// One row of the final table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCustomer {
    pub customer_id: CustomerId,
    pub recency_days: i64,
    pub frequency: u64,
    pub monetary: f64,
    pub r_score: u8,
    pub f_score: u8,
    pub m_score: u8,
    pub composite_score: CompositeScore,
    pub segment: String,
}

/// Everything a presentation or export layer needs from one run
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationResult {
    /// Reference instant recency was measured against
    pub snapshot: NaiveDateTime,
    pub bins: usize,
    /// Valid transactions that entered aggregation
    pub transaction_count: usize,
    /// Input rows skipped for lacking a customer id
    pub dropped_missing_customer: usize,
    /// Sorted by customer id
    pub customers: Vec<ScoredCustomer>,
}

/// Min / max / mean of one column
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl MetricStats {
    /// All zero for an empty input
    fn from_values(values: impl Iterator<Item = f64>) -> Self {
        let (count, min, max, sum) = values.fold(
            (0usize, f64::INFINITY, f64::NEG_INFINITY, 0.0f64),
            |(n, min, max, sum), v| (n + 1, min.min(v), max.max(v), sum + v),
        );
        if count == 0 {
            return Self::default();
        }
        Self {
            min,
            max,
            mean: sum / count as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentCount {
    pub segment: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCount {
    pub score: CompositeScore,
    pub count: usize,
}

/// Reductions over the scored table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentationSummary {
    pub customer_count: usize,
    pub recency_days: MetricStats,
    pub frequency: MetricStats,
    pub monetary: MetricStats,
    /// Over the numeric reading of the composite (e.g. 432)
    pub composite_score: MetricStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_score: Option<CompositeScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst_score: Option<CompositeScore>,
    /// Table order, zero-filled
    pub segment_counts: Vec<SegmentCount>,
    /// Highest composite first
    pub score_distribution: Vec<ScoreCount>,
}

/// Join metrics with their scores and classify each customer.
///
/// `scores` must be parallel to `metrics`.
pub fn project(
    metrics: Vec<CustomerMetrics>,
    scores: &[RfmScores],
    table: &SegmentTable,
) -> Vec<ScoredCustomer> {
    metrics
        .into_iter()
        .zip(scores)
        .map(|(m, s)| {
            let composite = CompositeScore::from_scores(s);
            ScoredCustomer {
                segment: table.classify(&composite).to_string(),
                customer_id: m.customer_id,
                recency_days: m.recency_days,
                frequency: m.frequency,
                monetary: m.monetary,
                r_score: s.recency,
                f_score: s.frequency,
                m_score: s.monetary,
                composite_score: composite,
            }
        })
        .collect()
}

impl SegmentationResult {
    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    pub fn summary(&self, table: &SegmentTable) -> SegmentationSummary {
        let customers = &self.customers;

        let mut by_segment: HashMap<&str, usize> = HashMap::new();
        let mut by_score: BTreeMap<CompositeScore, usize> = BTreeMap::new();
        for c in customers {
            *by_segment.entry(c.segment.as_str()).or_default() += 1;
            *by_score.entry(c.composite_score).or_default() += 1;
        }

        let mut segment_counts: Vec<SegmentCount> = table
            .labels()
            .into_iter()
            .map(|label| SegmentCount {
                segment: label.to_string(),
                count: by_segment.remove(label).unwrap_or(0),
            })
            .collect();
        // Labels from a different table than the one used for classification
        let mut extra: Vec<(&str, usize)> = by_segment.into_iter().collect();
        extra.sort_unstable();
        segment_counts.extend(extra.into_iter().map(|(segment, count)| SegmentCount {
            segment: segment.to_string(),
            count,
        }));

        SegmentationSummary {
            customer_count: customers.len(),
            recency_days: MetricStats::from_values(customers.iter().map(|c| c.recency_days as f64)),
            frequency: MetricStats::from_values(customers.iter().map(|c| c.frequency as f64)),
            monetary: MetricStats::from_values(customers.iter().map(|c| c.monetary)),
            composite_score: MetricStats::from_values(
                customers.iter().map(|c| c.composite_score.value() as f64),
            ),
            best_score: by_score.keys().next_back().copied(),
            worst_score: by_score.keys().next().copied(),
            segment_counts,
            score_distribution: by_score
                .into_iter()
                .rev()
                .map(|(score, count)| ScoreCount { score, count })
                .collect(),
        }
    }

    /// The table as a polars DataFrame with [`TABLE_COLUMNS`] headers
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let c = &self.customers;
        let text = |f: fn(&ScoredCustomer) -> String| c.iter().map(f).collect::<Vec<String>>();

        DataFrame::new(vec![
            Column::new(TABLE_COLUMNS[0].into(), text(|r| r.customer_id.to_string())),
            Column::new(
                TABLE_COLUMNS[1].into(),
                c.iter().map(|r| r.recency_days).collect::<Vec<i64>>(),
            ),
            Column::new(
                TABLE_COLUMNS[2].into(),
                c.iter().map(|r| r.frequency as i64).collect::<Vec<i64>>(),
            ),
            Column::new(
                TABLE_COLUMNS[3].into(),
                c.iter().map(|r| r.monetary).collect::<Vec<f64>>(),
            ),
            Column::new(
                TABLE_COLUMNS[4].into(),
                c.iter().map(|r| r.r_score as i32).collect::<Vec<i32>>(),
            ),
            Column::new(
                TABLE_COLUMNS[5].into(),
                c.iter().map(|r| r.f_score as i32).collect::<Vec<i32>>(),
            ),
            Column::new(
                TABLE_COLUMNS[6].into(),
                c.iter().map(|r| r.m_score as i32).collect::<Vec<i32>>(),
            ),
            Column::new(TABLE_COLUMNS[7].into(), text(|r| r.composite_score.to_string())),
            Column::new(TABLE_COLUMNS[8].into(), text(|r| r.segment.clone())),
        ])
    }
}
