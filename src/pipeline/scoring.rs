//! Quantile (equal-frequency) scoring of Recency / Frequency / Monetary
//!
//! Each metric is cut into `bins` equal-population groups using quantile
//! edges with linear interpolation between order statistics. Bin `i` holds the
//! values in `[edge[i-1], edge[i])`; the last bin also holds its upper edge.
//! Recency is scored inverted (most recent = highest score), frequency and
//! monetary directly.

use serde::Serialize;
use tracing::debug;

use super::aggregate::CustomerMetrics;
use super::error::{Metric, RfmError};

/// Default number of bins per metric
pub const DEFAULT_BINS: usize = 4;

/// Each score must fit in one digit of the composite token
pub const MAX_BINS: usize = 9;

/// How a metric's values are ordered before binning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankMethod {
    /// Bin raw values; equal values always share a bin
    #[default]
    Value,
    /// Rank values 1..N, breaking ties by customer order, then bin the ranks
    First,
}

impl std::fmt::Display for RankMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankMethod::Value => write!(f, "value"),
            RankMethod::First => write!(f, "first"),
        }
    }
}

impl std::str::FromStr for RankMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "value" => Ok(RankMethod::Value),
            "first" => Ok(RankMethod::First),
            _ => Err(format!("Unknown rank method: '{}'. Use 'value' or 'first'.", s)),
        }
    }
}

/// Binning parameters for the three metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoringConfig {
    pub bins: usize,
    pub recency: RankMethod,
    pub frequency: RankMethod,
    pub monetary: RankMethod,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            bins: DEFAULT_BINS,
            recency: RankMethod::Value,
            // Integer frequencies tie heavily; ranking keeps the bins populated
            frequency: RankMethod::First,
            monetary: RankMethod::Value,
        }
    }
}

impl ScoringConfig {
    pub fn with_bins(bins: usize) -> Self {
        Self {
            bins,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), RfmError> {
        validate_bins(self.bins)
    }
}

/// The three ordinal scores of one customer, each in `1..=bins`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RfmScores {
    pub recency: u8,
    pub frequency: u8,
    pub monetary: u8,
}

/// Score every customer. Metrics are processed in the order recency,
/// frequency, monetary and the first degenerate one is reported.
///
/// The returned vector is parallel to `customers`.
pub fn score_customers(
    customers: &[CustomerMetrics],
    config: &ScoringConfig,
) -> Result<Vec<RfmScores>, RfmError> {
    config.validate()?;
    let bins = config.bins;

    let recency: Vec<f64> = customers.iter().map(|c| c.recency_days as f64).collect();
    let frequency: Vec<f64> = customers.iter().map(|c| c.frequency as f64).collect();
    let monetary: Vec<f64> = customers.iter().map(|c| c.monetary).collect();

    let r_bins = quantile_bins(&recency, bins, config.recency, Metric::Recency)?;
    let f_bins = quantile_bins(&frequency, bins, config.frequency, Metric::Frequency)?;
    let m_bins = quantile_bins(&monetary, bins, config.monetary, Metric::Monetary)?;

    Ok(r_bins
        .iter()
        .zip(&f_bins)
        .zip(&m_bins)
        .map(|((&r, &f), &m)| RfmScores {
            // Lower recency is better
            recency: (bins + 1 - r) as u8,
            frequency: f as u8,
            monetary: m as u8,
        })
        .collect())
}

/// Assign each value to a 1-indexed quantile bin.
///
/// # Errors
/// * `InvalidBinCount` if `bins` is outside `1..=9`
/// * `DegenerateDistribution` if repeated quantile edges leave a bin empty
///   (too many identical values for `bins` groups)
pub fn quantile_bins(
    values: &[f64],
    bins: usize,
    method: RankMethod,
    metric: Metric,
) -> Result<Vec<usize>, RfmError> {
    validate_bins(bins)?;
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let keyed = match method {
        RankMethod::Value => values.to_vec(),
        RankMethod::First => first_ranks(values),
    };

    let mut sorted = keyed.clone();
    sorted.sort_by(f64::total_cmp);
    let edges = quantile_edges(&sorted, bins);

    // A value sitting on an interior edge goes to the upper bin
    let interior = &edges[1..bins];
    let assigned: Vec<usize> = keyed
        .iter()
        .map(|&v| interior.partition_point(|&e| e <= v) + 1)
        .collect();

    if !edges.windows(2).all(|w| w[0] < w[1]) {
        let mut populated = vec![false; bins];
        for &b in &assigned {
            populated[b - 1] = true;
        }
        let populated_bins = populated.iter().filter(|&&p| p).count();
        // Only a repeated top edge can still fill every bin
        if populated_bins < bins {
            return Err(RfmError::DegenerateDistribution {
                metric,
                bins,
                populated_bins,
            });
        }
    }

    debug!(%metric, %method, ?edges, "quantile bin edges");

    Ok(assigned)
}

/// Quantile edges at `0, 1/bins, ..., 1` over sorted data, interpolating
/// linearly between neighbouring order statistics.
///
/// `sorted` must be ascending. Empty input has no edges.
pub fn quantile_edges(sorted: &[f64], bins: usize) -> Vec<f64> {
    let Some(last) = sorted.len().checked_sub(1) else {
        return Vec::new();
    };

    (0..=bins)
        .map(|j| {
            let pos = (j * last) as f64 / bins as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        })
        .collect()
}

/// Ranks 1..N by value; equal values are ranked in order of appearance.
fn first_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    // Stable sort keeps appearance order among ties
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    for (rank, &idx) in order.iter().enumerate() {
        ranks[idx] = (rank + 1) as f64;
    }
    ranks
}

fn validate_bins(bins: usize) -> Result<(), RfmError> {
    if (1..=MAX_BINS).contains(&bins) {
        Ok(())
    } else {
        Err(RfmError::InvalidBinCount(bins))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_method_from_str() {
        assert_eq!("value".parse::<RankMethod>().unwrap(), RankMethod::Value);
        assert_eq!("FIRST".parse::<RankMethod>().unwrap(), RankMethod::First);
        assert!("dense".parse::<RankMethod>().is_err());
    }

    #[test]
    fn test_rank_method_display() {
        assert_eq!(RankMethod::Value.to_string(), "value");
        assert_eq!(RankMethod::First.to_string(), "first");
    }

    #[test]
    fn test_default_config() {
        let config = ScoringConfig::default();
        assert_eq!(config.bins, 4);
        assert_eq!(config.recency, RankMethod::Value);
        assert_eq!(config.frequency, RankMethod::First);
        assert_eq!(config.monetary, RankMethod::Value);
    }

    #[test]
    fn test_quantile_edges_interpolate() {
        let edges = quantile_edges(&[1.0, 10.0, 30.0], 4);
        assert_eq!(edges, vec![1.0, 5.5, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_quantile_edges_exact_positions() {
        let edges = quantile_edges(&[1.0, 2.0, 3.0, 4.0, 5.0], 4);
        assert_eq!(edges, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_quantile_bins_by_value() {
        // Edges 1, 2, 3, 4, 5: [1, 2) [2, 3) [3, 4) [4, 5]
        let bins = quantile_bins(&[5.0, 1.0, 3.0, 2.0, 4.0], 4, RankMethod::Value, Metric::Monetary)
            .unwrap();
        assert_eq!(bins, vec![4, 1, 3, 2, 4]);
    }

    #[test]
    fn test_first_ranks_break_ties_by_position() {
        assert_eq!(first_ranks(&[3.0, 1.0, 3.0, 1.0]), vec![3.0, 1.0, 4.0, 2.0]);
    }

    #[test]
    fn test_rank_binning_survives_heavy_ties() {
        let values = vec![1.0; 8];
        assert!(quantile_bins(&values, 4, RankMethod::Value, Metric::Frequency).is_err());

        let bins = quantile_bins(&values, 4, RankMethod::First, Metric::Frequency).unwrap();
        assert_eq!(bins, vec![1, 1, 2, 2, 3, 3, 4, 4]);
    }

    #[test]
    fn test_degenerate_reports_metric_and_populated_bins() {
        let err = quantile_bins(&[7.0, 7.0, 7.0, 7.0, 9.0], 4, RankMethod::Value, Metric::Monetary)
            .unwrap_err();
        match err {
            RfmError::DegenerateDistribution {
                metric,
                bins,
                populated_bins,
            } => {
                assert_eq!(metric, Metric::Monetary);
                assert_eq!(bins, 4);
                assert_eq!(populated_bins, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_repeated_low_edge_counts_empty_bins() {
        // Edges 5, 5, 15, 32.5, 50: nothing is below the first interior edge
        let err = quantile_bins(
            &[5.0, 5.0, 5.0, 10.0, 20.0, 30.0, 40.0, 50.0],
            4,
            RankMethod::Value,
            Metric::Monetary,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RfmError::DegenerateDistribution {
                populated_bins: 3,
                ..
            }
        ));
        assert!(err.to_string().contains("only 3 of 4"));
    }

    #[test]
    fn test_repeated_top_edge_still_fills_every_bin() {
        // Edges 1, 2, 3, 9, 9
        let bins = quantile_bins(&[1.0, 2.0, 3.0, 9.0, 9.0], 4, RankMethod::Value, Metric::Recency)
            .unwrap();
        assert_eq!(bins, vec![1, 2, 3, 4, 4]);
    }

    #[test]
    fn test_interior_edge_values_go_to_upper_bin() {
        // Edges 1, 5.5, 10, 20, 30: 10 sits on the middle edge
        let bins = quantile_bins(&[10.0, 1.0, 30.0], 4, RankMethod::Value, Metric::Recency).unwrap();
        assert_eq!(bins, vec![3, 1, 4]);
    }

    #[test]
    fn test_quantile_edges_empty() {
        assert!(quantile_edges(&[], 4).is_empty());
    }

    #[test]
    fn test_single_bin() {
        let bins = quantile_bins(&[3.0, 1.0, 2.0], 1, RankMethod::Value, Metric::Recency).unwrap();
        assert_eq!(bins, vec![1, 1, 1]);
    }

    #[test]
    fn test_invalid_bin_counts() {
        for bad in [0, 10, 42] {
            assert!(matches!(
                quantile_bins(&[1.0, 2.0], bad, RankMethod::Value, Metric::Recency),
                Err(RfmError::InvalidBinCount(b)) if b == bad
            ));
        }
    }

    #[test]
    fn test_empty_values() {
        assert!(quantile_bins(&[], 4, RankMethod::Value, Metric::Recency)
            .unwrap()
            .is_empty());
    }
}
