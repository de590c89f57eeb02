//! Clustering-level statistics

use crate::cluster::metrics::{self, OverlapStats};
use crate::cluster::MembershipTable;
use crate::error::MetricResult;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Five-number summary plus mean of a size distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeDistribution {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl SizeDistribution {
    /// `None` for an empty input
    pub fn from_sizes(sizes: &[u64]) -> Option<Self> {
        if sizes.is_empty() {
            return None;
        }
        let values: Vec<f64> = sizes.iter().map(|&s| s as f64).collect();
        let mean = Statistics::mean(&values);
        let std_dev = if values.len() > 1 { Statistics::std_dev(&values) } else { 0.0 };
        let min = Statistics::min(&values);
        let max = Statistics::max(&values);
        let mut data = Data::new(values);
        Some(Self {
            min,
            q1: OrderStatistics::lower_quartile(&mut data),
            median: OrderStatistics::median(&mut data),
            q3: OrderStatistics::upper_quartile(&mut data),
            max,
            mean,
            std_dev,
        })
    }
}

/// Counts describing a whole membership table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringSummary {
    pub num_clusters: usize,
    pub num_singletons: usize,
    pub node_coverage: f64,
    pub overlap: OverlapStats,
    pub sizes: Option<SizeDistribution>,
}

impl ClusteringSummary {
    pub fn compute(table: &MembershipTable) -> MetricResult<Self> {
        let sizes = metrics::per_row_sizes(table);
        let overlap = metrics::overlap(table)?;
        let node_coverage = if table.universe_size() == 0 {
            0.0
        } else {
            overlap.covered_nodes as f64 / table.universe_size() as f64
        };
        Ok(Self {
            num_clusters: table.len(),
            num_singletons: sizes.iter().filter(|&&s| s == 1).count(),
            node_coverage,
            overlap,
            sizes: SizeDistribution::from_sizes(&sizes),
        })
    }
}
