//! Error types for the cluster metric engine

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised by bitset construction, membership building and scoring
#[derive(Debug, Error)]
pub enum MetricError {
    /// A node id outside `[0, universe)`
    #[error("node id {index} is out of range for a universe of {universe} nodes")]
    IndexOutOfRange {
        /// Offending node id
        index: usize,
        /// Size of the node universe
        universe: usize,
    },

    /// Two bitsets over different universes were combined
    #[error("universe mismatch: {left} vs {right}")]
    UniverseMismatch {
        left: usize,
        right: usize,
    },

    /// Serialized bitset whose words do not fit its universe
    #[error("malformed bitset: {words} words for a universe of {universe} nodes")]
    MalformedBitSet {
        universe: usize,
        words: usize,
    },

    /// Modularity is undefined on a graph without edges
    #[error("modularity is undefined for a graph with no edges")]
    DegenerateGraph,

    /// Failure inside the tabular layer
    #[error(transparent)]
    Frame(#[from] PolarsError),
}

impl MetricError {
    pub fn index_out_of_range(index: usize, universe: usize) -> Self {
        Self::IndexOutOfRange { index, universe }
    }

    pub fn universe_mismatch(left: usize, right: usize) -> Self {
        Self::UniverseMismatch { left, right }
    }
}

/// Result alias used throughout the metric engine
pub type MetricResult<T> = std::result::Result<T, MetricError>;
