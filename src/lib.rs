//! Cluster quality metrics over large graphs
//!
//! Clusters are held as dense bitsets over the node universe and scored
//! against a compressed adjacency graph (intra-cluster edges, CPM,
//! modularity), one cluster at a time or as polars columns.

pub mod config;
pub mod data;
pub mod error;
pub mod frame;
pub mod graph;
pub mod cluster;
pub mod storage;

pub use cluster::{read_filtered_membership, read_membership, BitSet, ClusterRow, MembershipTable, SingletonMode};
pub use error::{MetricError, MetricResult};
pub use graph::Graph;
