//! Cluster membership and scoring module

pub mod bitset;
pub mod membership;
pub mod metrics;
pub mod summary;

pub use bitset::BitSet;
pub use membership::{read_filtered_membership, read_membership, ClusterRow, Membership, MembershipTable, SingletonMode};
pub use metrics::{ClusterMetrics, OverlapStats, DEFAULT_RESOLUTION};
pub use summary::{ClusteringSummary, SizeDistribution};
