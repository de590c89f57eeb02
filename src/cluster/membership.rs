//! Cluster membership tables

use crate::cluster::BitSet;
use crate::error::{MetricError, MetricResult};
use crate::graph::Graph;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How nodes that appear in no cluster are handled when building a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SingletonMode {
    /// Keep only the given clusters
    Ignore,
    /// Put every uncovered node into one extra cluster
    #[default]
    AsIs,
    /// Give every uncovered node its own singleton cluster
    AutoPopulate,
}

impl FromStr for SingletonMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "ignore" => Ok(Self::Ignore),
            "asis" => Ok(Self::AsIs),
            "autopopulate" => Ok(Self::AutoPopulate),
            _ => Err(format!(
                "unknown singleton mode '{}' (expected ignore, as-is or auto-populate)",
                s
            )),
        }
    }
}

impl fmt::Display for SingletonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ignore => "ignore",
            Self::AsIs => "as-is",
            Self::AutoPopulate => "auto-populate",
        };
        f.write_str(name)
    }
}

/// One parsed cluster: an optional label and the ids of its nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRow {
    pub label: Option<String>,
    pub nodes: Vec<usize>,
}

impl ClusterRow {
    pub fn new(label: impl Into<String>, nodes: Vec<usize>) -> Self {
        Self {
            label: Some(label.into()),
            nodes,
        }
    }
}

/// A cluster of a [`MembershipTable`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Row position in the table
    pub cluster_id: usize,
    /// Input label; `None` for rows added by the singleton policy
    pub label: Option<String>,
    pub nodes: BitSet,
}

/// Ordered clusters over a common node universe
#[derive(Debug, Clone, Serialize)]
pub struct MembershipTable {
    universe: usize,
    mode: SingletonMode,
    rows: Vec<Membership>,
}

impl MembershipTable {
    pub fn rows(&self) -> &[Membership] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Node universe shared by every row
    pub fn universe_size(&self) -> usize {
        self.universe
    }

    /// Singleton policy the table was built with
    pub fn mode(&self) -> SingletonMode {
        self.mode
    }

    /// Node sets of every row, in order
    pub fn node_sets(&self) -> impl Iterator<Item = &BitSet> + '_ {
        self.rows.iter().map(|row| &row.nodes)
    }
}

/// Build a membership table over the nodes of `graph`.
///
/// Input clusters keep their order; rows synthesized by `mode` follow in
/// ascending node-id order.
pub fn read_membership<I>(graph: &Graph, clusters: I, mode: SingletonMode) -> MetricResult<MembershipTable>
where
    I: IntoIterator<Item = ClusterRow>,
{
    read_filtered_membership(graph, clusters, mode, 0)
}

/// Like [`read_membership`], but input clusters with fewer than
/// `min_cluster_size` distinct nodes are dropped before the singleton policy
/// runs, so their nodes count as uncovered.
pub fn read_filtered_membership<I>(
    graph: &Graph,
    clusters: I,
    mode: SingletonMode,
    min_cluster_size: usize,
) -> MetricResult<MembershipTable>
where
    I: IntoIterator<Item = ClusterRow>,
{
    let n = graph.n();
    let mut rows = Vec::new();
    let mut covered = BitSet::empty(n);
    let mut dropped = 0usize;

    for row in clusters {
        let nodes = BitSet::from_indices(row.nodes, n)?;
        if nodes.popcnt() < min_cluster_size {
            dropped += 1;
            continue;
        }
        covered.union_with(&nodes)?;
        rows.push(Membership {
            cluster_id: rows.len(),
            label: row.label,
            nodes,
        });
    }

    if dropped > 0 {
        log::info!("Dropped {} clusters below size {}", dropped, min_cluster_size);
    }

    let input_rows = rows.len();
    let uncovered = covered.complement();

    match mode {
        SingletonMode::Ignore => {}
        SingletonMode::AsIs => {
            if !uncovered.is_empty() {
                rows.push(Membership {
                    cluster_id: rows.len(),
                    label: None,
                    nodes: uncovered,
                });
            }
        }
        SingletonMode::AutoPopulate => {
            for node in uncovered.iter() {
                rows.push(Membership {
                    cluster_id: rows.len(),
                    label: None,
                    nodes: BitSet::from_indices([node], n)?,
                });
            }
        }
    }

    log::info!(
        "Built membership table with {} clusters ({} from input, mode {})",
        rows.len(),
        input_rows,
        mode
    );

    Ok(MembershipTable {
        universe: n,
        mode,
        rows,
    })
}

impl MembershipTable {
    /// Build a table directly from bitsets, without applying a singleton policy
    pub fn from_sets<I>(universe: usize, sets: I) -> MetricResult<Self>
    where
        I: IntoIterator<Item = (Option<String>, BitSet)>,
    {
        let mut rows = Vec::new();
        for (cluster_id, (label, nodes)) in sets.into_iter().enumerate() {
            if nodes.universe_size() != universe {
                return Err(MetricError::universe_mismatch(nodes.universe_size(), universe));
            }
            rows.push(Membership {
                cluster_id,
                label,
                nodes,
            });
        }
        Ok(Self {
            universe,
            mode: SingletonMode::Ignore,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> Graph {
        Graph::from_edges(6, &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5)]).unwrap()
    }

    fn clusters() -> Vec<ClusterRow> {
        vec![ClusterRow::new("a", vec![0, 1, 2])]
    }

    #[test]
    fn test_ignore_keeps_input_only() {
        let table = read_membership(&graph(), clusters(), SingletonMode::Ignore).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].label.as_deref(), Some("a"));
        assert_eq!(table.mode(), SingletonMode::Ignore);
    }

    #[test]
    fn test_as_is_groups_leftovers() {
        let table = read_membership(&graph(), clusters(), SingletonMode::AsIs).unwrap();
        assert_eq!(table.len(), 2);
        let leftover = &table.rows()[1];
        assert_eq!(leftover.cluster_id, 1);
        assert!(leftover.label.is_none());
        assert_eq!(leftover.nodes.iter().collect::<Vec<_>>(), vec![3, 4, 5]);
    }

    #[test]
    fn test_as_is_without_leftovers_adds_nothing() {
        let rows = vec![ClusterRow::new("a", vec![0, 1, 2]), ClusterRow::new("b", vec![3, 4, 5])];
        let table = read_membership(&graph(), rows, SingletonMode::AsIs).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_autopopulate_singletons_ascending() {
        let table = read_membership(&graph(), clusters(), SingletonMode::AutoPopulate).unwrap();
        assert_eq!(table.len(), 4);
        let singles: Vec<Vec<usize>> = table.rows()[1..]
            .iter()
            .map(|row| row.nodes.iter().collect())
            .collect();
        assert_eq!(singles, vec![vec![3], vec![4], vec![5]]);
        assert!(table.rows().iter().enumerate().all(|(i, r)| r.cluster_id == i));
    }

    #[test]
    fn test_overlap_allowed_and_out_of_range_rejected() {
        let rows = vec![ClusterRow::new("a", vec![0, 1]), ClusterRow::new("b", vec![1, 2])];
        assert!(read_membership(&graph(), rows, SingletonMode::Ignore).is_ok());

        let rows = vec![ClusterRow::new("a", vec![0, 6])];
        let err = read_membership(&graph(), rows, SingletonMode::AsIs).unwrap_err();
        assert!(matches!(err, MetricError::IndexOutOfRange { index: 6, universe: 6 }));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("ignore".parse::<SingletonMode>().unwrap(), SingletonMode::Ignore);
        assert_eq!("AsIs".parse::<SingletonMode>().unwrap(), SingletonMode::AsIs);
        assert_eq!("as_is".parse::<SingletonMode>().unwrap(), SingletonMode::AsIs);
        assert_eq!("auto-populate".parse::<SingletonMode>().unwrap(), SingletonMode::AutoPopulate);
        assert!("bogus".parse::<SingletonMode>().is_err());
        assert_eq!(SingletonMode::default(), SingletonMode::AsIs);
    }

    #[test]
    fn test_min_size_counts_distinct_nodes() {
        let rows = vec![
            ClusterRow::new("dup", vec![3, 3]),
            ClusterRow::new("a", vec![0, 1, 2]),
            ClusterRow::new("pair", vec![4, 5, 5]),
        ];
        let table = read_filtered_membership(&graph(), rows, SingletonMode::Ignore, 2).unwrap();
        let labels: Vec<_> = table.rows().iter().map(|r| r.label.as_deref()).collect();
        assert_eq!(labels, vec![Some("a"), Some("pair")]);
        assert!(table.rows().iter().enumerate().all(|(i, r)| r.cluster_id == i));
    }

    #[test]
    fn test_dropped_nodes_fall_to_singleton_policy() {
        let rows = vec![ClusterRow::new("a", vec![0, 1, 2]), ClusterRow::new("b", vec![3, 3])];
        let table = read_filtered_membership(&graph(), rows, SingletonMode::AutoPopulate, 2).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.rows()[1].nodes.iter().collect::<Vec<_>>(), vec![3]);
        assert!(table.rows()[1].label.is_none());

        let rows = vec![ClusterRow::new("a", vec![0, 1, 2])];
        let unfiltered = read_filtered_membership(&graph(), rows, SingletonMode::AsIs, 0).unwrap();
        assert_eq!(unfiltered.len(), 2);
    }

    #[test]
    fn test_from_sets_checks_universe() {
        let sets = vec![(None, BitSet::empty(5))];
        assert!(MembershipTable::from_sets(6, sets).is_err());
    }
}
