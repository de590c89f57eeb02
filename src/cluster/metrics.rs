//! Cluster quality metrics and table-wide reductions

use crate::cluster::{BitSet, MembershipTable};
use crate::error::{MetricError, MetricResult};
use crate::graph::{Graph, NodeSetStats};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Resolution used when the caller has no preference
pub const DEFAULT_RESOLUTION: f64 = 1.0;

/// Per-cluster scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterMetrics {
    pub size: u64,
    pub intra_edges: u64,
    pub boundary_edges: u64,
    pub min_internal_degree: u64,
    pub volume: u64,
    pub cpm: f64,
    pub modularity: f64,
}

/// Coverage and overlap of a membership table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapStats {
    /// Nodes in at least one cluster
    pub covered_nodes: u64,
    /// Sum of cluster sizes
    pub sum_of_sizes: u64,
    /// Nodes in two or more clusters
    pub overlapping_nodes: u64,
    /// Memberships beyond the first, summed over nodes
    pub excess_memberships: u64,
}

/// Number of unordered pairs among `k` nodes
#[inline]
fn pairs(k: u64) -> f64 {
    if k <= 1 {
        0.0
    } else {
        (k as f64) * ((k - 1) as f64) / 2.0
    }
}

/// CPM score from precomputed aggregates
pub fn calc_cpm(intra_edges: u64, size: u64, resolution: f64) -> f64 {
    intra_edges as f64 - resolution * pairs(size)
}

/// Modularity from precomputed aggregates; `total_edges` is the graph's `m`
pub fn calc_modularity(intra_edges: u64, volume: u64, total_edges: u64, resolution: f64) -> MetricResult<f64> {
    if total_edges == 0 {
        return Err(MetricError::DegenerateGraph);
    }
    let m = total_edges as f64;
    let expected = volume as f64 / (2.0 * m);
    Ok(intra_edges as f64 / m - resolution * expected * expected)
}

pub fn intra_edges(graph: &Graph, nodes: &BitSet) -> MetricResult<u64> {
    graph.covered_edges(nodes)
}

pub fn cpm(graph: &Graph, nodes: &BitSet, resolution: f64) -> MetricResult<f64> {
    let intra = intra_edges(graph, nodes)?;
    Ok(calc_cpm(intra, nodes.popcnt() as u64, resolution))
}

/// Sum of member degrees
pub fn volume(graph: &Graph, nodes: &BitSet) -> MetricResult<u64> {
    graph.degree_sum(nodes)
}

pub fn modularity(graph: &Graph, nodes: &BitSet, resolution: f64) -> MetricResult<f64> {
    if graph.m() == 0 {
        return Err(MetricError::DegenerateGraph);
    }
    let intra = intra_edges(graph, nodes)?;
    let vol = volume(graph, nodes)?;
    calc_modularity(intra, vol, graph.m() as u64, resolution)
}

/// All scores of one cluster from a single adjacency pass
pub fn score(graph: &Graph, nodes: &BitSet, resolution: f64) -> MetricResult<ClusterMetrics> {
    let stats = graph.node_set_stats(nodes)?;
    from_stats(&stats, graph.m() as u64, resolution)
}

fn from_stats(stats: &NodeSetStats, total_edges: u64, resolution: f64) -> MetricResult<ClusterMetrics> {
    Ok(ClusterMetrics {
        size: stats.size,
        intra_edges: stats.intra_edges,
        boundary_edges: stats.boundary_edges,
        min_internal_degree: stats.min_internal_degree,
        volume: stats.volume(),
        cpm: calc_cpm(stats.intra_edges, stats.size, resolution),
        modularity: calc_modularity(stats.intra_edges, stats.volume(), total_edges, resolution)?,
    })
}

/// Aggregates of every row, computed in parallel
pub fn table_stats(graph: &Graph, table: &MembershipTable) -> MetricResult<Vec<NodeSetStats>> {
    table
        .rows()
        .par_iter()
        .map(|row| graph.node_set_stats(&row.nodes))
        .collect()
}

/// Score every row of a table in parallel, in row order
pub fn score_table(graph: &Graph, table: &MembershipTable, resolution: f64) -> MetricResult<Vec<ClusterMetrics>> {
    log::info!(
        "Scoring {} clusters at resolution {}",
        table.len(),
        resolution
    );
    if graph.m() == 0 {
        return Err(MetricError::DegenerateGraph);
    }
    let total_edges = graph.m() as u64;
    table_stats(graph, table)?
        .iter()
        .map(|stats| from_stats(stats, total_edges, resolution))
        .collect()
}

/// Union of every cluster
pub fn union_all(table: &MembershipTable) -> MetricResult<BitSet> {
    let universe = table.universe_size();
    table
        .rows()
        .par_iter()
        .map(|row| Ok(row.nodes.clone()))
        .try_reduce(
            || BitSet::empty(universe),
            |mut acc, set| {
                acc.union_with(&set)?;
                Ok(acc)
            },
        )
}

pub fn per_row_sizes(table: &MembershipTable) -> Vec<u64> {
    table.node_sets().map(|s| s.popcnt() as u64).collect()
}

pub fn sum_of_sizes(table: &MembershipTable) -> u64 {
    table.node_sets().map(|s| s.popcnt() as u64).sum()
}

/// Coverage and overlap counts
pub fn overlap(table: &MembershipTable) -> MetricResult<OverlapStats> {
    let universe = table.universe_size();
    // once: nodes seen at least once, twice: at least twice
    let mut once = BitSet::empty(universe);
    let mut twice = BitSet::empty(universe);
    for set in table.node_sets() {
        let repeated = once.intersection(set)?;
        twice.union_with(&repeated)?;
        once.union_with(set)?;
    }

    let covered_nodes = once.popcnt() as u64;
    let sum = sum_of_sizes(table);
    Ok(OverlapStats {
        covered_nodes,
        sum_of_sizes: sum,
        overlapping_nodes: twice.popcnt() as u64,
        excess_memberships: sum - covered_nodes,
    })
}

/// Number of distinct graph edges with both endpoints in some cluster
pub fn edge_coverage(graph: &Graph, table: &MembershipTable) -> MetricResult<u64> {
    let edge_universe = graph.m();
    let covered = table
        .rows()
        .par_iter()
        .map(|row| graph.covered_edge_ids(&row.nodes))
        .try_reduce(
            || BitSet::empty(edge_universe),
            |mut acc, set| {
                acc.union_with(&set)?;
                Ok(acc)
            },
        )?;
    Ok(covered.popcnt() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{read_membership, ClusterRow, SingletonMode};

    const EPS: f64 = 1e-12;

    fn discont_graph() -> Graph {
        Graph::from_edges(6, &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5)]).unwrap()
    }

    fn path_graph() -> Graph {
        Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).unwrap()
    }

    fn set(indices: &[usize], n: usize) -> BitSet {
        BitSet::from_indices(indices.iter().copied(), n).unwrap()
    }

    #[test]
    fn test_cpm() {
        let g = discont_graph();
        let triangle = set(&[0, 1, 2], 6);
        assert!((cpm(&g, &triangle, 0.5).unwrap() - (3.0 - 0.5 * 3.0)).abs() < EPS);
        assert!((cpm(&g, &triangle, 0.0).unwrap() - 3.0).abs() < EPS);
    }

    #[test]
    fn test_cpm_degenerate_sets() {
        let g = discont_graph();
        for r in [0.0, 0.5, 1.0, 7.0] {
            assert_eq!(cpm(&g, &set(&[4], 6), r).unwrap(), 0.0);
            assert_eq!(cpm(&g, &BitSet::empty(6), r).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_full_set_modularity_on_connected_graph() {
        let g = path_graph();
        let all = BitSet::full(4);
        assert!(modularity(&g, &all, 1.0).unwrap().abs() < EPS);
        assert!((modularity(&g, &all, 0.25).unwrap() - 0.75).abs() < EPS);
    }

    #[test]
    fn test_modularity_value() {
        let g = discont_graph();
        // triangle: intra 3, volume 6, m 5 => 3/5 - (6/10)^2
        let q = modularity(&g, &set(&[0, 1, 2], 6), 1.0).unwrap();
        assert!((q - (0.6 - 0.36)).abs() < EPS);
    }

    #[test]
    fn test_modularity_edgeless_graph_fails() {
        let g = Graph::from_edges(3, &[]).unwrap();
        let err = modularity(&g, &BitSet::full(3), 1.0).unwrap_err();
        assert!(matches!(err, MetricError::DegenerateGraph));
        assert!(matches!(calc_modularity(0, 0, 0, 1.0), Err(MetricError::DegenerateGraph)));
    }

    #[test]
    fn test_volume_is_degree_sum() {
        let g = discont_graph();
        let nodes = set(&[2, 3, 4], 6);
        let stats = g.node_set_stats(&nodes).unwrap();
        assert_eq!(volume(&g, &nodes).unwrap(), 2 * stats.intra_edges + stats.boundary_edges);
    }

    #[test]
    fn test_score_table_matches_single_calls() {
        let g = discont_graph();
        let rows = vec![
            ClusterRow::new("a", vec![0, 1, 2]),
            ClusterRow::new("b", vec![2, 3]),
        ];
        let table = read_membership(&g, rows, SingletonMode::AsIs).unwrap();
        let scores = score_table(&g, &table, 0.5).unwrap();
        assert_eq!(scores.len(), table.len());
        for (row, s) in table.rows().iter().zip(&scores) {
            assert_eq!(s.intra_edges, intra_edges(&g, &row.nodes).unwrap());
            assert!((s.cpm - cpm(&g, &row.nodes, 0.5).unwrap()).abs() < EPS);
            assert!((s.modularity - modularity(&g, &row.nodes, 0.5).unwrap()).abs() < EPS);
            assert_eq!(*s, score(&g, &row.nodes, 0.5).unwrap());
        }
    }

    #[test]
    fn test_reductions_and_overlap() {
        let g = discont_graph();
        let rows = vec![
            ClusterRow::new("a", vec![0, 1, 2]),
            ClusterRow::new("b", vec![2, 3]),
            ClusterRow::new("c", vec![2, 3, 4]),
        ];
        let table = read_membership(&g, rows, SingletonMode::Ignore).unwrap();
        assert_eq!(per_row_sizes(&table), vec![3, 2, 3]);
        assert_eq!(sum_of_sizes(&table), 8);
        assert_eq!(union_all(&table).unwrap().popcnt(), 5);

        let stats = overlap(&table).unwrap();
        assert_eq!(stats.covered_nodes, 5);
        assert_eq!(stats.overlapping_nodes, 2);
        assert_eq!(stats.excess_memberships, 3);
    }

    #[test]
    fn test_union_all_of_empty_table() {
        let g = discont_graph();
        let table = read_membership(&g, Vec::new(), SingletonMode::Ignore).unwrap();
        let u = union_all(&table).unwrap();
        assert_eq!(u.universe_size(), 6);
        assert!(u.is_empty());
    }

    #[test]
    fn test_edge_coverage() {
        let g = discont_graph();
        let rows = vec![
            ClusterRow::new("a", vec![0, 1, 2]),
            ClusterRow::new("b", vec![1, 2]),
            ClusterRow::new("c", vec![3, 4]),
        ];
        let table = read_membership(&g, rows, SingletonMode::Ignore).unwrap();
        assert_eq!(edge_coverage(&g, &table).unwrap(), 4);
    }
}
