//! Memory-efficient undirected graph representation

use crate::cluster::BitSet;
use crate::error::{MetricError, MetricResult};
use crate::graph::components::ComponentLabels;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::mem;
use std::sync::OnceLock;

/// Compressed sparse row representation of an undirected simple graph.
///
/// Every edge `{u, v}` is stored twice, once in each endpoint's neighbor
/// list, and neighbor lists are sorted. Edges additionally get a stable id
/// in `[0, m)`: edges are ordered by their lower endpoint, then by the
/// higher one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    node_count: usize,

    edge_count: usize,

    /// offsets[i] to offsets[i+1] is the neighbor range of node i
    offsets: Vec<u64>,

    /// Concatenated sorted neighbor lists
    edges: Vec<u32>,

    /// upper_offsets[i] = number of edges whose lower endpoint is below i
    upper_offsets: Vec<u64>,

    /// External name of every node
    node_ids: Vec<String>,

    id_to_index: HashMap<String, u32>,

    #[serde(skip)]
    components: OnceLock<ComponentLabels>,
}

/// Aggregates over a node set gathered in a single adjacency pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeSetStats {
    /// Number of nodes in the set
    pub size: u64,
    /// Edges with both endpoints in the set
    pub intra_edges: u64,
    /// Edges with exactly one endpoint in the set
    pub boundary_edges: u64,
    /// Smallest number of in-set neighbors over the members (0 if empty)
    pub min_internal_degree: u64,
}

impl NodeSetStats {
    /// Sum of member degrees
    pub fn volume(&self) -> u64 {
        2 * self.intra_edges + self.boundary_edges
    }
}

/// Headline numbers for a graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSummary {
    pub n: usize,
    pub m: usize,
    pub num_components: usize,
    pub largest_component: usize,
    pub avg_degree: f64,
    pub max_degree: usize,
}

/// Running count of edges whose lower endpoint is below each node.
/// `offsets` must be non-decreasing and end at `edges.len()`.
fn upper_prefix(offsets: &[u64], edges: &[u32]) -> Vec<u64> {
    let mut upper = Vec::with_capacity(offsets.len());
    upper.push(0);
    let mut acc = 0u64;
    for (node, range) in offsets.windows(2).enumerate() {
        let adj = &edges[range[0] as usize..range[1] as usize];
        acc += (adj.len() - adj.partition_point(|&v| v as usize <= node)) as u64;
        upper.push(acc);
    }
    upper
}

impl Graph {
    /// Assemble a graph from sorted, symmetric, deduplicated adjacency.
    /// Callers go through [`crate::graph::builder::GraphBuilder`].
    pub(crate) fn from_parts(offsets: Vec<u64>, edges: Vec<u32>, node_ids: Vec<String>) -> Self {
        let node_count = offsets.len().saturating_sub(1);
        let edge_count = edges.len() / 2;

        let upper_offsets = upper_prefix(&offsets, &edges);

        let id_to_index = node_ids
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i as u32))
            .collect();

        Self {
            node_count,
            edge_count,
            offsets,
            edges,
            upper_offsets,
            node_ids,
            id_to_index,
            components: OnceLock::new(),
        }
    }

    /// Number of nodes
    pub fn n(&self) -> usize {
        self.node_count
    }

    /// Number of undirected edges
    pub fn m(&self) -> usize {
        self.edge_count
    }

    /// Sorted neighbors of a node
    pub fn neighbors(&self, node: usize) -> &[u32] {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        &self.edges[start..end]
    }

    /// Neighbors with a larger id than `node`
    fn upper_neighbors(&self, node: usize) -> &[u32] {
        let adj = self.neighbors(node);
        &adj[adj.partition_point(|&v| v as usize <= node)..]
    }

    pub fn degree(&self, node: usize) -> usize {
        (self.offsets[node + 1] - self.offsets[node]) as usize
    }

    /// Check if `{u, v}` is an edge
    pub fn has_edge(&self, u: usize, v: u32) -> bool {
        self.neighbors(u).binary_search(&v).is_ok()
    }

    /// External name of a node
    pub fn node_name(&self, node: usize) -> Option<&str> {
        self.node_ids.get(node).map(String::as_str)
    }

    /// Node id for an external name
    pub fn node_index(&self, name: &str) -> Option<u32> {
        self.id_to_index.get(name).copied()
    }

    /// Validate CSR invariants, used after deserializing a snapshot.
    ///
    /// Offsets must start at zero, never decrease and end at the edge count;
    /// every neighbor list must be strictly increasing, in range, free of
    /// self-loops and mirrored by the other endpoint. Edge ids and the name
    /// index must agree with the adjacency.
    pub(crate) fn is_consistent(&self) -> bool {
        let n = self.node_count;
        let shape_ok = self.offsets.len() == n + 1
            && self.upper_offsets.len() == n + 1
            && self.node_ids.len() == n
            && self.offsets.first() == Some(&0)
            && self.offsets.last().copied() == Some(self.edges.len() as u64)
            && self.edges.len() == 2 * self.edge_count
            && self.offsets.windows(2).all(|w| w[0] <= w[1]);
        if !shape_ok {
            return false;
        }

        // offsets are in bounds from here on, so slicing cannot panic
        let adjacency_ok = (0..n).all(|u| {
            let adj = self.neighbors(u);
            adj.windows(2).all(|w| w[0] < w[1])
                && adj
                    .iter()
                    .all(|&v| (v as usize) < n && v as usize != u && self.has_edge(v as usize, u as u32))
        });

        adjacency_ok
            && upper_prefix(&self.offsets, &self.edges) == self.upper_offsets
            && self.id_to_index.len() == n
            && self
                .node_ids
                .iter()
                .enumerate()
                .all(|(i, name)| self.id_to_index.get(name) == Some(&(i as u32)))
    }

    fn check_universe(&self, nodes: &BitSet) -> MetricResult<()> {
        if nodes.universe_size() != self.node_count {
            return Err(MetricError::universe_mismatch(
                nodes.universe_size(),
                self.node_count,
            ));
        }
        Ok(())
    }

    /// Count edges with both endpoints in `nodes`
    pub fn covered_edges(&self, nodes: &BitSet) -> MetricResult<u64> {
        self.check_universe(nodes)?;
        Ok(nodes
            .iter()
            .map(|u| {
                self.upper_neighbors(u)
                    .iter()
                    .filter(|&&v| nodes.contains(v as usize))
                    .count() as u64
            })
            .sum())
    }

    /// Sum of degrees of the members of `nodes`
    pub fn degree_sum(&self, nodes: &BitSet) -> MetricResult<u64> {
        self.check_universe(nodes)?;
        Ok(nodes.iter().map(|u| self.degree(u) as u64).sum())
    }

    /// Count edges with exactly one endpoint in `nodes`
    pub fn boundary_edges(&self, nodes: &BitSet) -> MetricResult<u64> {
        Ok(self.node_set_stats(nodes)?.boundary_edges)
    }

    /// Size, intra edges, boundary edges and minimum internal degree
    pub fn node_set_stats(&self, nodes: &BitSet) -> MetricResult<NodeSetStats> {
        self.check_universe(nodes)?;
        let mut size = 0u64;
        let mut internal_total = 0u64;
        let mut boundary = 0u64;
        let mut min_internal: Option<u64> = None;

        for u in nodes.iter() {
            let adj = self.neighbors(u);
            let internal = adj.iter().filter(|&&v| nodes.contains(v as usize)).count() as u64;
            size += 1;
            internal_total += internal;
            boundary += adj.len() as u64 - internal;
            min_internal = Some(min_internal.map_or(internal, |m| m.min(internal)));
        }

        Ok(NodeSetStats {
            size,
            intra_edges: internal_total / 2,
            boundary_edges: boundary,
            min_internal_degree: min_internal.unwrap_or(0),
        })
    }

    /// Ids of the edges with both endpoints in `nodes`, as a set over `[0, m)`
    pub fn covered_edge_ids(&self, nodes: &BitSet) -> MetricResult<BitSet> {
        self.check_universe(nodes)?;
        let mut covered = BitSet::empty(self.edge_count);
        for u in nodes.iter() {
            let base = self.upper_offsets[u] as usize;
            for (offset, &v) in self.upper_neighbors(u).iter().enumerate() {
                if nodes.contains(v as usize) {
                    covered.insert(base + offset)?;
                }
            }
        }
        Ok(covered)
    }

    /// Connected component labels, computed on first use
    pub fn components(&self) -> &ComponentLabels {
        self.components
            .get_or_init(|| ComponentLabels::compute(self))
    }

    pub fn num_components(&self) -> usize {
        self.components().sizes.len()
    }

    /// Size of the largest connected component (0 for an empty graph)
    pub fn largest_component(&self) -> usize {
        self.components().sizes.iter().max().copied().unwrap_or(0) as usize
    }

    pub fn summary(&self) -> GraphSummary {
        let max_degree = (0..self.node_count).map(|u| self.degree(u)).max().unwrap_or(0);
        let avg_degree = if self.node_count == 0 {
            0.0
        } else {
            2.0 * self.edge_count as f64 / self.node_count as f64
        };
        GraphSummary {
            n: self.node_count,
            m: self.edge_count,
            num_components: self.num_components(),
            largest_component: self.largest_component(),
            avg_degree,
            max_degree,
        }
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        let base = mem::size_of::<Self>();
        let offsets = (self.offsets.capacity() + self.upper_offsets.capacity()) * mem::size_of::<u64>();
        let edges = self.edges.capacity() * mem::size_of::<u32>();
        let ids = self.node_ids.iter().map(|s| s.capacity()).sum::<usize>();

        base + offsets + edges + ids
    }
}
