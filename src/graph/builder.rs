//! Graph construction module

use crate::error::{MetricError, MetricResult};
use crate::graph::Graph;
use std::collections::HashMap;

/// Builder for incrementally constructing an undirected [`Graph`]
pub struct GraphBuilder {
    /// Number of nodes
    node_count: usize,

    /// Mapping from external names to node indices
    id_to_index: HashMap<String, u32>,

    /// Node external names
    node_ids: Vec<String>,

    /// Adjacency lists for each node (both directions)
    adjacency_lists: Vec<Vec<u32>>,

    self_loops: usize,
}

impl GraphBuilder {
    /// Create a new graph builder with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            node_count: 0,
            id_to_index: HashMap::with_capacity(capacity),
            node_ids: Vec::with_capacity(capacity),
            adjacency_lists: Vec::with_capacity(capacity),
            self_loops: 0,
        }
    }

    /// Create a builder over `node_count` nodes named `"0"` to `"n-1"`
    pub fn with_nodes(node_count: usize) -> Self {
        let mut builder = Self::with_capacity(node_count);
        for i in 0..node_count {
            builder.get_or_create_node(&i.to_string());
        }
        builder
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Get or create a node ID for the given external name
    pub fn get_or_create_node(&mut self, id: &str) -> u32 {
        if let Some(&idx) = self.id_to_index.get(id) {
            return idx;
        }

        let idx = self.node_count as u32;
        self.id_to_index.insert(id.to_string(), idx);
        self.node_ids.push(id.to_string());
        self.adjacency_lists.push(Vec::new());
        self.node_count += 1;

        idx
    }

    /// Add an undirected edge between two named nodes
    pub fn add_edge(&mut self, src_id: &str, dst_id: &str) {
        let src_idx = self.get_or_create_node(src_id);
        let dst_idx = self.get_or_create_node(dst_id);
        self.link(src_idx, dst_idx);
    }

    /// Add an undirected edge between two existing node indices
    pub fn add_edge_indices(&mut self, u: u32, v: u32) -> MetricResult<()> {
        for idx in [u, v] {
            if idx as usize >= self.node_count {
                return Err(MetricError::index_out_of_range(idx as usize, self.node_count));
            }
        }
        self.link(u, v);
        Ok(())
    }

    fn link(&mut self, u: u32, v: u32) {
        if u == v {
            self.self_loops += 1;
            return;
        }
        self.adjacency_lists[u as usize].push(v);
        self.adjacency_lists[v as usize].push(u);
    }

    /// Build the compressed graph; parallel edges collapse
    pub fn build(mut self) -> Graph {
        if self.self_loops > 0 {
            log::debug!("Dropped {} self-loops", self.self_loops);
        }

        for list in &mut self.adjacency_lists {
            list.sort_unstable();
            list.dedup();
        }

        let edge_count: usize = self.adjacency_lists.iter().map(|list| list.len()).sum();

        let mut offsets = Vec::with_capacity(self.node_count + 1);
        offsets.push(0);

        let mut offset = 0u64;
        for list in &self.adjacency_lists {
            offset += list.len() as u64;
            offsets.push(offset);
        }

        let mut edges = Vec::with_capacity(edge_count);
        for list in &self.adjacency_lists {
            edges.extend_from_slice(list);
        }

        let graph = Graph::from_parts(offsets, edges, self.node_ids);
        log::debug!("Built graph with {} nodes and {} edges", graph.n(), graph.m());
        graph
    }
}

impl Graph {
    /// Build a graph over nodes `0..node_count` from an edge list
    pub fn from_edges(node_count: usize, edges: &[(u32, u32)]) -> MetricResult<Graph> {
        let mut builder = GraphBuilder::with_nodes(node_count);
        for &(u, v) in edges {
            builder.add_edge_indices(u, v)?;
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_nodes_first_appearance() {
        let mut builder = GraphBuilder::with_capacity(4);
        builder.add_edge("a", "b");
        builder.add_edge("c", "a");
        builder.add_edge("b", "a");
        builder.add_edge("c", "c");
        let g = builder.build();

        assert_eq!(g.n(), 3);
        assert_eq!(g.m(), 2);
        assert_eq!(g.node_index("c"), Some(2));
        assert_eq!(g.node_name(1), Some("b"));
        assert_eq!(g.neighbors(0), &[1, 2]);
    }

    #[test]
    fn test_from_edges_rejects_unknown_index() {
        let err = Graph::from_edges(3, &[(0, 3)]).unwrap_err();
        assert!(matches!(err, MetricError::IndexOutOfRange { index: 3, universe: 3 }));
    }

    #[test]
    fn test_isolated_nodes_kept() {
        let g = Graph::from_edges(4, &[(0, 1)]).unwrap();
        assert_eq!(g.n(), 4);
        assert_eq!(g.degree(3), 0);
        assert_eq!(g.node_index("3"), Some(3));
    }
}
