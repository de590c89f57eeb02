//! Connected component labelling

use crate::graph::Graph;
use serde::{Deserialize, Serialize};

/// Union-Find data structure for connected component analysis
pub struct DisjointSets {
    /// Parent pointers (parent[i] = parent of node i)
    parent: Vec<u32>,

    /// Size of each set (for union by size)
    rank: Vec<u32>,
}

impl DisjointSets {
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size as u32).collect(),
            rank: vec![1; size],
        }
    }

    /// Find the root of the set containing x with path halving
    pub fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grandparent = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grandparent;
            x = grandparent;
        }
        x
    }

    /// Union the sets containing x and y
    pub fn union(&mut self, x: u32, y: u32) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x == root_y {
            return;
        }

        // attach smaller tree under the larger one
        if self.rank[root_x as usize] > self.rank[root_y as usize] {
            self.parent[root_y as usize] = root_x;
            self.rank[root_x as usize] += self.rank[root_y as usize];
        } else {
            self.parent[root_x as usize] = root_y;
            self.rank[root_y as usize] += self.rank[root_x as usize];
        }
    }

    /// Get the size of the set containing x
    pub fn size(&mut self, x: u32) -> u32 {
        let root = self.find(x);
        self.rank[root as usize]
    }
}

/// Component id of every node plus the size of every component.
///
/// Component ids are dense and numbered in order of their smallest node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentLabels {
    pub labels: Vec<u32>,
    pub sizes: Vec<u32>,
}

impl ComponentLabels {
    pub fn compute(graph: &Graph) -> Self {
        let n = graph.n();
        let mut sets = DisjointSets::new(n);
        for u in 0..n {
            for &v in graph.neighbors(u) {
                if (v as usize) > u {
                    sets.union(u as u32, v);
                }
            }
        }

        let mut root_to_label = vec![u32::MAX; n];
        let mut labels = Vec::with_capacity(n);
        let mut sizes = Vec::new();
        for u in 0..n as u32 {
            let root = sets.find(u) as usize;
            if root_to_label[root] == u32::MAX {
                root_to_label[root] = sizes.len() as u32;
                sizes.push(sets.size(u));
            }
            labels.push(root_to_label[root]);
        }

        log::debug!("Labelled {} connected components", sizes.len());
        Self { labels, sizes }
    }
}
