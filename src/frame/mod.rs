//! Tabular layer: cluster aggregates as polars columns
//!
//! Node sets stay as [`BitSet`] values on the Rust side; this module exposes
//! the typed column operations over them (`popcnt`, `union`,
//! `covered_edges`, `nodeset_to_list`), per-node columns (`cc_labels`,
//! `cc_size`, [`node_frame`]) and builds a [`DataFrame`] of per-cluster
//! aggregates that the expressions in [`exprs`] score lazily.

pub mod exprs;

use crate::cluster::metrics;
use crate::cluster::{BitSet, MembershipTable};
use crate::error::{MetricError, MetricResult};
use crate::graph::Graph;
use polars::prelude::*;
use rayon::prelude::*;

pub use exprs::{cpm, modularity, vol};

/// Column names of [`cluster_frame`]
pub mod columns {
    pub const LABEL: &str = "label";
    /// Cluster size
    pub const N: &str = "n";
    /// Intra-cluster edges
    pub const M: &str = "m";
    /// Boundary edges
    pub const C: &str = "c";
    /// Minimum internal degree
    pub const MCD: &str = "mcd";
    /// External names of the members
    pub const NODES: &str = "nodes";
}

/// Column names of [`node_frame`]
pub mod node_columns {
    pub const NODE: &str = "node";
    pub const DEGREE: &str = "degree";
    /// Ids of the clusters containing the node
    pub const CLUSTERS: &str = "clusters";
}

/// Population count of every set
pub fn popcnt(name: &str, sets: &[BitSet]) -> Series {
    let counts: Vec<u64> = sets.iter().map(|s| s.popcnt() as u64).collect();
    Series::new(name.into(), counts)
}

/// Row-reducing union of a column of sets
pub fn union(sets: &[BitSet], universe: usize) -> MetricResult<BitSet> {
    BitSet::union_all(sets, universe)
}

/// Intra-cluster edge count of every set
pub fn covered_edges(graph: &Graph, name: &str, sets: &[BitSet]) -> MetricResult<Series> {
    let counts = sets
        .par_iter()
        .map(|s| graph.covered_edges(s))
        .collect::<MetricResult<Vec<u64>>>()?;
    Ok(Series::new(name.into(), counts))
}

/// Edge-id set covered by every node set, for edge coverage reductions
pub fn covered_edge_sets(graph: &Graph, sets: &[BitSet]) -> MetricResult<Vec<BitSet>> {
    sets.par_iter().map(|s| graph.covered_edge_ids(s)).collect()
}

/// External node names of every set, as a list column
pub fn nodeset_to_list(graph: &Graph, name: &str, sets: &[BitSet]) -> MetricResult<Series> {
    let lists = sets
        .iter()
        .map(|set| {
            if set.universe_size() != graph.n() {
                return Err(MetricError::universe_mismatch(set.universe_size(), graph.n()));
            }
            let names: Vec<&str> = set
                .iter()
                .map(|u| graph.node_name(u).unwrap_or_default())
                .collect();
            Ok(Series::new(PlSmallStr::EMPTY, names))
        })
        .collect::<MetricResult<Vec<Series>>>()?;
    Ok(Series::new(name.into(), lists))
}

/// Connected-component label of every node id
pub fn cc_labels(graph: &Graph, name: &str, nodes: &[usize]) -> MetricResult<Series> {
    let labels = &graph.components().labels;
    let values = nodes
        .iter()
        .map(|&u| {
            labels
                .get(u)
                .copied()
                .ok_or_else(|| MetricError::index_out_of_range(u, graph.n()))
        })
        .collect::<MetricResult<Vec<u32>>>()?;
    Ok(Series::new(name.into(), values))
}

/// Size of every component label, as produced by [`cc_labels`]
pub fn cc_size(graph: &Graph, name: &str, components: &[u32]) -> MetricResult<Series> {
    let sizes = &graph.components().sizes;
    let values = components
        .iter()
        .map(|&c| {
            sizes
                .get(c as usize)
                .copied()
                .ok_or_else(|| MetricError::index_out_of_range(c as usize, sizes.len()))
        })
        .collect::<MetricResult<Vec<u32>>>()?;
    Ok(Series::new(name.into(), values))
}

/// One row per node with its external name and degree. With a table, a
/// `clusters` list column holds the ids of the rows containing the node.
pub fn node_frame(graph: &Graph, table: Option<&MembershipTable>) -> MetricResult<DataFrame> {
    let names: Vec<&str> = (0..graph.n())
        .map(|u| graph.node_name(u).unwrap_or_default())
        .collect();
    let degrees: Vec<u64> = (0..graph.n()).map(|u| graph.degree(u) as u64).collect();

    let mut df = df!(
        node_columns::NODE => names,
        node_columns::DEGREE => degrees
    )?;

    if let Some(table) = table {
        if table.universe_size() != graph.n() {
            return Err(MetricError::universe_mismatch(table.universe_size(), graph.n()));
        }
        let mut memberships: Vec<Vec<u64>> = vec![Vec::new(); graph.n()];
        for row in table.rows() {
            for u in row.nodes.iter() {
                memberships[u].push(row.cluster_id as u64);
            }
        }
        let lists: Vec<Series> = memberships
            .into_iter()
            .map(|ids| Series::new(PlSmallStr::EMPTY, ids))
            .collect();
        df.with_column(Series::new(node_columns::CLUSTERS.into(), lists))?;
    }
    Ok(df)
}

/// One row per cluster with `label`, `n`, `m`, `c`, `mcd` and the member
/// names in `nodes`
pub fn cluster_frame(graph: &Graph, table: &MembershipTable) -> MetricResult<DataFrame> {
    let stats = metrics::table_stats(graph, table)?;

    let labels: Vec<Option<String>> = table.rows().iter().map(|r| r.label.clone()).collect();
    let n: Vec<u64> = stats.iter().map(|s| s.size).collect();
    let m: Vec<u64> = stats.iter().map(|s| s.intra_edges).collect();
    let c: Vec<u64> = stats.iter().map(|s| s.boundary_edges).collect();
    let mcd: Vec<u64> = stats.iter().map(|s| s.min_internal_degree).collect();

    let sets: Vec<BitSet> = table.node_sets().cloned().collect();
    let nodes = nodeset_to_list(graph, columns::NODES, &sets)?;

    let mut df = df!(
        columns::LABEL => labels,
        columns::N => n,
        columns::M => m,
        columns::C => c,
        columns::MCD => mcd
    )?;
    df.with_column(nodes)?;
    log::debug!("Built cluster frame with {} rows", df.height());
    Ok(df)
}

/// Append `cpm_{r}` and `modularity_{r}` columns for every resolution
pub fn with_scores(df: DataFrame, total_edges: u64, resolutions: &[f64]) -> MetricResult<DataFrame> {
    let mut exprs = Vec::with_capacity(resolutions.len() * 2);
    for &r in resolutions {
        exprs.push(cpm(r).alias(format!("cpm_{}", r)));
        exprs.push(modularity(total_edges, r)?.alias(format!("modularity_{}", r)));
    }
    Ok(df.lazy().with_columns(exprs).collect()?)
}
