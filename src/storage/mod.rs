//! Results persistence module

pub mod snapshot;

use anyhow::Result;
use crate::cluster::ClusteringSummary;
use crate::graph::GraphSummary;
use polars::prelude::*;
use serde_json::{json, to_string_pretty};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub use snapshot::{load_graph, save_graph};

/// Save analysis results to the specified directory
pub fn save_results(
    clusters: &mut DataFrame,
    graph_summary: &GraphSummary,
    clustering_summary: &ClusteringSummary,
    edge_coverage: u64,
    output_dir: &str,
) -> Result<()> {
    log::info!("Saving {} clusters to {}", clusters.height(), output_dir);

    fs::create_dir_all(output_dir)?;

    save_summary(graph_summary, clustering_summary, edge_coverage, output_dir)?;
    save_clusters(clusters, output_dir)?;

    log::info!("Results saved successfully");

    Ok(())
}

/// Save summary information
fn save_summary(
    graph_summary: &GraphSummary,
    clustering_summary: &ClusteringSummary,
    edge_coverage: u64,
    output_dir: &str,
) -> Result<()> {
    log::info!("Saving summary information");

    let path = Path::new(output_dir).join("summary.json");
    let mut file = File::create(path)?;

    let edge_coverage_ratio = if graph_summary.m == 0 {
        0.0
    } else {
        edge_coverage as f64 / graph_summary.m as f64
    };

    let summary = json!({
        "graph_stats": graph_summary,
        "cluster_stats": clustering_summary,
        "edge_coverage": {
            "covered_edges": edge_coverage,
            "ratio": edge_coverage_ratio,
        }
    });

    file.write_all(to_string_pretty(&summary)?.as_bytes())?;

    Ok(())
}

/// Save the per-cluster table as Parquet
fn save_clusters(clusters: &mut DataFrame, output_dir: &str) -> Result<()> {
    log::info!("Saving per-cluster metrics");

    let path = Path::new(output_dir).join("clusters.parquet");
    let file = File::create(path)?;
    ParquetWriter::new(file).finish(clusters)?;

    Ok(())
}
