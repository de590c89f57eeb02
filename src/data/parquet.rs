//! Parquet edge tables

use crate::data::ParseError;
use crate::graph::{Graph, GraphBuilder};
use polars::prelude::*;
use std::path::Path;

/// Load an undirected graph from a Parquet table with one edge per row.
///
/// Endpoint columns may be of any type castable to string; rows with a null
/// endpoint are skipped.
pub fn load_edge_table<P: AsRef<Path>>(
    path: P,
    src_col: &str,
    dst_col: &str,
) -> Result<Graph, ParseError> {
    let path = path.as_ref();
    log::info!("Reading parquet file: {}", path.display());

    if !path.exists() {
        return Err(ParseError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("file not found: {}", path.display()),
        )));
    }

    let df = LazyFrame::scan_parquet(path, Default::default())?
        .select([
            col(src_col).cast(DataType::String),
            col(dst_col).cast(DataType::String),
        ])
        .collect()?;

    log::info!("Loaded {} edge rows", df.height());

    let src = df.column(src_col)?.str()?;
    let dst = df.column(dst_col)?.str()?;

    let mut builder = GraphBuilder::with_capacity(df.height());
    let mut skipped = 0usize;
    for (s, d) in src.into_iter().zip(dst.into_iter()) {
        match (s, d) {
            (Some(s), Some(d)) => builder.add_edge(s, d),
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        log::debug!("Skipped {} rows with null endpoints", skipped);
    }

    let graph = builder.build();
    log::info!("Loaded graph with {} nodes and {} edges", graph.n(), graph.m());
    Ok(graph)
}
