//! Whitespace-separated edge list files

use crate::data::ParseError;
use crate::graph::{Graph, GraphBuilder};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Read an edge list: one `src dst` pair per line, extra columns ignored.
/// Blank lines and lines starting with `#` or `%` are skipped.
pub fn read_edge_list<R: Read>(reader: R) -> Result<Graph, ParseError> {
    let mut builder = GraphBuilder::with_capacity(1024);
    let mut lines_read = 0usize;

    for (idx, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('%') {
            continue;
        }
        let mut tokens = trimmed.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some(src), Some(dst)) => builder.add_edge(src, dst),
            _ => return Err(ParseError::malformed(idx + 1, "expected two node names")),
        }
        lines_read += 1;
    }

    log::debug!("Read {} edge lines", lines_read);
    Ok(builder.build())
}

/// Load a graph from an edge list file
pub fn load_edge_list<P: AsRef<Path>>(path: P) -> Result<Graph, ParseError> {
    log::info!("Reading edge list: {}", path.as_ref().display());
    let file = File::open(path)?;
    let graph = read_edge_list(file)?;
    log::info!("Loaded graph with {} nodes and {} edges", graph.n(), graph.m());
    Ok(graph)
}
