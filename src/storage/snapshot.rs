//! Binary graph snapshots

use crate::graph::Graph;
use anyhow::{anyhow, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serialize a graph with bincode
pub fn save_graph<P: AsRef<Path>>(graph: &Graph, path: P) -> Result<()> {
    let path = path.as_ref();
    log::info!("Saving graph snapshot to {}", path.display());
    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, graph)?;
    writer.flush()?;
    log::debug!("Snapshot holds about {} bytes of graph data", graph.memory_usage());
    Ok(())
}

/// Load a snapshot written by [`save_graph`]
pub fn load_graph<P: AsRef<Path>>(path: P) -> Result<Graph> {
    let path = path.as_ref();
    log::info!("Loading graph snapshot from {}", path.display());
    let file = File::open(path)?;
    // SAFETY: the mapping is read-only and dropped before returning
    let mmap = unsafe { Mmap::map(&file)? };
    let graph: Graph = bincode::deserialize(&mmap[..])?;
    if !graph.is_consistent() {
        return Err(anyhow!("corrupt graph snapshot: {}", path.display()));
    }
    log::info!("Loaded graph with {} nodes and {} edges", graph.n(), graph.m());
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        let g = Graph::from_edges(5, &[(0, 1), (1, 2), (3, 4)]).unwrap();
        save_graph(&g, &path).unwrap();

        let loaded = load_graph(&path).unwrap();
        assert_eq!(loaded.n(), 5);
        assert_eq!(loaded.m(), 3);
        assert_eq!(loaded.neighbors(1), g.neighbors(1));
        assert_eq!(loaded.node_index("4"), Some(4));
        assert_eq!(loaded.num_components(), 2);
    }

    #[test]
    fn test_corrupt_offsets_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        let g = Graph::from_edges(3, &[(0, 1), (1, 2)]).unwrap();
        let mut bytes = bincode::serialize(&g).unwrap();

        // node count, edge count and the offsets length precede offsets[0];
        // offsets[1] is the fifth u64
        assert_eq!(&bytes[32..40], &1u64.to_le_bytes());
        bytes[32..40].copy_from_slice(&4u64.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let err = load_graph(&path).unwrap_err();
        assert!(err.to_string().contains("corrupt graph snapshot"));
    }

    #[test]
    fn test_garbage_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.bin");
        std::fs::write(&path, b"not a graph").unwrap();
        assert!(load_graph(&path).is_err());
    }
}
