//! Configuration management for the cluster metric engine

use crate::cluster::{SingletonMode, DEFAULT_RESOLUTION};
use crate::data::clusters::ClusterFormat;
use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

/// Default configuration for a scoring run
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resolutions to score CPM and modularity at
    pub resolutions: Vec<f64>,

    /// Handling of nodes absent from every cluster
    pub singleton_mode: SingletonMode,

    /// Layout of the cluster file
    pub cluster_format: ClusterFormat,

    /// Field separator for `pairs` cluster files
    pub separator: char,

    /// Drop input clusters smaller than this before scoring
    pub min_cluster_size: usize,

    /// Number of worker threads (0 = all cores)
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolutions: vec![DEFAULT_RESOLUTION],
            singleton_mode: SingletonMode::default(),
            cluster_format: ClusterFormat::default(),
            separator: '\t',
            min_cluster_size: 0,
            threads: 0,
        }
    }
}

impl Config {
    /// Create a new configuration with custom values
    pub fn new(
        resolutions: Vec<f64>,
        singleton_mode: SingletonMode,
        cluster_format: ClusterFormat,
        separator: char,
        min_cluster_size: usize,
        threads: usize,
    ) -> Self {
        Self {
            resolutions,
            singleton_mode,
            cluster_format,
            separator,
            min_cluster_size,
            threads,
        }
    }

    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Worker threads to use, resolving 0 to the number of cores
    pub fn worker_threads(&self) -> usize {
        if self.threads > 0 {
            self.threads
        } else {
            num_cpus::get()
        }
    }
}
