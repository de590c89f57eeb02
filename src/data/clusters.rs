//! Cluster file parsing
//!
//! Three layouts are understood:
//! - `pairs`: one `node<sep>label` membership per line, grouped by label in
//!   order of first appearance (overlapping clusters list a node twice)
//! - `lists`: one cluster per line, `label node node ...`
//! - `json`: JSON lines, `{"label": .., "nodes": [..]}`
//!
//! Parsing only produces node names; [`resolve`] maps them onto a graph.

use crate::cluster::ClusterRow;
use crate::data::ParseError;
use crate::graph::Graph;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

/// Layout of a cluster file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterFormat {
    #[default]
    Pairs,
    Lists,
    Json,
}

impl FromStr for ClusterFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pairs" | "membership" => Ok(Self::Pairs),
            "lists" => Ok(Self::Lists),
            "json" | "jsonl" => Ok(Self::Json),
            _ => Err(format!("unknown cluster format '{}' (expected pairs, lists or json)", s)),
        }
    }
}

/// A cluster as read from a file, before node names are resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCluster {
    pub label: Option<String>,
    /// Line on which the cluster first appears
    pub line: usize,
    pub nodes: Vec<String>,
}

/// Node names or labels in JSON may be numbers or strings
#[derive(Deserialize)]
#[serde(untagged)]
enum Name {
    Int(i64),
    Text(String),
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Name::Int(i) => write!(f, "{}", i),
            Name::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Deserialize)]
struct JsonCluster {
    #[serde(default)]
    label: Option<Name>,
    nodes: Vec<Name>,
}

fn content_lines<R: Read>(reader: R) -> impl Iterator<Item = Result<(usize, String), ParseError>> {
    BufReader::new(reader)
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| match line {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    None
                } else {
                    Some(Ok((idx + 1, trimmed.to_string())))
                }
            }
            Err(e) => Some(Err(ParseError::Io(e))),
        })
}

/// Parse `node<sep>label` lines
pub fn parse_membership_pairs<R: Read>(reader: R, sep: char) -> Result<Vec<ParsedCluster>, ParseError> {
    let mut clusters: Vec<ParsedCluster> = Vec::new();
    let mut by_label: HashMap<String, usize> = HashMap::new();

    for entry in content_lines(reader) {
        let (line_no, line) = entry?;
        let mut fields = line.split(sep).map(str::trim).filter(|f| !f.is_empty());
        let (node, label) = match (fields.next(), fields.next()) {
            (Some(node), Some(label)) => (node, label),
            _ => {
                return Err(ParseError::malformed(
                    line_no,
                    format!("expected 'node{}label'", sep.escape_default()),
                ))
            }
        };

        let idx = *by_label.entry(label.to_string()).or_insert_with(|| {
            clusters.push(ParsedCluster {
                label: Some(label.to_string()),
                line: line_no,
                nodes: Vec::new(),
            });
            clusters.len() - 1
        });
        clusters[idx].nodes.push(node.to_string());
    }

    Ok(clusters)
}

/// Parse `label node node ...` lines
pub fn parse_node_lists<R: Read>(reader: R) -> Result<Vec<ParsedCluster>, ParseError> {
    let mut clusters = Vec::new();
    for entry in content_lines(reader) {
        let (line_no, line) = entry?;
        let mut tokens = line.split_whitespace();
        let label = tokens
            .next()
            .ok_or_else(|| ParseError::malformed(line_no, "missing cluster label"))?;
        clusters.push(ParsedCluster {
            label: Some(label.to_string()),
            line: line_no,
            nodes: tokens.map(str::to_string).collect(),
        });
    }
    Ok(clusters)
}

/// Parse JSON lines of `{"label": .., "nodes": [..]}`
pub fn parse_json_lines<R: Read>(reader: R) -> Result<Vec<ParsedCluster>, ParseError> {
    let mut clusters = Vec::new();
    for entry in content_lines(reader) {
        let (line_no, line) = entry?;
        let parsed: JsonCluster = serde_json::from_str(&line)
            .map_err(|e| ParseError::malformed(line_no, e.to_string()))?;
        clusters.push(ParsedCluster {
            label: parsed.label.map(|l| l.to_string()),
            line: line_no,
            nodes: parsed.nodes.iter().map(Name::to_string).collect(),
        });
    }
    Ok(clusters)
}

/// Parse a cluster file in the given layout
pub fn read_cluster_file<P: AsRef<Path>>(
    path: P,
    format: ClusterFormat,
    sep: char,
) -> Result<Vec<ParsedCluster>, ParseError> {
    log::info!("Reading {:?} cluster file: {}", format, path.as_ref().display());
    let file = File::open(path)?;
    let clusters = match format {
        ClusterFormat::Pairs => parse_membership_pairs(file, sep)?,
        ClusterFormat::Lists => parse_node_lists(file)?,
        ClusterFormat::Json => parse_json_lines(file)?,
    };
    log::info!("Parsed {} clusters", clusters.len());
    Ok(clusters)
}

/// Map node names onto node ids of `graph`
pub fn resolve(graph: &Graph, parsed: Vec<ParsedCluster>) -> Result<Vec<ClusterRow>, ParseError> {
    parsed
        .into_iter()
        .map(|cluster| -> Result<ClusterRow, ParseError> {
            let nodes = cluster
                .nodes
                .iter()
                .map(|name| {
                    graph
                        .node_index(name)
                        .map(|idx| idx as usize)
                        .ok_or_else(|| ParseError::UnknownNode {
                            line: cluster.line,
                            node: name.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ClusterRow {
                label: cluster.label,
                nodes,
            })
        })
        .collect()
}
