//! Graph and clustering input

pub mod clusters;
pub mod edgelist;
pub mod parquet;

use thiserror::Error;

/// Malformed or unreadable graph/cluster input
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("line {line}: node '{node}' is not in the graph")]
    UnknownNode { line: usize, node: String },

    #[error("edge table error: {0}")]
    Table(#[from] polars::prelude::PolarsError),
}

impl ParseError {
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            message: message.into(),
        }
    }
}
