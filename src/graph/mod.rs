//! Graph representation and algorithms module

pub mod compressed;
pub mod builder;
pub mod components;

pub use builder::GraphBuilder;
pub use components::ComponentLabels;
pub use compressed::{Graph, GraphSummary, NodeSetStats};
