//! Typed, deduplicated issue relationship graph

pub mod builder;
pub mod model;

pub use builder::{truncate_label, GraphBuilder};
pub use model::{Category, EdgeKind, Graph, GraphEdge, GraphNode, NodeOrigin};
