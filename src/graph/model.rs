use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Node category derived from the issue type name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Bug,
    Task,
    Story,
    Epic,
    Parent,
    Subtask,
    #[serde(rename = "Tech Debt")]
    TechDebt,
    Unknown,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Bug,
        Category::Task,
        Category::Story,
        Category::Epic,
        Category::Parent,
        Category::Subtask,
        Category::TechDebt,
        Category::Unknown,
    ];

    /// Map a Jira issue type name; anything unrecognised is `Unknown`
    pub fn from_type_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "bug" => Category::Bug,
            "task" => Category::Task,
            "story" => Category::Story,
            "epic" => Category::Epic,
            "parent" => Category::Parent,
            "sub-task" | "subtask" => Category::Subtask,
            "tech debt" | "technical debt" => Category::TechDebt,
            _ => Category::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Bug => "Bug",
            Category::Task => "Task",
            Category::Story => "Story",
            Category::Epic => "Epic",
            Category::Parent => "Parent",
            Category::Subtask => "Subtask",
            Category::TechDebt => "Tech Debt",
            Category::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeKind {
    Parent,
    Epic,
    Subtask,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Parent => "Parent",
            EdgeKind::Epic => "Epic",
            EdgeKind::Subtask => "Subtask",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a node carries fetched data or was synthesised from a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeOrigin {
    Fetched,
    Stub,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    /// Hover text
    pub title: String,
    pub category: Category,
    pub status: String,
    pub url: String,
    pub origin: NodeOrigin,
}

impl GraphNode {
    pub fn is_stub(&self) -> bool {
        self.origin == NodeOrigin::Stub
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

/// Directed issue graph; nodes and edges keep creation order
#[derive(Debug, Clone, Default)]
pub struct Graph {
    order: Vec<String>,
    nodes: HashMap<String, GraphNode>,
    edges: Vec<GraphEdge>,
    edge_set: HashSet<GraphEdge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in first-creation order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn contains_edge(&self, source: &str, target: &str, kind: EdgeKind) -> bool {
        self.edges
            .iter()
            .any(|e| e.source == source && e.target == target && e.kind == kind)
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Insert or replace a fetched node. Keeps its original position.
    pub(crate) fn upsert_fetched(&mut self, node: GraphNode) {
        if !self.nodes.contains_key(&node.id) {
            self.order.push(node.id.clone());
        }
        self.nodes.insert(node.id.clone(), node);
    }

    /// Insert `node` only if the id is new; an existing node is never touched
    pub(crate) fn insert_if_absent(&mut self, node: GraphNode) {
        if self.nodes.contains_key(&node.id) {
            return;
        }
        self.order.push(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
    }

    /// Add an edge between existing nodes. Returns false for a duplicate or a
    /// dangling endpoint.
    pub(crate) fn add_edge(&mut self, source: &str, target: &str, kind: EdgeKind) -> bool {
        if !self.contains_node(source) || !self.contains_node(target) {
            return false;
        }
        let edge = GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            kind,
        };
        if !self.edge_set.insert(edge.clone()) {
            return false;
        }
        self.edges.push(edge);
        true
    }
}
