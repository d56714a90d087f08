//! Assemble the issue graph
//!
//! Issues are processed in fetch order. Each issue's own node is written as
//! fetched data; parents, epics and subtasks that are only referenced get a
//! stub node, which a later fetched issue with the same key replaces in place.

use super::model::{Category, EdgeKind, Graph, GraphNode, NodeOrigin};
use crate::api::constants::{browse_url, SUMMARY_LABEL_CHARS};
use crate::api::models::UNKNOWN;
use crate::api::{FieldMapping, Issue};
use log::debug;

/// Truncate to at most `max_chars` characters
pub fn truncate_label(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

pub struct GraphBuilder {
    base_url: String,
}

impl GraphBuilder {
    /// `base_url` is the Jira site that node URLs point into
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn build(&self, mapping: &FieldMapping, issues: &[Issue]) -> Graph {
        let epic_field = mapping.epic_field_id();
        let mut graph = Graph::new();

        for issue in issues {
            graph.upsert_fetched(self.fetched_node(issue));

            if let Some(parent) = &issue.parent {
                graph.insert_if_absent(self.stub_node(parent, parent, Category::Parent));
                graph.add_edge(parent, &issue.key, EdgeKind::Parent);
            }

            if let Some(epic) = issue.epic_link(epic_field) {
                graph.insert_if_absent(self.stub_node(&epic, &epic, Category::Epic));
                graph.add_edge(&epic, &issue.key, EdgeKind::Epic);
            }

            for subtask in &issue.subtasks {
                let label = subtask.summary.as_deref().unwrap_or(&subtask.key);
                graph.insert_if_absent(self.stub_node(&subtask.key, label, Category::Subtask));
                graph.add_edge(&issue.key, &subtask.key, EdgeKind::Subtask);
            }
        }

        debug!(
            "Built graph with {} nodes and {} edges from {} issues (epic field {})",
            graph.node_count(),
            graph.edge_count(),
            issues.len(),
            epic_field
        );
        graph
    }

    fn fetched_node(&self, issue: &Issue) -> GraphNode {
        GraphNode {
            id: issue.key.clone(),
            label: truncate_label(&issue.summary, SUMMARY_LABEL_CHARS),
            title: issue.key.clone(),
            category: Category::from_type_name(&issue.issue_type),
            status: issue.status.clone(),
            url: browse_url(&self.base_url, &issue.key),
            origin: NodeOrigin::Fetched,
        }
    }

    fn stub_node(&self, id: &str, label: &str, category: Category) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            label: truncate_label(label, SUMMARY_LABEL_CHARS),
            title: id.to_string(),
            category,
            status: UNKNOWN.to_string(),
            url: browse_url(&self.base_url, id),
            origin: NodeOrigin::Stub,
        }
    }
}
