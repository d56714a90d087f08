//! Standalone HTML document with an interactive vis.js network

use crate::api::constants::{browse_url, SUMMARY_LABEL_CHARS};
use crate::api::Issue;
use crate::graph::{truncate_label, Category, EdgeKind, Graph, GraphEdge, GraphNode};
use anyhow::{Context, Result};
use serde::Serialize;

const TEMPLATE: &str = include_str!("template.html");
const TITLE: &str = "Jira Issues and Network Graph";

/// Statuses that get their own border color
const STATUS_COLORS: &[(&str, &str)] = &[
    ("Open", "black"),
    ("In Progress", "yellow"),
    ("Done", "green"),
    ("Closed", "red"),
];

const FALLBACK_COLOR: &str = "gray";

pub fn category_color(category: Category) -> &'static str {
    match category {
        Category::Bug => "red",
        Category::Task => "blue",
        Category::Story => "green",
        Category::Epic => "orange",
        Category::TechDebt => "purple",
        Category::Parent | Category::Subtask | Category::Unknown => FALLBACK_COLOR,
    }
}

pub fn status_color(status: &str) -> &'static str {
    STATUS_COLORS
        .iter()
        .find(|(name, _)| *name == status)
        .map(|(_, color)| *color)
        .unwrap_or(FALLBACK_COLOR)
}

pub fn edge_color(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Parent => "blue",
        EdgeKind::Epic | EdgeKind::Subtask => "green",
    }
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[derive(Debug, Serialize)]
struct NodeColor {
    background: &'static str,
    border: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VisNode<'a> {
    id: &'a str,
    label: &'a str,
    title: &'a str,
    color: NodeColor,
    border_width: u32,
    url: &'a str,
}

impl<'a> From<&'a GraphNode> for VisNode<'a> {
    fn from(node: &'a GraphNode) -> Self {
        Self {
            id: &node.id,
            label: &node.label,
            title: &node.title,
            color: NodeColor {
                background: category_color(node.category),
                border: status_color(&node.status),
            },
            border_width: 4,
            url: &node.url,
        }
    }
}

#[derive(Debug, Serialize)]
struct VisEdge<'a> {
    from: &'a str,
    to: &'a str,
    label: &'static str,
    color: &'static str,
    width: u32,
}

impl<'a> From<&'a GraphEdge> for VisEdge<'a> {
    fn from(edge: &'a GraphEdge) -> Self {
        Self {
            from: &edge.source,
            to: &edge.target,
            label: edge.kind.as_str(),
            color: edge_color(edge.kind),
            width: 3,
        }
    }
}

/// JSON safe to inline inside a `<script>` element
fn script_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value).context("Failed to serialize graph data")?;
    Ok(json.replace("</", "<\\/"))
}

/// Substitute `{{NAME}}` placeholders in one pass; substituted text is never rescanned
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let value = after
            .find("}}")
            .and_then(|end| values.iter().find(|(name, _)| *name == &after[..end]).map(|(_, v)| (end, *v)));

        match value {
            Some((end, value)) => {
                output.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                output.push_str("{{");
                rest = after;
            }
        }
    }

    output.push_str(rest);
    output
}

pub struct HtmlRenderer {
    base_url: String,
}

impl HtmlRenderer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn render(&self, graph: &Graph, issues: &[Issue]) -> Result<String> {
        let nodes: Vec<VisNode> = graph.nodes().map(VisNode::from).collect();
        let edges: Vec<VisEdge> = graph.edges().iter().map(VisEdge::from).collect();

        let summary = format!(
            "{} issues, {} nodes, {} edges",
            issues.len(),
            graph.node_count(),
            graph.edge_count()
        );

        let nodes_json = script_json(&nodes)?;
        let edges_json = script_json(&edges)?;
        let issue_list = self.issue_list(issues);
        let category_legend = category_legend();
        let status_legend = status_legend();

        Ok(fill_template(
            TEMPLATE,
            &[
                ("TITLE", TITLE),
                ("SUMMARY", &summary),
                ("ISSUE_LIST", &issue_list),
                ("CATEGORY_LEGEND", &category_legend),
                ("STATUS_LEGEND", &status_legend),
                ("NODES_JSON", &nodes_json),
                ("EDGES_JSON", &edges_json),
            ],
        ))
    }

    fn issue_list(&self, issues: &[Issue]) -> String {
        issues
            .iter()
            .map(|issue| {
                format!(
                    "            <li><a href=\"{}\" target=\"_blank\">{}: {}</a></li>",
                    escape_html(&browse_url(&self.base_url, &issue.key)),
                    escape_html(&issue.key),
                    escape_html(&truncate_label(&issue.summary, SUMMARY_LABEL_CHARS))
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Categories with a color of their own; the gray ones are left out
fn category_legend() -> String {
    Category::ALL
        .iter()
        .filter(|category| category_color(**category) != FALLBACK_COLOR)
        .map(|category| {
            format!(
                "            <p><span style=\"color: {};\">&#9679;</span> {}</p>",
                category_color(*category),
                category.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn status_legend() -> String {
    STATUS_COLORS
        .iter()
        .map(|(status, color)| format!("            <p><span style=\"color: {};\">&#9632;</span> {}</p>", color, status))
        .collect::<Vec<_>>()
        .join("\n")
}
