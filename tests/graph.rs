//! Graph assembly properties

mod common;

use common::BASE_URL;
use jira_graph::api::{FieldMapping, Issue};
use jira_graph::graph::{Category, EdgeKind, Graph, GraphBuilder, NodeOrigin};
use serde_json::{json, Value};
use std::collections::BTreeSet;

const EPIC_FIELD: &str = "customfield_10014";

fn mapping() -> FieldMapping {
    let mut mapping = FieldMapping::with_system_fields();
    mapping.insert("Epic Link", EPIC_FIELD);
    mapping
}

fn parse(record: Value) -> Issue {
    Issue::from_json(&record).unwrap()
}

fn story(key: &str, parent: Option<&str>, epic: Option<&str>, subtasks: &[(&str, &str)]) -> Issue {
    let subtasks: Vec<Value> = subtasks
        .iter()
        .map(|(key, summary)| json!({"key": key, "fields": {"summary": summary}}))
        .collect();
    let mut fields = json!({
        "issuetype": {"name": "Story"},
        "status": {"name": "In Progress"},
        "summary": format!("Story {}", key),
        "subtasks": subtasks,
    });
    if let Some(parent) = parent {
        fields["parent"] = json!({"key": parent});
    }
    fields[EPIC_FIELD] = epic.map(Value::from).unwrap_or(Value::Null);
    parse(json!({"key": key, "fields": fields}))
}

fn epic(key: &str) -> Issue {
    parse(json!({
        "key": key,
        "fields": {
            "issuetype": {"name": "Epic"},
            "status": {"name": "Done"},
            "summary": format!("Epic {}", key)
        }
    }))
}

fn build(issues: &[Issue]) -> Graph {
    GraphBuilder::new(BASE_URL).build(&mapping(), issues)
}

fn node_ids(graph: &Graph) -> BTreeSet<String> {
    graph.nodes().map(|n| n.id.clone()).collect()
}

fn edge_set(graph: &Graph) -> BTreeSet<(String, String, EdgeKind)> {
    graph
        .edges()
        .iter()
        .map(|e| (e.source.clone(), e.target.clone(), e.kind))
        .collect()
}

fn sample() -> Vec<Issue> {
    vec![
        story("PROJ-2", Some("PROJ-1"), Some("PROJ-100"), &[("PROJ-3", "Wire the button")]),
        story("PROJ-4", Some("PROJ-1"), Some("PROJ-100"), &[]),
        epic("PROJ-100"),
        story("PROJ-3", None, None, &[]),
    ]
}

/// Every edge endpoint is a node and every node id appears once
#[test]
fn test_edges_reference_unique_nodes() {
    let graph = build(&sample());

    let ids: Vec<String> = graph.nodes().map(|n| n.id.clone()).collect();
    assert_eq!(ids.len(), node_ids(&graph).len());

    for edge in graph.edges() {
        assert!(graph.contains_node(&edge.source), "missing source {}", edge.source);
        assert!(graph.contains_node(&edge.target), "missing target {}", edge.target);
    }
    assert_eq!(graph.edge_count(), edge_set(&graph).len());
}

/// Parent, epic and subtask references become typed edges in the right direction
#[test]
fn test_edge_kinds_and_direction() {
    let graph = build(&sample());

    assert!(graph.contains_edge("PROJ-1", "PROJ-2", EdgeKind::Parent));
    assert!(graph.contains_edge("PROJ-100", "PROJ-2", EdgeKind::Epic));
    assert!(graph.contains_edge("PROJ-2", "PROJ-3", EdgeKind::Subtask));
    assert!(graph.contains_edge("PROJ-1", "PROJ-4", EdgeKind::Parent));
    assert_eq!(graph.edge_count(), 5);
}

/// A referenced-only issue stays a stub with Unknown status
#[test]
fn test_stub_for_unfetched_parent() {
    let graph = build(&sample());

    let parent = graph.node("PROJ-1").unwrap();
    assert_eq!(parent.origin, NodeOrigin::Stub);
    assert_eq!(parent.category, Category::Parent);
    assert_eq!(parent.status, "Unknown");
    assert_eq!(parent.label, "PROJ-1");
    assert_eq!(parent.url, "https://acme.atlassian.net/browse/PROJ-1");
}

/// A stub created before its issue is fetched is upgraded in place
#[test]
fn test_stub_upgraded_in_place() {
    let graph = build(&sample());

    let epic = graph.node("PROJ-100").unwrap();
    assert_eq!(epic.origin, NodeOrigin::Fetched);
    assert_eq!(epic.status, "Done");
    assert_eq!(epic.label, "Epic PROJ-100");

    let subtask = graph.node("PROJ-3").unwrap();
    assert_eq!(subtask.origin, NodeOrigin::Fetched);
    assert_eq!(subtask.category, Category::Story);

    let order: Vec<&str> = graph.nodes().map(|n| n.id.as_str()).collect();
    assert_eq!(order, vec!["PROJ-2", "PROJ-1", "PROJ-100", "PROJ-3", "PROJ-4"]);
}

/// A later reference never downgrades a fetched node
#[test]
fn test_full_node_not_overwritten_by_reference() {
    let issues = vec![
        epic("PROJ-100"),
        story("PROJ-2", None, Some("PROJ-100"), &[]),
        story("PROJ-5", Some("PROJ-100"), None, &[]),
    ];
    let graph = build(&issues);

    let epic = graph.node("PROJ-100").unwrap();
    assert_eq!(epic.origin, NodeOrigin::Fetched);
    assert_eq!(epic.category, Category::Epic);
    assert_eq!(epic.status, "Done");
}

/// Subtask stubs carry the subtask's own summary
#[test]
fn test_subtask_stub_label() {
    let long = "s".repeat(80);
    let issues = vec![story("PROJ-2", None, None, &[("PROJ-7", long.as_str()), ("PROJ-8", "Short")])];
    let graph = build(&issues);

    let subtask = graph.node("PROJ-7").unwrap();
    assert_eq!(subtask.origin, NodeOrigin::Stub);
    assert_eq!(subtask.category, Category::Subtask);
    assert_eq!(subtask.label.chars().count(), 64);
    assert_eq!(graph.node("PROJ-8").unwrap().label, "Short");
}

/// Building twice yields identical nodes and edges
#[test]
fn test_idempotent() {
    let issues = sample();

    let first = build(&issues);
    let second = build(&issues);

    assert_eq!(first.nodes().cloned().collect::<Vec<_>>(), second.nodes().cloned().collect::<Vec<_>>());
    assert_eq!(first.edges(), second.edges());
}

/// Node and edge membership does not depend on issue order
#[test]
fn test_order_independent_membership() {
    let issues = sample();
    let mut reversed = issues.clone();
    reversed.reverse();

    let forward = build(&issues);
    let backward = build(&reversed);

    assert_eq!(node_ids(&forward), node_ids(&backward));
    assert_eq!(edge_set(&forward), edge_set(&backward));
    for node in forward.nodes() {
        let other = backward.node(&node.id).unwrap();
        assert_eq!(node.origin, other.origin, "origin differs for {}", node.id);
        assert_eq!(node.status, other.status, "status differs for {}", node.id);
    }
}

/// A 100-character summary becomes a 64-character label
#[test]
fn test_label_truncation() {
    let summary = "x".repeat(100);
    let issue = parse(json!({
        "key": "PROJ-9",
        "fields": {"issuetype": {"name": "Bug"}, "status": {"name": "Open"}, "summary": summary}
    }));

    let graph = build(&[issue]);

    let node = graph.node("PROJ-9").unwrap();
    assert_eq!(node.label.chars().count(), 64);
    assert_eq!(node.title, "PROJ-9");
    assert_eq!(node.category, Category::Bug);
}

/// Without a resolved epic field, `epiclink` is read
#[test]
fn test_default_epic_field() {
    let issue = parse(json!({
        "key": "PROJ-2",
        "fields": {"issuetype": {"name": "Task"}, "status": {"name": "Open"}, "summary": "t", "epiclink": "PROJ-50"}
    }));

    let graph = GraphBuilder::new(BASE_URL).build(&FieldMapping::with_system_fields(), &[issue]);

    assert!(graph.contains_edge("PROJ-50", "PROJ-2", EdgeKind::Epic));
    assert_eq!(graph.node("PROJ-50").unwrap().category, Category::Epic);
}

/// Null epic, no parent, no subtasks: a lone node
#[test]
fn test_sparse_issue() {
    let graph = build(&[story("PROJ-2", None, None, &[])]);

    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn test_empty_input() {
    let graph = build(&[]);

    assert!(graph.is_empty());
    assert_eq!(graph.edge_count(), 0);
}
