//! One end-to-end run: fields, issues, graph, document

use crate::api::{
    Clock, FieldResolver, FuzzyMatch, HttpTransport, IssuePaginator, MetricsSnapshot, ResilientFetcher, Sleeper,
};
use crate::config::AppConfig;
use crate::graph::GraphBuilder;
use crate::render::{write_document, HtmlRenderer};
use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// What a run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub issue_count: usize,
    pub node_count: usize,
    pub edge_count: usize,
    pub stub_count: usize,
    pub epic_field_id: String,
    pub unmatched_fields: Vec<String>,
    pub fuzzy_fields: Vec<FuzzyMatch>,
    pub output_path: PathBuf,
    pub metrics: MetricsSnapshot,
}

impl RunReport {
    /// True when some fetch failed and the document may be incomplete
    pub fn is_degraded(&self) -> bool {
        self.metrics.failed_fetches() > 0
    }
}

/// Run the whole pipeline against `transport`.
///
/// Fetch failures never abort the run; they shrink the issue set. Only an
/// invalid configuration or a failure to write the document is an error.
pub async fn run(
    config: &AppConfig,
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
) -> Result<RunReport> {
    config.validate()?;
    let base_url = config.base_url()?;

    let fetcher = ResilientFetcher::new(transport, &config.resilience_config())
        .with_sleeper(sleeper)
        .with_clock(clock);

    info!("Resolving {} required fields", config.jira.required_fields.len());
    let mapping = FieldResolver::new(&fetcher, config.field_url()?)
        .resolve(&config.jira.required_fields)
        .await;

    let field_ids = mapping.field_ids();
    info!("Searching issues with fields: {}", field_ids.join(","));
    let issues = IssuePaginator::new(&fetcher, config.search_url()?, config.jira.jql.as_str())
        .fetch_all(&field_ids)
        .await;

    let graph = GraphBuilder::new(base_url.as_str()).build(&mapping, &issues);
    let html = HtmlRenderer::new(base_url.as_str())
        .render(&graph, &issues)
        .context("Failed to render graph document")?;
    let output_path = write_document(&config.output.path, &html)?;

    Ok(RunReport {
        issue_count: issues.len(),
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        stub_count: graph.nodes().filter(|n| n.is_stub()).count(),
        epic_field_id: mapping.epic_field_id().to_string(),
        unmatched_fields: mapping.unmatched().to_vec(),
        fuzzy_fields: mapping.fuzzy_matches().to_vec(),
        output_path,
        metrics: fetcher.metrics_collector().snapshot(),
    })
}
