use crate::pipeline::RunReport;
use colored::*;

/// Print the end-of-run summary to stdout
pub fn print_report(report: &RunReport, dry_run: bool) {
    println!();
    if report.is_degraded() {
        println!(
            "{} Graph written with missing data: {}",
            "⚠️".bright_yellow().bold(),
            report.output_path.display().to_string().bright_yellow().bold()
        );
    } else {
        println!(
            "{} Graph written: {}",
            "✓".bright_green().bold(),
            report.output_path.display().to_string().bright_green().bold()
        );
    }

    println!(
        "  {} issues, {} nodes ({} referenced only), {} edges",
        report.issue_count.to_string().cyan(),
        report.node_count.to_string().cyan(),
        report.stub_count,
        report.edge_count.to_string().cyan()
    );
    println!("  Epic field: {}", report.epic_field_id.cyan());

    for fuzzy in &report.fuzzy_fields {
        println!(
            "  {} '{}' matched '{}' ({})",
            "~".bright_yellow(),
            fuzzy.requested,
            fuzzy.matched,
            fuzzy.field_id.dimmed()
        );
    }
    if !report.unmatched_fields.is_empty() {
        println!(
            "  {} Unmatched fields: {}",
            "⚠️".bright_yellow().bold(),
            report.unmatched_fields.join(", ").bright_yellow()
        );
    }

    let metrics = &report.metrics;
    let sleep_label = if dry_run { "Waits computed (not slept)" } else { "Time waiting" };
    println!();
    println!("  {}", "Requests:".bright_white().bold());
    for endpoint in &metrics.endpoints {
        println!(
            "    {} {} fetches, {} requests, {} retries, {} rate-limit waits",
            format!("{:<8}", endpoint.endpoint).cyan(),
            endpoint.total_fetches,
            endpoint.total_requests,
            endpoint.total_retries,
            endpoint.rate_limit_waits
        );
        for (kind, count) in &endpoint.failures {
            println!("      {} {} x {}", "✗".bright_red(), kind.bright_red(), count);
        }
    }
    println!("    {}: {:?}", sleep_label, metrics.total_sleep());
}
