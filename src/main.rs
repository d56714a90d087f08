use anyhow::Result;
use clap::Parser;
use jira_graph::api::{Clock, RecordingSleeper, ReqwestTransport, Sleeper, SystemClock, TokioSleeper};
use jira_graph::cli::{summary, Cli};
use jira_graph::config::AppConfig;
use jira_graph::pipeline;
use log::{info, LevelFilter};
use std::sync::Arc;
use std::time::Duration;

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    info!("Starting jira-graph");

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_process_env();
    cli.apply_to(&mut config);
    config.validate()?;

    let transport = Arc::new(ReqwestTransport::new(
        config.credentials(),
        Duration::from_secs(config.resilience.request_timeout_secs),
    )?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let sleeper: Arc<dyn Sleeper> = if cli.dry_run {
        info!("Dry run: waits are computed but not performed");
        Arc::new(RecordingSleeper::new())
    } else {
        Arc::new(TokioSleeper)
    };

    let report = pipeline::run(&config, transport, sleeper, clock).await?;
    summary::print_report(&report, cli.dry_run);

    Ok(())
}
