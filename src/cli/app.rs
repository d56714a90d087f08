use crate::api::resilience::LogLevel;
use crate::config::AppConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "jira-graph")]
#[command(version)]
#[command(about = "Fetch Jira issues and render their parent, epic and subtask relationships as an HTML graph")]
pub struct Cli {
    /// Config file (default: <config dir>/jira-graph/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JQL filter, overrides JQL_QUERY
    #[arg(short, long)]
    pub jql: Option<String>,

    /// Output HTML file; an existing file is never overwritten
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Required field name to resolve (repeatable), replaces the configured list
    #[arg(short, long = "field", value_name = "NAME")]
    pub fields: Vec<String>,

    /// Debug logging, including one line per HTTP request
    #[arg(short, long)]
    pub verbose: bool,

    /// Compute waits without sleeping
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Apply flag overrides; flags win over file and environment
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(jql) = &self.jql {
            config.jira.jql = jql.clone();
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if !self.fields.is_empty() {
            config.jira.required_fields = self.fields.clone();
        }
        if self.verbose {
            config.resilience.log_level = LogLevel::Debug;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "jira-graph",
            "--jql",
            "project = PROJ",
            "--field",
            "Epic Link",
            "--field",
            "Sprint",
            "--dry-run",
            "-v",
        ]);

        assert_eq!(cli.jql.as_deref(), Some("project = PROJ"));
        assert_eq!(cli.fields, vec!["Epic Link".to_string(), "Sprint".to_string()]);
        assert!(cli.dry_run);
        assert!(cli.verbose);
    }

    #[test]
    fn test_overrides_win() {
        let mut config = AppConfig::default();
        config.jira.jql = "project = ENV".to_string();

        let cli = Cli::parse_from(["jira-graph", "-j", "project = CLI", "-o", "out.html"]);
        cli.apply_to(&mut config);

        assert_eq!(config.jira.jql, "project = CLI");
        assert_eq!(config.output.path, PathBuf::from("out.html"));
        assert_eq!(config.jira.required_fields, vec!["Epic Link".to_string()]);
        assert_eq!(config.resilience.log_level, LogLevel::Info);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
