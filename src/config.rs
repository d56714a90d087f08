use crate::api::constants::{browse_url, field_endpoint, search_endpoint, EPIC_LINK_FIELD};
use crate::api::resilience::{LogLevel, ResilienceConfig, RetryConfig};
use crate::api::BasicCredentials;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_SITE: &str = "JIRA_CO_URL";
pub const ENV_BASE_URL: &str = "JIRA_BASE_URL";
pub const ENV_USER: &str = "JIRA_USER";
pub const ENV_API_TOKEN: &str = "JIRA_API_TOKEN";
pub const ENV_JQL: &str = "JQL_QUERY";
pub const ENV_REQUIRED_FIELDS: &str = "JIRA_REQUIRED_FIELDS";
pub const ENV_OUTPUT: &str = "JIRA_GRAPH_OUTPUT";

/// Run configuration. Built once in `main` and passed down.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub jira: JiraSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub resilience: ResilienceSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraSettings {
    /// Full base URL, or a bare Atlassian site name
    pub site: Option<String>,
    pub user: Option<String>,
    pub api_token: Option<String>,
    #[serde(default)]
    pub jql: String,
    #[serde(default = "default_required_fields")]
    pub required_fields: Vec<String>,
}

fn default_required_fields() -> Vec<String> {
    vec![EPIC_LINK_FIELD.to_string()]
}

impl Default for JiraSettings {
    fn default() -> Self {
        Self {
            site: None,
            user: None,
            api_token: None,
            jql: String::new(),
            required_fields: default_required_fields(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("jira_issues_with_graph.html")
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceSettings {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_retry_delays_secs")]
    pub retry_delays_secs: Vec<u64>,
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_retry_delays_secs() -> Vec<u64> {
    RetryConfig::default().delays().iter().map(Duration::as_secs).collect()
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for ResilienceSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            retry_delays_secs: default_retry_delays_secs(),
            log_level: default_log_level(),
        }
    }
}

/// Non-empty, trimmed value of an environment lookup
fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl AppConfig {
    /// `<config_dir>/jira-graph/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Failed to get config directory")?
            .join("jira-graph")
            .join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", path);

        let config_content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file: {:?}", path))?;

        toml::from_str(&config_content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load the file layer. An explicit path must exist; the default path is optional.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        match Self::default_config_path() {
            Ok(path) if path.exists() => Self::from_file(&path),
            Ok(path) => {
                debug!("No config file at {:?}, using defaults", path);
                Ok(Self::default())
            }
            Err(e) => {
                debug!("Skipping config file: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// Overlay environment values. `lookup` is `std::env::var` in production.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(site) = non_empty(lookup(ENV_BASE_URL)).or_else(|| non_empty(lookup(ENV_SITE))) {
            self.jira.site = Some(site);
        }
        if let Some(user) = non_empty(lookup(ENV_USER)) {
            self.jira.user = Some(user);
        }
        if let Some(token) = non_empty(lookup(ENV_API_TOKEN)) {
            self.jira.api_token = Some(token);
        }
        if let Some(jql) = non_empty(lookup(ENV_JQL)) {
            self.jira.jql = jql;
        }
        if let Some(fields) = non_empty(lookup(ENV_REQUIRED_FIELDS)) {
            self.jira.required_fields = fields
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(output) = non_empty(lookup(ENV_OUTPUT)) {
            self.output.path = PathBuf::from(output);
        }
    }

    /// Overlay the process environment, after loading `.env` if present
    pub fn apply_process_env(&mut self) {
        match dotenvy::dotenv() {
            Ok(path) => info!("Loaded environment from {:?}", path),
            Err(e) if e.not_found() => debug!("No .env file found"),
            Err(e) => warn!("Failed to load .env file: {}", e),
        }
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Fail before any network activity if the run cannot reach Jira
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;

        if self.jira.user.is_none() || self.jira.api_token.is_none() {
            warn!(
                "{} or {} not set, requests will be anonymous",
                ENV_USER, ENV_API_TOKEN
            );
        }
        if self.jira.jql.is_empty() {
            warn!("{} is empty, the search is unfiltered", ENV_JQL);
        }
        if self.resilience.retry_delays_secs.is_empty() {
            warn!("Retry schedule is empty, failed requests will not be retried");
        }
        Ok(())
    }

    /// Site base URL without a trailing slash.
    ///
    /// A bare name like `acme` becomes `https://acme.atlassian.net`; a host
    /// without a scheme gets `https://`.
    pub fn base_url(&self) -> Result<String> {
        let site = self
            .jira
            .site
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .with_context(|| format!("Jira site not configured: set {} or {}", ENV_SITE, ENV_BASE_URL))?;

        let site = site.trim_end_matches('/');
        let base = if site.contains("://") {
            site.to_string()
        } else if site.contains('.') {
            format!("https://{}", site)
        } else {
            format!("https://{}.atlassian.net", site)
        };

        reqwest::Url::parse(&base).with_context(|| format!("Invalid Jira site URL: {}", base))?;
        Ok(base)
    }

    pub fn browse_url(&self, issue_key: &str) -> Result<String> {
        Ok(browse_url(&self.base_url()?, issue_key))
    }

    pub fn field_url(&self) -> Result<String> {
        Ok(field_endpoint(&self.base_url()?))
    }

    pub fn search_url(&self) -> Result<String> {
        Ok(search_endpoint(&self.base_url()?))
    }

    pub fn credentials(&self) -> BasicCredentials {
        BasicCredentials {
            user: self.jira.user.clone().unwrap_or_default(),
            api_token: self.jira.api_token.clone().unwrap_or_default(),
        }
    }

    pub fn resilience_config(&self) -> ResilienceConfig {
        ResilienceConfig::builder()
            .retry_config(RetryConfig::from_secs(&self.resilience.retry_delays_secs))
            .request_timeout(Duration::from_secs(self.resilience.request_timeout_secs))
            .log_level(self.resilience.log_level)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.jira.required_fields, vec!["Epic Link".to_string()]);
        assert_eq!(config.output.path, PathBuf::from("jira_issues_with_graph.html"));
        assert_eq!(config.resilience.retry_delays_secs, vec![1, 2, 4, 8, 16, 32, 64]);
        assert_eq!(config.resilience.request_timeout_secs, 30);
    }

    #[test]
    fn test_missing_site_is_fatal() {
        let config = AppConfig::default();

        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains(ENV_SITE));
    }

    #[test]
    fn test_base_url_normalization() {
        let mut config = AppConfig::default();

        config.jira.site = Some("acme".to_string());
        assert_eq!(config.base_url().unwrap(), "https://acme.atlassian.net");

        config.jira.site = Some("jira.example.com/".to_string());
        assert_eq!(config.base_url().unwrap(), "https://jira.example.com");

        config.jira.site = Some("http://localhost:8080/".to_string());
        assert_eq!(config.base_url().unwrap(), "http://localhost:8080");
        assert_eq!(config.browse_url("P-1").unwrap(), "http://localhost:8080/browse/P-1");
        assert_eq!(config.search_url().unwrap(), "http://localhost:8080/rest/api/3/search");
    }

    #[test]
    fn test_env_layer() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            (ENV_SITE, "acme"),
            (ENV_USER, "me@acme.com"),
            (ENV_API_TOKEN, "secret"),
            (ENV_JQL, "project = PROJ"),
            (ENV_REQUIRED_FIELDS, "Epic Link, Sprint,,"),
            (ENV_OUTPUT, ""),
        ]));

        assert_eq!(config.jira.site.as_deref(), Some("acme"));
        assert_eq!(config.jira.jql, "project = PROJ");
        assert_eq!(config.jira.required_fields, vec!["Epic Link".to_string(), "Sprint".to_string()]);
        assert_eq!(config.output.path, default_output_path());
        assert_eq!(config.credentials().api_token, "secret");
    }

    #[test]
    fn test_base_url_env_wins_over_site_name() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[(ENV_SITE, "acme"), (ENV_BASE_URL, "https://jira.acme.io")]));

        assert_eq!(config.base_url().unwrap(), "https://jira.acme.io");
    }

    #[test]
    fn test_file_layer_then_env() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[jira]
site = "filesite"
jql = "project = FILE"

[resilience]
retry_delays_secs = [0, 0]
log_level = "debug"
"#,
        )
        .unwrap();

        let mut config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.jira.required_fields, vec!["Epic Link".to_string()]);
        assert_eq!(config.resilience.request_timeout_secs, 30);
        assert_eq!(config.resilience_config().retry.max_attempts(), 2);

        config.apply_env(env(&[(ENV_JQL, "project = ENV")]));
        assert_eq!(config.jira.site.as_deref(), Some("filesite"));
        assert_eq!(config.jira.jql, "project = ENV");
    }

    #[test]
    fn test_explicit_missing_file_errors() {
        let dir = TempDir::new().unwrap();

        assert!(AppConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
