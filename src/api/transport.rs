//! Raw HTTP GET seam
//!
//! [`HttpTransport`] performs exactly one request and reports what came
//! back. It knows nothing about retries; `ResilientFetcher` is its only
//! caller.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// A response as seen by the retry logic
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Header names lowercased
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }
}

/// Request never produced a response
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Other(String),
}

impl TransportError {
    /// Classify a reqwest error
    pub fn from_reqwest_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportError::Timeout
        } else if error.is_connect() {
            TransportError::Connect(error.to_string())
        } else {
            TransportError::Other(error.to_string())
        }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse, TransportError>;
}

/// Jira credentials for HTTP Basic auth
#[derive(Debug, Clone, Default)]
pub struct BasicCredentials {
    pub user: String,
    pub api_token: String,
}

impl BasicCredentials {
    pub fn is_empty(&self) -> bool {
        self.user.is_empty() && self.api_token.is_empty()
    }
}

/// reqwest-backed transport with connection pooling
#[derive(Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    credentials: BasicCredentials,
}

impl ReqwestTransport {
    pub fn new(credentials: BasicCredentials, request_timeout: Duration) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("jira-graph/", env!("CARGO_PKG_VERSION")))
            // Location is surfaced to the retry loop instead of followed
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self::with_custom_client(http_client, credentials))
    }

    /// Create a transport around an existing client
    pub fn with_custom_client(http_client: reqwest::Client, credentials: BasicCredentials) -> Self {
        Self {
            http_client,
            credentials,
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse, TransportError> {
        let mut request = self
            .http_client
            .get(url)
            .header("Accept", "application/json")
            .query(query);

        if !self.credentials.is_empty() {
            request = request.basic_auth(&self.credentials.user, Some(&self.credentials.api_token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest_error(&e))?;

        let status = response.status().as_u16();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(name.as_str().to_ascii_lowercase(), value_str.to_string());
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest_error(&e))?;

        Ok(RawResponse { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_response_lowercases_headers() {
        let response = RawResponse::new(403, "").with_header("X-RateLimit-Remaining", "0");

        assert_eq!(response.headers.get("x-ratelimit-remaining"), Some(&"0".to_string()));
    }

    #[test]
    fn test_credentials_emptiness() {
        assert!(BasicCredentials::default().is_empty());
        assert!(
            !BasicCredentials {
                user: "me@acme.com".to_string(),
                api_token: String::new(),
            }
            .is_empty()
        );
    }
}
