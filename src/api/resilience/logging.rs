//! Structured logging with correlation tracking for Jira fetches
//!
//! Every logical fetch gets a correlation id; each event is emitted as one
//! JSON document through the `log` facade so retries, rate-limit waits and
//! rejections of the same fetch can be grepped together.

use super::config::{LogLevel, MonitoringConfig};
use super::rate_limit::Delay;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use log::{debug, error, info, warn};

/// Structured logger for fetch operations with correlation tracking
#[derive(Debug, Clone)]
pub struct ApiLogger {
    config: MonitoringConfig,
}

/// Context for a single logical fetch
#[derive(Debug, Clone)]
pub struct FetchContext {
    /// Unique correlation ID for this fetch
    pub correlation_id: String,
    /// Endpoint label (`field`, `search`, ...)
    pub endpoint: String,
    /// URL originally requested
    pub url: String,
    /// Start time for performance tracking
    pub start_time: Instant,
}

/// Summary of a finished fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchMetrics {
    /// Total duration of the fetch including sleeps
    pub duration: Duration,
    /// Requests issued, initial attempt included
    pub attempts: u32,
    /// Whether a 200 was obtained
    pub success: bool,
    /// Last HTTP status seen
    pub status_code: Option<u16>,
    /// Failure description when unsuccessful
    pub error_message: Option<String>,
    /// Backoff and retry-after waits
    pub retry_delays: Vec<Duration>,
    /// Waits for a rate-limit window to reset
    pub rate_limit_delays: Vec<Duration>,
}

impl ApiLogger {
    pub fn new(config: MonitoringConfig) -> Self {
        Self { config }
    }

    /// Start tracking a new fetch
    pub fn start_fetch(&self, endpoint: &str, url: &str) -> FetchContext {
        let correlation_id = if self.config.correlation_ids {
            uuid::Uuid::new_v4().to_string()
        } else {
            String::new()
        };

        let context = FetchContext {
            correlation_id,
            endpoint: endpoint.to_string(),
            url: url.to_string(),
            start_time: Instant::now(),
        };

        if self.config.request_logging && self.should_log(LogLevel::Debug) {
            let log_data = json!({
                "event": "fetch_started",
                "correlation_id": context.correlation_id,
                "endpoint": context.endpoint,
                "url": context.url,
                "timestamp": chrono::Utc::now().to_rfc3339()
            });

            debug!("Fetch Started: {}", log_data);
        }

        context
    }

    /// Log an outgoing request
    pub fn log_request(&self, context: &FetchContext, attempt: u32, url: &str, query: &[(String, String)]) {
        if !self.config.request_logging || !self.should_log(LogLevel::Debug) {
            return;
        }

        let params: HashMap<&str, &str> = query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let log_data = json!({
            "event": "http_request",
            "correlation_id": context.correlation_id,
            "endpoint": context.endpoint,
            "attempt": attempt,
            "url": url,
            "params": params,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        debug!("HTTP Request: {}", log_data);
    }

    /// Log a received response
    pub fn log_response(&self, context: &FetchContext, status_code: u16, headers: &HashMap<String, String>, duration: Duration) {
        if !self.config.request_logging || !self.should_log(LogLevel::Debug) {
            return;
        }

        let log_data = json!({
            "event": "http_response",
            "correlation_id": context.correlation_id,
            "endpoint": context.endpoint,
            "status_code": status_code,
            "duration_ms": duration.as_millis(),
            "headers": self.sanitize_headers(headers),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        debug!("HTTP Response: {}", log_data);
    }

    /// Log a transport timeout or connection failure
    pub fn log_transport_error(&self, context: &FetchContext, attempt: u32, error: &str) {
        if !self.should_log(LogLevel::Warn) {
            return;
        }

        let log_data = json!({
            "event": "transport_error",
            "correlation_id": context.correlation_id,
            "endpoint": context.endpoint,
            "attempt": attempt,
            "error": error,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        warn!("Request Failed: {}", log_data);
    }

    /// Log a scheduled retry
    pub fn log_retry(&self, context: &FetchContext, next_attempt: u32, target: &str, last_status: Option<u16>, delay: &Delay) {
        if !self.should_log(LogLevel::Warn) {
            return;
        }

        let log_data = json!({
            "event": "retry_scheduled",
            "correlation_id": context.correlation_id,
            "endpoint": context.endpoint,
            "attempt": next_attempt,
            "target": target,
            "last_status": last_status,
            "delay_ms": delay.duration.as_millis(),
            "reason": delay.reason.as_str(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        warn!("Retry Scheduled: {}", log_data);
    }

    /// Log a wait for the rate-limit window to reset
    pub fn log_rate_limit(&self, context: &FetchContext, delay: Duration) {
        if !self.should_log(LogLevel::Warn) {
            return;
        }

        let log_data = json!({
            "event": "rate_limited",
            "correlation_id": context.correlation_id,
            "endpoint": context.endpoint,
            "delay_ms": delay.as_millis(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        warn!("Rate Limited: {}", log_data);
    }

    /// Log a 422 that will not be retried
    pub fn log_rejection(&self, context: &FetchContext, status_code: u16, message: &str, detail: Option<&str>) {
        if !self.should_log(LogLevel::Warn) {
            return;
        }

        let log_data = json!({
            "event": "fetch_rejected",
            "correlation_id": context.correlation_id,
            "endpoint": context.endpoint,
            "url": context.url,
            "status_code": status_code,
            "message": message,
            "detail": detail,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        warn!("Skipping Request: {}", log_data);
    }

    /// Complete a fetch and log its metrics
    pub fn complete_fetch(&self, context: &FetchContext, metrics: &FetchMetrics) {
        if !self.config.performance_metrics {
            return;
        }

        let log_data = json!({
            "event": "fetch_completed",
            "correlation_id": context.correlation_id,
            "endpoint": context.endpoint,
            "url": context.url,
            "duration_ms": metrics.duration.as_millis(),
            "attempts": metrics.attempts,
            "success": metrics.success,
            "status_code": metrics.status_code,
            "error_message": metrics.error_message,
            "retry_delays_ms": metrics.retry_delays.iter().map(|d| d.as_millis()).collect::<Vec<_>>(),
            "rate_limit_delays_ms": metrics.rate_limit_delays.iter().map(|d| d.as_millis()).collect::<Vec<_>>(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        if metrics.success {
            if self.should_log(LogLevel::Info) {
                info!("Fetch Completed: {}", log_data);
            }
        } else if self.should_log(LogLevel::Error) {
            error!("Fetch Failed: {}", log_data);
        }
    }

    /// Check if we should log at the given level
    fn should_log(&self, level: LogLevel) -> bool {
        match (self.config.log_level, level) {
            (LogLevel::Error, LogLevel::Error) => true,
            (LogLevel::Warn, LogLevel::Error | LogLevel::Warn) => true,
            (LogLevel::Info, LogLevel::Error | LogLevel::Warn | LogLevel::Info) => true,
            (LogLevel::Debug, LogLevel::Error | LogLevel::Warn | LogLevel::Info | LogLevel::Debug) => true,
            (LogLevel::Trace, _) => true,
            _ => false,
        }
    }

    /// Sanitize headers to remove sensitive information
    fn sanitize_headers(&self, headers: &HashMap<String, String>) -> HashMap<String, String> {
        headers
            .iter()
            .map(|(key, value)| {
                let key_lower = key.to_lowercase();
                if key_lower.contains("authorization") || key_lower.contains("token") || key_lower.contains("cookie") {
                    (key.clone(), "[REDACTED]".to_string())
                } else {
                    (key.clone(), value.clone())
                }
            })
            .collect()
    }
}

impl FetchContext {
    /// Calculate elapsed time since the fetch started
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Empty metrics for this context, filled in by the fetcher
    pub fn create_metrics(&self) -> FetchMetrics {
        FetchMetrics {
            duration: Duration::ZERO,
            attempts: 0,
            success: false,
            status_code: None,
            error_message: None,
            retry_delays: Vec::new(),
            rate_limit_delays: Vec::new(),
        }
    }
}

impl FetchMetrics {
    /// Retries made after the initial attempt
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }

    /// Total time spent sleeping for any reason
    pub fn total_sleep(&self) -> Duration {
        self.retry_delays.iter().chain(self.rate_limit_delays.iter()).sum()
    }

    /// Payload-free metadata for a JSON log line
    pub fn to_json(&self) -> Value {
        json!({
            "attempts": self.attempts,
            "success": self.success,
            "status_code": self.status_code,
            "slept_ms": self.total_sleep().as_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debug_config() -> MonitoringConfig {
        MonitoringConfig {
            correlation_ids: true,
            request_logging: true,
            performance_metrics: true,
            log_level: LogLevel::Debug,
        }
    }

    #[test]
    fn test_fetch_context_creation() {
        let logger = ApiLogger::new(debug_config());
        let context = logger.start_fetch("search", "https://acme.atlassian.net/rest/api/3/search");

        assert_eq!(context.endpoint, "search");
        assert_eq!(context.url, "https://acme.atlassian.net/rest/api/3/search");
        assert_eq!(context.correlation_id.len(), 36);
    }

    #[test]
    fn test_correlation_ids_can_be_disabled() {
        let mut config = debug_config();
        config.correlation_ids = false;
        let logger = ApiLogger::new(config);

        let context = logger.start_fetch("field", "https://acme.atlassian.net/rest/api/2/field");

        assert!(context.correlation_id.is_empty());
    }

    #[test]
    fn test_fetch_metrics() {
        let context = ApiLogger::new(debug_config()).start_fetch("search", "u");
        let mut metrics = context.create_metrics();
        metrics.attempts = 3;
        metrics.retry_delays.push(Duration::from_secs(1));
        metrics.rate_limit_delays.push(Duration::from_secs(5));

        assert_eq!(metrics.retries(), 2);
        assert_eq!(metrics.total_sleep(), Duration::from_secs(6));
        assert_eq!(metrics.to_json()["slept_ms"], 6000);
    }

    #[test]
    fn test_header_sanitization() {
        let logger = ApiLogger::new(debug_config());
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), "Basic c2VjcmV0".to_string());
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Set-Cookie".to_string(), "atlassian.xsrf.token=abc".to_string());

        let sanitized = logger.sanitize_headers(&headers);

        assert_eq!(sanitized.get("Authorization"), Some(&"[REDACTED]".to_string()));
        assert_eq!(sanitized.get("Content-Type"), Some(&"application/json".to_string()));
        assert_eq!(sanitized.get("Set-Cookie"), Some(&"[REDACTED]".to_string()));
    }

    #[test]
    fn test_log_level_filtering() {
        let mut config = debug_config();
        config.log_level = LogLevel::Warn;
        let logger = ApiLogger::new(config);

        assert!(logger.should_log(LogLevel::Error));
        assert!(logger.should_log(LogLevel::Warn));
        assert!(!logger.should_log(LogLevel::Info));
        assert!(!logger.should_log(LogLevel::Debug));
        assert!(!logger.should_log(LogLevel::Trace));
    }
}
