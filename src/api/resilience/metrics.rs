//! Fetch statistics aggregated across a run
//!
//! Counts fetches, retries and waits per endpoint so a degraded run can say
//! where it lost data and how long it spent waiting on Jira.

use super::config::MonitoringConfig;
use super::logging::FetchMetrics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Shared metrics collector, cheap to clone
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsCollectorInner>>,
    config: MonitoringConfig,
}

#[derive(Debug)]
struct MetricsCollectorInner {
    /// Per-endpoint metrics, ordered by endpoint name
    endpoints: BTreeMap<String, EndpointMetrics>,
    /// Start time for uptime
    start_time: Instant,
}

/// Metrics for one endpoint (`field`, `search`, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointMetrics {
    pub endpoint: String,
    /// Logical fetches
    pub total_fetches: u64,
    pub successful_fetches: u64,
    /// Failed fetches keyed by failure kind
    pub failures: BTreeMap<String, u64>,
    /// Requests issued, retries included
    pub total_requests: u64,
    pub total_retries: u64,
    /// Number of rate-limit waits
    pub rate_limit_waits: u64,
    pub total_retry_delay: Duration,
    pub total_rate_limit_delay: Duration,
    pub total_duration: Duration,
    /// Final status code counts
    pub status_codes: BTreeMap<u16, u64>,
}

/// Point-in-time copy of all metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub endpoints: Vec<EndpointMetrics>,
    pub uptime: Duration,
    /// Timestamp when snapshot was taken
    pub timestamp: String,
}

impl MetricsCollector {
    pub fn new(config: MonitoringConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsCollectorInner {
                endpoints: BTreeMap::new(),
                start_time: Instant::now(),
            })),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetricsCollectorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record completion of a fetch. `failure_kind` is `None` on success.
    pub fn record_fetch(&self, endpoint: &str, metrics: &FetchMetrics, failure_kind: Option<&str>) {
        if !self.config.performance_metrics {
            return;
        }

        let mut inner = self.lock();
        inner
            .endpoints
            .entry(endpoint.to_string())
            .or_insert_with(|| EndpointMetrics::new(endpoint))
            .record(metrics, failure_kind);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.lock();

        MetricsSnapshot {
            endpoints: inner.endpoints.values().cloned().collect(),
            uptime: inner.start_time.elapsed(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Metrics for a single endpoint
    pub fn endpoint_metrics(&self, endpoint: &str) -> Option<EndpointMetrics> {
        self.lock().endpoints.get(endpoint).cloned()
    }
}

impl EndpointMetrics {
    fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            total_fetches: 0,
            successful_fetches: 0,
            failures: BTreeMap::new(),
            total_requests: 0,
            total_retries: 0,
            rate_limit_waits: 0,
            total_retry_delay: Duration::ZERO,
            total_rate_limit_delay: Duration::ZERO,
            total_duration: Duration::ZERO,
            status_codes: BTreeMap::new(),
        }
    }

    fn record(&mut self, metrics: &FetchMetrics, failure_kind: Option<&str>) {
        self.total_fetches += 1;
        match failure_kind {
            None => self.successful_fetches += 1,
            Some(kind) => *self.failures.entry(kind.to_string()).or_insert(0) += 1,
        }

        self.total_requests += metrics.attempts as u64;
        self.total_retries += metrics.retries() as u64;
        self.rate_limit_waits += metrics.rate_limit_delays.len() as u64;
        self.total_retry_delay += metrics.retry_delays.iter().sum::<Duration>();
        self.total_rate_limit_delay += metrics.rate_limit_delays.iter().sum::<Duration>();
        self.total_duration += metrics.duration;

        if let Some(status_code) = metrics.status_code {
            *self.status_codes.entry(status_code).or_insert(0) += 1;
        }
    }

    pub fn failed_fetches(&self) -> u64 {
        self.failures.values().sum()
    }

    /// Success rate as percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_fetches == 0 {
            0.0
        } else {
            (self.successful_fetches as f64 / self.total_fetches as f64) * 100.0
        }
    }

    /// Time spent asleep for any reason
    pub fn total_sleep(&self) -> Duration {
        self.total_retry_delay + self.total_rate_limit_delay
    }
}

impl MetricsSnapshot {
    pub fn total_fetches(&self) -> u64 {
        self.endpoints.iter().map(|e| e.total_fetches).sum()
    }

    pub fn failed_fetches(&self) -> u64 {
        self.endpoints.iter().map(EndpointMetrics::failed_fetches).sum()
    }

    pub fn total_retries(&self) -> u64 {
        self.endpoints.iter().map(|e| e.total_retries).sum()
    }

    pub fn total_sleep(&self) -> Duration {
        self.endpoints.iter().map(EndpointMetrics::total_sleep).sum()
    }
}
