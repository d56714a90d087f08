//! One logical GET with retry, backoff and rate-limit handling
//!
//! All network traffic in the crate goes through [`ResilientFetcher::fetch`].
//! The retry decisions live in [`RetryMachine`]; this module performs the
//! requests and sleeps the machine asks for, and turns terminal states into
//! a JSON body or a [`FetchFailure`].

use super::resilience::{
    ApiLogger, AttemptOutcome, Clock, DelayReason, FetchContext, FetchMetrics, MetricsCollector, RateLimitPolicy,
    RequestTarget, ResilienceConfig, ResponseSignals, RetryMachine, RetryState, Sleeper, SystemClock, TokioSleeper,
};
use super::transport::HttpTransport;
use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Why a fetch produced no body
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchFailure {
    /// 422: the request itself is wrong; never retried
    #[error("{status} Unprocessable Entity: {message}")]
    Unprocessable {
        status: u16,
        message: String,
        detail: Option<String>,
    },
    /// The retry budget ran out without a 200
    #[error("retries exhausted after {attempts} attempts (last status: {})", describe_status(.last_status))]
    RetriesExhausted { attempts: u32, last_status: Option<u16> },
    /// 200 whose body is not JSON
    #[error("invalid JSON body in {status} response: {message}")]
    InvalidBody { status: u16, message: String },
}

fn describe_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "none, every attempt failed in transport".to_string(),
    }
}

impl FetchFailure {
    /// Stable label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            FetchFailure::Unprocessable { .. } => "unprocessable",
            FetchFailure::RetriesExhausted { .. } => "retries_exhausted",
            FetchFailure::InvalidBody { .. } => "invalid_body",
        }
    }
}

/// Retrying JSON fetcher; the sole owner of outbound requests
#[derive(Clone)]
pub struct ResilientFetcher {
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
    policy: RateLimitPolicy,
    api_logger: ApiLogger,
    metrics_collector: MetricsCollector,
}

impl ResilientFetcher {
    /// Fetcher with real time: tokio sleeps and the system clock
    pub fn new(transport: Arc<dyn HttpTransport>, config: &ResilienceConfig) -> Self {
        Self {
            transport,
            sleeper: Arc::new(TokioSleeper),
            clock: Arc::new(SystemClock),
            policy: RateLimitPolicy::new(config.retry.clone()),
            api_logger: ApiLogger::new(config.monitoring.clone()),
            metrics_collector: MetricsCollector::new(config.monitoring.clone()),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Share a collector with other fetchers
    pub fn with_metrics_collector(mut self, metrics_collector: MetricsCollector) -> Self {
        self.metrics_collector = metrics_collector;
        self
    }

    pub fn metrics_collector(&self) -> &MetricsCollector {
        &self.metrics_collector
    }

    /// GET `url` with `query`, retrying until a 200, a 422, or the schedule
    /// runs out.
    pub async fn fetch(&self, url: &str, query: &[(String, String)]) -> Result<Value, FetchFailure> {
        let endpoint = endpoint_label(url);
        let context = self.api_logger.start_fetch(&endpoint, url);
        let mut metrics = context.create_metrics();
        let mut machine = RetryMachine::new(self.policy.clone());
        let mut last_body = String::new();

        loop {
            match machine.state().clone() {
                RetryState::Attempting { attempt, target } => {
                    let (request_url, request_query): (String, &[(String, String)]) = match &target {
                        RequestTarget::Original => (url.to_string(), query),
                        RequestTarget::Redirect(location) => (location.clone(), &[]),
                    };

                    metrics.attempts += 1;
                    self.api_logger.log_request(&context, attempt, &request_url, request_query);
                    let request_start = Instant::now();

                    let outcome = match self.transport.get(&request_url, request_query).await {
                        Ok(response) => {
                            self.api_logger
                                .log_response(&context, response.status, &response.headers, request_start.elapsed());
                            let mut signals = ResponseSignals::from_headers(response.status, &response.headers);
                            // Relative to the URL this attempt actually hit
                            signals.location = signals.location.map(|loc| resolve_location(&request_url, &loc));
                            last_body = response.body;
                            AttemptOutcome::Responded(signals)
                        }
                        Err(error) => {
                            self.api_logger.log_transport_error(&context, attempt, &error.to_string());
                            last_body.clear();
                            AttemptOutcome::TimedOut
                        }
                    };

                    machine.record(outcome, self.clock.now());
                }
                RetryState::Sleeping { attempt, delay } => {
                    let target = match machine.wake().clone() {
                        RetryState::Attempting {
                            target: RequestTarget::Redirect(location),
                            ..
                        } => location,
                        _ => url.to_string(),
                    };

                    if delay.reason == DelayReason::RateLimitReset {
                        self.api_logger.log_rate_limit(&context, delay.duration);
                        metrics.rate_limit_delays.push(delay.duration);
                    } else {
                        metrics.retry_delays.push(delay.duration);
                    }
                    self.api_logger
                        .log_retry(&context, attempt, &target, machine.last_status(), &delay);

                    self.sleeper.sleep(delay.duration).await;
                }
                RetryState::Succeeded { attempts } => {
                    let result = serde_json::from_str::<Value>(&last_body).map_err(|e| FetchFailure::InvalidBody {
                        status: 200,
                        message: e.to_string(),
                    });
                    if attempts > 1 {
                        debug!("{} succeeded after {} attempts", url, attempts);
                    }
                    return self.finish(&context, metrics, machine.last_status(), result);
                }
                RetryState::Rejected { status, .. } => {
                    let (message, detail) = unprocessable_payload(&last_body);
                    self.api_logger
                        .log_rejection(&context, status, &message, detail.as_deref());
                    let failure = FetchFailure::Unprocessable { status, message, detail };
                    return self.finish(&context, metrics, Some(status), Err(failure));
                }
                RetryState::Exhausted { attempts, last_status } => {
                    warn!(
                        "Retries exhausted for {}, giving up. Last status: {}",
                        url,
                        describe_status(&last_status)
                    );
                    let failure = FetchFailure::RetriesExhausted { attempts, last_status };
                    return self.finish(&context, metrics, last_status, Err(failure));
                }
            }
        }
    }

    fn finish(
        &self,
        context: &FetchContext,
        mut metrics: FetchMetrics,
        status_code: Option<u16>,
        result: Result<Value, FetchFailure>,
    ) -> Result<Value, FetchFailure> {
        metrics.duration = context.elapsed();
        metrics.status_code = status_code;
        metrics.success = result.is_ok();
        metrics.error_message = result.as_ref().err().map(|e| e.to_string());

        self.api_logger.complete_fetch(context, &metrics);
        self.metrics_collector.record_fetch(
            &context.endpoint,
            &metrics,
            result.as_ref().err().map(FetchFailure::kind),
        );
        debug!("Fetch summary for {}: {}", context.url, metrics.to_json());

        result
    }
}

/// Metrics label: the last path segment of the URL
fn endpoint_label(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()).map(str::to_string))
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Resolve a possibly relative `Location` against the requested URL
fn resolve_location(url: &str, location: &str) -> String {
    reqwest::Url::parse(url)
        .and_then(|base| base.join(location))
        .map(|resolved| resolved.to_string())
        .unwrap_or_else(|_| location.to_string())
}

/// `message` and first nested error message from a 422 body.
///
/// Understands `{"message", "errors": [{"message"}]}` as well as Jira's
/// `{"errorMessages": [..], "errors": {field: msg}}`.
fn unprocessable_payload(body: &str) -> (String, Option<String>) {
    let json: Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(_) if body.trim().is_empty() => return ("Unprocessable Entity".to_string(), None),
        Err(_) => return (body.trim().to_string(), None),
    };

    let message = json["message"]
        .as_str()
        .or_else(|| json["errorMessages"][0].as_str())
        .unwrap_or("Unprocessable Entity")
        .to_string();

    let detail = match &json["errors"] {
        Value::Array(errors) => errors.first().and_then(|e| e["message"].as_str()).map(str::to_string),
        Value::Object(errors) => errors.values().next().and_then(Value::as_str).map(str::to_string),
        _ => None,
    };

    (message, detail)
}
