//! Retry, rate-limit and monitoring machinery for Jira fetches
//!
//! Provides the backoff schedule, the delay policy derived from response
//! headers, the per-fetch retry state machine, injectable time, and
//! structured logging / metrics.

pub mod clock;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod rate_limit;
pub mod retry;

pub use clock::{Clock, ManualClock, RecordingSleeper, Sleeper, SystemClock, TokioSleeper};
pub use config::{LogLevel, MonitoringConfig, ResilienceConfig, ResilienceConfigBuilder};
pub use logging::{ApiLogger, FetchContext, FetchMetrics};
pub use metrics::{EndpointMetrics, MetricsCollector, MetricsSnapshot};
pub use rate_limit::{Delay, DelayReason, RateLimitPolicy, ResponseSignals};
pub use retry::{AttemptOutcome, RequestTarget, ResponseClass, RetryConfig, RetryMachine, RetryState};
