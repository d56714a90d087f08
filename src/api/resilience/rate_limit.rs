//! Delay decisions from response metadata
//!
//! Jira signals throttling through `X-RateLimit-Remaining` /
//! `X-RateLimit-Reset`, explicit waits through `Retry-After`, and moved
//! resources through `Location`. [`RateLimitPolicy`] turns those signals plus
//! the retry attempt number into the single delay to wait before the next try.

use super::retry::RetryConfig;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Accepted spellings for the remaining-quota header (lowercase)
const REMAINING_HEADERS: &[&str] = &["x-ratelimit-remaining", "rate-limit-remaining", "ratelimit-remaining"];

/// Accepted spellings for the quota-reset header (lowercase)
const RESET_HEADERS: &[&str] = &["x-ratelimit-reset", "rate-limit-reset", "ratelimit-reset"];

const RETRY_AFTER_HEADER: &str = "retry-after";
const LOCATION_HEADER: &str = "location";

/// The parts of an HTTP response that influence retry scheduling
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseSignals {
    pub status: u16,
    /// Remaining request quota in the current window
    pub remaining: Option<u64>,
    /// Absolute reset time, epoch seconds
    pub reset_epoch: Option<i64>,
    /// Explicit wait requested by the server, seconds
    pub retry_after: Option<u64>,
    /// Redirect target for subsequent attempts
    pub location: Option<String>,
}

impl ResponseSignals {
    /// Extract signals from a status and a header map.
    ///
    /// Header names are matched case-insensitively. Values that do not parse
    /// are ignored rather than treated as errors.
    pub fn from_headers(status: u16, headers: &HashMap<String, String>) -> Self {
        Self {
            status,
            remaining: header_value(headers, REMAINING_HEADERS).and_then(|v| v.parse().ok()),
            reset_epoch: header_value(headers, RESET_HEADERS).and_then(parse_epoch),
            retry_after: header_value(headers, &[RETRY_AFTER_HEADER]).and_then(|v| v.parse().ok()),
            location: header_value(headers, &[LOCATION_HEADER])
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        }
    }

    /// Zero quota left in the current window
    pub fn quota_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Drop everything that describes *when* to retry, keeping the redirect.
    ///
    /// Used after a transport timeout: the previous response's wait hints are
    /// stale by then.
    pub fn without_wait_hints(&self) -> Self {
        Self {
            status: self.status,
            remaining: None,
            reset_epoch: None,
            retry_after: None,
            location: self.location.clone(),
        }
    }
}

fn header_value<'a>(headers: &'a HashMap<String, String>, names: &[&str]) -> Option<&'a str> {
    headers
        .iter()
        .find(|(name, _)| names.iter().any(|n| name.eq_ignore_ascii_case(n)))
        .map(|(_, value)| value.trim())
}

/// Epoch seconds (fractional part tolerated) or an RFC 3339 timestamp
fn parse_epoch(value: &str) -> Option<i64> {
    value
        .parse::<i64>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().map(|f| f.floor() as i64))
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|t| t.timestamp()))
}

/// Why a retry is being delayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayReason {
    /// Quota exhausted, waiting for the window to reset
    RateLimitReset,
    /// Server asked for an explicit wait
    RetryAfter,
    /// Exponential backoff schedule
    Backoff,
}

impl DelayReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DelayReason::RateLimitReset => "rate_limit_reset",
            DelayReason::RetryAfter => "retry_after",
            DelayReason::Backoff => "backoff",
        }
    }
}

/// A computed wait before the next attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delay {
    pub duration: Duration,
    pub reason: DelayReason,
}

/// Pure delay calculator
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    retry: RetryConfig,
}

impl RateLimitPolicy {
    pub fn new(retry: RetryConfig) -> Self {
        Self { retry }
    }

    /// Number of retries allowed after the initial attempt
    pub fn max_attempts(&self) -> u32 {
        self.retry.max_attempts()
    }

    /// Delay before retry number `retry_index` (0-based), or `None` once the
    /// schedule is exhausted.
    ///
    /// Precedence: quota reset, then `Retry-After`, then the backoff schedule.
    /// A zero-quota response without a usable reset time falls through to the
    /// next rule.
    pub fn delay_for(&self, retry_index: u32, signals: Option<&ResponseSignals>, now: DateTime<Utc>) -> Option<Delay> {
        let backoff = self.retry.delay_for_attempt(retry_index)?;

        if let Some(signals) = signals {
            if signals.quota_exhausted() {
                if let Some(reset_epoch) = signals.reset_epoch {
                    return Some(Delay {
                        duration: until_reset(reset_epoch, now),
                        reason: DelayReason::RateLimitReset,
                    });
                }
            }

            if let Some(seconds) = signals.retry_after {
                return Some(Delay {
                    duration: Duration::from_secs(seconds),
                    reason: DelayReason::RetryAfter,
                });
            }
        }

        Some(Delay {
            duration: backoff,
            reason: DelayReason::Backoff,
        })
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

/// `max(0, reset - now)` at whole-second precision
pub fn until_reset(reset_epoch: i64, now: DateTime<Utc>) -> Duration {
    let reset = match Utc.timestamp_opt(reset_epoch, 0).single() {
        Some(reset) => reset,
        None => return Duration::ZERO,
    };

    let seconds = (reset - now).num_seconds();
    Duration::from_secs(seconds.max(0) as u64)
}
