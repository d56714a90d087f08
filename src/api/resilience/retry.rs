//! Retry schedule and the per-fetch retry state machine
//!
//! A logical fetch moves through `Attempting → (Sleeping → Attempting)* →
//! Succeeded | Exhausted | Rejected`. The machine only decides; the fetcher
//! performs the I/O and the sleeps it is told to perform.

use super::rate_limit::{Delay, RateLimitPolicy, ResponseSignals};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Exponential backoff schedule, in seconds
const DEFAULT_DELAYS_SECS: [u64; 7] = [1, 2, 4, 8, 16, 32, 64];

/// Backoff schedule: one entry per retry after the initial attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    delays: Vec<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from_delays(DEFAULT_DELAYS_SECS.iter().map(|s| Duration::from_secs(*s)).collect())
    }
}

impl RetryConfig {
    pub fn from_delays(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    pub fn from_secs(delays: &[u64]) -> Self {
        Self::from_delays(delays.iter().map(|s| Duration::from_secs(*s)).collect())
    }

    /// Retries allowed after the initial attempt
    pub fn max_attempts(&self) -> u32 {
        self.delays.len() as u32
    }

    /// Backoff before retry `attempt` (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        self.delays.get(attempt as usize).copied()
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }
}

/// How a status code is handled by the fetcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// 200
    Success,
    /// 422 Unprocessable Entity: never retried
    Unprocessable,
    /// Everything else, including 202 and 403
    Retryable,
}

impl ResponseClass {
    pub fn from_status_code(status: u16) -> Self {
        match status {
            200 => ResponseClass::Success,
            422 => ResponseClass::Unprocessable,
            _ => ResponseClass::Retryable,
        }
    }
}

/// What happened on one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Responded(ResponseSignals),
    TimedOut,
}

/// Where the next request goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    Original,
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState {
    /// Request `attempt` should be issued (0 = initial request)
    Attempting { attempt: u32, target: RequestTarget },
    /// Wait before issuing request `attempt`
    Sleeping { attempt: u32, delay: Delay },
    Succeeded { attempts: u32 },
    Exhausted { attempts: u32, last_status: Option<u16> },
    Rejected { attempts: u32, status: u16 },
}

impl RetryState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RetryState::Succeeded { .. } | RetryState::Exhausted { .. } | RetryState::Rejected { .. }
        )
    }
}

/// Drives one logical fetch
#[derive(Debug, Clone)]
pub struct RetryMachine {
    policy: RateLimitPolicy,
    state: RetryState,
    redirect: Option<String>,
    last_status: Option<u16>,
    last_signals: Option<ResponseSignals>,
}

impl RetryMachine {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            state: RetryState::Attempting {
                attempt: 0,
                target: RequestTarget::Original,
            },
            redirect: None,
            last_status: None,
            last_signals: None,
        }
    }

    pub fn state(&self) -> &RetryState {
        &self.state
    }

    /// Last status seen on any attempt
    pub fn last_status(&self) -> Option<u16> {
        self.last_status
    }

    /// Feed the result of the attempt announced by `Attempting`.
    ///
    /// Outcomes fed in any other state are ignored.
    pub fn record(&mut self, outcome: AttemptOutcome, now: DateTime<Utc>) -> &RetryState {
        let attempt = match self.state {
            RetryState::Attempting { attempt, .. } => attempt,
            _ => return &self.state,
        };
        let attempts = attempt + 1;

        match outcome {
            AttemptOutcome::Responded(signals) => {
                self.last_status = Some(signals.status);
                match ResponseClass::from_status_code(signals.status) {
                    ResponseClass::Success => {
                        self.state = RetryState::Succeeded { attempts };
                        return &self.state;
                    }
                    ResponseClass::Unprocessable => {
                        self.state = RetryState::Rejected {
                            attempts,
                            status: signals.status,
                        };
                        return &self.state;
                    }
                    ResponseClass::Retryable => {}
                }
                if let Some(location) = &signals.location {
                    self.redirect = Some(location.clone());
                }
                self.last_signals = Some(signals);
            }
            AttemptOutcome::TimedOut => {
                self.last_signals = self.last_signals.as_ref().map(ResponseSignals::without_wait_hints);
            }
        }

        // Retry `attempt` (0-indexed) follows request `attempt`
        self.state = match self.policy.delay_for(attempt, self.last_signals.as_ref(), now) {
            Some(delay) => RetryState::Sleeping {
                attempt: attempt + 1,
                delay,
            },
            None => RetryState::Exhausted {
                attempts,
                last_status: self.last_status,
            },
        };
        &self.state
    }

    /// The requested sleep has elapsed
    pub fn wake(&mut self) -> &RetryState {
        if let RetryState::Sleeping { attempt, .. } = self.state {
            let target = match &self.redirect {
                Some(location) => RequestTarget::Redirect(location.clone()),
                None => RequestTarget::Original,
            };
            self.state = RetryState::Attempting { attempt, target };
        }
        &self.state
    }
}
