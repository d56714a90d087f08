//! Shared fixtures: a scripted transport and a frozen clock

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use jira_graph::api::{
    HttpTransport, ManualClock, RawResponse, RecordingSleeper, ResilienceConfig, ResilientFetcher, TransportError,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const BASE_URL: &str = "https://acme.atlassian.net";
pub const START_EPOCH: i64 = 1_700_000_000;

pub fn start_time() -> DateTime<Utc> {
    Utc.timestamp_opt(START_EPOCH, 0).unwrap()
}

/// One request as the transport saw it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl RecordedCall {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

/// Replays a fixed sequence of outcomes, one per request
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Result<RawResponse, TransportError>>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<RawResponse, TransportError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            url: url.to_string(),
            query: query.to_vec(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("script exhausted".to_string())))
    }
}

pub fn ok(body: Value) -> Result<RawResponse, TransportError> {
    Ok(RawResponse::new(200, body.to_string()))
}

pub fn status(code: u16) -> Result<RawResponse, TransportError> {
    Ok(RawResponse::new(code, ""))
}

pub fn timeout() -> Result<RawResponse, TransportError> {
    Err(TransportError::Timeout)
}

/// Fetcher on a frozen clock whose sleeps only advance that clock
pub fn test_fetcher(transport: &ScriptedTransport) -> (ResilientFetcher, RecordingSleeper, ManualClock) {
    let clock = ManualClock::new(start_time());
    let sleeper = RecordingSleeper::with_clock(clock.clone());
    let fetcher = ResilientFetcher::new(Arc::new(transport.clone()), &ResilienceConfig::default())
        .with_sleeper(Arc::new(sleeper.clone()))
        .with_clock(Arc::new(clock.clone()));
    (fetcher, sleeper, clock)
}

/// Search record in Jira's shape
pub fn issue(key: &str, issue_type: &str, summary: &str) -> Value {
    json!({
        "key": key,
        "fields": {
            "issuetype": {"name": issue_type},
            "status": {"name": "Open"},
            "summary": summary
        }
    })
}

/// `count` numbered issues starting at `first`
pub fn issue_page(first: usize, count: usize) -> Value {
    let issues: Vec<Value> = (first..first + count)
        .map(|n| issue(&format!("PROJ-{}", n), "Task", &format!("Issue {}", n)))
        .collect();
    json!({ "startAt": first, "maxResults": 50, "issues": issues })
}

pub fn field_catalog() -> Value {
    json!([
        {"id": "summary", "name": "Summary", "custom": false},
        {"id": "status", "name": "Status", "custom": false},
        {"id": "customfield_10014", "name": "Epic Links", "custom": true},
        {"id": "customfield_10020", "name": "Sprint", "custom": true}
    ])
}
