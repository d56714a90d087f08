//! Jira Cloud REST access
//!
//! Everything that talks to Jira lives here: the transport seam, the
//! resilient fetcher that wraps it, field resolution and issue search.

pub mod constants;
pub mod fetcher;
pub mod fields;
pub mod models;
pub mod resilience;
pub mod search;
pub mod similarity;
pub mod transport;

pub use fetcher::{FetchFailure, ResilientFetcher};
pub use fields::{FieldMapping, FieldResolver, FuzzyMatch};
pub use models::{FieldCatalogEntry, Issue, SubtaskRef};
pub use resilience::{
    Clock, ManualClock, MetricsCollector, MetricsSnapshot, MonitoringConfig, RateLimitPolicy, RecordingSleeper,
    ResilienceConfig, RetryConfig, Sleeper, SystemClock, TokioSleeper,
};
pub use search::IssuePaginator;
pub use transport::{BasicCredentials, HttpTransport, RawResponse, ReqwestTransport, TransportError};
