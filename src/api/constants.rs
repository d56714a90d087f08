//! API constants for the Jira Cloud REST API

/// Field catalog lives in v2 only; v3 has no `/field`
pub const FIELD_API_PATH: &str = "/rest/api/2/field";

/// Issue search endpoint
pub const SEARCH_API_PATH: &str = "/rest/api/3/search";

/// Issue browse path, joined with an issue key
pub const BROWSE_PATH: &str = "/browse";

/// Jira's default (and maximum honoured) page size for search
pub const PAGE_SIZE: usize = 50;

/// Maximum characters of a summary shown in a node label
pub const SUMMARY_LABEL_CHARS: usize = 64;

/// Cutoff for fuzzy field-name matching
pub const FIELD_SIMILARITY_CUTOFF: f64 = 0.6;

/// Logical name of the epic reference field
pub const EPIC_LINK_FIELD: &str = "Epic Link";

/// Field id used for epic references when the catalog has no "Epic Link"
pub const DEFAULT_EPIC_FIELD_ID: &str = "epiclink";

/// Search query parameter names
pub mod params {
    pub const JQL: &str = "jql";
    pub const FIELDS: &str = "fields";
    pub const START_AT: &str = "startAt";
    pub const MAX_RESULTS: &str = "maxResults";
}

/// System field ids every search needs, keyed by logical name
pub const SYSTEM_FIELDS: &[(&str, &str)] = &[
    ("Parent", "parent"),
    ("Summary", "summary"),
    ("Status", "status"),
    ("Issue Type", "issuetype"),
    ("Sub-tasks", "subtasks"),
];

/// Build the field catalog URL
pub fn field_endpoint(base_url: &str) -> String {
    format!("{}{}", base_url, FIELD_API_PATH)
}

/// Build the issue search URL
pub fn search_endpoint(base_url: &str) -> String {
    format!("{}{}", base_url, SEARCH_API_PATH)
}

/// Build the canonical browse URL for an issue key
pub fn browse_url(base_url: &str, issue_key: &str) -> String {
    format!("{}{}/{}", base_url, BROWSE_PATH, issue_key)
}
