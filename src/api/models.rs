use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallback for a missing issue type or status name
pub const UNKNOWN: &str = "Unknown";

/// A subtask as referenced from its parent issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskRef {
    pub key: String,
    pub summary: Option<String>,
}

/// One fetched Jira issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub key: String,
    pub issue_type: String,
    pub status: String,
    pub summary: String,
    pub parent: Option<String>,
    pub subtasks: Vec<SubtaskRef>,
    /// Raw `fields` object, kept for custom field lookups
    pub fields: Value,
}

impl Issue {
    /// Parse one record from a search page. `None` when the record has no key.
    pub fn from_json(record: &Value) -> Option<Self> {
        let key = record["key"].as_str().filter(|k| !k.is_empty())?.to_string();
        let fields = record.get("fields").cloned().unwrap_or(Value::Null);

        let issue_type = named(&fields["issuetype"]).unwrap_or(UNKNOWN).to_string();
        let status = named(&fields["status"]).unwrap_or(UNKNOWN).to_string();
        let summary = fields["summary"].as_str().unwrap_or_default().to_string();
        let parent = reference_key(&fields["parent"]);

        let subtasks = fields["subtasks"]
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let key = entry["key"].as_str()?.to_string();
                        let summary = entry["fields"]["summary"].as_str().map(str::to_string);
                        Some(SubtaskRef { key, summary })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            key,
            issue_type,
            status,
            summary,
            parent,
            subtasks,
            fields,
        })
    }

    /// Epic key held in `field_id`, if set
    pub fn epic_link(&self, field_id: &str) -> Option<String> {
        reference_key(&self.fields[field_id])
    }
}

/// `name` of a `{name: ..}` object
fn named(value: &Value) -> Option<&str> {
    value["name"].as_str()
}

/// Issue key from either a plain string or an object carrying `key`
fn reference_key(value: &Value) -> Option<String> {
    match value {
        Value::String(key) if !key.is_empty() => Some(key.clone()),
        Value::Object(object) => object
            .get("key")
            .and_then(Value::as_str)
            .filter(|k| !k.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// One entry of the `/field` catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub custom: bool,
}
