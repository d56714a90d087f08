//! Resolve human-readable field names to Jira field ids

use super::constants::{DEFAULT_EPIC_FIELD_ID, EPIC_LINK_FIELD, FIELD_SIMILARITY_CUTOFF, SYSTEM_FIELDS};
use super::fetcher::ResilientFetcher;
use super::models::FieldCatalogEntry;
use super::similarity::closest_match;
use log::{debug, info, warn};
use serde::Serialize;

/// A required name that was resolved through similarity rather than equality
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzyMatch {
    pub requested: String,
    /// Catalog name or id the request matched
    pub matched: String,
    pub field_id: String,
    pub score: f64,
}

/// Logical field name to field id; built once per run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldMapping {
    entries: Vec<(String, String)>,
    unmatched: Vec<String>,
    fuzzy: Vec<FuzzyMatch>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapping holding only the system fields every search needs
    pub fn with_system_fields() -> Self {
        let mut mapping = Self::new();
        for (name, id) in SYSTEM_FIELDS {
            mapping.insert(name, id);
        }
        mapping
    }

    /// Map `name` to `field_id`, replacing an earlier mapping of the same name
    pub fn insert(&mut self, name: &str, field_id: &str) {
        match self.entries.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = field_id.to_string(),
            None => self.entries.push((name.to_string(), field_id.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, id)| id.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Field holding the epic reference, `epiclink` when unresolved
    pub fn epic_field_id(&self) -> &str {
        self.get(EPIC_LINK_FIELD).unwrap_or(DEFAULT_EPIC_FIELD_ID)
    }

    /// Distinct field ids in insertion order, for the search `fields` parameter.
    /// The epic field is always requested, falling back to `epiclink`.
    pub fn field_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(self.entries.len() + 1);
        let epic = self.epic_field_id();
        for id in self.entries.iter().map(|(_, id)| id.as_str()).chain([epic]) {
            if !ids.iter().any(|existing| existing == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(name, id)| (name.as_str(), id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unmatched(&self) -> &[String] {
        &self.unmatched
    }

    pub fn fuzzy_matches(&self) -> &[FuzzyMatch] {
        &self.fuzzy
    }

    /// Resolve `required` names against a field catalog
    pub fn resolve_against(catalog: &[FieldCatalogEntry], required: &[String]) -> Self {
        let mut mapping = Self::with_system_fields();

        for name in required {
            if let Some(entry) = catalog.iter().find(|e| &e.name == name) {
                debug!("Found required field: {} -> {}", name, entry.id);
                mapping.insert(name, &entry.id);
                continue;
            }
            if let Some(entry) = catalog.iter().find(|e| &e.id == name) {
                debug!("Required field {} is a field id", name);
                mapping.insert(name, &entry.id);
                continue;
            }

            let candidates = catalog.iter().flat_map(|e| [e.name.as_str(), e.id.as_str()]);
            let resolved = closest_match(name, candidates, FIELD_SIMILARITY_CUTOFF).and_then(|(matched, score)| {
                catalog
                    .iter()
                    .find(|e| e.name == matched || e.id == matched)
                    .map(|entry| FuzzyMatch {
                        requested: name.clone(),
                        matched: matched.to_string(),
                        field_id: entry.id.clone(),
                        score,
                    })
            });

            match resolved {
                Some(fuzzy) => {
                    info!(
                        "Required field '{}' not found, using closest match '{}' ({}, score {:.2})",
                        name, fuzzy.matched, fuzzy.field_id, fuzzy.score
                    );
                    mapping.insert(name, &fuzzy.field_id);
                    mapping.fuzzy.push(fuzzy);
                }
                None => {
                    warn!("Required field '{}' not found and no close match", name);
                    mapping.unmatched.push(name.clone());
                }
            }
        }

        mapping
    }
}

/// Fetches the field catalog once and builds the [`FieldMapping`]
pub struct FieldResolver<'a> {
    fetcher: &'a ResilientFetcher,
    field_url: String,
}

impl<'a> FieldResolver<'a> {
    pub fn new(fetcher: &'a ResilientFetcher, field_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            field_url: field_url.into(),
        }
    }

    /// Never fails: a missing catalog leaves every required name unmatched
    pub async fn resolve(&self, required: &[String]) -> FieldMapping {
        let catalog = match self.fetch_catalog().await {
            Some(catalog) => catalog,
            None => {
                let mut mapping = FieldMapping::with_system_fields();
                mapping.unmatched = required.to_vec();
                return mapping;
            }
        };

        debug!("Fields found in Jira ({}):", catalog.len());
        for entry in &catalog {
            debug!(" - {}: {}", entry.name, entry.id);
        }

        let mapping = FieldMapping::resolve_against(&catalog, required);
        if mapping.unmatched().is_empty() {
            info!("All {} required fields resolved", required.len());
        } else {
            warn!("Missing or unmatched required fields: {}", mapping.unmatched().join(", "));
        }
        mapping
    }

    async fn fetch_catalog(&self) -> Option<Vec<FieldCatalogEntry>> {
        let body = match self.fetcher.fetch(&self.field_url, &[]).await {
            Ok(body) => body,
            Err(failure) => {
                warn!("Failed to fetch fields from Jira: {}", failure);
                return None;
            }
        };

        match serde_json::from_value::<Vec<FieldCatalogEntry>>(body) {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                warn!("Field catalog has an unexpected shape: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str) -> FieldCatalogEntry {
        FieldCatalogEntry {
            id: id.to_string(),
            name: name.to_string(),
            custom: id.starts_with("customfield_"),
        }
    }

    fn catalog() -> Vec<FieldCatalogEntry> {
        vec![
            entry("summary", "Summary"),
            entry("customfield_10014", "Epic Link"),
            entry("customfield_10016", "Story point estimate"),
        ]
    }

    #[test]
    fn test_system_fields_always_present() {
        let mapping = FieldMapping::resolve_against(&[], &[]);

        assert_eq!(mapping.get("Parent"), Some("parent"));
        assert_eq!(mapping.get("Issue Type"), Some("issuetype"));
        assert_eq!(mapping.get("Sub-tasks"), Some("subtasks"));
        assert_eq!(mapping.epic_field_id(), DEFAULT_EPIC_FIELD_ID);
        assert_eq!(
            mapping.field_ids(),
            vec!["parent", "summary", "status", "issuetype", "subtasks", "epiclink"]
        );
    }

    #[test]
    fn test_exact_name_match() {
        let mapping = FieldMapping::resolve_against(&catalog(), &["Epic Link".to_string()]);

        assert_eq!(mapping.epic_field_id(), "customfield_10014");
        assert!(mapping.fuzzy_matches().is_empty());
        assert!(mapping.unmatched().is_empty());
    }

    #[test]
    fn test_exact_id_match() {
        let mapping = FieldMapping::resolve_against(&catalog(), &["customfield_10016".to_string()]);

        assert_eq!(mapping.get("customfield_10016"), Some("customfield_10016"));
    }

    #[test]
    fn test_unmatched_is_reported() {
        let mapping = FieldMapping::resolve_against(&catalog(), &["Zebra".to_string()]);

        assert_eq!(mapping.unmatched(), &["Zebra".to_string()]);
        assert!(!mapping.contains("Zebra"));
    }

    #[test]
    fn test_field_ids_are_distinct() {
        let mut mapping = FieldMapping::with_system_fields();
        mapping.insert("Headline", "summary");
        mapping.insert("Epic Link", "customfield_10014");

        let ids = mapping.field_ids();

        assert_eq!(ids.iter().filter(|id| *id == "summary").count(), 1);
        assert_eq!(ids.last().map(String::as_str), Some("customfield_10014"));
        assert_eq!(mapping.len(), 7);
    }

    #[test]
    fn test_insert_replaces() {
        let mut mapping = FieldMapping::new();
        mapping.insert("Epic Link", "a");
        mapping.insert("Epic Link", "b");

        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get("Epic Link"), Some("b"));
    }
}
