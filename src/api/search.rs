//! Paginated issue search

use super::constants::{params, PAGE_SIZE};
use super::fetcher::ResilientFetcher;
use super::models::Issue;
use log::{debug, info, warn};

/// Walks `/search` pages until a short page or a failed fetch
pub struct IssuePaginator<'a> {
    fetcher: &'a ResilientFetcher,
    search_url: String,
    jql: String,
    page_size: usize,
}

impl<'a> IssuePaginator<'a> {
    pub fn new(fetcher: &'a ResilientFetcher, search_url: impl Into<String>, jql: impl Into<String>) -> Self {
        Self {
            fetcher,
            search_url: search_url.into(),
            jql: jql.into(),
            page_size: PAGE_SIZE,
        }
    }

    fn page_query(&self, field_ids: &[String], start_at: usize) -> Vec<(String, String)> {
        vec![
            (params::JQL.to_string(), self.jql.clone()),
            (params::FIELDS.to_string(), field_ids.join(",")),
            (params::START_AT.to_string(), start_at.to_string()),
            (params::MAX_RESULTS.to_string(), self.page_size.to_string()),
        ]
    }

    /// Every issue the query yields, in page order.
    ///
    /// A failed page ends the walk; issues from earlier pages are kept.
    pub async fn fetch_all(&self, field_ids: &[String]) -> Vec<Issue> {
        let mut issues = Vec::new();
        let mut start_at = 0;

        loop {
            let query = self.page_query(field_ids, start_at);
            let body = match self.fetcher.fetch(&self.search_url, &query).await {
                Ok(body) => body,
                Err(failure) => {
                    warn!(
                        "Stopping pagination at offset {} after {} issues: {}",
                        start_at,
                        issues.len(),
                        failure
                    );
                    break;
                }
            };

            let Some(records) = body["issues"].as_array() else {
                warn!("Search page at offset {} has no issues array, stopping", start_at);
                break;
            };

            let page_len = records.len();
            for record in records {
                match Issue::from_json(record) {
                    Some(issue) => issues.push(issue),
                    None => warn!("Skipping search record without a key at offset {}", start_at),
                }
            }
            debug!("Fetched {} issues at offset {}", page_len, start_at);

            if page_len < self.page_size {
                break;
            }
            start_at += self.page_size;
        }

        info!("Fetched {} issues", issues.len());
        issues
    }
}
