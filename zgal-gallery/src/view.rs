//! View state: active filter × current page
//!
//! The visible record list is never stored. It is derived on demand from
//! the retained records and the active filter, so it cannot drift from the
//! fetched data.

use crate::keywords::{sanitize, SanitizedKeyword};
use crate::record::Record;
use serde::Serialize;
use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

/// Key of the pseudo-filter matching every record
pub const ALL_FILTER: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(into = "String")]
pub enum Filter {
    #[default]
    All,
    Tag(SanitizedKeyword),
}

impl Filter {
    /// Parse user input: "all" (any case) or blank selects everything
    pub fn from_input(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_FILTER) {
            Filter::All
        } else {
            Filter::Tag(sanitize(trimmed))
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Filter::All => ALL_FILTER,
            Filter::Tag(key) => key.as_str(),
        }
    }

    /// True when the record carries the filter tag
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::All => true,
            Filter::Tag(key) => {
                !key.is_empty() && record.keywords().iter().any(|raw| sanitize(raw) == *key)
            }
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl From<Filter> for String {
    fn from(filter: Filter) -> Self {
        filter.key().to_string()
    }
}

/// Current view selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub active_filter: Filter,
    /// 1-indexed
    pub current_page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            active_filter: Filter::All,
            current_page: 1,
        }
    }
}

/// Records matching `filter`, newest first
///
/// Undated records follow all dated ones. The sort is stable, so records
/// with equal dates keep their fetch order.
pub fn filter_records(records: &[Arc<Record>], filter: &Filter) -> Vec<Arc<Record>> {
    let mut matching: Vec<Arc<Record>> = records
        .iter()
        .filter(|record| filter.matches(record))
        .cloned()
        .collect();
    matching.sort_by_cached_key(|record| {
        let date = record.publication_date();
        (date.is_none(), Reverse(date))
    });
    matching
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: u64, date: Option<&str>, keywords: &[&str]) -> Arc<Record> {
        Arc::new(
            serde_json::from_value(json!({
                "id": id,
                "metadata": {"publication_date": date, "keywords": keywords}
            }))
            .unwrap(),
        )
    }

    fn ids(records: &[Arc<Record>]) -> Vec<String> {
        records.iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn test_newest_first_undated_last_stable() {
        let records = vec![
            record(1, Some("2020-01-01"), &[]),
            record(2, None, &[]),
            record(3, Some("2023-06-01"), &[]),
            record(4, Some("2020-01-01"), &[]),
            record(5, Some("not a date"), &[]),
        ];
        assert_eq!(ids(&filter_records(&records, &Filter::All)), vec!["3", "1", "4", "2", "5"]);
    }

    #[test]
    fn test_tag_filter_uses_sanitized_keys() {
        let records = vec![
            record(1, None, &["Wood pasture"]),
            record(2, None, &["Hedges"]),
            record(3, None, &["wood-pasture"]),
        ];
        let filter = Filter::from_input("WOOD PASTURE");
        assert_eq!(filter.key(), "woodpasture");
        assert_eq!(ids(&filter_records(&records, &filter)), vec!["1", "3"]);
    }

    #[test]
    fn test_from_input_all() {
        assert_eq!(Filter::from_input(" All "), Filter::All);
        assert_eq!(Filter::from_input(""), Filter::All);
        assert_eq!(Filter::All.to_string(), "all");
    }

    #[test]
    fn test_unknown_tag_matches_nothing() {
        let records = vec![record(1, None, &["Hedges"])];
        assert!(filter_records(&records, &Filter::from_input("goats")).is_empty());
        assert!(filter_records(&records, &Filter::from_input("???")).is_empty());
    }
}
