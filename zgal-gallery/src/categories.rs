//! Category index
//!
//! Accumulates sanitized keyword → (label, count) as record batches arrive.
//! Counting is per keyword occurrence: a record listing "Silvopastoral" and
//! "silvopastoral " adds 2 to `silvopastoral`. The label of a key is the
//! first raw spelling seen in the session and is never replaced.

use crate::keywords::{sanitize, SanitizedKeyword};
use crate::record::Record;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CategoryEntry {
    label: String,
    count: usize,
}

/// One row of the category listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub key: SanitizedKeyword,
    pub label: String,
    pub count: usize,
    /// Official typology label
    pub is_typology: bool,
}

/// Append-only keyword index for one session
#[derive(Debug, Default)]
pub struct CategoryIndex {
    entries: HashMap<SanitizedKeyword, CategoryEntry>,
    records_absorbed: usize,
}

impl CategoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every keyword of every record in the batch
    pub fn absorb(&mut self, batch: &[Arc<Record>]) {
        for record in batch {
            self.absorb_record(record);
        }
    }

    fn absorb_record(&mut self, record: &Record) {
        self.records_absorbed += 1;
        for raw in record.keywords() {
            let key = sanitize(raw);
            if key.is_empty() {
                continue;
            }
            self.entries
                .entry(key)
                .or_insert_with(|| CategoryEntry {
                    label: raw.clone(),
                    count: 0,
                })
                .count += 1;
        }
    }

    /// Count for a key, 0 when unseen
    pub fn count(&self, key: &SanitizedKeyword) -> usize {
        self.entries.get(key).map_or(0, |e| e.count)
    }

    /// Display label for a key
    pub fn label(&self, key: &SanitizedKeyword) -> Option<&str> {
        self.entries.get(key).map(|e| e.label.as_str())
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records absorbed so far (count of the "all" entry)
    pub fn records_absorbed(&self) -> usize {
        self.records_absorbed
    }

    /// All entries sorted case-insensitively by label
    ///
    /// Labels equal ignoring case fall back to key order so the listing is
    /// deterministic.
    pub fn snapshot(&self) -> Vec<CategorySummary> {
        let mut rows: Vec<CategorySummary> = self
            .entries
            .iter()
            .map(|(key, entry)| CategorySummary {
                key: key.clone(),
                label: entry.label.clone(),
                count: entry.count,
                is_typology: key.is_typology(),
            })
            .collect();

        rows.sort_by(|a, b| {
            a.label
                .to_lowercase()
                .cmp(&b.label.to_lowercase())
                .then_with(|| a.key.cmp(&b.key))
        });
        rows
    }
}
