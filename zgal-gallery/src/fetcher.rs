//! Record fetcher
//!
//! Pages through every source collection in order. Within one collection
//! page N+1 is only requested after page N was handed to the caller, so a
//! caller that renders each batch before pulling the next one never sees
//! out-of-order appends.
//!
//! Failure policy:
//! - A failed page request (network error, non-success status, unreadable
//!   body) ends that collection for the session. Records from earlier pages
//!   stay, nothing is retried, and the fetch state is marked partial.
//! - A hit that cannot be decoded into a [`Record`] is skipped with a warning.
//! - A record id already retained earlier in the session is dropped silently.

use crate::api::{ApiPage, CollectionId, PageCursor, PageSource};
use crate::error::GalleryError;
use crate::record::{Record, RecordId};
use futures::Stream;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// One page of newly retained records
#[derive(Debug, Clone)]
pub struct RecordBatch {
    pub collection: CollectionId,
    /// Never empty
    pub records: Vec<Arc<Record>>,
    /// Cursor of the following page, `None` at the end of the collection
    pub next: Option<PageCursor>,
}

/// Pagination position of one collection
#[derive(Debug, Clone, PartialEq)]
pub enum CursorState {
    /// First page not requested yet
    Start,
    /// Next page to request
    Next(PageCursor),
    /// Last page seen
    Exhausted,
    /// A request failed; pagination stopped early
    Failed,
}

impl CursorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CursorState::Exhausted | CursorState::Failed)
    }
}

#[derive(Debug, Clone)]
struct CollectionProgress {
    id: CollectionId,
    cursor: CursorState,
    pages: usize,
}

/// Collection whose pagination ended early
#[derive(Debug, Clone)]
pub struct CollectionFailure {
    pub collection: CollectionId,
    pub error: String,
}

/// Hit that could not be decoded into a record
#[derive(Debug, Clone)]
pub struct SkippedRecord {
    pub collection: CollectionId,
    /// Zero-based page index within the collection
    pub page: usize,
    /// Position of the hit within its page
    pub position: usize,
    pub reason: String,
}

/// Everything fetched so far in a session
#[derive(Debug, Default)]
pub struct FetchState {
    records: Vec<Arc<Record>>,
    seen: HashSet<RecordId>,
    total_expected: Option<u64>,
    collections: Vec<CollectionProgress>,
    failures: Vec<CollectionFailure>,
    skipped: Vec<SkippedRecord>,
    duplicates_dropped: usize,
}

impl FetchState {
    fn new(sources: Vec<CollectionId>) -> Self {
        let mut unique: Vec<CollectionId> = Vec::with_capacity(sources.len());
        for source in sources {
            if !unique.contains(&source) {
                unique.push(source);
            }
        }

        Self {
            collections: unique
                .into_iter()
                .map(|id| CollectionProgress {
                    id,
                    cursor: CursorState::Start,
                    pages: 0,
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Retained records in arrival order
    pub fn records(&self) -> &[Arc<Record>] {
        &self.records
    }

    pub fn loaded(&self) -> usize {
        self.records.len()
    }

    /// Approximate total reported by the API, `None` when unknown
    pub fn total_expected(&self) -> Option<u64> {
        self.total_expected
    }

    /// Source collections in crawl order
    pub fn sources(&self) -> Vec<CollectionId> {
        self.collections.iter().map(|c| c.id.clone()).collect()
    }

    pub fn cursor(&self, collection: &CollectionId) -> Option<&CursorState> {
        self.collections
            .iter()
            .find(|c| &c.id == collection)
            .map(|c| &c.cursor)
    }

    /// True once every collection is exhausted or failed
    pub fn is_complete(&self) -> bool {
        self.collections.iter().all(|c| c.cursor.is_terminal())
    }

    /// True when at least one collection stopped early
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn failures(&self) -> &[CollectionFailure] {
        &self.failures
    }

    /// Hits skipped as malformed
    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    /// Records dropped because their id had already been retained
    pub fn duplicates_dropped(&self) -> usize {
        self.duplicates_dropped
    }

    /// Decode, de-duplicate and retain the hits of one page
    fn absorb_hits(
        &mut self,
        collection: &CollectionId,
        page: usize,
        hits: Vec<Value>,
    ) -> Vec<Arc<Record>> {
        let mut fresh = Vec::with_capacity(hits.len());

        for (position, hit) in hits.into_iter().enumerate() {
            let record: Record = match serde_json::from_value(hit) {
                Ok(record) => record,
                Err(e) => {
                    let error = GalleryError::MalformedRecord {
                        index: position,
                        reason: e.to_string(),
                    };
                    warn!(collection = %collection, page, "{}", error);
                    self.skipped.push(SkippedRecord {
                        collection: collection.clone(),
                        page,
                        position,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if !self.seen.insert(record.id.clone()) {
                debug!(collection = %collection, id = %record.id, "Dropping duplicate record");
                self.duplicates_dropped += 1;
                continue;
            }

            let record = Arc::new(record);
            self.records.push(Arc::clone(&record));
            fresh.push(record);
        }

        fresh
    }
}

/// Sum of the reported totals of all sources
///
/// One lightweight request per source. Any failure makes the whole total
/// unknown, since a partial sum would overstate progress.
pub async fn fetch_approximate_total(
    source: &dyn PageSource,
    sources: &[CollectionId],
) -> Option<u64> {
    let mut total = 0u64;
    for collection in sources {
        match source.fetch_total(collection).await {
            Ok(count) => total = total.saturating_add(count),
            Err(e) => {
                warn!(collection = %collection, "{}; progress will be indeterminate", e);
                return None;
            }
        }
    }
    Some(total)
}

/// Pull-based paginated fetcher; sole owner of the session's [`FetchState`]
pub struct RecordFetcher {
    source: Arc<dyn PageSource>,
    state: FetchState,
    current: usize,
}

impl RecordFetcher {
    /// Create a fetcher over `sources` (duplicates in the list are ignored)
    pub fn new(source: Arc<dyn PageSource>, sources: Vec<CollectionId>) -> Self {
        Self {
            source,
            state: FetchState::new(sources),
            current: 0,
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    /// Request the approximate total and remember it in the fetch state
    pub async fn fetch_approximate_total(&mut self) -> Option<u64> {
        let sources = self.state.sources();
        let total = fetch_approximate_total(self.source.as_ref(), &sources).await;
        self.state.total_expected = total;
        total
    }

    /// Fetch pages until one yields new records, or every collection is done
    pub async fn next_batch(&mut self) -> Option<RecordBatch> {
        loop {
            let (collection, cursor, page_index) = {
                let progress = self.state.collections.get_mut(self.current)?;
                let cursor = match &progress.cursor {
                    CursorState::Start => None,
                    CursorState::Next(cursor) => Some(cursor.clone()),
                    CursorState::Exhausted | CursorState::Failed => {
                        self.current += 1;
                        continue;
                    }
                };
                (progress.id.clone(), cursor, progress.pages)
            };

            let result = self.source.fetch_page(&collection, cursor.as_ref()).await;
            let progress = &mut self.state.collections[self.current];
            progress.pages += 1;

            let page: ApiPage = match result {
                Ok(page) => page,
                Err(e) => {
                    if e.ends_collection() {
                        warn!(
                            collection = %collection,
                            page = page_index,
                            "Page request failed, collection stopped early: {}", e
                        );
                    } else {
                        error!(
                            collection = %collection,
                            page = page_index,
                            "Cannot request page, collection stopped early: {}", e
                        );
                    }
                    progress.cursor = CursorState::Failed;
                    self.state.failures.push(CollectionFailure {
                        collection,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            // An empty page ends the collection even if the API offers a next link
            let next = if page.hits.is_empty() { None } else { page.next.clone() };
            progress.cursor = match &next {
                Some(cursor) => CursorState::Next(cursor.clone()),
                None => CursorState::Exhausted,
            };

            debug!(
                collection = %collection,
                page = page_index,
                hits = page.hits.len(),
                "Received record page"
            );

            let records = self.state.absorb_hits(&collection, page_index, page.hits);

            if next.is_none() {
                info!(
                    collection = %collection,
                    pages = page_index + 1,
                    "Collection exhausted"
                );
            }

            if records.is_empty() {
                continue;
            }

            return Some(RecordBatch {
                collection,
                records,
                next,
            });
        }
    }

    /// Lazy stream of batches across all collections
    pub fn fetch_all(&mut self) -> impl Stream<Item = RecordBatch> + Send + '_ {
        async_stream::stream! {
            while let Some(batch) = self.next_batch().await {
                yield batch;
            }
        }
    }

    pub fn into_state(self) -> FetchState {
        self.state
    }
}
