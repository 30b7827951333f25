//! Remote record API access
//!
//! The fetcher talks to the API only through [`PageSource`], so pagination,
//! de-duplication and failure handling can be exercised against scripted
//! sources in tests. [`ZenodoClient`] is the HTTP implementation.

mod zenodo_client;

pub use zenodo_client::ZenodoClient;

use crate::error::GalleryResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Source collection (community) identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(String);

impl CollectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CollectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque cursor for the next page, taken from the previous response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn new(cursor: impl Into<String>) -> Self {
        Self(cursor.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page as returned by the API
///
/// Hits stay raw JSON so a single malformed record can be skipped without
/// losing the rest of the page.
#[derive(Debug, Clone, Default)]
pub struct ApiPage {
    pub hits: Vec<Value>,
    /// Reported total size of the result set, when present
    pub total: Option<u64>,
    /// Cursor for the next page; `None` means the collection is exhausted
    pub next: Option<PageCursor>,
}

/// Wire shape of a list response
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse {
    pub hits: ListHits,
    #[serde(default)]
    pub links: Option<ListLinks>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListHits {
    #[serde(default)]
    pub hits: Vec<Value>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListLinks {
    #[serde(default)]
    pub next: Option<String>,
}

impl From<ListResponse> for ApiPage {
    fn from(response: ListResponse) -> Self {
        Self {
            hits: response.hits.hits,
            total: response.hits.total,
            next: response
                .links
                .and_then(|links| links.next)
                .filter(|next| !next.is_empty())
                .map(PageCursor::new),
        }
    }
}

/// Paginated record source
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page of a collection
    ///
    /// `cursor` is `None` for the first page and the previous page's
    /// `next` cursor afterwards.
    async fn fetch_page(
        &self,
        collection: &CollectionId,
        cursor: Option<&PageCursor>,
    ) -> GalleryResult<ApiPage>;

    /// Lightweight request reading only the reported total of a collection
    async fn fetch_total(&self, collection: &CollectionId) -> GalleryResult<u64>;
}
