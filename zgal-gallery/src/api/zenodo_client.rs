//! Zenodo records API client
//!
//! `GET <records_url>?community=<id>&type=image&size=<n>&sort=<order>` with
//! `links.next` as the continuation cursor. Requests go through a client-side
//! rate limiter; nothing is retried.

use super::{ApiPage, CollectionId, ListResponse, PageCursor, PageSource};
use crate::error::{GalleryError, GalleryResult};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Url;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;
use zgal_common::config::ApiConfig;

const USER_AGENT: &str = concat!("zgal/", env!("CARGO_PKG_VERSION"));

/// HTTP page source backed by the Zenodo records endpoint
pub struct ZenodoClient {
    http_client: reqwest::Client,
    records_url: String,
    page_size: u32,
    sort: String,
    rate_limiter: DefaultDirectRateLimiter,
}

impl ZenodoClient {
    pub fn new(config: &ApiConfig) -> GalleryResult<Self> {
        let per_minute = NonZeroU32::new(config.requests_per_minute).ok_or_else(|| {
            zgal_common::Error::Config("api.requests_per_minute must be greater than 0".to_string())
        })?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| zgal_common::Error::Internal(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            records_url: config.records_url.clone(),
            page_size: config.page_size,
            sort: config.sort.clone(),
            rate_limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
        })
    }

    /// URL of the first page of a collection
    pub fn first_page_url(&self, collection: &CollectionId, size: u32) -> GalleryResult<Url> {
        let size = size.to_string();
        Url::parse_with_params(
            &self.records_url,
            &[
                ("community", collection.as_str()),
                ("type", "image"),
                ("size", size.as_str()),
                ("sort", self.sort.as_str()),
            ],
        )
        .map_err(|e| {
            zgal_common::Error::Config(format!("Invalid records_url {}: {}", self.records_url, e))
                .into()
        })
    }

    async fn get_page(&self, collection: &CollectionId, url: &str) -> GalleryResult<ApiPage> {
        self.rate_limiter.until_ready().await;

        debug!(collection = %collection, url = %url, "Requesting record page");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| GalleryError::NetworkFailure {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GalleryError::HttpStatus {
                collection: collection.to_string(),
                status: status.as_u16(),
            });
        }

        let body: ListResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                GalleryError::InvalidResponse {
                    collection: collection.to_string(),
                    message: e.to_string(),
                }
            } else {
                GalleryError::NetworkFailure {
                    collection: collection.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        Ok(body.into())
    }
}

#[async_trait]
impl PageSource for ZenodoClient {
    async fn fetch_page(
        &self,
        collection: &CollectionId,
        cursor: Option<&PageCursor>,
    ) -> GalleryResult<ApiPage> {
        let url = match cursor {
            Some(cursor) => cursor.as_str().to_string(),
            None => self.first_page_url(collection, self.page_size)?.to_string(),
        };
        self.get_page(collection, &url).await
    }

    async fn fetch_total(&self, collection: &CollectionId) -> GalleryResult<u64> {
        let url = self.first_page_url(collection, 1)?;
        let page = self
            .get_page(collection, url.as_str())
            .await
            .map_err(|e| GalleryError::CountUnavailable(e.to_string()))?;

        page.total.ok_or_else(|| {
            GalleryError::CountUnavailable(format!("collection {} reported no total", collection))
        })
    }
}
