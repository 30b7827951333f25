//! Shared fixtures for zgal-gallery integration tests
//!
//! A scripted in-memory page source, image probes with fixed behavior, and
//! a session harness wired to headless host services.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use zgal_common::config::TomlConfig;
use zgal_common::events::{EventBus, GalleryEvent};
use zgal_gallery::api::{ApiPage, CollectionId, PageCursor, PageSource};
use zgal_gallery::error::{GalleryError, GalleryResult};
use zgal_gallery::render::headless::{HeadlessLayout, HeadlessLightbox, HeadlessMap, StaticHostPage};
use zgal_gallery::render::{ImageLoad, ImageProbe, InstantProbe, RenderServices};
use zgal_gallery::{GallerySession, SessionServices};

// ================================================================================================
// Records
// ================================================================================================

/// Minimal valid record hit
pub fn photo(id: u64, date: Option<&str>, keywords: &[&str]) -> Value {
    json!({
        "id": id,
        "doi": format!("10.5281/zenodo.{}", id),
        "files": [{"key": format!("photo{}.jpg", id)}],
        "metadata": {
            "title": format!("Photo {}", id),
            "creators": [{"name": "Doe, Jane"}],
            "publication_date": date,
            "keywords": keywords
        },
        "stats": {"views": id * 10}
    })
}

/// Record hit with a position
pub fn located_photo(id: u64, lat: f64, lon: f64) -> Value {
    let mut hit = photo(id, Some("2022-01-01"), &[]);
    hit["metadata"]["custom"] = json!({
        "dwc:decimalLatitude": [lat],
        "dwc:decimalLongitude": [lon]
    });
    hit
}

// ================================================================================================
// Scripted page source
// ================================================================================================

/// One scripted response
#[derive(Debug, Clone)]
pub enum ScriptedPage {
    Hits(Vec<Value>),
    /// Network failure
    Fail,
    /// Request never completes
    Hang,
}

/// In-memory page source replaying scripted pages per collection
///
/// Cursors have the form `<collection>#<page index>`. Every request is
/// logged so tests can assert request order.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    pages: HashMap<String, Vec<ScriptedPage>>,
    totals: HashMap<String, u64>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(mut self, id: &str, pages: Vec<ScriptedPage>) -> Self {
        self.pages.insert(id.to_string(), pages);
        self
    }

    pub fn total(mut self, id: &str, total: u64) -> Self {
        self.totals.insert(id.to_string(), total);
        self
    }

    /// Requests made so far, as `<collection>#<page index>`
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(
        &self,
        collection: &CollectionId,
        cursor: Option<&PageCursor>,
    ) -> GalleryResult<ApiPage> {
        let index: usize = cursor
            .and_then(|c| c.as_str().rsplit('#').next())
            .and_then(|i| i.parse().ok())
            .unwrap_or(0);
        self.requests
            .lock()
            .unwrap()
            .push(format!("{}#{}", collection, index));

        let pages = self.pages.get(collection.as_str()).ok_or(GalleryError::HttpStatus {
            collection: collection.to_string(),
            status: 404,
        })?;

        match pages.get(index) {
            Some(ScriptedPage::Fail) => Err(GalleryError::NetworkFailure {
                collection: collection.to_string(),
                message: "connection reset".to_string(),
            }),
            Some(ScriptedPage::Hang) => {
                std::future::pending::<()>().await;
                Ok(ApiPage::default())
            }
            Some(ScriptedPage::Hits(hits)) => Ok(ApiPage {
                hits: hits.clone(),
                total: self.totals.get(collection.as_str()).copied(),
                next: (index + 1 < pages.len())
                    .then(|| PageCursor::new(format!("{}#{}", collection, index + 1))),
            }),
            None => Ok(ApiPage::default()),
        }
    }

    async fn fetch_total(&self, collection: &CollectionId) -> GalleryResult<u64> {
        self.totals
            .get(collection.as_str())
            .copied()
            .ok_or_else(|| GalleryError::CountUnavailable(format!("no total for {}", collection)))
    }
}

// ================================================================================================
// Image probes
// ================================================================================================

/// Every image fails to load
pub struct FailingProbe;

#[async_trait]
impl ImageProbe for FailingProbe {
    async fn load(&self, _url: &str) -> ImageLoad {
        ImageLoad::Failed("HTTP 404".to_string())
    }
}

/// Images never finish loading
pub struct HangingProbe;

#[async_trait]
impl ImageProbe for HangingProbe {
    async fn load(&self, _url: &str) -> ImageLoad {
        std::future::pending::<()>().await;
        ImageLoad::Loaded
    }
}

// ================================================================================================
// Session harness
// ================================================================================================

pub struct Harness {
    pub session: GallerySession,
    pub source: Arc<ScriptedSource>,
    pub layout: Arc<HeadlessLayout>,
    pub lightbox: Arc<HeadlessLightbox>,
    pub map: Arc<HeadlessMap>,
    pub events: broadcast::Receiver<GalleryEvent>,
}

impl Harness {
    /// Events received so far
    pub fn drain_events(&mut self) -> Vec<GalleryEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

pub fn test_config(communities: &[&str], page_size: usize) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.api.communities = communities.iter().map(|c| c.to_string()).collect();
    config.gallery.page_size = page_size;
    config
}

pub fn harness(source: ScriptedSource, config: &TomlConfig) -> Harness {
    harness_with(source, config, Arc::new(InstantProbe), &["gallery", "map"])
}

pub fn harness_with(
    source: ScriptedSource,
    config: &TomlConfig,
    probe: Arc<dyn ImageProbe>,
    mounts: &[&str],
) -> Harness {
    let source = Arc::new(source);
    let layout = Arc::new(HeadlessLayout::new());
    let lightbox = Arc::new(HeadlessLightbox::new());
    let map = Arc::new(HeadlessMap::new());

    let services = SessionServices {
        source: source.clone(),
        host: Arc::new(StaticHostPage::new(mounts.iter().copied())),
        render: RenderServices {
            layout: layout.clone(),
            lightbox: lightbox.clone(),
            probe,
        },
        map: map.clone(),
    };

    let event_bus = EventBus::new(1000);
    let events = event_bus.subscribe();

    Harness {
        session: GallerySession::new(config, services, event_bus),
        source,
        layout,
        lightbox,
        map,
        events,
    }
}
