//! Gallery render pipeline
//!
//! Turns records into grid items and drives the layout, lightbox and
//! progressive reveal. Items are appended in the order they are presented;
//! the pipeline never reorders them.
//!
//! The layout is initialised on the first `present` after construction or
//! after `destroy`. Later calls register only the new items. Every call
//! re-attaches the lightbox over all items so new ones open as well.
//!
//! Each `present` spawns one reveal pass over its new items. A pass waits for
//! every image in parallel with a per-image timeout, marks each item shown as
//! soon as its own image settles, and asks the layout to recalculate.
//! `destroy` aborts passes still in flight so a stale pass never touches the
//! items of a later view.

pub mod headless;
pub mod reveal;
pub mod services;

pub use reveal::{HttpImageProbe, ImageLoad, ImageProbe, InstantProbe, RevealOutcome};
pub use services::{
    default_caption, escape_html, require_mount, HostPage, LayoutService, LayoutTarget,
    LightboxEntry, LightboxService, MapService, TitleBuilder,
};

use crate::geo::map_link;
use crate::keywords::{tag_set, SanitizedKeyword};
use crate::record::{image_url, Coordinates, Record, RecordId};
use chrono::Utc;
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};
use uuid::Uuid;
use zgal_common::config::{ApiConfig, GalleryConfig};
use zgal_common::events::{EventBus, GalleryEvent, RevealCounts};

/// Selector the lightbox is attached to
pub const LIGHTBOX_SELECTOR: &str = ".popup-btn";

/// Image URL parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSettings {
    pub iiif_base: String,
    pub thumbnail_width: u32,
    pub full_width: u32,
}

impl ImageSettings {
    pub fn from_config(api: &ApiConfig, gallery: &GalleryConfig) -> Self {
        Self {
            iiif_base: api.iiif_base.clone(),
            thumbnail_width: gallery.thumbnail_width,
            full_width: gallery.full_width,
        }
    }
}

/// Everything a grid item shows, derived from one record
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayItem {
    pub id: RecordId,
    pub thumbnail_url: String,
    pub full_url: String,
    pub title: String,
    pub authors: String,
    pub year: Option<i32>,
    pub coordinates: Option<Coordinates>,
    /// Present only when the record has a position
    pub map_link: Option<String>,
    /// Filter classes of the item
    pub tags: Vec<SanitizedKeyword>,
    pub doi_url: Option<String>,
    pub views: u64,
}

impl DisplayItem {
    pub fn lightbox_entry(&self) -> LightboxEntry {
        LightboxEntry {
            id: self.id.clone(),
            image_url: self.full_url.clone(),
            title: self.title.clone(),
            authors: self.authors.clone(),
            year: self.year,
            source_url: self.doi_url.clone(),
        }
    }
}

pub fn display_item(record: &Record, settings: &ImageSettings) -> DisplayItem {
    let id = record.id.as_str();
    let file = record.first_file_key();
    let coordinates = record.coordinates();

    DisplayItem {
        id: record.id.clone(),
        thumbnail_url: image_url(&settings.iiif_base, id, file, settings.thumbnail_width),
        full_url: image_url(&settings.iiif_base, id, file, settings.full_width),
        title: record.title().to_string(),
        authors: record.authors(),
        year: record.year(),
        coordinates,
        map_link: coordinates.map(map_link),
        tags: tag_set(record.keywords().iter().map(String::as_str)),
        doi_url: record.doi_url(),
        views: record.views(),
    }
}

/// Grid item with its reveal flag
#[derive(Debug, Clone)]
pub struct GalleryItem {
    pub display: DisplayItem,
    shown: Arc<AtomicBool>,
}

impl GalleryItem {
    fn new(display: DisplayItem) -> Self {
        Self {
            display,
            shown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_shown(&self) -> bool {
        self.shown.load(Ordering::Acquire)
    }
}

/// Host collaborators the pipeline draws through
#[derive(Clone)]
pub struct RenderServices {
    pub layout: Arc<dyn LayoutService>,
    pub lightbox: Arc<dyn LightboxService>,
    pub probe: Arc<dyn ImageProbe>,
}

/// Handle on one `present` call
pub struct RenderHandle {
    pub generation: u64,
    pub ids: Vec<RecordId>,
    task: Option<JoinHandle<RevealCounts>>,
}

impl RenderHandle {
    fn idle(generation: u64) -> Self {
        Self {
            generation,
            ids: Vec::new(),
            task: None,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Wait for the reveal pass; an aborted pass yields empty counts
    pub async fn wait(self) -> RevealCounts {
        match self.task {
            Some(task) => task.await.unwrap_or_default(),
            None => RevealCounts::default(),
        }
    }
}

pub struct GalleryRenderPipeline {
    /// `None` when the grid mount point is missing; rendering is then skipped
    target: Option<LayoutTarget>,
    services: RenderServices,
    settings: ImageSettings,
    reveal_timeout: Duration,
    title_builder: TitleBuilder,
    items: Vec<GalleryItem>,
    layout_initialized: bool,
    generation: u64,
    in_flight: Vec<AbortHandle>,
    events: Option<(EventBus, Uuid)>,
}

impl GalleryRenderPipeline {
    pub fn new(
        host: &dyn HostPage,
        config: &GalleryConfig,
        settings: ImageSettings,
        services: RenderServices,
    ) -> Self {
        let target = match require_mount(host, &config.container) {
            Ok(()) => Some(LayoutTarget::from(config)),
            Err(e) => {
                warn!("{}; gallery grid will not be rendered", e);
                None
            }
        };

        Self {
            target,
            services,
            settings,
            reveal_timeout: Duration::from_millis(config.reveal_timeout_ms),
            title_builder: Arc::new(default_caption),
            items: Vec::new(),
            layout_initialized: false,
            generation: 0,
            in_flight: Vec::new(),
            events: None,
        }
    }

    /// Replace the lightbox caption builder
    pub fn with_title_builder(mut self, title_builder: TitleBuilder) -> Self {
        self.title_builder = title_builder;
        self
    }

    /// Emit `ItemsRevealed` on the bus when a pass finishes
    pub fn with_events(mut self, event_bus: EventBus, session_id: Uuid) -> Self {
        self.events = Some((event_bus, session_id));
        self
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    /// Items currently in the grid, in presentation order
    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    pub fn shown_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_shown()).count()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Append records to the grid and start revealing them
    ///
    /// Must be called from within a tokio runtime.
    pub fn present(&mut self, records: &[Arc<Record>]) -> RenderHandle {
        let Some(target) = self.target.clone() else {
            return RenderHandle::idle(self.generation);
        };
        if records.is_empty() {
            return RenderHandle::idle(self.generation);
        }

        let new_items: Vec<GalleryItem> = records
            .iter()
            .map(|record| GalleryItem::new(display_item(record, &self.settings)))
            .collect();
        let ids: Vec<RecordId> = new_items.iter().map(|i| i.display.id.clone()).collect();

        self.items.extend(new_items.iter().cloned());

        if self.layout_initialized {
            self.services.layout.append_items(&ids);
        } else {
            let all: Vec<RecordId> = self.items.iter().map(|i| i.display.id.clone()).collect();
            self.services.layout.initialize(&target, &all);
            self.layout_initialized = true;
        }

        let entries: Vec<LightboxEntry> = self
            .items
            .iter()
            .map(|item| item.display.lightbox_entry())
            .collect();
        self.services
            .lightbox
            .attach(LIGHTBOX_SELECTOR, &entries, Arc::clone(&self.title_builder));

        debug!(
            generation = self.generation,
            appended = ids.len(),
            total = self.items.len(),
            "Presented gallery items"
        );

        let task = self.spawn_reveal(new_items);
        self.in_flight.retain(|handle| !handle.is_finished());
        self.in_flight.push(task.abort_handle());

        RenderHandle {
            generation: self.generation,
            ids,
            task: Some(task),
        }
    }

    fn spawn_reveal(&self, items: Vec<GalleryItem>) -> JoinHandle<RevealCounts> {
        let probe = Arc::clone(&self.services.probe);
        let layout = Arc::clone(&self.services.layout);
        let timeout = self.reveal_timeout;
        let generation = self.generation;
        let events = self.events.clone();

        tokio::spawn(async move {
            let reveals = items.into_iter().map(|item| {
                let probe = Arc::clone(&probe);
                let layout = Arc::clone(&layout);
                async move {
                    let outcome =
                        reveal::reveal_one(probe.as_ref(), &item.display.thumbnail_url, timeout)
                            .await;
                    item.shown.store(true, Ordering::Release);
                    layout.relayout();
                    outcome
                }
            });

            let mut counts = RevealCounts::default();
            for outcome in join_all(reveals).await {
                match outcome {
                    RevealOutcome::Loaded => counts.loaded += 1,
                    RevealOutcome::Failed => counts.failed += 1,
                    RevealOutcome::TimedOut => counts.timed_out += 1,
                }
            }

            debug!(
                generation,
                loaded = counts.loaded,
                failed = counts.failed,
                timed_out = counts.timed_out,
                "Reveal pass finished"
            );

            if let Some((event_bus, session_id)) = events {
                event_bus.emit_lossy(GalleryEvent::ItemsRevealed {
                    session_id,
                    generation,
                    counts,
                    timestamp: Utc::now(),
                });
            }

            counts
        })
    }

    /// Tear down the layout and drop every item
    ///
    /// Reveal passes still running are aborted. The next `present` starts a
    /// new generation with a fresh layout.
    pub fn destroy(&mut self) {
        for handle in self.in_flight.drain(..) {
            handle.abort();
        }
        if self.layout_initialized {
            self.services.layout.destroy();
            self.layout_initialized = false;
        }
        self.items.clear();
        self.generation += 1;
    }
}

impl Drop for GalleryRenderPipeline {
    fn drop(&mut self) {
        for handle in self.in_flight.drain(..) {
            handle.abort();
        }
    }
}
