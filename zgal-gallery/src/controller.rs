//! Gallery session controller
//!
//! Owns one session: the fetcher (and through it the fetch state), the
//! category index, the view state and the render pipeline. It decides what
//! is visible and rebuilds the grid whenever that changes.
//!
//! While fetching, each batch is shown as it arrives in fetch order. Once
//! every collection is done the view resets to "all", page 1, and the grid is
//! rebuilt from the complete set in canonical newest-first order.

use crate::api::{CollectionId, PageSource};
use crate::categories::{CategoryIndex, CategorySummary};
use crate::fetcher::{FetchState, RecordFetcher};
use crate::map_view::MapViewAdapter;
use crate::pagination::{calculate_pagination, Pagination, PaginationView};
use crate::progress::ProgressReporter;
use crate::record::Record;
use crate::render::{GalleryRenderPipeline, HostPage, ImageSettings, MapService, RenderHandle, RenderServices};
use crate::view::{filter_records, Filter, ViewState};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;
use zgal_common::config::TomlConfig;
use zgal_common::events::{EventBus, GalleryEvent, ProgressData};

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    /// Before the first load
    Idle,
    /// Batches are still arriving; the grid shows them unfiltered
    Fetching,
    /// A filter (or "all") was applied to the complete set
    FilterApplied,
    /// A different page of the filtered set is shown
    PageChanged,
}

/// Category listing with the "all" entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryListing {
    /// Count of the "all" entry: every retained record
    pub all: usize,
    pub entries: Vec<CategorySummary>,
}

/// Outcome of the background fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchSummary {
    pub loaded: usize,
    pub total_expected: Option<u64>,
    /// True when at least one collection stopped early
    pub partial: bool,
}

/// Host collaborators of a session
#[derive(Clone)]
pub struct SessionServices {
    pub source: Arc<dyn PageSource>,
    pub host: Arc<dyn HostPage>,
    pub render: RenderServices,
    pub map: Arc<dyn MapService>,
}

pub struct GallerySession {
    session_id: Uuid,
    fetcher: RecordFetcher,
    categories: CategoryIndex,
    view: ViewState,
    phase: SessionPhase,
    pipeline: GalleryRenderPipeline,
    map_view: MapViewAdapter,
    progress: ProgressReporter,
    event_bus: EventBus,
    page_size: usize,
    /// Reveal pass of the rebuild that ended the fetch
    final_render: Option<RenderHandle>,
}

impl GallerySession {
    pub fn new(config: &TomlConfig, services: SessionServices, event_bus: EventBus) -> Self {
        let session_id = Uuid::new_v4();
        let sources: Vec<CollectionId> = config
            .api
            .communities
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(CollectionId::from)
            .collect();
        let settings = ImageSettings::from_config(&config.api, &config.gallery);

        let pipeline = GalleryRenderPipeline::new(
            services.host.as_ref(),
            &config.gallery,
            settings.clone(),
            services.render,
        )
        .with_events(event_bus.clone(), session_id);

        let map_view = MapViewAdapter::new(
            services.host.as_ref(),
            services.map,
            config.map.clone(),
            settings,
        );

        Self {
            session_id,
            fetcher: RecordFetcher::new(services.source, sources),
            categories: CategoryIndex::new(),
            view: ViewState::default(),
            phase: SessionPhase::Idle,
            pipeline,
            map_view,
            progress: ProgressReporter::new(Duration::from_millis(config.progress.dismiss_delay_ms)),
            event_bus,
            page_size: config.gallery.page_size.max(1),
            final_render: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn fetch_state(&self) -> &FetchState {
        self.fetcher.state()
    }

    pub fn pipeline(&self) -> &GalleryRenderPipeline {
        &self.pipeline
    }

    pub fn progress(&self) -> &ProgressReporter {
        &self.progress
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Fetch every source collection, showing batches as they arrive
    ///
    /// Ends with the full rebuild of the "all" view. Never fails: collections
    /// that stop early are reported through the returned `partial` flag.
    ///
    /// If the returned future is dropped before it completes, the session
    /// stays in `SessionPhase::Fetching` with whatever was loaded so far.
    pub async fn run(&mut self) -> FetchSummary {
        self.phase = SessionPhase::Fetching;
        let sources = self.fetcher.state().sources();
        info!(
            session_id = %self.session_id,
            sources = sources.len(),
            "Gallery session started"
        );
        self.event_bus.emit_lossy(GalleryEvent::SessionStarted {
            session_id: self.session_id,
            sources: sources.iter().map(ToString::to_string).collect(),
            timestamp: Utc::now(),
        });

        self.fetcher.fetch_approximate_total().await;
        self.update_progress();

        let mut failures_reported = 0;
        loop {
            let batch = self.fetcher.next_batch().await;
            failures_reported = self.report_failures(failures_reported);

            let Some(batch) = batch else {
                break;
            };

            self.categories.absorb(&batch.records);
            self.pipeline.present(&batch.records);

            self.event_bus.emit_lossy(GalleryEvent::BatchReceived {
                session_id: self.session_id,
                collection: batch.collection.to_string(),
                records: batch.records.len(),
                total_loaded: self.fetcher.state().loaded(),
                timestamp: Utc::now(),
            });
            self.update_progress();
        }

        let state = self.fetcher.state();
        let summary = FetchSummary {
            loaded: state.loaded(),
            total_expected: state.total_expected(),
            partial: state.is_partial(),
        };
        self.progress.finish();

        info!(
            session_id = %self.session_id,
            loaded = summary.loaded,
            partial = summary.partial,
            skipped = state.skipped().len(),
            duplicates = state.duplicates_dropped(),
            "Gallery fetch completed"
        );
        self.event_bus.emit_lossy(GalleryEvent::FetchCompleted {
            session_id: self.session_id,
            total_loaded: summary.loaded,
            partial: summary.partial,
            timestamp: Utc::now(),
        });

        self.view = ViewState::default();
        self.phase = SessionPhase::FilterApplied;
        self.final_render = Some(self.rebuild());

        summary
    }

    fn report_failures(&self, already_reported: usize) -> usize {
        let failures = self.fetcher.state().failures();
        for failure in failures.iter().skip(already_reported) {
            self.event_bus.emit_lossy(GalleryEvent::CollectionFailed {
                session_id: self.session_id,
                collection: failure.collection.to_string(),
                error: failure.error.clone(),
                timestamp: Utc::now(),
            });
        }
        failures.len()
    }

    fn update_progress(&mut self) -> ProgressData {
        let state = self.fetcher.state();
        let progress = self
            .progress
            .update(state.loaded(), state.total_expected(), Instant::now());
        self.event_bus.emit_lossy(GalleryEvent::ProgressUpdated {
            session_id: self.session_id,
            progress: progress.clone(),
            timestamp: Utc::now(),
        });
        progress
    }

    /// Reveal handle of the post-fetch rebuild, if not taken yet
    pub fn take_render(&mut self) -> Option<RenderHandle> {
        self.final_render.take()
    }

    /// Hide a completed progress display once its delay has elapsed
    pub fn tick_progress(&mut self, now: Instant) -> bool {
        self.progress.tick(now)
    }

    /// Select a tag filter (or "all"); always returns to page 1
    ///
    /// Only reachable during `Fetching` after a cancelled `run`; the view then
    /// covers the records loaded before the cancellation.
    pub fn select_filter(&mut self, filter: Filter) -> RenderHandle {
        if self.phase == SessionPhase::Fetching {
            warn!("Filter selected on an unfinished fetch; showing the records loaded so far");
        }
        self.view.active_filter = filter;
        self.view.current_page = 1;
        self.phase = SessionPhase::FilterApplied;
        self.rebuild()
    }

    /// Show another page of the filtered set; out-of-range pages clamp
    pub fn select_page(&mut self, page: usize) -> RenderHandle {
        self.view.current_page = page;
        self.phase = SessionPhase::PageChanged;
        self.rebuild()
    }

    /// Destroy the grid and present the current page from scratch
    fn rebuild(&mut self) -> RenderHandle {
        let filtered = self.filtered_records();
        let pagination = self.current_pagination(filtered.len());
        self.view.current_page = pagination.page;

        let page = &filtered[pagination.window(filtered.len(), self.page_size)];

        self.pipeline.destroy();
        let handle = self.pipeline.present(page);
        let markers = self.map_view.project(&filtered);

        info!(
            filter = %self.view.active_filter,
            page = pagination.page,
            total_pages = pagination.total_pages,
            visible = page.len(),
            markers,
            "Gallery view rebuilt"
        );
        self.event_bus.emit_lossy(GalleryEvent::ViewChanged {
            session_id: self.session_id,
            filter: self.view.active_filter.to_string(),
            page: pagination.page,
            total_pages: pagination.total_pages,
            visible: page.len(),
            timestamp: Utc::now(),
        });

        handle
    }

    fn current_pagination(&self, filtered_len: usize) -> Pagination {
        calculate_pagination(filtered_len, self.view.current_page, self.page_size)
    }

    /// Retained records matching the active filter, newest first
    pub fn filtered_records(&self) -> Vec<Arc<Record>> {
        filter_records(self.fetcher.state().records(), &self.view.active_filter)
    }

    /// Records of the current page
    pub fn page_records(&self) -> Vec<Arc<Record>> {
        let filtered = self.filtered_records();
        let window = self
            .current_pagination(filtered.len())
            .window(filtered.len(), self.page_size);
        filtered[window].to_vec()
    }

    pub fn total_pages(&self) -> usize {
        self.current_pagination(self.filtered_records().len()).total_pages
    }

    /// Pagination controls, `None` when there is at most one page
    pub fn pagination(&self) -> Option<PaginationView> {
        self.current_pagination(self.filtered_records().len()).view()
    }

    pub fn categories(&self) -> CategoryListing {
        CategoryListing {
            all: self.fetcher.state().loaded(),
            entries: self.categories.snapshot(),
        }
    }

    pub fn category_index(&self) -> &CategoryIndex {
        &self.categories
    }

    /// Sum of view counts over the retained records
    pub fn total_views(&self) -> u64 {
        self.fetcher
            .state()
            .records()
            .iter()
            .map(|record| record.views())
            .sum()
    }
}
