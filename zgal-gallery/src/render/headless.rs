//! Headless collaborators
//!
//! In-memory stand-ins for the host page libraries. They record every call
//! so a headless session (the binary, the tests) can report what a browser
//! host would have been asked to draw.

use super::services::{
    HostPage, LayoutService, LayoutTarget, LightboxEntry, LightboxService, MapService,
    TitleBuilder,
};
use crate::record::{Coordinates, RecordId};
use std::collections::HashSet;
use std::sync::Mutex;

/// Host page with a fixed set of mount points
#[derive(Debug, Clone, Default)]
pub struct StaticHostPage {
    mounts: HashSet<String>,
}

impl StaticHostPage {
    pub fn new<I, S>(mounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mounts: mounts.into_iter().map(Into::into).collect(),
        }
    }
}

impl HostPage for StaticHostPage {
    fn has_mount(&self, id: &str) -> bool {
        self.mounts.contains(id)
    }
}

/// Snapshot of what the headless layout has been told
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutLog {
    pub target: Option<LayoutTarget>,
    /// Items currently registered, in registration order
    pub items: Vec<RecordId>,
    pub initialize_calls: usize,
    pub append_calls: usize,
    pub relayout_calls: usize,
    pub destroy_calls: usize,
}

#[derive(Debug, Default)]
pub struct HeadlessLayout {
    log: Mutex<LayoutLog>,
}

impl HeadlessLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> LayoutLog {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

impl LayoutService for HeadlessLayout {
    fn initialize(&self, target: &LayoutTarget, items: &[RecordId]) {
        if let Ok(mut log) = self.log.lock() {
            log.target = Some(target.clone());
            log.items = items.to_vec();
            log.initialize_calls += 1;
        }
    }

    fn append_items(&self, items: &[RecordId]) {
        if let Ok(mut log) = self.log.lock() {
            log.items.extend_from_slice(items);
            log.append_calls += 1;
        }
    }

    fn relayout(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.relayout_calls += 1;
        }
    }

    fn destroy(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.target = None;
            log.items.clear();
            log.destroy_calls += 1;
        }
    }
}

/// Lightbox that renders captions eagerly at attach time
#[derive(Debug, Default)]
pub struct HeadlessLightbox {
    attached: Mutex<Vec<(RecordId, String)>>,
    selector: Mutex<Option<String>>,
}

impl HeadlessLightbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caption built for an item at the last attach
    pub fn caption(&self, id: &RecordId) -> Option<String> {
        self.attached
            .lock()
            .ok()?
            .iter()
            .find(|(item, _)| item == id)
            .map(|(_, caption)| caption.clone())
    }

    pub fn attached_count(&self) -> usize {
        self.attached.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn selector(&self) -> Option<String> {
        self.selector.lock().ok()?.clone()
    }
}

impl LightboxService for HeadlessLightbox {
    fn attach(&self, selector: &str, entries: &[LightboxEntry], title_builder: TitleBuilder) {
        let captions = entries
            .iter()
            .map(|entry| (entry.id.clone(), title_builder(entry)))
            .collect();
        if let Ok(mut attached) = self.attached.lock() {
            *attached = captions;
        }
        if let Ok(mut current) = self.selector.lock() {
            *current = Some(selector.to_string());
        }
    }
}

/// Marker placed on the headless map
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub latitude: f64,
    pub longitude: f64,
    pub popup_html: String,
}

/// Snapshot of the headless map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapLog {
    pub container: Option<String>,
    pub center: Option<Coordinates>,
    pub zoom: Option<u8>,
    pub markers: Vec<Marker>,
    pub create_calls: usize,
    pub fit_calls: usize,
}

#[derive(Debug, Default)]
pub struct HeadlessMap {
    log: Mutex<MapLog>,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> MapLog {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

impl MapService for HeadlessMap {
    fn create_map(&self, container: &str, center: Coordinates, zoom: u8) {
        if let Ok(mut log) = self.log.lock() {
            log.container = Some(container.to_string());
            log.center = Some(center);
            log.zoom = Some(zoom);
            log.create_calls += 1;
        }
    }

    fn add_marker(&self, latitude: f64, longitude: f64, popup_html: &str) {
        if let Ok(mut log) = self.log.lock() {
            log.markers.push(Marker {
                latitude,
                longitude,
                popup_html: popup_html.to_string(),
            });
        }
    }

    fn clear_markers(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.markers.clear();
        }
    }

    fn fit_to_markers(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.fit_calls += 1;
        }
    }
}
