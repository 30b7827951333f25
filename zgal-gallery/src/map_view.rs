//! Map view adapter
//!
//! Projects the currently visible records onto map markers. The map itself
//! is created on first projection, so a session that never shows the map
//! never asks the host for one.

use crate::record::{Coordinates, Record};
use crate::render::{display_item, escape_html, require_mount, HostPage, ImageSettings, MapService};
use std::sync::Arc;
use tracing::{debug, warn};
use zgal_common::config::MapConfig;

pub struct MapViewAdapter {
    map: Arc<dyn MapService>,
    config: MapConfig,
    settings: ImageSettings,
    mounted: bool,
    created: bool,
}

impl MapViewAdapter {
    pub fn new(
        host: &dyn HostPage,
        map: Arc<dyn MapService>,
        config: MapConfig,
        settings: ImageSettings,
    ) -> Self {
        let mounted = match require_mount(host, &config.container) {
            Ok(()) => true,
            Err(e) => {
                warn!("{}; map view disabled", e);
                false
            }
        };

        Self {
            map,
            config,
            settings,
            mounted,
            created: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.mounted
    }

    /// Replace all markers with those of `records`
    ///
    /// Returns the number of markers placed. Records without a position are
    /// left off the map.
    pub fn project(&mut self, records: &[Arc<Record>]) -> usize {
        if !self.mounted {
            return 0;
        }

        if !self.created {
            let center = Coordinates {
                latitude: self.config.center_lat,
                longitude: self.config.center_lon,
            };
            self.map.create_map(&self.config.container, center, self.config.zoom);
            self.created = true;
        }

        self.map.clear_markers();

        let mut placed = 0;
        for record in records {
            let item = display_item(record, &self.settings);
            let Some(position) = item.coordinates else {
                continue;
            };
            let link = item.doi_url.as_deref().unwrap_or(&item.full_url);
            let popup = format!(
                "<img src=\"{}\" width=\"150\"><br><b>{}</b><br><a href=\"{}\" target=\"_blank\">View</a>",
                escape_html(&item.thumbnail_url),
                escape_html(&item.title),
                escape_html(link)
            );
            self.map.add_marker(position.latitude, position.longitude, &popup);
            placed += 1;
        }

        if placed > 0 {
            self.map.fit_to_markers();
        }

        debug!(markers = placed, records = records.len(), "Projected records onto map");
        placed
    }
}
