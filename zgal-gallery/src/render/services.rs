//! Host-side collaborators of the render pipeline
//!
//! The masonry layout, the lightbox and the map are external libraries in
//! the host page. The gallery reaches them only through these traits, with
//! the narrow contract each library actually offers.

use crate::error::{GalleryError, GalleryResult};
use crate::record::{Coordinates, RecordId};
use std::sync::Arc;

/// Where and how the masonry layout is mounted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutTarget {
    pub container: String,
    pub item_selector: String,
    pub sizer_selector: String,
}

impl From<&zgal_common::config::GalleryConfig> for LayoutTarget {
    fn from(config: &zgal_common::config::GalleryConfig) -> Self {
        Self {
            container: config.container.clone(),
            item_selector: config.item_selector.clone(),
            sizer_selector: config.sizer_selector.clone(),
        }
    }
}

/// Masonry layout service
///
/// `relayout` may be called any number of times and must be idempotent.
pub trait LayoutService: Send + Sync {
    /// Full initialisation over the items currently in the container
    fn initialize(&self, target: &LayoutTarget, items: &[RecordId]);
    /// Register items appended after initialisation
    fn append_items(&self, items: &[RecordId]);
    fn relayout(&self);
    fn destroy(&self);
}

/// Data the lightbox caption is built from
#[derive(Debug, Clone, PartialEq)]
pub struct LightboxEntry {
    pub id: RecordId,
    pub image_url: String,
    pub title: String,
    pub authors: String,
    pub year: Option<i32>,
    pub source_url: Option<String>,
}

/// Caption builder handed to the lightbox
pub type TitleBuilder = Arc<dyn Fn(&LightboxEntry) -> String + Send + Sync>;

/// Image lightbox service
pub trait LightboxService: Send + Sync {
    fn attach(&self, selector: &str, entries: &[LightboxEntry], title_builder: TitleBuilder);
}

/// Map service
pub trait MapService: Send + Sync {
    fn create_map(&self, container: &str, center: Coordinates, zoom: u8);
    fn add_marker(&self, latitude: f64, longitude: f64, popup_html: &str);
    fn clear_markers(&self);
    fn fit_to_markers(&self);
}

/// Mount point lookup in the host page
pub trait HostPage: Send + Sync {
    fn has_mount(&self, id: &str) -> bool;
}

/// Fail with `RenderTargetMissing` when a mount point is absent
pub fn require_mount(host: &dyn HostPage, id: &str) -> GalleryResult<()> {
    if host.has_mount(id) {
        Ok(())
    } else {
        Err(GalleryError::RenderTargetMissing(id.to_string()))
    }
}

/// Escape text for inclusion in caption and popup markup
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Default lightbox caption: title, byline with year, citation link
pub fn default_caption(entry: &LightboxEntry) -> String {
    let year = entry.year.map(|y| y.to_string()).unwrap_or_default();
    let byline = format!(
        "{} <br> <small>by {} ({})",
        escape_html(&entry.title),
        escape_html(&entry.authors),
        year
    );

    match &entry.source_url {
        Some(url) => {
            let url = escape_html(url);
            format!(
                "{}<br><a href=\"{}\" target=\"_blank\">Full resolution and source to cite:  {}</a></small>",
                byline, url, url
            )
        }
        None => format!("{}</small>", byline),
    }
}
