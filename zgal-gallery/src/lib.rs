//! zgal-gallery library - filterable photo gallery over a community record API
//!
//! Fetches image records page by page, indexes their keywords, and drives a
//! masonry grid with progressive reveal, tag filtering, pagination and a map
//! view. Host page libraries are reached through the traits in [`render`].

pub mod api;
pub mod categories;
pub mod controller;
pub mod error;
pub mod fetcher;
pub mod geo;
pub mod keywords;
pub mod map_view;
pub mod pagination;
pub mod progress;
pub mod record;
pub mod render;
pub mod view;

pub use controller::{CategoryListing, FetchSummary, GallerySession, SessionPhase, SessionServices};
pub use error::{GalleryError, GalleryResult};
pub use view::{Filter, ViewState};
