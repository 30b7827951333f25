//! # zgal Common Library
//!
//! Shared code for the zgal gallery crates including:
//! - Error types
//! - Bootstrap configuration loading (TOML, environment, defaults)
//! - Event types (GalleryEvent enum) and the broadcast EventBus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
