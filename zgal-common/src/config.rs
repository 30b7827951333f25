//! Bootstrap configuration loading
//!
//! Configuration sources, highest priority first:
//! 1. Command-line argument (config file path, explicit overrides applied by the binary)
//! 2. Environment variables (`ZGAL_CONFIG`, `ZGAL_COMMUNITIES`)
//! 3. TOML config file (`<config_dir>/zgal/config.toml`)
//! 4. Compiled defaults
//!
//! A missing or unreadable TOML file never stops startup: the resolver logs a
//! warning and falls back to compiled defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file path
pub const CONFIG_ENV_VAR: &str = "ZGAL_CONFIG";

/// Accepted per-image reveal wait, in milliseconds
pub const REVEAL_TIMEOUT_RANGE_MS: std::ops::RangeInclusive<u64> = 1_000..=30_000;

/// Environment variable overriding the community list (comma separated)
pub const COMMUNITIES_ENV_VAR: &str = "ZGAL_COMMUNITIES";

/// Bootstrap configuration loaded from TOML file
///
/// Every section is optional; missing keys take compiled defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// Remote record API settings
    pub api: ApiConfig,
    /// Gallery grid settings
    pub gallery: GalleryConfig,
    /// Progress display settings
    pub progress: ProgressConfig,
    /// Map view settings
    pub map: MapConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Remote record API configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// List endpoint for records
    pub records_url: String,
    /// IIIF image service base
    pub iiif_base: String,
    /// Communities (source collections) to crawl
    pub communities: Vec<String>,
    /// Records requested per API page
    pub page_size: u32,
    /// Sort order passed to the API
    pub sort: String,
    /// Client-side rate limit for page requests
    pub requests_per_minute: u32,
    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            records_url: "https://zenodo.org/api/records".to_string(),
            iiif_base: "https://zenodo.org/api/iiif".to_string(),
            communities: vec!["euraf-media".to_string()],
            page_size: 25,
            sort: "newest".to_string(),
            requests_per_minute: 60,
            request_timeout_secs: 30,
        }
    }
}

/// Gallery grid configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GalleryConfig {
    /// Items per gallery page
    pub page_size: usize,
    /// Width requested for grid thumbnails
    pub thumbnail_width: u32,
    /// Width requested for the lightbox image
    pub full_width: u32,
    /// Upper bound on the wait for an image before it is revealed anyway
    pub reveal_timeout_ms: u64,
    /// Mount point id of the grid container
    pub container: String,
    /// Selector matching grid items
    pub item_selector: String,
    /// Selector of the column sizer element
    pub sizer_selector: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            page_size: 24,
            thumbnail_width: 500,
            full_width: 1200,
            reveal_timeout_ms: 5000,
            container: "gallery".to_string(),
            item_selector: ".grid-item".to_string(),
            sizer_selector: ".grid-sizer".to_string(),
        }
    }
}

/// Progress display configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProgressConfig {
    /// Delay before the "complete" display hides itself
    pub dismiss_delay_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            dismiss_delay_ms: 2500,
        }
    }
}

/// Map view configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    /// Mount point id of the map container
    pub container: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            container: "map".to_string(),
            center_lat: 48.0,
            center_lon: 10.0,
            zoom: 4,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl TomlConfig {
    /// Reject values the gallery cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.api.communities.iter().all(|c| c.trim().is_empty()) {
            return Err(Error::Config("at least one community is required".to_string()));
        }
        if self.api.page_size == 0 {
            return Err(Error::Config("api.page_size must be greater than 0".to_string()));
        }
        if self.api.requests_per_minute == 0 {
            return Err(Error::Config(
                "api.requests_per_minute must be greater than 0".to_string(),
            ));
        }
        if self.gallery.page_size == 0 {
            return Err(Error::Config("gallery.page_size must be greater than 0".to_string()));
        }
        if self.gallery.thumbnail_width == 0 || self.gallery.full_width == 0 {
            return Err(Error::Config("image widths must be greater than 0".to_string()));
        }
        if !REVEAL_TIMEOUT_RANGE_MS.contains(&self.gallery.reveal_timeout_ms) {
            return Err(Error::Config(format!(
                "gallery.reveal_timeout_ms must be between {} and {}",
                REVEAL_TIMEOUT_RANGE_MS.start(),
                REVEAL_TIMEOUT_RANGE_MS.end()
            )));
        }
        Ok(())
    }

    /// Apply environment variable overrides on top of file values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var(COMMUNITIES_ENV_VAR) {
            let communities = parse_community_list(&raw);
            if communities.is_empty() {
                warn!("{} is set but lists no communities, ignoring", COMMUNITIES_ENV_VAR);
            } else {
                info!("Communities overridden from {}: {}", COMMUNITIES_ENV_VAR, communities.join(", "));
                self.api.communities = communities;
            }
        }
    }
}

/// Split a comma separated community list, dropping blanks
pub fn parse_community_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML {} failed: {}", path.display(), e)))
}

/// Default config file location for the platform (`<config_dir>/zgal/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("zgal").join("config.toml"))
}

/// Resolves which config file to read and loads it with graceful degradation
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Config file path by priority: CLI → `ZGAL_CONFIG` → platform default
    ///
    /// The platform default is only returned when the file exists.
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        default_config_path().filter(|p| p.exists())
    }

    /// Load configuration, never failing on a missing or broken file
    pub fn resolve(&self) -> TomlConfig {
        let mut config = match self.config_path() {
            Some(path) => match load_toml_config(&path) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Could not load {} ({}), using compiled defaults", path.display(), e);
                    TomlConfig::default()
                }
            },
            None => {
                info!("No config file found, using compiled defaults");
                TomlConfig::default()
            }
        };

        config.apply_env_overrides();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TomlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.communities, vec!["euraf-media".to_string()]);
        assert_eq!(config.gallery.reveal_timeout_ms, 5000);
        assert_eq!(config.progress.dismiss_delay_ms, 2500);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [gallery]
            page_size = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.gallery.page_size, 12);
        assert_eq!(config.gallery.thumbnail_width, 500);
        assert_eq!(config.api, ApiConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let mut config = TomlConfig::default();
        config.gallery.page_size = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_blank_communities() {
        let mut config = TomlConfig::default();
        config.api.communities = vec!["  ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_community_list() {
        assert_eq!(
            parse_community_list(" euraf-media, ,agroforestry "),
            vec!["euraf-media".to_string(), "agroforestry".to_string()]
        );
        assert!(parse_community_list(",,").is_empty());
    }
}
