//! Progressive image reveal
//!
//! Each grid item starts hidden and is revealed once its image finished
//! loading, failed to load, or the per-image wait elapsed. A failed image is
//! still revealed; a hung one never blocks the others.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Result of loading one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLoad {
    Loaded,
    Failed(String),
}

/// Loads an image far enough to know whether it will display
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn load(&self, url: &str) -> ImageLoad;
}

/// How one item came to be revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Loaded,
    Failed,
    TimedOut,
}

/// Wait for one image with an upper bound
pub async fn reveal_one(probe: &dyn ImageProbe, url: &str, timeout: Duration) -> RevealOutcome {
    match tokio::time::timeout(timeout, probe.load(url)).await {
        Ok(ImageLoad::Loaded) => RevealOutcome::Loaded,
        Ok(ImageLoad::Failed(reason)) => {
            debug!(url = %url, "Image failed to load, revealing anyway: {}", reason);
            RevealOutcome::Failed
        }
        Err(_) => {
            debug!(url = %url, timeout_ms = timeout.as_millis() as u64, "Image load timed out");
            RevealOutcome::TimedOut
        }
    }
}

/// Probe that fetches the image over HTTP
///
/// The request is complete once headers arrive with a success status and
/// the body was read.
pub struct HttpImageProbe {
    http_client: reqwest::Client,
}

impl HttpImageProbe {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn load(&self, url: &str) -> ImageLoad {
        let response = match self.http_client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return ImageLoad::Failed(e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return ImageLoad::Failed(format!("HTTP {}", status.as_u16()));
        }

        match response.bytes().await {
            Ok(_) => ImageLoad::Loaded,
            Err(e) => ImageLoad::Failed(e.to_string()),
        }
    }
}

/// Probe that reports every image as loaded immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantProbe;

#[async_trait]
impl ImageProbe for InstantProbe {
    async fn load(&self, _url: &str) -> ImageLoad {
        ImageLoad::Loaded
    }
}
