//! Supporting types carried by gallery session events.

use serde::{Deserialize, Serialize};

/// Loading progress as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressData {
    /// Exact percentage when the expected total is known, `None` otherwise
    pub percent: Option<u8>,
    /// Bar fill to draw (pseudo-progress when `percent` is `None`, never 100 then)
    pub visual_percent: u8,
    /// Human-readable label
    pub label: String,
    /// True only for a known total that has been fully loaded
    pub complete: bool,
}

/// Outcome tally of one progressive reveal pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealCounts {
    /// Images that finished loading
    pub loaded: usize,
    /// Images that reported a load error (still revealed)
    pub failed: usize,
    /// Images revealed because the wait timed out
    pub timed_out: usize,
}

impl RevealCounts {
    /// Total items revealed in the pass
    pub fn total(&self) -> usize {
        self.loaded + self.failed + self.timed_out
    }
}
