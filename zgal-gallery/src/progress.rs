//! Loading progress
//!
//! [`report`] is a pure function of (loaded, expected total). With a known
//! total the percentage is exact and may reach 100. Without one the bar is a
//! pseudo-progress that approaches but never reaches [`INDETERMINATE_CAP`],
//! and `percent` stays `None`.
//!
//! [`ProgressReporter`] adds the display lifecycle: a completed bar stays
//! visible for the dismiss delay, then hides itself unless progress resumes.

use std::time::Duration;
use tokio::time::Instant;
use zgal_common::events::ProgressData;

/// Upper bound of the indeterminate bar
pub const INDETERMINATE_CAP: u8 = 95;

/// Records at which the indeterminate bar is half of its cap
const INDETERMINATE_HALF_POINT: f64 = 100.0;

pub fn report(loaded: usize, total: Option<u64>) -> ProgressData {
    match total {
        Some(total) if total > 0 => {
            let ratio = loaded as f64 / total as f64 * 100.0;
            let percent = ratio.round().min(100.0) as u8;
            ProgressData {
                percent: Some(percent),
                visual_percent: percent,
                label: format!("Loaded {} of {} photos ({}%)", loaded, total, percent),
                complete: percent == 100,
            }
        }
        _ => {
            let loaded_f = loaded as f64;
            let fill = f64::from(INDETERMINATE_CAP) * loaded_f / (loaded_f + INDETERMINATE_HALF_POINT);
            ProgressData {
                percent: None,
                visual_percent: (fill.floor() as u8).min(INDETERMINATE_CAP - 1),
                label: format!("Loaded {} photos", loaded),
                complete: false,
            }
        }
    }
}

/// What the progress display currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressDisplay {
    Hidden,
    Active(ProgressData),
    Complete { data: ProgressData, since: Instant },
}

#[derive(Debug)]
pub struct ProgressReporter {
    dismiss_delay: Duration,
    display: ProgressDisplay,
}

impl ProgressReporter {
    pub fn new(dismiss_delay: Duration) -> Self {
        Self {
            dismiss_delay,
            display: ProgressDisplay::Hidden,
        }
    }

    pub fn display(&self) -> &ProgressDisplay {
        &self.display
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self.display, ProgressDisplay::Hidden)
    }

    /// Recompute progress and update the display state
    pub fn update(&mut self, loaded: usize, total: Option<u64>, now: Instant) -> ProgressData {
        let data = report(loaded, total);

        self.display = if data.complete {
            match &self.display {
                ProgressDisplay::Complete { since, .. } => ProgressDisplay::Complete {
                    data: data.clone(),
                    since: *since,
                },
                _ => ProgressDisplay::Complete {
                    data: data.clone(),
                    since: now,
                },
            }
        } else {
            ProgressDisplay::Active(data.clone())
        };

        data
    }

    /// Hide a completed display once the dismiss delay has elapsed
    ///
    /// Returns true when this call dismissed it.
    pub fn tick(&mut self, now: Instant) -> bool {
        if let ProgressDisplay::Complete { since, .. } = &self.display {
            if now.saturating_duration_since(*since) >= self.dismiss_delay {
                self.display = ProgressDisplay::Hidden;
                return true;
            }
        }
        false
    }

    /// Fetch ended: keep a completed display until its dismissal, hide anything else
    ///
    /// A stream that ends early or without a known total never shows 100%.
    pub fn finish(&mut self) {
        if let ProgressDisplay::Active(_) = self.display {
            self.display = ProgressDisplay::Hidden;
        }
    }

    /// Instant at which a completed display is due to hide
    pub fn dismiss_deadline(&self) -> Option<Instant> {
        match &self.display {
            ProgressDisplay::Complete { since, .. } => Some(*since + self.dismiss_delay),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_total_percentage() {
        let data = report(50, Some(200));
        assert_eq!(data.percent, Some(25));
        assert_eq!(data.label, "Loaded 50 of 200 photos (25%)");
        assert!(!data.complete);
    }

    #[test]
    fn test_percentage_rounds_and_caps() {
        assert_eq!(report(1, Some(3)).percent, Some(33));
        assert_eq!(report(2, Some(3)).percent, Some(67));
        let over = report(210, Some(200));
        assert_eq!(over.percent, Some(100));
        assert!(over.complete);
    }

    #[test]
    fn test_unknown_total_never_completes() {
        for loaded in [0, 1, 50, 1_000, 1_000_000] {
            let data = report(loaded, None);
            assert_eq!(data.percent, None);
            assert!(data.visual_percent < 100);
            assert!(data.visual_percent < INDETERMINATE_CAP);
            assert!(!data.complete);
        }
        assert_eq!(report(7, None).label, "Loaded 7 photos");
    }

    #[test]
    fn test_zero_total_is_indeterminate() {
        assert_eq!(report(3, Some(0)).percent, None);
    }

    #[test]
    fn test_complete_display_dismisses_after_delay() {
        let start = Instant::now();
        let mut reporter = ProgressReporter::new(Duration::from_millis(2500));

        reporter.update(10, Some(10), start);
        assert!(matches!(reporter.display(), ProgressDisplay::Complete { .. }));
        assert!(!reporter.tick(start + Duration::from_millis(2000)));
        assert!(reporter.tick(start + Duration::from_millis(2500)));
        assert!(!reporter.is_visible());
    }

    #[test]
    fn test_finish_hides_incomplete_display() {
        let mut reporter = ProgressReporter::new(Duration::from_millis(2500));
        reporter.update(4, None, Instant::now());
        reporter.finish();
        assert_eq!(reporter.display(), &ProgressDisplay::Hidden);
    }

    #[test]
    fn test_resumed_progress_cancels_dismissal() {
        let start = Instant::now();
        let mut reporter = ProgressReporter::new(Duration::from_millis(2500));

        reporter.update(10, Some(10), start);
        reporter.update(10, Some(20), start + Duration::from_millis(1000));
        assert!(!reporter.tick(start + Duration::from_millis(5000)));
        assert!(matches!(reporter.display(), ProgressDisplay::Active(_)));
    }
}
