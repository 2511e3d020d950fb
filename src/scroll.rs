// Scroll progress tracking and scroll-position helpers: progress fraction,
// "scrolled" flag, active section lookup, once-only reveal latch.

use serde::{Deserialize, Serialize};

use crate::types::*;

/// Probe line (px from the viewport top) used for active section detection.
pub const DEFAULT_SECTION_PROBE: f64 = 100.0;
/// Reveal margin (px). Negative shrinks the viewport, so elements reveal once
/// they are this far inside it.
pub const DEFAULT_REVEAL_MARGIN: f64 = -100.0;

/// Normalized scroll progress in [0, 1].
///
/// Returns 0 when the content fits in one viewport.
pub fn scroll_fraction(metrics: ScrollMetrics) -> f64 {
    let range = metrics.scrollable_height - metrics.viewport_height;
    if !(range > 0.0) || !metrics.scroll_offset.is_finite() || !range.is_finite() {
        return 0.0;
    }

    (metrics.scroll_offset / range).clamp(0.0, 1.0)
}

/// Continuously updated scroll signal. One per `InputHub`.
#[derive(Debug, Clone, Default)]
pub struct ScrollTracker {
    metrics: ScrollMetrics,
    fraction: f64,
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record new metrics and return the recomputed fraction.
    pub fn update(&mut self, metrics: ScrollMetrics) -> f64 {
        self.metrics = metrics;
        self.fraction = scroll_fraction(metrics);
        self.fraction
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn offset(&self) -> f64 {
        if self.metrics.scroll_offset.is_finite() {
            self.metrics.scroll_offset.max(0.0)
        } else {
            0.0
        }
    }

    /// True once the page has scrolled past `threshold` pixels.
    pub fn is_scrolled(&self, threshold: f64) -> bool {
        self.offset() > threshold
    }
}

/// A named page section and its current layout region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub region: BoundingRegion,
}

/// First section (in document order) whose region spans `probe_line`.
pub fn active_section(sections: &[Section], probe_line: f64) -> Option<&Section> {
    sections
        .iter()
        .find(|section| section.region.top <= probe_line && section.region.bottom() >= probe_line)
}

/// Once-only in-view detection. Latches on first intersection.
#[derive(Debug, Clone, Copy)]
pub struct RevealLatch {
    margin: f64,
    revealed: bool,
}

impl RevealLatch {
    pub fn new(margin: f64) -> Self {
        RevealLatch {
            margin,
            revealed: false,
        }
    }

    /// Check `region` against a viewport of `viewport_height` grown by the margin.
    /// Returns whether the element has been revealed so far.
    pub fn observe(&mut self, region: BoundingRegion, viewport_height: f64) -> bool {
        if self.revealed {
            return true;
        }

        let view_top = -self.margin;
        let view_bottom = viewport_height + self.margin;
        if view_bottom > view_top && region.top < view_bottom && region.bottom() > view_top {
            self.revealed = true;
        }
        self.revealed
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }
}

impl Default for RevealLatch {
    fn default() -> Self {
        Self::new(DEFAULT_REVEAL_MARGIN)
    }
}
