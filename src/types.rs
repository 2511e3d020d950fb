// Strong typing over strings. Newtypes for timestamps and host handles, plain
// structs for geometry samples. Everything here crosses the JS boundary as JSON.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Timestamp in microseconds. Newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_micros(us: u64) -> Self {
        Timestamp(us)
    }

    pub fn as_micros(&self) -> u64 {
        self.0
    }

    pub fn as_secs(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Seconds elapsed since `earlier`, zero if the clock went backwards.
    pub fn secs_since(&self, earlier: Timestamp) -> f64 {
        self.0.saturating_sub(earlier.0) as f64 / 1_000_000.0
    }
}

/// Host-side element handle. The host owns the element; the engine only names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetId(u32);

impl TargetId {
    pub const fn new(id: u32) -> Self {
        TargetId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Host-side listener registration handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListenerId(u32);

impl ListenerId {
    pub const fn new(id: u32) -> Self {
        ListenerId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Handle to one behavior binding. Never reused within an `InputHub`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BindingId(u32);

impl BindingId {
    pub const fn new(id: u32) -> Self {
        BindingId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for BindingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Raw viewport coordinates of the pointer at one sampling instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
}

impl PointerSample {
    pub fn new(x: f64, y: f64) -> Self {
        PointerSample { x, y }
    }
}

/// Layout rectangle of an element, read fresh from the host at sample time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BoundingRegion {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingRegion {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        BoundingRegion {
            left,
            top,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Pointer position relative to a region's center (or corner, for tilt).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RelativeOffset {
    pub dx: f64,
    pub dy: f64,
}

impl RelativeOffset {
    pub fn new(dx: f64, dy: f64) -> Self {
        RelativeOffset { dx, dy }
    }

    pub fn zero() -> Self {
        RelativeOffset { dx: 0.0, dy: 0.0 }
    }
}

/// Size of the host viewport in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> Self {
        ViewportSize { width, height }
    }
}

/// Document scroll state as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ScrollMetrics {
    pub scroll_offset: f64,
    pub scrollable_height: f64,
    pub viewport_height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_offset: f64, scrollable_height: f64, viewport_height: f64) -> Self {
        ScrollMetrics {
            scroll_offset,
            scrollable_height,
            viewport_height,
        }
    }
}

/// Numeric visual parameters handed to the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformResult {
    /// Magnetic, parallax and scroll-parallax output (pixels).
    Translate { translate_x: f64, translate_y: f64 },
    /// Tilt output (degrees).
    Rotate { rotate_x: f64, rotate_y: f64 },
    /// Progress output in [0, 1].
    ScrollFraction { scroll_fraction: f64 },
    /// Cursor replacement: top-left positions of the dot and the trailing ring.
    Cursor {
        dot_x: f64,
        dot_y: f64,
        ring_x: f64,
        ring_y: f64,
        scale: f64,
        visible: bool,
    },
}

impl TransformResult {
    pub fn translate(translate_x: f64, translate_y: f64) -> Self {
        TransformResult::Translate {
            translate_x,
            translate_y,
        }
    }

    pub fn rotate(rotate_x: f64, rotate_y: f64) -> Self {
        TransformResult::Rotate { rotate_x, rotate_y }
    }

    pub fn scroll_fraction(scroll_fraction: f64) -> Self {
        TransformResult::ScrollFraction { scroll_fraction }
    }
}

/// Why a transform update was emitted. Lets the rendering layer choose its own
/// easing for returns to rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateReason {
    /// A pointer sample was mapped.
    Sample,
    /// Pointer left the element; transform is the rest value.
    Leave,
    /// Scroll position changed.
    Scroll,
    /// Continuous per-frame motion (cursor springs).
    Frame,
    /// Binding was torn down; transform is the rest value.
    Unbind,
}

/// One transform change for one binding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformUpdate {
    pub binding: BindingId,
    pub transform: TransformResult,
    pub reason: UpdateReason,
}

/// Descriptor of the element under the pointer, for cursor variant selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HoverTarget {
    pub tag: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
}

/// Single raw input event delivered by the host to a listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputEvent {
    /// Pointer moved (element-scoped or viewport-scoped, per the listener).
    PointerMove { x: f64, y: f64 },
    /// Pointer left the bound element.
    PointerLeave,
    /// Pointer entered an element (viewport-scoped).
    PointerOver(HoverTarget),
    /// Pointer left an element (viewport-scoped).
    PointerOut,
    /// Document scrolled.
    Scroll {
        scroll_offset: f64,
        scrollable_height: f64,
        viewport_height: f64,
    },
}

/// Engine configuration passed from JS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Scroll offset (px) past which the page counts as scrolled.
    #[serde(default = "default_scrolled_threshold")]
    pub scrolled_threshold: f64,
    /// Upper bound on the frame delta fed to cursor springs (milliseconds).
    #[serde(default = "default_max_frame_delta_ms")]
    pub max_frame_delta_ms: f64,
    /// Margin (px) applied to the viewport for reveal detection.
    #[serde(default = "default_reveal_margin")]
    pub reveal_margin: f64,
}

/// Largest accepted `max_frame_delta_ms`.
pub const MAX_FRAME_DELTA_LIMIT_MS: f64 = 1000.0;

impl EngineConfig {
    /// Parse and validate a JSON engine configuration.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.max_frame_delta_ms > 0.0 && self.max_frame_delta_ms <= MAX_FRAME_DELTA_LIMIT_MS)
        {
            return Err(EngineError::CoefficientOutOfRange {
                name: "max_frame_delta_ms",
                value: self.max_frame_delta_ms,
                expected: "milliseconds in (0, 1000]",
            });
        }
        if !self.scrolled_threshold.is_finite() {
            return Err(EngineError::CoefficientOutOfRange {
                name: "scrolled_threshold",
                value: self.scrolled_threshold,
                expected: "a finite offset",
            });
        }
        if !self.reveal_margin.is_finite() {
            return Err(EngineError::CoefficientOutOfRange {
                name: "reveal_margin",
                value: self.reveal_margin,
                expected: "a finite margin",
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            scrolled_threshold: default_scrolled_threshold(),
            max_frame_delta_ms: default_max_frame_delta_ms(),
            reveal_margin: default_reveal_margin(),
        }
    }
}

fn default_scrolled_threshold() -> f64 {
    50.0
}

fn default_max_frame_delta_ms() -> f64 {
    100.0
}

fn default_reveal_margin() -> f64 {
    -100.0
}
