// Transform mappers: one canonical formula per strategy.
// Inputs are already-derived offsets; outputs are rendering-layer transforms.

use serde::{Deserialize, Serialize};

use crate::geometry::{local_offset, relative_offset, viewport_percent};
use crate::types::*;

/// Default magnetic pull coefficient.
pub const DEFAULT_STRENGTH: f64 = 0.3;
/// Default maximum tilt angle per axis, in degrees.
pub const DEFAULT_MAX_ANGLE: f64 = 15.0;
/// Default scroll-parallax speed.
pub const DEFAULT_SCROLL_SPEED: f64 = 0.5;
/// Scroll offset past which scroll-parallax stops moving.
pub const SCROLL_PARALLAX_RANGE: f64 = 1000.0;

/// Suppresses one pointer axis. A locked axis contributes its rest value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AxisLock {
    #[serde(default)]
    pub x: bool,
    #[serde(default)]
    pub y: bool,
}

impl AxisLock {
    fn apply(&self, offset: RelativeOffset) -> RelativeOffset {
        RelativeOffset::new(
            if self.x { 0.0 } else { offset.dx },
            if self.y { 0.0 } else { offset.dy },
        )
    }
}

/// Magnetic pull toward the pointer: the center offset scaled by `strength`.
pub fn magnetic(offset: RelativeOffset, strength: f64, lock: AxisLock) -> TransformResult {
    let offset = lock.apply(offset);
    TransformResult::translate(offset.dx * strength, offset.dy * strength)
}

/// Magnetic pull computed straight from a pointer sample and the element region.
pub fn magnetic_at(
    pointer: PointerSample,
    region: BoundingRegion,
    strength: f64,
    lock: AxisLock,
) -> TransformResult {
    magnetic(relative_offset(pointer, region), strength, lock)
}

/// 3D tilt from a corner-relative pointer position.
///
/// `rotate_x` follows the vertical position (positive below center),
/// `rotate_y` the horizontal one (positive left of center).
pub fn tilt(
    local: RelativeOffset,
    region: BoundingRegion,
    max_angle_x: f64,
    max_angle_y: f64,
    lock: AxisLock,
) -> TransformResult {
    if region.is_degenerate() {
        return TransformResult::rotate(0.0, 0.0);
    }

    let (hw, hh) = region.half_extents();
    let rotate_x = if lock.y {
        0.0
    } else {
        ((local.dy - hh) / hh) * max_angle_x
    };
    let rotate_y = if lock.x {
        0.0
    } else {
        ((hw - local.dx) / hw) * max_angle_y
    };

    TransformResult::rotate(rotate_x, rotate_y)
}

/// Tilt computed straight from a pointer sample and the element region.
pub fn tilt_at(
    pointer: PointerSample,
    region: BoundingRegion,
    max_angle_x: f64,
    max_angle_y: f64,
    lock: AxisLock,
) -> TransformResult {
    tilt(
        local_offset(pointer, region),
        region,
        max_angle_x,
        max_angle_y,
        lock,
    )
}

/// Background layer drift from the global pointer, as a percentage of the
/// viewport scaled by the layer coefficient. Larger coefficients read as closer.
pub fn parallax(
    pointer: PointerSample,
    viewport: ViewportSize,
    coefficient: f64,
    lock: AxisLock,
) -> TransformResult {
    let pct = lock.apply(viewport_percent(pointer, viewport));
    TransformResult::translate(pct.dx * coefficient, pct.dy * coefficient)
}

/// Vertical drift driven by scroll offset. Moves up at `speed` px per scrolled
/// px and holds once the offset passes `SCROLL_PARALLAX_RANGE`.
pub fn scroll_parallax(scroll_offset: f64, speed: f64) -> TransformResult {
    let offset = if scroll_offset.is_finite() {
        scroll_offset.clamp(0.0, SCROLL_PARALLAX_RANGE)
    } else {
        0.0
    };
    // Adding 0.0 normalizes -0.0 for a zero offset.
    TransformResult::translate(0.0, -speed * offset + 0.0)
}
