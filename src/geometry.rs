// Pointer geometry against element regions and the viewport.
// Pure functions only. Degenerate input yields the neutral offset, never NaN.

use crate::types::*;

impl BoundingRegion {
    /// True when the region has no usable area (zero, negative or non-finite extents).
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
            || !self.left.is_finite()
            || !self.top.is_finite()
            || !self.width.is_finite()
            || !self.height.is_finite()
    }

    pub fn center(&self) -> PointerSample {
        PointerSample::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Half width and half height.
    pub fn half_extents(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// Pointer offset from the center of `region`.
///
/// Returns the zero offset for a degenerate region.
pub fn relative_offset(pointer: PointerSample, region: BoundingRegion) -> RelativeOffset {
    if region.is_degenerate() {
        return RelativeOffset::zero();
    }

    let center = region.center();
    RelativeOffset::new(pointer.x - center.x, pointer.y - center.y)
}

/// Pointer offset from the top-left corner of `region`.
pub fn local_offset(pointer: PointerSample, region: BoundingRegion) -> RelativeOffset {
    if region.is_degenerate() {
        return RelativeOffset::zero();
    }

    RelativeOffset::new(pointer.x - region.left, pointer.y - region.top)
}

/// Pointer position as a percentage (0-100) of the viewport along each axis.
pub fn viewport_percent(pointer: PointerSample, viewport: ViewportSize) -> RelativeOffset {
    if !(viewport.width > 0.0 && viewport.height > 0.0) {
        return RelativeOffset::zero();
    }

    RelativeOffset::new(
        pointer.x / viewport.width * 100.0,
        pointer.y / viewport.height * 100.0,
    )
}
