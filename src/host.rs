// The seam between the engine and whatever runtime delivers input events.
// The host owns elements and listener registrations; the engine asks it to
// attach/detach and to report geometry, and never caches what it reads.

use crate::types::*;

/// Kind of input listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListenerKind {
    PointerMove,
    PointerLeave,
    PointerOver,
    PointerOut,
    Scroll,
}

impl ListenerKind {
    /// DOM event name for this listener.
    pub fn event_name(&self) -> &'static str {
        match self {
            ListenerKind::PointerMove => "pointermove",
            ListenerKind::PointerLeave => "pointerleave",
            ListenerKind::PointerOver => "pointerover",
            ListenerKind::PointerOut => "pointerout",
            ListenerKind::Scroll => "scroll",
        }
    }
}

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerScope {
    /// On one bound element.
    Element(TargetId),
    /// On the viewport/window.
    Viewport,
}

/// Host runtime services the engine depends on.
pub trait InputHost {
    /// Register a listener and return its handle. Events for it are delivered
    /// back through `InputHub::handle` with this id.
    fn attach(&mut self, kind: ListenerKind, scope: ListenerScope) -> ListenerId;

    /// Remove a listener. Must take effect before returning.
    fn detach(&mut self, listener: ListenerId);

    /// Current layout rectangle of `target`, or `None` once it is unmounted.
    fn region(&self, target: TargetId) -> Option<BoundingRegion>;

    fn viewport(&self) -> ViewportSize;

    fn scroll_metrics(&self) -> ScrollMetrics;
}
