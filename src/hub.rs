// Input hub: owns every behavior binding and every listener registration.
// Events only record the latest sample; geometry is read and mappers run once
// per animation frame in `frame`. Viewport listeners are shared and reference
// counted across bindings.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, trace};

use crate::behavior::{Behavior, BehaviorConfig};
use crate::error::EngineError;
use crate::host::{InputHost, ListenerKind, ListenerScope};
use crate::scroll::{RevealLatch, ScrollTracker};
use crate::types::*;

#[derive(Debug, Clone, Copy)]
enum Route {
    /// Listener on a bound element, owned by one binding.
    Element(BindingId),
    /// Viewport listener shared by all interested bindings.
    Shared(ListenerKind),
}

#[derive(Debug, Clone, Copy)]
struct SharedListener {
    id: ListenerId,
    refs: usize,
}

/// Latest unprocessed element-scoped sample. Later events replace earlier ones.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    Move(PointerSample),
    Leave,
}

#[derive(Debug)]
struct Binding {
    target: TargetId,
    behavior: Behavior,
    listeners: Vec<ListenerId>,
    pending: Option<Pending>,
    queued: Option<(TransformResult, UpdateReason)>,
}

/// Process-wide input tracking service. Create once at startup; `shutdown`
/// (or drop) tears down every binding and listener.
pub struct InputHub<H: InputHost> {
    host: H,
    config: EngineConfig,
    bindings: BTreeMap<BindingId, Binding>,
    routes: HashMap<ListenerId, Route>,
    shared: BTreeMap<ListenerKind, SharedListener>,
    next_binding: u32,
    pointer: Option<PointerSample>,
    pointer_dirty: bool,
    hover: Option<HoverTarget>,
    hover_dirty: bool,
    scroll: ScrollTracker,
    scroll_dirty: bool,
    reveals: HashMap<TargetId, RevealLatch>,
    last_frame: Option<Timestamp>,
}

impl<H: InputHost> InputHub<H> {
    pub fn new(host: H, config: EngineConfig) -> Self {
        InputHub {
            host,
            config,
            bindings: BTreeMap::new(),
            routes: HashMap::new(),
            shared: BTreeMap::new(),
            next_binding: 0,
            pointer: None,
            pointer_dirty: false,
            hover: None,
            hover_dirty: false,
            scroll: ScrollTracker::new(),
            scroll_dirty: false,
            reveals: HashMap::new(),
            last_frame: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Attach a behavior to `target`. The config is already validated, so this
    /// cannot fail; listeners are registered before returning.
    pub fn bind(&mut self, target: TargetId, config: BehaviorConfig) -> BindingId {
        self.next_binding += 1;
        let id = BindingId::new(self.next_binding);

        let binding = self.attach(id, target, config);
        debug!(
            binding = %id,
            element = target.as_u32(),
            strategy = binding.behavior.strategy().as_str(),
            listeners = binding.listeners.len(),
            "bound behavior"
        );
        self.bindings.insert(id, binding);
        id
    }

    /// Parse, validate and bind. Nothing is attached if validation fails.
    pub fn bind_json(&mut self, target: TargetId, json: &str) -> Result<BindingId, EngineError> {
        let config = BehaviorConfig::from_json(json)?;
        Ok(self.bind(target, config))
    }

    /// Replace a binding's configuration. The previous listener set is
    /// deregistered before the new one is registered. Returns the previous
    /// behavior's rest transform; the new behavior's first transform follows
    /// from the next `frame`.
    pub fn rebind(
        &mut self,
        id: BindingId,
        config: BehaviorConfig,
    ) -> Result<TransformUpdate, EngineError> {
        let old = self
            .bindings
            .remove(&id)
            .ok_or(EngineError::UnknownBinding(id))?;
        let target = old.target;
        let rest = old.behavior.rest();

        // Last-known input survives the listener swap so the new behavior can
        // be primed with it.
        let pointer = self.pointer;
        let hover = self.hover.clone();
        self.release(id, old);
        self.pointer = pointer;
        self.hover = hover;

        let binding = self.attach(id, target, config);
        if !self.shared.contains_key(&ListenerKind::PointerMove) {
            self.pointer = None;
        }
        if !self.shared.contains_key(&ListenerKind::PointerOver) {
            self.hover = None;
        }
        debug!(
            binding = %id,
            strategy = binding.behavior.strategy().as_str(),
            "rebound behavior"
        );
        self.bindings.insert(id, binding);

        Ok(TransformUpdate {
            binding: id,
            transform: rest,
            reason: UpdateReason::Unbind,
        })
    }

    pub fn rebind_json(
        &mut self,
        id: BindingId,
        json: &str,
    ) -> Result<TransformUpdate, EngineError> {
        let config = BehaviorConfig::from_json(json)?;
        self.rebind(id, config)
    }

    /// Tear down a binding. Listeners are detached before this returns; the
    /// rest transform is returned for the rendering layer. Unknown ids are a no-op.
    pub fn unbind(&mut self, id: BindingId) -> Option<TransformUpdate> {
        let binding = self.bindings.remove(&id)?;
        let rest = binding.behavior.rest();
        self.release(id, binding);
        debug!(binding = %id, "unbound behavior");

        Some(TransformUpdate {
            binding: id,
            transform: rest,
            reason: UpdateReason::Unbind,
        })
    }

    /// Tear down every binding.
    pub fn shutdown(&mut self) -> Vec<TransformUpdate> {
        let ids: Vec<BindingId> = self.bindings.keys().copied().collect();
        let updates: Vec<TransformUpdate> =
            ids.into_iter().filter_map(|id| self.unbind(id)).collect();
        self.reveals.clear();
        if !updates.is_empty() {
            debug!(bindings = updates.len(), "input hub shut down");
        }
        updates
    }

    /// Deliver a raw event from `listener`. Returns `false` when the event was
    /// ignored: the listener is no longer registered, or the event does not
    /// apply to it.
    pub fn handle(&mut self, listener: ListenerId, event: InputEvent) -> bool {
        let Some(route) = self.routes.get(&listener).copied() else {
            trace!(listener = listener.as_u32(), "dropped event for stale listener");
            return false;
        };

        match (route, event) {
            (Route::Element(id), InputEvent::PointerMove { x, y }) => {
                self.set_pending(id, Pending::Move(PointerSample::new(x, y)))
            }
            (Route::Element(id), InputEvent::PointerLeave) => self.set_pending(id, Pending::Leave),
            (Route::Shared(ListenerKind::PointerMove), InputEvent::PointerMove { x, y }) => {
                self.pointer = Some(PointerSample::new(x, y));
                self.pointer_dirty = true;
                true
            }
            (Route::Shared(ListenerKind::PointerOver), InputEvent::PointerOver(target)) => {
                self.hover = Some(target);
                self.hover_dirty = true;
                true
            }
            (Route::Shared(ListenerKind::PointerOut), InputEvent::PointerOut) => {
                self.hover = None;
                self.hover_dirty = true;
                true
            }
            (
                Route::Shared(ListenerKind::Scroll),
                InputEvent::Scroll {
                    scroll_offset,
                    scrollable_height,
                    viewport_height,
                },
            ) => {
                self.scroll.update(ScrollMetrics::new(
                    scroll_offset,
                    scrollable_height,
                    viewport_height,
                ));
                self.scroll_dirty = true;
                true
            }
            (route, event) => {
                trace!(?route, ?event, "event does not apply to listener");
                false
            }
        }
    }

    /// Per-frame scheduling point: drain pending samples, read geometry fresh,
    /// advance continuous motion, and return every transform that changed.
    pub fn frame(&mut self, now: Timestamp) -> Vec<TransformUpdate> {
        let max_dt = self
            .config
            .max_frame_delta_ms
            .clamp(0.0, MAX_FRAME_DELTA_LIMIT_MS)
            / 1000.0;
        let dt = self
            .last_frame
            .map(|last| now.secs_since(last))
            .unwrap_or(0.0)
            .min(max_dt);
        self.last_frame = Some(now);

        let viewport = self.host.viewport();
        let pointer = if self.pointer_dirty { self.pointer } else { None };
        let mut updates = Vec::new();

        for (&id, binding) in self.bindings.iter_mut() {
            let mut out = binding.queued.take();

            if let Some(pending) = binding.pending.take() {
                // Liveness check before touching layout.
                match self.host.region(binding.target) {
                    Some(region) => {
                        let next = match pending {
                            Pending::Move(sample) => binding
                                .behavior
                                .on_pointer_move(sample, region)
                                .map(|t| (t, UpdateReason::Sample)),
                            Pending::Leave => binding
                                .behavior
                                .on_pointer_leave()
                                .map(|t| (t, UpdateReason::Leave)),
                        };
                        out = next.or(out);
                    }
                    None => {
                        trace!(binding = %id, "target unmounted; sample dropped");
                    }
                }
            }

            if let Some(sample) = pointer {
                if let Some(t) = binding.behavior.on_global_pointer(sample, viewport) {
                    out = Some((t, UpdateReason::Sample));
                }
            }

            if self.hover_dirty {
                binding.behavior.on_hover(self.hover.as_ref());
            }

            if self.scroll_dirty {
                if let Some(t) = binding.behavior.on_scroll(&self.scroll) {
                    out = Some((t, UpdateReason::Scroll));
                }
            }

            if let Some(t) = binding.behavior.on_frame(dt) {
                out = Some((t, UpdateReason::Frame));
            }

            if let Some((transform, reason)) = out {
                updates.push(TransformUpdate {
                    binding: id,
                    transform,
                    reason,
                });
            }
        }

        self.pointer_dirty = false;
        self.hover_dirty = false;
        self.scroll_dirty = false;
        updates
    }

    /// Current transform of a binding.
    pub fn current(&self, id: BindingId) -> Option<TransformResult> {
        self.bindings.get(&id).map(|b| b.behavior.current())
    }

    pub fn is_bound(&self, id: BindingId) -> bool {
        self.bindings.contains_key(&id)
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn scroll(&self) -> &ScrollTracker {
        &self.scroll
    }

    pub fn scroll_fraction(&self) -> f64 {
        self.scroll.fraction()
    }

    /// Whether the page has scrolled past the configured threshold.
    pub fn is_scrolled(&self) -> bool {
        self.scroll.is_scrolled(self.config.scrolled_threshold)
    }

    /// Check `target` against the viewport for once-only reveal. Returns
    /// whether it has been revealed so far; an unmounted target reports its
    /// latched state without touching layout.
    pub fn reveal(&mut self, target: TargetId) -> bool {
        let margin = self.config.reveal_margin;
        let latch = self
            .reveals
            .entry(target)
            .or_insert_with(|| RevealLatch::new(margin));
        if latch.is_revealed() {
            return true;
        }
        match self.host.region(target) {
            Some(region) => {
                let revealed = latch.observe(region, self.host.viewport().height);
                if revealed {
                    trace!(element = target.as_u32(), "revealed");
                }
                revealed
            }
            None => false,
        }
    }

    /// Drop reveal state for a target that has unmounted.
    pub fn forget_reveal(&mut self, target: TargetId) {
        self.reveals.remove(&target);
    }

    fn set_pending(&mut self, id: BindingId, pending: Pending) -> bool {
        match self.bindings.get_mut(&id) {
            Some(binding) => {
                binding.pending = Some(pending);
                true
            }
            None => false,
        }
    }

    /// Register listeners for a new configuration and prime the behavior with
    /// whatever input state already exists.
    fn attach(&mut self, id: BindingId, target: TargetId, config: BehaviorConfig) -> Binding {
        let mut listeners = Vec::new();
        if config.strategy.is_element_scoped() {
            for kind in [ListenerKind::PointerMove, ListenerKind::PointerLeave] {
                let listener = self.host.attach(kind, ListenerScope::Element(target));
                self.routes.insert(listener, Route::Element(id));
                listeners.push(listener);
            }
        }

        let shared = config.strategy.shared_listeners();
        for &kind in shared {
            self.acquire(kind);
        }

        let mut behavior = Behavior::new(config);
        let mut queued = None;

        if shared.contains(&ListenerKind::Scroll) {
            // Initial scroll position may be nonzero on deep-linked loads.
            self.scroll.update(self.host.scroll_metrics());
            if let Some(t) = behavior.on_scroll(&self.scroll) {
                queued = Some((t, UpdateReason::Scroll));
            }
        }
        if shared.contains(&ListenerKind::PointerMove) {
            if let Some(pointer) = self.pointer {
                if let Some(t) = behavior.on_global_pointer(pointer, self.host.viewport()) {
                    queued = Some((t, UpdateReason::Sample));
                }
            }
        }
        if shared.contains(&ListenerKind::PointerOver) {
            behavior.on_hover(self.hover.as_ref());
        }

        Binding {
            target,
            behavior,
            listeners,
            pending: None,
            queued,
        }
    }

    fn release(&mut self, id: BindingId, binding: Binding) {
        for listener in binding.listeners {
            self.routes.remove(&listener);
            self.host.detach(listener);
        }
        for &kind in binding.behavior.config().strategy.shared_listeners() {
            self.release_shared(kind);
        }
        trace!(binding = %id, "released listeners");
    }

    fn acquire(&mut self, kind: ListenerKind) {
        if let Some(shared) = self.shared.get_mut(&kind) {
            shared.refs += 1;
            return;
        }

        let id = self.host.attach(kind, ListenerScope::Viewport);
        self.routes.insert(id, Route::Shared(kind));
        self.shared.insert(kind, SharedListener { id, refs: 1 });
        debug!(event = kind.event_name(), "attached shared listener");
    }

    fn release_shared(&mut self, kind: ListenerKind) {
        let Some(shared) = self.shared.get_mut(&kind) else {
            return;
        };
        shared.refs -= 1;
        if shared.refs > 0 {
            return;
        }

        let id = shared.id;
        self.shared.remove(&kind);
        self.routes.remove(&id);
        self.host.detach(id);
        match kind {
            ListenerKind::PointerMove => self.pointer = None,
            ListenerKind::PointerOver | ListenerKind::PointerOut => self.hover = None,
            _ => {}
        }
        debug!(event = kind.event_name(), "detached shared listener");
    }
}

impl<H: InputHost> Drop for InputHub<H> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
