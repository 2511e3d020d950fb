// interaction_core: pointer- and scroll-reactive transform engine.
// All mapping math and listener lifetime rules live here; JS is plumbing that
// forwards events and applies the transforms this engine returns.

mod behavior;
mod cursor;
mod error;
mod geometry;
mod host;
mod hub;
mod mapper;
mod scroll;
mod types;

use tracing::warn;
use wasm_bindgen::prelude::*;

pub use behavior::{Behavior, BehaviorConfig, RawBehaviorConfig, Strategy, StrategyConfig};
pub use cursor::{CursorFollower, CursorSettings, CursorVariant, SpringConfig};
pub use error::EngineError;
pub use geometry::{local_offset, relative_offset, viewport_percent};
pub use host::{InputHost, ListenerKind, ListenerScope};
pub use hub::InputHub;
pub use mapper::{magnetic, magnetic_at, parallax, scroll_parallax, tilt, tilt_at, AxisLock};
pub use scroll::{active_section, scroll_fraction, RevealLatch, ScrollTracker, Section};
pub use types::*;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
extern "C" {
    /// JS object that owns DOM listeners on the engine's behalf.
    ///
    /// ```js
    /// {
    ///   attach(event, target) -> listenerId,   // target undefined = window
    ///   detach(listenerId),
    ///   region(target) -> [left, top, width, height] | undefined,
    ///   viewport() -> [width, height],
    ///   scrollMetrics() -> [scrollOffset, scrollableHeight, viewportHeight],
    /// }
    /// ```
    #[derive(Debug, Clone)]
    pub type HostBridge;

    #[wasm_bindgen(method)]
    fn attach(this: &HostBridge, event: &str, target: Option<u32>) -> u32;

    #[wasm_bindgen(method)]
    fn detach(this: &HostBridge, listener: u32);

    #[wasm_bindgen(method)]
    fn region(this: &HostBridge, target: u32) -> JsValue;

    #[wasm_bindgen(method)]
    fn viewport(this: &HostBridge) -> JsValue;

    #[wasm_bindgen(method, js_name = scrollMetrics)]
    fn scroll_metrics(this: &HostBridge) -> JsValue;
}

/// `InputHost` backed by a JS `HostBridge`.
struct JsHost {
    bridge: HostBridge,
}

impl JsHost {
    fn numbers(value: JsValue) -> Option<Vec<f64>> {
        if value.is_undefined() || value.is_null() {
            return None;
        }
        Some(js_sys::Float64Array::new(&value).to_vec())
    }
}

impl InputHost for JsHost {
    fn attach(&mut self, kind: ListenerKind, scope: ListenerScope) -> ListenerId {
        let target = match scope {
            ListenerScope::Element(target) => Some(target.as_u32()),
            ListenerScope::Viewport => None,
        };
        ListenerId::new(self.bridge.attach(kind.event_name(), target))
    }

    fn detach(&mut self, listener: ListenerId) {
        self.bridge.detach(listener.as_u32());
    }

    fn region(&self, target: TargetId) -> Option<BoundingRegion> {
        match Self::numbers(self.bridge.region(target.as_u32()))?.as_slice() {
            [left, top, width, height, ..] => {
                Some(BoundingRegion::new(*left, *top, *width, *height))
            }
            other => {
                warn!(element = target.as_u32(), len = other.len(), "malformed region from host");
                None
            }
        }
    }

    fn viewport(&self) -> ViewportSize {
        match Self::numbers(self.bridge.viewport()).as_deref() {
            Some([width, height, ..]) => ViewportSize::new(*width, *height),
            _ => ViewportSize::default(),
        }
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        match Self::numbers(self.bridge.scroll_metrics()).as_deref() {
            Some([offset, scrollable, viewport, ..]) => {
                ScrollMetrics::new(*offset, *scrollable, *viewport)
            }
            _ => ScrollMetrics::default(),
        }
    }
}

/// Main engine interface exposed to JavaScript.
/// One instance per page: created at startup, shut down on teardown.
#[wasm_bindgen]
pub struct Engine {
    hub: InputHub<JsHost>,
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, bridge: HostBridge) -> Result<Engine, JsValue> {
        let config = EngineConfig::from_json(config_json).map_err(to_js)?;
        Ok(Engine {
            hub: InputHub::new(JsHost { bridge }, config),
        })
    }

    /// Attach a behavior to an element. Fails before attaching anything if the
    /// behavior JSON is invalid.
    pub fn bind(&mut self, target: u32, behavior_json: &str) -> Result<u32, JsValue> {
        self.hub
            .bind_json(TargetId::new(target), behavior_json)
            .map(|id| id.as_u32())
            .map_err(to_js)
    }

    /// Swap a binding's behavior, re-registering its listeners. Returns the
    /// previous behavior's rest update as JSON.
    pub fn rebind(&mut self, binding: u32, behavior_json: &str) -> Result<String, JsValue> {
        let rest = self
            .hub
            .rebind_json(BindingId::new(binding), behavior_json)
            .map_err(to_js)?;
        serde_json::to_string(&rest).map_err(|e| to_js(e.into()))
    }

    /// Tear down a binding. Returns the rest update as JSON, or `null` if the
    /// binding was already gone.
    pub fn unbind(&mut self, binding: u32) -> Result<String, JsValue> {
        let rest = self.hub.unbind(BindingId::new(binding));
        serde_json::to_string(&rest).map_err(|e| to_js(e.into()))
    }

    /// Deliver an event as JSON (see `InputEvent`).
    pub fn handle(&mut self, listener: u32, event_json: &str) -> Result<bool, JsValue> {
        let event: InputEvent = serde_json::from_str(event_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid event: {}", e)))?;
        Ok(self.hub.handle(ListenerId::new(listener), event))
    }

    /// Fast path for the most frequent event.
    pub fn pointer_move(&mut self, listener: u32, x: f64, y: f64) -> bool {
        self.hub
            .handle(ListenerId::new(listener), InputEvent::PointerMove { x, y })
    }

    pub fn pointer_leave(&mut self, listener: u32) -> bool {
        self.hub
            .handle(ListenerId::new(listener), InputEvent::PointerLeave)
    }

    pub fn scroll(
        &mut self,
        listener: u32,
        scroll_offset: f64,
        scrollable_height: f64,
        viewport_height: f64,
    ) -> bool {
        self.hub.handle(
            ListenerId::new(listener),
            InputEvent::Scroll {
                scroll_offset,
                scrollable_height,
                viewport_height,
            },
        )
    }

    /// Run one animation frame. Returns a JSON array of `TransformUpdate`.
    /// Batch call to keep JS↔WASM crossings to one per frame.
    pub fn frame(&mut self, timestamp_us: u64) -> Result<String, JsValue> {
        let updates = self.hub.frame(Timestamp::from_micros(timestamp_us));
        serde_json::to_string(&updates).map_err(|e| to_js(e.into()))
    }

    pub fn scroll_fraction(&self) -> f64 {
        self.hub.scroll_fraction()
    }

    pub fn is_scrolled(&self) -> bool {
        self.hub.is_scrolled()
    }

    /// Id of the section under the navigation probe line, from a JSON array of
    /// `{ id, region }`.
    pub fn active_section(&self, sections_json: &str) -> Result<Option<String>, JsValue> {
        active_section_id(sections_json, scroll::DEFAULT_SECTION_PROBE).map_err(to_js)
    }

    /// Whether `target` has scrolled into view. Latches: once true, stays true
    /// until `forget_reveal`.
    pub fn reveal(&mut self, target: u32) -> bool {
        self.hub.reveal(TargetId::new(target))
    }

    pub fn forget_reveal(&mut self, target: u32) {
        self.hub.forget_reveal(TargetId::new(target));
    }

    /// Tear down every binding. Returns the rest updates as JSON.
    pub fn shutdown(&mut self) -> Result<String, JsValue> {
        let updates = self.hub.shutdown();
        serde_json::to_string(&updates).map_err(|e| to_js(e.into()))
    }
}

fn active_section_id(
    sections_json: &str,
    probe_line: f64,
) -> Result<Option<String>, EngineError> {
    let sections: Vec<Section> = serde_json::from_str(sections_json)?;
    Ok(active_section(&sections, probe_line).map(|s| s.id.clone()))
}

fn to_js(err: EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}
