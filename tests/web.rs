// Browser-side checks of the Engine facade against a JS HostBridge.
// Run with `wasm-pack test --headless --chrome`.

#![cfg(target_arch = "wasm32")]

use interaction_core::{Engine, HostBridge};
use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen(inline_js = "
export function makeBridge() {
  let next = 0;
  const live = new Map();
  return {
    live,
    mounted: true,
    attach(event, target) { next += 1; live.set(next, { event, target }); return next; },
    detach(id) { live.delete(id); },
    region(target) {
      if (!this.mounted) return undefined;
      if (target === 7) return [0, 0, 200, 100];
      if (target === 8) return [0, 300, 200, 100];
      return undefined;
    },
    viewport() { return [1000, 800]; },
    scrollMetrics() { return [600, 2000, 800]; },
  };
}
export function liveCount(bridge) { return bridge.live.size; }
export function unmount(bridge) { bridge.mounted = false; }
export function findListener(bridge, event, target) {
  for (const [id, l] of bridge.live) {
    if (l.event === event && l.target === target) return id;
  }
  return 0;
}
")]
extern "C" {
    #[wasm_bindgen(js_name = makeBridge)]
    fn make_bridge() -> HostBridge;

    #[wasm_bindgen(js_name = liveCount)]
    fn live_count(bridge: &HostBridge) -> u32;

    fn unmount(bridge: &HostBridge);

    #[wasm_bindgen(js_name = findListener)]
    fn find_listener(bridge: &HostBridge, event: &str, target: Option<u32>) -> u32;
}

#[wasm_bindgen_test]
fn magnetic_binding_round_trip() {
    let bridge = make_bridge();
    let mut engine = Engine::new("{}", bridge.clone()).expect("engine");

    let binding = engine
        .bind(7, r#"{"strategy":"magnetic","strength":0.3}"#)
        .expect("bind");
    assert_eq!(live_count(&bridge), 2);

    let moves = find_listener(&bridge, "pointermove", Some(7));
    assert!(engine.pointer_move(moves, 200.0, 0.0));
    let json = engine.frame(16_000).expect("frame");
    assert!(json.contains(r#""translate_x":30.0"#), "{json}");
    assert!(json.contains(r#""translate_y":-15.0"#), "{json}");

    let rest = engine.unbind(binding).expect("unbind");
    assert!(rest.contains(r#""reason":"Unbind""#));
    assert_eq!(live_count(&bridge), 0);
    assert!(!engine.pointer_move(moves, 10.0, 10.0));
}

#[wasm_bindgen_test]
fn invalid_behavior_attaches_nothing() {
    let bridge = make_bridge();
    let mut engine = Engine::new("{}", bridge.clone()).expect("engine");

    assert!(engine.bind(7, r#"{"strategy":"wobble"}"#).is_err());
    assert!(engine
        .bind(7, r#"{"strategy":"parallax","coefficient":4}"#)
        .is_err());
    assert_eq!(live_count(&bridge), 0);
}

#[wasm_bindgen_test]
fn progress_shares_one_scroll_listener() {
    let bridge = make_bridge();
    let mut engine = Engine::new(r#"{"scrolled_threshold":50}"#, bridge.clone()).expect("engine");

    engine.bind(1, r#"{"strategy":"progress"}"#).expect("bind");
    engine.bind(2, r#"{"strategy":"progress"}"#).expect("bind");
    assert_eq!(live_count(&bridge), 1);

    // 600 / (2000 - 800) = 0.5 at mount.
    assert!((engine.scroll_fraction() - 0.5).abs() < 1e-9);
    assert!(engine.is_scrolled());

    let scroll = find_listener(&bridge, "scroll", None);
    assert!(engine.scroll(scroll, 1200.0, 2000.0, 800.0));
    assert!((engine.scroll_fraction() - 1.0).abs() < 1e-9);

    engine.shutdown().expect("shutdown");
    assert_eq!(live_count(&bridge), 0);
}

#[wasm_bindgen_test]
fn unmounted_target_emits_nothing() {
    let bridge = make_bridge();
    let mut engine = Engine::new("{}", bridge.clone()).expect("engine");
    engine.bind(7, r#"{"strategy":"tilt"}"#).expect("bind");

    let moves = find_listener(&bridge, "pointermove", Some(7));
    unmount(&bridge);
    engine.pointer_move(moves, 50.0, 25.0);
    assert_eq!(engine.frame(16_000).expect("frame"), "[]");
}

#[wasm_bindgen_test]
fn rebind_returns_rest_of_previous_behavior() {
    let bridge = make_bridge();
    let mut engine = Engine::new("{}", bridge.clone()).expect("engine");
    let binding = engine.bind(7, r#"{"strategy":"magnetic"}"#).expect("bind");

    let moves = find_listener(&bridge, "pointermove", Some(7));
    engine.pointer_move(moves, 200.0, 0.0);
    engine.frame(16_000).expect("frame");

    let rest = engine.rebind(binding, r#"{"strategy":"tilt"}"#).expect("rebind");
    assert!(rest.contains(r#""translate_x":0.0"#), "{rest}");
    assert!(rest.contains(r#""reason":"Unbind""#), "{rest}");
    assert_eq!(live_count(&bridge), 2);
}

#[wasm_bindgen_test]
fn reveal_latches_through_facade() {
    let bridge = make_bridge();
    let mut engine = Engine::new("{}", bridge.clone()).expect("engine");
    assert!(engine.reveal(8));
    unmount(&bridge);
    assert!(engine.reveal(8));
    assert!(!engine.reveal(7));
    assert!(Engine::new(r#"{"max_frame_delta_ms":1e12}"#, bridge).is_err());
}
