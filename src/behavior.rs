// Composition layer: a validated strategy configuration plus the per-binding
// state that turns raw samples into the one "current transform" a binding exposes.
// Behaviors share nothing with each other.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cursor::{CursorFollower, CursorSettings, SpringConfig, MAX_DAMPING, MAX_STIFFNESS};
use crate::error::EngineError;
use crate::host::ListenerKind;
use crate::mapper::{self, AxisLock};
use crate::scroll::ScrollTracker;
use crate::types::*;

/// Default parallax layer coefficient.
pub const DEFAULT_COEFFICIENT: f64 = 0.05;
/// Largest tilt angle accepted, in degrees.
pub const MAX_TILT_ANGLE: f64 = 90.0;

/// Named mapping rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Magnetic,
    Tilt,
    Parallax,
    CursorFollow,
    Progress,
    ScrollParallax,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Magnetic => "magnetic",
            Strategy::Tilt => "tilt",
            Strategy::Parallax => "parallax",
            Strategy::CursorFollow => "cursor-follow",
            Strategy::Progress => "progress",
            Strategy::ScrollParallax => "scroll-parallax",
        }
    }
}

impl FromStr for Strategy {
    type Err = EngineError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "magnetic" => Ok(Strategy::Magnetic),
            "tilt" => Ok(Strategy::Tilt),
            "parallax" => Ok(Strategy::Parallax),
            "cursor-follow" => Ok(Strategy::CursorFollow),
            "progress" => Ok(Strategy::Progress),
            "scroll-parallax" => Ok(Strategy::ScrollParallax),
            other => Err(EngineError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Behavior configuration as it arrives from JS. Validated into `BehaviorConfig`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBehaviorConfig {
    pub strategy: String,
    #[serde(default)]
    pub strength: Option<f64>,
    #[serde(default)]
    pub max_angle_x: Option<f64>,
    #[serde(default)]
    pub max_angle_y: Option<f64>,
    #[serde(default)]
    pub coefficient: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub dot: Option<SpringConfig>,
    #[serde(default)]
    pub ring: Option<SpringConfig>,
    #[serde(default)]
    pub dot_size: Option<f64>,
    #[serde(default)]
    pub ring_size: Option<f64>,
    #[serde(default)]
    pub hover_classes: Option<Vec<String>>,
    #[serde(default)]
    pub axis_lock: AxisLock,
}

/// Strategy with its validated parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyConfig {
    Magnetic { strength: f64 },
    Tilt { max_angle_x: f64, max_angle_y: f64 },
    Parallax { coefficient: f64 },
    CursorFollow(CursorSettings),
    Progress,
    ScrollParallax { speed: f64 },
}

impl StrategyConfig {
    pub fn strategy(&self) -> Strategy {
        match self {
            StrategyConfig::Magnetic { .. } => Strategy::Magnetic,
            StrategyConfig::Tilt { .. } => Strategy::Tilt,
            StrategyConfig::Parallax { .. } => Strategy::Parallax,
            StrategyConfig::CursorFollow(_) => Strategy::CursorFollow,
            StrategyConfig::Progress => Strategy::Progress,
            StrategyConfig::ScrollParallax { .. } => Strategy::ScrollParallax,
        }
    }

    /// Whether the strategy listens on the bound element itself
    /// (pointer-move and pointer-leave) rather than the viewport.
    pub fn is_element_scoped(&self) -> bool {
        matches!(
            self,
            StrategyConfig::Magnetic { .. } | StrategyConfig::Tilt { .. }
        )
    }

    /// Viewport-scoped listeners this strategy consumes.
    pub fn shared_listeners(&self) -> &'static [ListenerKind] {
        match self {
            StrategyConfig::Magnetic { .. } | StrategyConfig::Tilt { .. } => &[],
            StrategyConfig::Parallax { .. } => &[ListenerKind::PointerMove],
            StrategyConfig::CursorFollow(_) => &[
                ListenerKind::PointerMove,
                ListenerKind::PointerOver,
                ListenerKind::PointerOut,
            ],
            StrategyConfig::Progress | StrategyConfig::ScrollParallax { .. } => {
                &[ListenerKind::Scroll]
            }
        }
    }
}

/// Validated behavior configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorConfig {
    pub strategy: StrategyConfig,
    pub axis_lock: AxisLock,
}

impl BehaviorConfig {
    pub fn magnetic(strength: f64) -> Result<Self, EngineError> {
        Self::try_from(RawBehaviorConfig {
            strategy: Strategy::Magnetic.as_str().to_string(),
            strength: Some(strength),
            ..Default::default()
        })
    }

    pub fn tilt(max_angle_x: f64, max_angle_y: f64) -> Result<Self, EngineError> {
        Self::try_from(RawBehaviorConfig {
            strategy: Strategy::Tilt.as_str().to_string(),
            max_angle_x: Some(max_angle_x),
            max_angle_y: Some(max_angle_y),
            ..Default::default()
        })
    }

    pub fn parallax(coefficient: f64) -> Result<Self, EngineError> {
        Self::try_from(RawBehaviorConfig {
            strategy: Strategy::Parallax.as_str().to_string(),
            coefficient: Some(coefficient),
            ..Default::default()
        })
    }

    pub fn cursor_follow() -> Self {
        BehaviorConfig {
            strategy: StrategyConfig::CursorFollow(CursorSettings::default()),
            axis_lock: AxisLock::default(),
        }
    }

    pub fn progress() -> Self {
        BehaviorConfig {
            strategy: StrategyConfig::Progress,
            axis_lock: AxisLock::default(),
        }
    }

    pub fn scroll_parallax(speed: f64) -> Result<Self, EngineError> {
        Self::try_from(RawBehaviorConfig {
            strategy: Strategy::ScrollParallax.as_str().to_string(),
            speed: Some(speed),
            ..Default::default()
        })
    }

    pub fn with_axis_lock(mut self, axis_lock: AxisLock) -> Self {
        self.axis_lock = axis_lock;
        self
    }

    /// Parse and validate a JSON behavior configuration.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let raw: RawBehaviorConfig = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        Self::try_from(raw)
    }
}

impl TryFrom<RawBehaviorConfig> for BehaviorConfig {
    type Error = EngineError;

    fn try_from(raw: RawBehaviorConfig) -> Result<Self, Self::Error> {
        let strategy = match raw.strategy.parse::<Strategy>()? {
            Strategy::Magnetic => {
                let strength = raw.strength.unwrap_or(mapper::DEFAULT_STRENGTH);
                check(
                    "strength",
                    strength,
                    strength > 0.0 && strength <= 1.0,
                    "a value in (0, 1]",
                )?;
                StrategyConfig::Magnetic { strength }
            }
            Strategy::Tilt => {
                let max_angle_x = raw.max_angle_x.unwrap_or(mapper::DEFAULT_MAX_ANGLE);
                let max_angle_y = raw.max_angle_y.unwrap_or(mapper::DEFAULT_MAX_ANGLE);
                check(
                    "max_angle_x",
                    max_angle_x,
                    (0.0..=MAX_TILT_ANGLE).contains(&max_angle_x),
                    "degrees in [0, 90]",
                )?;
                check(
                    "max_angle_y",
                    max_angle_y,
                    (0.0..=MAX_TILT_ANGLE).contains(&max_angle_y),
                    "degrees in [0, 90]",
                )?;
                StrategyConfig::Tilt {
                    max_angle_x,
                    max_angle_y,
                }
            }
            Strategy::Parallax => {
                let coefficient = raw.coefficient.unwrap_or(DEFAULT_COEFFICIENT);
                check(
                    "coefficient",
                    coefficient,
                    coefficient > 0.0 && coefficient <= 1.0,
                    "a value in (0, 1]",
                )?;
                StrategyConfig::Parallax { coefficient }
            }
            Strategy::CursorFollow => {
                let defaults = CursorSettings::default();
                let settings = CursorSettings {
                    dot: raw.dot.unwrap_or(defaults.dot),
                    ring: raw.ring.unwrap_or(defaults.ring),
                    dot_size: raw.dot_size.unwrap_or(defaults.dot_size),
                    ring_size: raw.ring_size.unwrap_or(defaults.ring_size),
                    hover_classes: raw.hover_classes.unwrap_or(defaults.hover_classes),
                };
                for (name, spring) in [("dot", settings.dot), ("ring", settings.ring)] {
                    check(
                        name,
                        spring.stiffness,
                        spring.stiffness > 0.0 && spring.stiffness <= MAX_STIFFNESS,
                        "a spring stiffness in (0, 100000]",
                    )?;
                    check(
                        name,
                        spring.damping,
                        (0.0..=MAX_DAMPING).contains(&spring.damping),
                        "a spring damping in [0, 10000]",
                    )?;
                }
                check(
                    "dot_size",
                    settings.dot_size,
                    settings.dot_size >= 0.0 && settings.dot_size.is_finite(),
                    "a non-negative size",
                )?;
                check(
                    "ring_size",
                    settings.ring_size,
                    settings.ring_size >= 0.0 && settings.ring_size.is_finite(),
                    "a non-negative size",
                )?;
                StrategyConfig::CursorFollow(settings)
            }
            Strategy::Progress => StrategyConfig::Progress,
            Strategy::ScrollParallax => {
                let speed = raw.speed.unwrap_or(mapper::DEFAULT_SCROLL_SPEED);
                check("speed", speed, speed.is_finite(), "a finite value")?;
                StrategyConfig::ScrollParallax { speed }
            }
        };

        Ok(BehaviorConfig {
            strategy,
            axis_lock: raw.axis_lock,
        })
    }
}

fn check(
    name: &'static str,
    value: f64,
    ok: bool,
    expected: &'static str,
) -> Result<(), EngineError> {
    // NaN fails every range comparison above, so `ok` is already false for it.
    if ok {
        Ok(())
    } else {
        Err(EngineError::CoefficientOutOfRange {
            name,
            value,
            expected,
        })
    }
}

/// One isolated behavior unit: a configured strategy and its current transform.
#[derive(Debug, Clone)]
pub struct Behavior {
    config: BehaviorConfig,
    current: TransformResult,
    cursor: Option<CursorFollower>,
}

impl Behavior {
    pub fn new(config: BehaviorConfig) -> Self {
        let cursor = match &config.strategy {
            StrategyConfig::CursorFollow(settings) => Some(CursorFollower::new(settings.clone())),
            _ => None,
        };
        let current = rest_value(&config.strategy);
        Behavior {
            config,
            current,
            cursor,
        }
    }

    pub fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    pub fn strategy(&self) -> Strategy {
        self.config.strategy.strategy()
    }

    /// The transform most recently handed to the rendering layer.
    pub fn current(&self) -> TransformResult {
        self.current
    }

    /// The value this behavior returns to when the pointer leaves or the binding ends.
    pub fn rest(&self) -> TransformResult {
        rest_value(&self.config.strategy)
    }

    /// Element-scoped pointer sample. Returns the new transform if it changed.
    pub fn on_pointer_move(
        &mut self,
        pointer: PointerSample,
        region: BoundingRegion,
    ) -> Option<TransformResult> {
        let lock = self.config.axis_lock;
        let next = match self.config.strategy {
            StrategyConfig::Magnetic { strength } => {
                mapper::magnetic_at(pointer, region, strength, lock)
            }
            StrategyConfig::Tilt {
                max_angle_x,
                max_angle_y,
            } => mapper::tilt_at(pointer, region, max_angle_x, max_angle_y, lock),
            _ => return None,
        };
        self.set(next)
    }

    /// Pointer left the element: element-scoped strategies return to rest.
    pub fn on_pointer_leave(&mut self) -> Option<TransformResult> {
        if !self.config.strategy.is_element_scoped() {
            return None;
        }
        let rest = self.rest();
        self.set(rest)
    }

    /// Viewport-scoped pointer sample.
    pub fn on_global_pointer(
        &mut self,
        pointer: PointerSample,
        viewport: ViewportSize,
    ) -> Option<TransformResult> {
        match self.config.strategy {
            StrategyConfig::Parallax { coefficient } => {
                let next = mapper::parallax(pointer, viewport, coefficient, self.config.axis_lock);
                self.set(next)
            }
            StrategyConfig::CursorFollow(_) => {
                if let Some(cursor) = self.cursor.as_mut() {
                    cursor.set_target(pointer);
                }
                // Motion is emitted from `on_frame`.
                None
            }
            _ => None,
        }
    }

    /// Hovered element changed (`None` when the pointer left an element).
    pub fn on_hover(&mut self, target: Option<&HoverTarget>) {
        if let Some(cursor) = self.cursor.as_mut() {
            let variant = target.map(|t| cursor.classify(t)).unwrap_or_default();
            cursor.set_variant(variant);
        }
    }

    /// Scroll position changed.
    pub fn on_scroll(&mut self, tracker: &ScrollTracker) -> Option<TransformResult> {
        let next = match self.config.strategy {
            StrategyConfig::Progress => TransformResult::scroll_fraction(tracker.fraction()),
            StrategyConfig::ScrollParallax { speed } => {
                mapper::scroll_parallax(tracker.offset(), speed)
            }
            _ => return None,
        };
        self.set(next)
    }

    /// Advance continuous motion by `dt` seconds.
    pub fn on_frame(&mut self, dt: f64) -> Option<TransformResult> {
        let cursor = self.cursor.as_mut()?;
        cursor.step(dt);
        let next = cursor.transform();
        self.set(next)
    }

    fn set(&mut self, next: TransformResult) -> Option<TransformResult> {
        if next == self.current {
            None
        } else {
            self.current = next;
            Some(next)
        }
    }
}

fn rest_value(strategy: &StrategyConfig) -> TransformResult {
    match strategy {
        StrategyConfig::Magnetic { .. }
        | StrategyConfig::Parallax { .. }
        | StrategyConfig::ScrollParallax { .. } => TransformResult::translate(0.0, 0.0),
        StrategyConfig::Tilt { .. } => TransformResult::rotate(0.0, 0.0),
        StrategyConfig::Progress => TransformResult::scroll_fraction(0.0),
        StrategyConfig::CursorFollow(_) => TransformResult::Cursor {
            dot_x: 0.0,
            dot_y: 0.0,
            ring_x: 0.0,
            ring_y: 0.0,
            scale: 1.0,
            visible: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_strategy_fails_fast() {
        let err = BehaviorConfig::from_json(r#"{"strategy":"wobble"}"#).unwrap_err();
        assert!(matches!(err, EngineError::UnknownStrategy(ref name) if name == "wobble"));
    }

    #[test]
    fn negative_strength_rejected() {
        let err = BehaviorConfig::magnetic(-0.3).unwrap_err();
        assert!(matches!(
            err,
            EngineError::CoefficientOutOfRange { name: "strength", .. }
        ));
        assert!(BehaviorConfig::magnetic(f64::NAN).is_err());
        assert!(BehaviorConfig::tilt(15.0, 120.0).is_err());
        assert!(BehaviorConfig::parallax(0.0).is_err());
    }

    #[test]
    fn defaults_fill_missing_parameters() {
        let config = BehaviorConfig::from_json(r#"{"strategy":"tilt"}"#).expect("valid tilt");
        assert_eq!(
            config.strategy,
            StrategyConfig::Tilt {
                max_angle_x: 15.0,
                max_angle_y: 15.0
            }
        );

        let config = BehaviorConfig::from_json(
            r#"{"strategy":"magnetic","axis_lock":{"y":true}}"#,
        )
        .expect("valid magnetic");
        assert_eq!(config.strategy, StrategyConfig::Magnetic { strength: 0.3 });
        assert_eq!(config.axis_lock, AxisLock { x: false, y: true });
    }

    #[test]
    fn spring_limits_are_enforced() {
        let ok = BehaviorConfig::from_json(
            r#"{"strategy":"cursor-follow","ring":{"stiffness":300,"damping":600}}"#,
        );
        assert!(ok.is_ok());

        for json in [
            r#"{"strategy":"cursor-follow","ring":{"stiffness":300,"damping":20000}}"#,
            r#"{"strategy":"cursor-follow","dot":{"stiffness":1e7,"damping":25}}"#,
            r#"{"strategy":"cursor-follow","dot":{"stiffness":0,"damping":25}}"#,
        ] {
            let err = BehaviorConfig::from_json(json).unwrap_err();
            assert!(matches!(err, EngineError::CoefficientOutOfRange { .. }), "{json}");
        }
    }

    #[test]
    fn malformed_json_is_invalid_config() {
        let err = BehaviorConfig::from_json(r#"{"strength":0.3}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn magnetic_moves_then_rests_on_leave() {
        let mut behavior = Behavior::new(BehaviorConfig::magnetic(0.3).expect("valid"));
        let region = BoundingRegion::new(0.0, 0.0, 200.0, 100.0);

        // Center is (100, 50); offset (100, -50).
        let moved = behavior
            .on_pointer_move(PointerSample::new(200.0, 0.0), region)
            .expect("transform changes");
        let TransformResult::Translate {
            translate_x,
            translate_y,
        } = moved
        else {
            panic!("magnetic should translate");
        };
        assert!((translate_x - 30.0).abs() < 1e-9);
        assert!((translate_y + 15.0).abs() < 1e-9);

        let rested = behavior.on_pointer_leave().expect("leave resets");
        assert_eq!(rested, TransformResult::translate(0.0, 0.0));
        assert_eq!(behavior.current(), behavior.rest());
        assert!(behavior.on_pointer_leave().is_none());
    }

    #[test]
    fn parallax_ignores_leave() {
        let mut behavior = Behavior::new(BehaviorConfig::parallax(0.05).expect("valid"));
        let moved = behavior.on_global_pointer(
            PointerSample::new(500.0, 250.0),
            ViewportSize::new(1000.0, 500.0),
        );
        assert!(moved.is_some());
        assert!(behavior.on_pointer_leave().is_none());
        assert_ne!(behavior.current(), behavior.rest());
    }

    #[test]
    fn progress_tracks_scroll() {
        let mut behavior = Behavior::new(BehaviorConfig::progress());
        let mut tracker = ScrollTracker::new();
        tracker.update(ScrollMetrics::new(600.0, 2000.0, 800.0));
        assert_eq!(
            behavior.on_scroll(&tracker),
            Some(TransformResult::scroll_fraction(0.5))
        );
        assert!(behavior.on_scroll(&tracker).is_none());
    }

    #[test]
    fn cursor_variant_follows_hover() {
        let mut behavior = Behavior::new(BehaviorConfig::cursor_follow());
        behavior.on_global_pointer(
            PointerSample::new(100.0, 100.0),
            ViewportSize::new(800.0, 600.0),
        );
        behavior.on_hover(Some(&HoverTarget {
            tag: "button".to_string(),
            role: None,
            classes: vec![],
        }));
        let frame = behavior.on_frame(1.0 / 60.0).expect("first frame shows the cursor");
        assert!(matches!(
            frame,
            TransformResult::Cursor {
                scale,
                visible: true,
                ..
            } if scale == 1.5
        ));

        behavior.on_hover(None);
        let frame = behavior.on_frame(1.0 / 60.0).expect("scale change is emitted");
        assert!(matches!(frame, TransformResult::Cursor { scale, .. } if scale == 1.0));
    }

    #[test]
    fn behaviors_are_isolated() {
        let config = BehaviorConfig::magnetic(0.5).expect("valid");
        let mut a = Behavior::new(config.clone());
        let b = Behavior::new(config);
        a.on_pointer_move(
            PointerSample::new(50.0, 50.0),
            BoundingRegion::new(0.0, 0.0, 10.0, 10.0),
        );
        assert_ne!(a.current(), b.current());
        assert_eq!(b.current(), b.rest());
    }
}
