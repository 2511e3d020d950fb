// Cursor replacement tracking: a tight dot and a looser trailing ring, each
// following the pointer on its own spring, plus hover-driven cursor variants.

use serde::{Deserialize, Serialize};

use crate::types::*;

/// Integration step ceiling. Keeps stiff springs stable at low frame rates.
const MAX_SUBSTEP_SECS: f64 = 1.0 / 120.0;
/// Upper bound on integration steps per `step` call.
const MAX_SUBSTEPS: f64 = 10_000.0;
/// Largest accepted spring stiffness.
pub const MAX_STIFFNESS: f64 = 100_000.0;
/// Largest accepted spring damping.
pub const MAX_DAMPING: f64 = 10_000.0;
/// Distance and speed under which a spring snaps to its target.
const REST_EPSILON: f64 = 0.01;

/// Spring parameters (unit mass).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping: f64,
}

impl SpringConfig {
    /// Largest step for which semi-implicit Euler stays stable: both `c·h` and
    /// `k·h²` at most 1.
    fn max_substep(&self) -> f64 {
        let mut h = MAX_SUBSTEP_SECS;
        if self.damping > 0.0 {
            h = h.min(1.0 / self.damping);
        }
        if self.stiffness > 0.0 {
            h = h.min(1.0 / self.stiffness.sqrt());
        }
        h
    }

    /// Tight follower for the cursor dot.
    pub fn dot() -> Self {
        SpringConfig {
            stiffness: 700.0,
            damping: 25.0,
        }
    }

    /// Looser follower for the trailing ring.
    pub fn ring() -> Self {
        SpringConfig {
            stiffness: 300.0,
            damping: 30.0,
        }
    }
}

/// One-dimensional damped spring.
#[derive(Debug, Clone, Copy)]
struct Spring {
    config: SpringConfig,
    position: f64,
    velocity: f64,
}

impl Spring {
    fn new(config: SpringConfig) -> Self {
        Spring {
            config,
            position: 0.0,
            velocity: 0.0,
        }
    }

    fn snap(&mut self, target: f64) {
        self.position = target;
        self.velocity = 0.0;
    }

    fn is_settled(&self, target: f64) -> bool {
        self.position == target && self.velocity == 0.0
    }

    /// Advance by `dt` seconds toward `target` (semi-implicit Euler, sub-stepped).
    fn step(&mut self, target: f64, dt: f64) {
        if dt <= 0.0 || self.is_settled(target) {
            return;
        }

        let max_h = self.config.max_substep();
        // Very long gaps advance at most MAX_SUBSTEPS stable steps.
        let dt = dt.min(max_h * MAX_SUBSTEPS);
        let steps = (dt / max_h).ceil().clamp(1.0, MAX_SUBSTEPS);
        let h = dt / steps;
        for _ in 0..steps as u32 {
            let accel = -self.config.stiffness * (self.position - target)
                - self.config.damping * self.velocity;
            self.velocity += accel * h;
            self.position += self.velocity * h;
        }

        if (self.position - target).abs() < REST_EPSILON && self.velocity.abs() < REST_EPSILON {
            self.snap(target);
        }
    }
}

/// Two-axis spring pair.
#[derive(Debug, Clone, Copy)]
struct Follower {
    x: Spring,
    y: Spring,
}

impl Follower {
    fn new(config: SpringConfig) -> Self {
        Follower {
            x: Spring::new(config),
            y: Spring::new(config),
        }
    }

    fn snap(&mut self, target: PointerSample) {
        self.x.snap(target.x);
        self.y.snap(target.y);
    }

    fn step(&mut self, target: PointerSample, dt: f64) {
        self.x.step(target.x, dt);
        self.y.step(target.y, dt);
    }

    fn position(&self) -> PointerSample {
        PointerSample::new(self.x.position, self.y.position)
    }
}

/// Cursor appearance selected by the element under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CursorVariant {
    #[default]
    Default,
    /// Links and buttons.
    Pointer,
    /// Text inputs.
    Text,
    /// Highlighted content cards.
    Hover,
}

impl CursorVariant {
    pub fn scale(&self) -> f64 {
        match self {
            CursorVariant::Default => 1.0,
            CursorVariant::Pointer => 1.5,
            CursorVariant::Text => 0.8,
            CursorVariant::Hover => 2.0,
        }
    }

    /// Pick the variant for the hovered element.
    pub fn classify(target: &HoverTarget, hover_classes: &[String]) -> Self {
        let tag = target.tag.to_ascii_lowercase();
        let has_class = |name: &str| target.classes.iter().any(|c| c == name);

        if tag == "a"
            || tag == "button"
            || has_class("clickable")
            || target.role.as_deref() == Some("button")
        {
            CursorVariant::Pointer
        } else if tag == "input" || tag == "textarea" {
            CursorVariant::Text
        } else if hover_classes.iter().any(|c| has_class(c)) {
            CursorVariant::Hover
        } else {
            CursorVariant::Default
        }
    }
}

/// Classes that switch the cursor to the hover variant when none are configured.
pub fn default_hover_classes() -> Vec<String> {
    vec![
        "project-card".to_string(),
        "skill-bar".to_string(),
        "cert-category".to_string(),
    ]
}

/// Cursor follower settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorSettings {
    #[serde(default = "SpringConfig::dot")]
    pub dot: SpringConfig,
    #[serde(default = "SpringConfig::ring")]
    pub ring: SpringConfig,
    /// Dot diameter (px).
    #[serde(default = "default_dot_size")]
    pub dot_size: f64,
    /// Ring diameter (px).
    #[serde(default = "default_ring_size")]
    pub ring_size: f64,
    #[serde(default = "default_hover_classes")]
    pub hover_classes: Vec<String>,
}

fn default_dot_size() -> f64 {
    32.0
}

fn default_ring_size() -> f64 {
    60.0
}

impl Default for CursorSettings {
    fn default() -> Self {
        CursorSettings {
            dot: SpringConfig::dot(),
            ring: SpringConfig::ring(),
            dot_size: default_dot_size(),
            ring_size: default_ring_size(),
            hover_classes: default_hover_classes(),
        }
    }
}

/// Tracks the decorative cursor: hidden until the first pointer sample, then
/// springs toward every new sample.
#[derive(Debug, Clone)]
pub struct CursorFollower {
    settings: CursorSettings,
    dot: Follower,
    ring: Follower,
    target: Option<PointerSample>,
    variant: CursorVariant,
}

impl CursorFollower {
    pub fn new(settings: CursorSettings) -> Self {
        CursorFollower {
            dot: Follower::new(settings.dot),
            ring: Follower::new(settings.ring),
            settings,
            target: None,
            variant: CursorVariant::Default,
        }
    }

    /// Point both followers at a new pointer sample.
    /// The first sample snaps them in place instead of flying in from the origin.
    pub fn set_target(&mut self, pointer: PointerSample) {
        if self.target.is_none() {
            self.dot.snap(pointer);
            self.ring.snap(pointer);
        }
        self.target = Some(pointer);
    }

    /// Advance both springs by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        if let Some(target) = self.target {
            self.dot.step(target, dt);
            self.ring.step(target, dt);
        }
    }

    pub fn set_variant(&mut self, variant: CursorVariant) {
        self.variant = variant;
    }

    /// Variant for a hovered element, using the configured hover classes.
    pub fn classify(&self, target: &HoverTarget) -> CursorVariant {
        CursorVariant::classify(target, &self.settings.hover_classes)
    }

    pub fn variant(&self) -> CursorVariant {
        self.variant
    }

    pub fn is_visible(&self) -> bool {
        self.target.is_some()
    }

    /// Current cursor transform (top-left positions).
    pub fn transform(&self) -> TransformResult {
        let dot = self.dot.position();
        let ring = self.ring.position();
        let dot_half = self.settings.dot_size / 2.0;
        let ring_half = self.settings.ring_size / 2.0;

        TransformResult::Cursor {
            dot_x: dot.x - dot_half,
            dot_y: dot.y - dot_half,
            ring_x: ring.x - ring_half,
            ring_y: ring.y - ring_half,
            scale: self.variant.scale(),
            visible: self.is_visible(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot_and_ring(result: TransformResult) -> (PointerSample, PointerSample) {
        let TransformResult::Cursor {
            dot_x,
            dot_y,
            ring_x,
            ring_y,
            ..
        } = result
        else {
            panic!("cursor follower should emit a cursor transform, got {result:?}");
        };
        (
            PointerSample::new(dot_x + 16.0, dot_y + 16.0),
            PointerSample::new(ring_x + 30.0, ring_y + 30.0),
        )
    }

    #[test]
    fn hidden_until_first_sample() {
        let mut cursor = CursorFollower::new(CursorSettings::default());
        assert!(!cursor.is_visible());
        assert!(matches!(
            cursor.transform(),
            TransformResult::Cursor { visible: false, .. }
        ));

        cursor.set_target(PointerSample::new(200.0, 100.0));
        let (dot, ring) = dot_and_ring(cursor.transform());
        assert_eq!(dot, PointerSample::new(200.0, 100.0));
        assert_eq!(ring, PointerSample::new(200.0, 100.0));
        assert!(cursor.is_visible());
    }

    #[test]
    fn ring_trails_dot() {
        let mut cursor = CursorFollower::new(CursorSettings::default());
        cursor.set_target(PointerSample::new(0.0, 0.0));
        cursor.set_target(PointerSample::new(300.0, 0.0));
        cursor.step(1.0 / 60.0);

        let (dot, ring) = dot_and_ring(cursor.transform());
        assert!(dot.x > 0.0, "dot should start moving");
        assert!(ring.x < dot.x, "ring should lag behind the dot");
    }

    #[test]
    fn springs_converge_and_settle() {
        let mut cursor = CursorFollower::new(CursorSettings::default());
        cursor.set_target(PointerSample::new(0.0, 0.0));
        cursor.set_target(PointerSample::new(250.0, -120.0));
        for _ in 0..180 {
            cursor.step(1.0 / 60.0);
        }

        let (dot, ring) = dot_and_ring(cursor.transform());
        assert_eq!(dot, PointerSample::new(250.0, -120.0));
        assert_eq!(ring, PointerSample::new(250.0, -120.0));
    }

    #[test]
    fn large_frame_gap_stays_stable() {
        let mut cursor = CursorFollower::new(CursorSettings::default());
        cursor.set_target(PointerSample::new(0.0, 0.0));
        cursor.set_target(PointerSample::new(100.0, 100.0));
        cursor.step(0.5);

        let (dot, _) = dot_and_ring(cursor.transform());
        assert!(dot.x.is_finite());
        assert!(dot.x > 50.0 && dot.x < 150.0);
    }

    #[test]
    fn heavily_damped_ring_stays_bounded() {
        let settings = CursorSettings {
            ring: SpringConfig {
                stiffness: 300.0,
                damping: 600.0,
            },
            ..CursorSettings::default()
        };
        let mut cursor = CursorFollower::new(settings);
        cursor.set_target(PointerSample::new(0.0, 0.0));
        cursor.set_target(PointerSample::new(300.0, 0.0));

        let mut last = 0.0;
        for _ in 0..60 {
            cursor.step(1.0 / 60.0);
            let (_, ring) = dot_and_ring(cursor.transform());
            assert!(ring.x.is_finite());
            assert!(ring.x >= last && ring.x <= 300.0, "ring overshot: {}", ring.x);
            last = ring.x;
        }
        assert!(last > 0.0);
    }

    #[test]
    fn extreme_springs_converge() {
        let settings = CursorSettings {
            dot: SpringConfig {
                stiffness: MAX_STIFFNESS,
                damping: MAX_DAMPING,
            },
            ring: SpringConfig {
                stiffness: MAX_STIFFNESS,
                damping: 0.5,
            },
            ..CursorSettings::default()
        };
        let mut cursor = CursorFollower::new(settings);
        cursor.set_target(PointerSample::new(0.0, 0.0));
        cursor.set_target(PointerSample::new(-80.0, 40.0));
        cursor.step(1e9);

        let (dot, ring) = dot_and_ring(cursor.transform());
        assert!(dot.x.is_finite() && dot.y.is_finite());
        assert!(ring.x.is_finite() && ring.y.is_finite());
        assert!(ring.x.abs() <= 160.0);
    }

    #[test]
    fn variant_classification() {
        let classes = default_hover_classes();
        let target = |tag: &str, role: Option<&str>, class: &[&str]| HoverTarget {
            tag: tag.to_string(),
            role: role.map(str::to_string),
            classes: class.iter().map(|c| c.to_string()).collect(),
        };

        assert_eq!(
            CursorVariant::classify(&target("A", None, &[]), &classes),
            CursorVariant::Pointer
        );
        assert_eq!(
            CursorVariant::classify(&target("div", Some("button"), &[]), &classes),
            CursorVariant::Pointer
        );
        assert_eq!(
            CursorVariant::classify(&target("textarea", None, &[]), &classes),
            CursorVariant::Text
        );
        assert_eq!(
            CursorVariant::classify(&target("div", None, &["project-card"]), &classes),
            CursorVariant::Hover
        );
        assert_eq!(
            CursorVariant::classify(&target("section", None, &["hero"]), &classes),
            CursorVariant::Default
        );
        assert_eq!(CursorVariant::Hover.scale(), 2.0);

        let mut cursor = CursorFollower::new(CursorSettings::default());
        let card = target("article", None, &["cert-category"]);
        cursor.set_variant(cursor.classify(&card));
        assert_eq!(cursor.variant(), CursorVariant::Hover);
    }
}
