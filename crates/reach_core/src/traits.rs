//! Collaborator contracts consumed by the interaction core.
//!
//! The host supplies these: a collision oracle (nearest-hit raycasts), an
//! input source (edge-triggered actions and joystick reads), a haptic sink,
//! and the trial evaluators that own target-set semantics and scoring.

use nalgebra::{Point3, Vector2};

use crate::math::Ray;
use crate::target::{EntityId, Hand, TargetId, TargetSet};

/// Nearest intersection along a ray, as reported by the collision oracle.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub entity: EntityId,
    pub point: Point3<f32>,
    pub distance: f32,
}

/// Black-box ray-intersection oracle. Must return the single nearest hit
/// along the ray within `max_distance`, deterministically.
pub trait CollisionOracle {
    fn raycast(&self, targets: &TargetSet, ray: &Ray, max_distance: f32) -> Option<RayHit>;
}

/// Logical input bindings used by the interaction techniques.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Confirm,
    GrabLeft,
    GrabRight,
    CycleAxis,
    SwitchMode,
    RotateStick,
    ScaleStick,
}

/// Per-tick input reads. `pressed` and `released` are edge-triggered: true
/// only on the tick the transition happened.
pub trait InputSource {
    fn pressed(&self, action: Action) -> bool;
    fn released(&self, action: Action) -> bool;
    fn stick(&self, action: Action) -> Vector2<f32>;
}

/// Fire-and-forget haptic pulse dispatch.
pub trait HapticSink {
    fn send_pulse(&mut self, hand: Hand, amplitude: f32, duration: f32);
}

/// Selection-trial collaborator: notified of every selection change and of
/// confirmed selections.
pub trait SelectionEvaluator {
    fn set_selection(&mut self, target: TargetId);
    fn confirm_selection(&mut self);
}

/// Transformation-trial collaborator: designates the source target being
/// manipulated and receives confirm notifications.
pub trait TransformEvaluator {
    fn source(&self) -> Option<TargetId>;
    fn confirm_transform(&mut self);
}
