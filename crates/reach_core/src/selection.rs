//! Pointer-raycast selection state machine.
//!
//! Each tick the machine builds one ray from the configured origin, asks the
//! collision oracle for the nearest hit, and updates hit/selection state.
//! Variant behaviors (inflation, viewport remapping) plug in through the
//! hook contract in [`extension`] without touching the base algorithm.
//!
//! Hook order within a tick is fixed: `build_ray`, then `on_hit`, then
//! selection bookkeeping, then `on_hit_target`, then exactly one of
//! `on_hit_new_target` / `on_hit_different_target`; miss ticks fire `on_miss`
//! (total miss only) followed by `on_miss_target`.

pub mod extension;
pub mod inflate;
pub mod viewport;

use anyhow::Result;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_non_negative, ensure_positive};
use crate::math::{Pose, Ray};
use crate::target::{Color, Hand, Rig, TargetId, TargetSet};
use crate::traits::{CollisionOracle, HapticSink, SelectionEvaluator};

use extension::SelectionExtension;

/// Which tracked pose the selection ray is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RayOriginKind {
    LeftHand,
    RightHand,
    /// Host-supplied pose on the tick frame (e.g. the head).
    Custom,
}

impl RayOriginKind {
    /// The hand that receives haptic feedback, for controller origins.
    pub fn hand(self) -> Option<Hand> {
        match self {
            RayOriginKind::LeftHand => Some(Hand::Left),
            RayOriginKind::RightHand => Some(Hand::Right),
            RayOriginKind::Custom => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SelectConfig {
    pub origin: RayOriginKind,
    pub max_ray_distance: f32,
    pub highlight_color: Color,
    pub haptic_amplitude: f32,
    pub haptic_duration: f32,
    /// Record the ray segment endpoint for display.
    pub show_ray: bool,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            origin: RayOriginKind::RightHand,
            max_ray_distance: 100.0,
            highlight_color: Color::MAGENTA,
            haptic_amplitude: 0.17,
            haptic_duration: 0.023,
            show_ray: true,
        }
    }
}

/// Per-tick collaborator bundle passed to [`RaycastSelector::tick`].
pub struct SelectFrame<'a> {
    pub targets: &'a mut TargetSet,
    pub oracle: &'a dyn CollisionOracle,
    pub evaluator: &'a mut dyn SelectionEvaluator,
    pub haptics: &'a mut dyn HapticSink,
    /// Trial gate: when false the tick is a no-op and haptics stay silent.
    pub in_progress: bool,
    /// Origin pose for [`RayOriginKind::Custom`].
    pub custom_origin: Option<Pose>,
}

#[derive(Debug, Default)]
struct SelectState {
    selected: Option<TargetId>,
    saved_color: Option<Color>,
    last_hit: Option<TargetId>,
    ray_segment: Option<(Point3<f32>, Point3<f32>)>,
}

/// Mutable view handed to extension hooks: the tick frame plus the base
/// machine's selection operations. Extensions go through `select` /
/// `clear_selection` rather than mutating selection state themselves.
pub struct HookCtx<'a, 'f> {
    config: &'a SelectConfig,
    state: &'a mut SelectState,
    pub frame: &'a mut SelectFrame<'f>,
    pub rig: &'a Rig,
}

impl HookCtx<'_, '_> {
    pub fn targets(&self) -> &TargetSet {
        self.frame.targets
    }

    pub fn targets_mut(&mut self) -> &mut TargetSet {
        self.frame.targets
    }

    pub fn selected(&self) -> Option<TargetId> {
        self.state.selected
    }

    /// Full selection bookkeeping: save color, highlight, haptic policy,
    /// evaluator notification. Clears any prior selection first.
    pub fn select(&mut self, target: TargetId) {
        clear_selection(self.state, self.frame);
        select_target(self.config, self.state, self.frame, target);
    }

    pub fn clear_selection(&mut self) {
        clear_selection(self.state, self.frame);
    }
}

pub struct RaycastSelector {
    config: SelectConfig,
    state: SelectState,
    extensions: Vec<Box<dyn SelectionExtension>>,
}

impl std::fmt::Debug for RaycastSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaycastSelector")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("extensions", &self.extensions.len())
            .finish()
    }
}

impl RaycastSelector {
    pub fn new(config: SelectConfig) -> Result<Self> {
        ensure_positive("max_ray_distance", config.max_ray_distance)?;
        ensure_non_negative("haptic_amplitude", config.haptic_amplitude)?;
        ensure_non_negative("haptic_duration", config.haptic_duration)?;
        Ok(Self {
            config,
            state: SelectState::default(),
            extensions: Vec::new(),
        })
    }

    /// Appends an extension; extensions run in the order they were added.
    pub fn with_extension(mut self, extension: Box<dyn SelectionExtension>) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn selected(&self) -> Option<TargetId> {
        self.state.selected
    }

    pub fn last_hit(&self) -> Option<TargetId> {
        self.state.last_hit
    }

    /// Ray visualization segment from the last tick (origin to hit point, or
    /// to the max-distance point on a miss). `None` until the first tick or
    /// when `show_ray` is off.
    pub fn ray_segment(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        self.state.ray_segment
    }

    /// Advances the state machine by one frame: one raycast, one terminal
    /// hook pair.
    pub fn tick(&mut self, rig: &Rig, frame: &mut SelectFrame<'_>) {
        if !frame.in_progress {
            return;
        }
        let Self {
            config,
            state,
            extensions,
        } = self;

        let Some(origin) = resolve_origin(config.origin, rig, frame.custom_origin) else {
            return;
        };

        let mut ray = Ray::new(origin.position, origin.forward().into_inner());
        for ext in extensions.iter_mut() {
            ray = ext.build_ray(ray, &origin, rig);
        }

        match frame.oracle.raycast(frame.targets, &ray, config.max_ray_distance) {
            Some(hit) => {
                if config.show_ray {
                    state.ray_segment = Some((ray.origin, hit.point));
                }
                for ext in extensions.iter_mut() {
                    let mut ctx = HookCtx {
                        config: &*config,
                        state: &mut *state,
                        frame: &mut *frame,
                        rig,
                    };
                    ext.on_hit(&hit, &ray, &mut ctx);
                }

                match frame.targets.find_entity(hit.entity) {
                    Some(target) => {
                        let prev_hit = state.last_hit;
                        clear_selection(state, frame);
                        select_target(config, state, frame, target);

                        for ext in extensions.iter_mut() {
                            let mut ctx = HookCtx {
                                config: &*config,
                                state: &mut *state,
                                frame: &mut *frame,
                                rig,
                            };
                            ext.on_hit_target(&hit, &ray, target, &mut ctx);
                        }
                        match prev_hit {
                            Some(prev) if prev != target => {
                                for ext in extensions.iter_mut() {
                                    let mut ctx = HookCtx {
                                        config: &*config,
                                        state: &mut *state,
                                        frame: &mut *frame,
                                        rig,
                                    };
                                    ext.on_hit_different_target(&hit, &ray, target, &mut ctx);
                                }
                            }
                            _ => {
                                for ext in extensions.iter_mut() {
                                    let mut ctx = HookCtx {
                                        config: &*config,
                                        state: &mut *state,
                                        frame: &mut *frame,
                                        rig,
                                    };
                                    ext.on_hit_new_target(&hit, &ray, target, &mut ctx);
                                }
                            }
                        }
                    }
                    None => {
                        clear_selection(state, frame);
                        for ext in extensions.iter_mut() {
                            let mut ctx = HookCtx {
                                config: &*config,
                                state: &mut *state,
                                frame: &mut *frame,
                                rig,
                            };
                            ext.on_miss_target(&ray, &mut ctx);
                        }
                    }
                }
            }
            None => {
                if config.show_ray {
                    state.ray_segment = Some((ray.origin, ray.at(config.max_ray_distance)));
                }
                clear_selection(state, frame);
                // Cleared before the hooks run so a hook-driven soft
                // selection (inflation extensions) survives the tick.
                state.last_hit = None;

                for ext in extensions.iter_mut() {
                    let mut ctx = HookCtx {
                        config: &*config,
                        state: &mut *state,
                        frame: &mut *frame,
                        rig,
                    };
                    ext.on_miss(&ray, &mut ctx);
                }
                for ext in extensions.iter_mut() {
                    let mut ctx = HookCtx {
                        config: &*config,
                        state: &mut *state,
                        frame: &mut *frame,
                        rig,
                    };
                    ext.on_miss_target(&ray, &mut ctx);
                }
            }
        }
    }

    /// Edge-triggered confirm: finalizes the current selection, restoring
    /// its color and notifying the evaluator. No-op when nothing is selected.
    pub fn confirm(&mut self, frame: &mut SelectFrame<'_>) {
        if self.state.selected.is_none() {
            return;
        }
        clear_selection(&mut self.state, frame);
        debug!("selection confirmed");
        frame.evaluator.confirm_selection();
    }
}

fn resolve_origin(kind: RayOriginKind, rig: &Rig, custom: Option<Pose>) -> Option<Pose> {
    match kind {
        RayOriginKind::LeftHand => Some(rig.left),
        RayOriginKind::RightHand => Some(rig.right),
        RayOriginKind::Custom => custom,
    }
}

fn select_target(
    config: &SelectConfig,
    state: &mut SelectState,
    frame: &mut SelectFrame<'_>,
    target: TargetId,
) {
    // One pulse per newly-hit target, only for controller origins, never
    // while the trial gate is closed, and never on the first hit of a run.
    if let Some(hand) = config.origin.hand() {
        if frame.in_progress && state.last_hit.is_some() && state.last_hit != Some(target) {
            frame
                .haptics
                .send_pulse(hand, config.haptic_amplitude, config.haptic_duration);
        }
    }

    if let Some(t) = frame.targets.get_mut(target) {
        state.saved_color = Some(t.color);
        t.color = config.highlight_color;
    }
    frame.evaluator.set_selection(target);
    if state.last_hit != Some(target) {
        debug!(?target, "selection changed");
    }
    state.selected = Some(target);
    state.last_hit = Some(target);
}

fn clear_selection(state: &mut SelectState, frame: &mut SelectFrame<'_>) {
    if let Some(id) = state.selected.take() {
        if let (Some(t), Some(color)) = (frame.targets.get_mut(id), state.saved_color.take()) {
            t.color = color;
        }
    }
}
