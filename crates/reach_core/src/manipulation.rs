//! Manipulation engine: interchangeable transform techniques sharing an
//! activate/update/deactivate lifecycle, scheduled exclusively by the
//! [`coordinator::ModeCoordinator`].
//!
//! Techniques mutate the source target's transform directly each tick.
//! Deactivation must always restore any hijacked state (parent, observer
//! pose); that invariant is mandatory, not best-effort.

pub mod confirm;
pub mod coordinator;
pub mod grab;
pub mod joystick;

use crate::target::{Rig, TargetId, TargetSet};
use crate::math::Pose;
use crate::traits::InputSource;

/// Per-tick collaborator bundle for manipulation techniques.
pub struct ManipFrame<'a> {
    pub targets: &'a mut TargetSet,
    /// The target under manipulation, designated by the transform evaluator.
    pub source: TargetId,
    /// The user-root pose; techniques may reposition it while active but must
    /// restore it on stop.
    pub observer: &'a mut Pose,
    pub input: &'a dyn InputSource,
    /// Seconds since the previous tick.
    pub dt: f32,
}

/// A manipulation technique. `start`/`stop` bracket the Active lifecycle
/// state; `tick` runs once per frame while active.
pub trait TransformMode {
    /// Short user-facing description of the technique's controls.
    fn instructions(&self) -> &'static str;

    fn start(&mut self, rig: &Rig, frame: &mut ManipFrame<'_>);

    /// Deactivate, restoring any state the technique hijacked.
    fn stop(&mut self, rig: &Rig, frame: &mut ManipFrame<'_>);

    fn tick(&mut self, rig: &Rig, frame: &mut ManipFrame<'_>);
}
