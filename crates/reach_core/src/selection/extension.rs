//! Extension hook contract for the selection state machine.
//!
//! Six callback slots plus a ray-construction override, all defaulted to
//! no-ops. The base machine invokes them at fixed points in its per-tick
//! algorithm; extensions compose by registration order on the selector, so
//! variant behaviors stack without subclass chains.

use crate::math::{Pose, Ray};
use crate::selection::HookCtx;
use crate::target::{Rig, TargetId};
use crate::traits::RayHit;

#[allow(unused_variables)]
pub trait SelectionExtension {
    /// Overrides ray construction. Receives the ray built so far (the
    /// default, or the previous extension's output) and returns the ray the
    /// machine should cast.
    fn build_ray(&mut self, ray: Ray, origin: &Pose, rig: &Rig) -> Ray {
        ray
    }

    /// The ray hit something in the scene (target or not).
    fn on_hit(&mut self, hit: &RayHit, ray: &Ray, ctx: &mut HookCtx) {}

    /// The ray hit a member of the target set; selection bookkeeping has
    /// already run. Fires every tick while a target is hit.
    fn on_hit_target(&mut self, hit: &RayHit, ray: &Ray, target: TargetId, ctx: &mut HookCtx) {}

    /// The hit target follows a tick with no target hit (or the same one).
    fn on_hit_new_target(&mut self, hit: &RayHit, ray: &Ray, target: TargetId, ctx: &mut HookCtx) {}

    /// The hit target differs from the previous tick's hit target.
    fn on_hit_different_target(
        &mut self,
        hit: &RayHit,
        ray: &Ray,
        target: TargetId,
        ctx: &mut HookCtx,
    ) {
    }

    /// No target was hit this tick (the ray may still have hit scenery).
    fn on_miss_target(&mut self, ray: &Ray, ctx: &mut HookCtx) {}

    /// The ray hit nothing at all.
    fn on_miss(&mut self, ray: &Ray, ctx: &mut HookCtx) {}
}
