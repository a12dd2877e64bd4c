//! Inflation extensions: grow the target the user is closest to hitting.
//!
//! Two policies: a constant multiplier, and a dynamic "just enough to graze"
//! factor recomputed every tick. Both soft-select the nearest target when the
//! ray misses everything, so a near-miss still counts as a selection.

use anyhow::Result;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ensure_positive;
use crate::math::{self, Ray};
use crate::selection::extension::SelectionExtension;
use crate::selection::HookCtx;
use crate::target::{TargetId, TargetSet};
use crate::traits::RayHit;

/// How the "nearest" target is chosen on a miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NearestPolicy {
    /// Minimum squared ray-to-center distance, ignoring radius.
    Center,
    /// Minimum ray-to-surface distance (accounts for per-target radii).
    Surface,
}

/// Target whose center passes closest to the ray line.
pub fn nearest_target_by_center(targets: &TargetSet, ray: &Ray) -> Option<TargetId> {
    targets
        .iter()
        .map(|(id, t)| (id, math::ray_distance_sq(ray, &t.position)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

/// Target whose surface passes closest to the ray line.
pub fn nearest_target_by_surface(targets: &TargetSet, ray: &Ray) -> Option<TargetId> {
    targets
        .iter()
        .map(|(id, t)| (id, math::ray_distance(ray, &t.position) - t.radius()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

/// Constant-factor inflation of the nearest unselected target.
pub struct ConstantInflate {
    factor: f32,
    policy: NearestPolicy,
    inflated: Option<(TargetId, Vector3<f32>)>,
}

impl ConstantInflate {
    pub fn new(factor: f32) -> Result<Self> {
        ensure_positive("factor", factor)?;
        Ok(Self {
            factor,
            policy: NearestPolicy::Center,
            inflated: None,
        })
    }

    pub fn with_policy(mut self, policy: NearestPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn inflated(&self) -> Option<TargetId> {
        self.inflated.map(|(id, _)| id)
    }

    /// Restores the inflated target's pre-inflation scale. No-op when
    /// nothing is inflated.
    pub fn reset(&mut self, targets: &mut TargetSet) {
        if let Some((id, scale)) = self.inflated.take() {
            if let Some(t) = targets.get_mut(id) {
                t.scale = scale;
            }
        }
    }

    fn inflate(&mut self, targets: &mut TargetSet, target: TargetId) {
        self.reset(targets);
        if let Some(t) = targets.get_mut(target) {
            let original = t.scale;
            t.scale = original * self.factor;
            self.inflated = Some((target, original));
            trace!(?target, "inflated at constant factor");
        }
    }

    fn nearest(&self, targets: &TargetSet, ray: &Ray) -> Option<TargetId> {
        match self.policy {
            NearestPolicy::Center => nearest_target_by_center(targets, ray),
            NearestPolicy::Surface => nearest_target_by_surface(targets, ray),
        }
    }
}

impl SelectionExtension for ConstantInflate {
    fn on_hit_target(&mut self, _hit: &RayHit, _ray: &Ray, target: TargetId, ctx: &mut HookCtx) {
        if self.inflated() != Some(target) {
            self.inflate(ctx.targets_mut(), target);
        }
    }

    fn on_miss_target(&mut self, ray: &Ray, ctx: &mut HookCtx) {
        let Some(nearest) = self.nearest(ctx.targets(), ray) else {
            return;
        };
        if self.inflated() != Some(nearest) {
            self.inflate(ctx.targets_mut(), nearest);
        }
        // Soft selection: the nearest target counts as selected even though
        // the ray did not literally intersect it.
        ctx.select(nearest);
    }

    fn on_hit_different_target(
        &mut self,
        _hit: &RayHit,
        _ray: &Ray,
        _target: TargetId,
        ctx: &mut HookCtx,
    ) {
        // The new hit is already at natural size; just restore the old one.
        self.reset(ctx.targets_mut());
    }
}

/// Closest-approach proportional inflation: the target grows exactly enough
/// for the ray to graze it, capped at a maximum diameter, and shrinks back as
/// the ray re-approaches. Recomputed every tick, on hits and misses alike.
pub struct DynamicInflate {
    max_diameter: f32,
    inflated: Option<(TargetId, Vector3<f32>)>,
}

impl DynamicInflate {
    pub fn new(max_diameter: f32) -> Result<Self> {
        ensure_positive("max_diameter", max_diameter)?;
        Ok(Self {
            max_diameter,
            inflated: None,
        })
    }

    pub fn inflated(&self) -> Option<TargetId> {
        self.inflated.map(|(id, _)| id)
    }

    pub fn reset(&mut self, targets: &mut TargetSet) {
        if let Some((id, scale)) = self.inflated.take() {
            if let Some(t) = targets.get_mut(id) {
                t.scale = scale;
            }
        }
    }

    fn apply(&mut self, targets: &mut TargetSet, ray: &Ray, target: TargetId) {
        if let Some((prev, _)) = self.inflated {
            if prev != target {
                self.reset(targets);
            }
        }
        let original = match self.inflated {
            Some((id, scale)) if id == target => scale,
            _ => match targets.get(target) {
                Some(t) => t.scale,
                None => return,
            },
        };
        let radius = original.x * 0.5;
        if !(radius > 0.0) {
            return;
        }
        if let Some(t) = targets.get_mut(target) {
            let dist = math::ray_distance(ray, &t.position);
            let factor = inflate_factor(dist, radius, self.max_diameter / original.x);
            t.scale = original * factor;
            self.inflated = Some((target, original));
        }
    }
}

/// Factor that makes a sphere of the given radius just graze a ray passing
/// at `dist`, clamped to `cap`. Already-hit targets stay at natural size.
fn inflate_factor(dist: f32, radius: f32, cap: f32) -> f32 {
    if dist <= radius {
        1.0
    } else {
        (dist / radius).min(cap)
    }
}

impl SelectionExtension for DynamicInflate {
    fn on_hit_target(&mut self, _hit: &RayHit, ray: &Ray, target: TargetId, ctx: &mut HookCtx) {
        // Every tick: the ray drifts within the inflated silhouette, so the
        // factor is continuously recomputed against the original radius.
        self.apply(ctx.targets_mut(), ray, target);
    }

    fn on_miss_target(&mut self, ray: &Ray, ctx: &mut HookCtx) {
        let Some(nearest) = nearest_target_by_center(ctx.targets(), ray) else {
            return;
        };
        self.apply(ctx.targets_mut(), ray, nearest);
        ctx.select(nearest);
    }
}
