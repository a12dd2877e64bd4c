//! Reference collision oracle treating every target as a sphere of radius
//! `scale.x / 2`, plus optional non-target sphere obstacles. Hosts with real
//! physics supply their own `CollisionOracle`; tests use this one.

use nalgebra::Point3;

use crate::math::Ray;
use crate::target::{EntityId, TargetSet};
use crate::traits::{CollisionOracle, RayHit};

/// Analytic sphere obstacle that is part of the scene but not a target.
#[derive(Debug, Clone, Copy)]
pub struct Obstacle {
    pub entity: EntityId,
    pub center: Point3<f32>,
    pub radius: f32,
}

#[derive(Debug, Clone, Default)]
pub struct SphereOracle {
    obstacles: Vec<Obstacle>,
}

impl SphereOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_obstacle(mut self, obstacle: Obstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }
}

impl CollisionOracle for SphereOracle {
    fn raycast(&self, targets: &TargetSet, ray: &Ray, max_distance: f32) -> Option<RayHit> {
        let mut nearest: Option<RayHit> = None;

        let mut consider = |entity: EntityId, center: Point3<f32>, radius: f32| {
            if let Some(t) = ray_sphere(ray, &center, radius) {
                if t <= max_distance && nearest.map_or(true, |h| t < h.distance) {
                    nearest = Some(RayHit {
                        entity,
                        point: ray.at(t),
                        distance: t,
                    });
                }
            }
        };

        for (_, target) in targets.iter() {
            consider(target.entity, target.position, target.radius());
        }
        for obstacle in &self.obstacles {
            consider(obstacle.entity, obstacle.center, obstacle.radius);
        }

        nearest
    }
}

/// Smallest non-negative ray parameter hitting the sphere, if any.
fn ray_sphere(ray: &Ray, center: &Point3<f32>, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(&ray.direction);
    let c = oc.norm_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let t = -b - sqrt_disc;
    if t >= 0.0 {
        return Some(t);
    }
    let t = -b + sqrt_disc;
    (t >= 0.0).then_some(t)
}
