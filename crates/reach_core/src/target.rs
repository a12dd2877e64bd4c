//! Target data model: the selectable/manipulable entities and the tracked
//! rig the interaction techniques read from.
//!
//! The target set is owned conceptually by the host's evaluator; this crate
//! only reads membership and mutates pose, scale, color, and parent of
//! existing members.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::math::Pose;

/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const MAGENTA: Color = Color::rgb(1.0, 0.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// Scene-level identity assigned by the host; the collision oracle reports
/// hits in terms of entities, which may or may not be targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Index of a target within its `TargetSet`. Stable as long as the host does
/// not reorder the set mid-trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

/// What a target is currently rigidly attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parent {
    World,
    Hand(Hand),
}

/// A selectable entity with pose, non-uniform scale, and render color.
#[derive(Debug, Clone)]
pub struct Target {
    pub entity: EntityId,
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
    pub color: Color,
    pub parent: Parent,
}

impl Target {
    pub fn new(entity: EntityId, position: Point3<f32>) -> Self {
        Self {
            entity,
            position,
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            color: Color::WHITE,
            parent: Parent::World,
        }
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.rotation)
    }

    /// Bounding radius under the sphere interpretation used for grab and
    /// inflation decisions.
    pub fn radius(&self) -> f32 {
        self.scale.x * 0.5
    }

    /// World point expressed in the target's local frame, including the
    /// division by scale (matches a full inverse-transform of the TRS).
    pub fn inverse_transform_point(&self, world: &Point3<f32>) -> Point3<f32> {
        let unscaled = self.rotation.inverse() * (world - self.position);
        Point3::new(
            unscaled.x / self.scale.x,
            unscaled.y / self.scale.y,
            unscaled.z / self.scale.z,
        )
    }

    /// Local direction rotated into world space.
    pub fn transform_direction(&self, local: &Vector3<f32>) -> Vector3<f32> {
        self.rotation * local
    }
}

/// Ordered, index-stable collection of targets.
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    targets: Vec<Target>,
}

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, target: Target) -> TargetId {
        self.targets.push(target);
        TargetId(self.targets.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(id.0)
    }

    pub fn get_mut(&mut self, id: TargetId) -> Option<&mut Target> {
        self.targets.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TargetId, &Target)> {
        self.targets
            .iter()
            .enumerate()
            .map(|(i, t)| (TargetId(i), t))
    }

    /// Membership test for oracle hits.
    pub fn find_entity(&self, entity: EntityId) -> Option<TargetId> {
        self.targets
            .iter()
            .position(|t| t.entity == entity)
            .map(TargetId)
    }
}

/// Head and hand poses sampled once per tick by the host.
#[derive(Debug, Clone, Copy)]
pub struct Rig {
    pub head: Pose,
    pub left: Pose,
    pub right: Pose,
}

impl Rig {
    pub fn identity() -> Self {
        Self {
            head: Pose::identity(),
            left: Pose::identity(),
            right: Pose::identity(),
        }
    }

    pub fn hand(&self, hand: Hand) -> &Pose {
        match hand {
            Hand::Left => &self.left,
            Hand::Right => &self.right,
        }
    }
}
