//! Geometry utilities shared by the selection and manipulation subsystems.
//!
//! Conventions: right-handed basis with +Z forward, +Y up, +X right. All
//! angles are radians unless a config field says otherwise.

use anyhow::Result;
use nalgebra::{Point3, Unit, UnitQuaternion, Vector2, Vector3};

use crate::error::{ensure_positive, ConfigError};

/// A tracked rigid pose (position + orientation, no scale).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl Pose {
    pub fn new(position: Point3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self { position, rotation }
    }

    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Pose at `position` oriented so that `forward()` points at `target`.
    pub fn looking_at(position: Point3<f32>, target: Point3<f32>, up: Vector3<f32>) -> Self {
        let rotation = UnitQuaternion::face_towards(&(target - position), &up);
        Self { position, rotation }
    }

    pub fn forward(&self) -> Unit<Vector3<f32>> {
        Unit::new_unchecked(self.rotation * Vector3::z())
    }

    pub fn right(&self) -> Unit<Vector3<f32>> {
        Unit::new_unchecked(self.rotation * Vector3::x())
    }

    pub fn up(&self) -> Unit<Vector3<f32>> {
        Unit::new_unchecked(self.rotation * Vector3::y())
    }

    pub fn transform_point(&self, local: &Point3<f32>) -> Point3<f32> {
        self.position + self.rotation * local.coords
    }

    pub fn inverse_transform_point(&self, world: &Point3<f32>) -> Point3<f32> {
        Point3::from(self.rotation.inverse() * (world - self.position))
    }

    pub fn transform_direction(&self, local: &Vector3<f32>) -> Vector3<f32> {
        self.rotation * local
    }
}

/// Origin plus normalized direction, rebuilt fresh each tick from a tracked pose.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Unit<Vector3<f32>>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: Unit::new_normalize(direction),
        }
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction.into_inner() * t
    }
}

/// Closest point on the (unbounded) ray line to `p`, by vector projection.
pub fn closest_point_on_ray(ray: &Ray, p: &Point3<f32>) -> Point3<f32> {
    let t = (p - ray.origin).dot(&ray.direction);
    ray.at(t)
}

/// Squared distance from `p` to its closest point on the ray line.
pub fn ray_distance_sq(ray: &Ray, p: &Point3<f32>) -> f32 {
    (closest_point_on_ray(ray, p) - p).norm_squared()
}

pub fn ray_distance(ray: &Ray, p: &Point3<f32>) -> f32 {
    ray_distance_sq(ray, p).sqrt()
}

/// Shortest rotation taking direction `from` onto direction `to`.
///
/// Unlike `UnitQuaternion::rotation_between`, antiparallel inputs resolve to a
/// half-turn about an arbitrary perpendicular axis instead of `None`.
pub fn rotation_from_to(from: &Vector3<f32>, to: &Vector3<f32>) -> UnitQuaternion<f32> {
    match UnitQuaternion::rotation_between(from, to) {
        Some(q) => q,
        None => {
            let axis = perpendicular(from);
            UnitQuaternion::from_axis_angle(&Unit::new_normalize(axis), std::f32::consts::PI)
        }
    }
}

fn perpendicular(v: &Vector3<f32>) -> Vector3<f32> {
    let candidate = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    v.cross(&candidate)
}

/// One of the three coordinate axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Cycle order X -> Y -> Z -> X.
    pub fn next(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::Z,
            Axis::Z => Axis::X,
        }
    }

    pub fn unit(self) -> Unit<Vector3<f32>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }

    pub fn component(self, v: &Vector3<f32>) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    pub fn component_mut(self, v: &mut Vector3<f32>) -> &mut f32 {
        match self {
            Axis::X => &mut v.x,
            Axis::Y => &mut v.y,
            Axis::Z => &mut v.z,
        }
    }
}

/// Axis with the largest absolute component of `v`. Ties resolve with
/// precedence X > Y > Z.
pub fn dominant_axis(v: &Vector3<f32>) -> Axis {
    let (ax, ay, az) = (v.x.abs(), v.y.abs(), v.z.abs());
    if ax >= ay && ax >= az {
        Axis::X
    } else if ay >= az {
        Axis::Y
    } else {
        Axis::Z
    }
}

/// Pinhole camera used for viewport-space projection and ray reconstruction.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub pose: Pose,
    /// Vertical field of view, radians.
    pub fov_y: f32,
    /// Width over height.
    pub aspect: f32,
}

impl Camera {
    pub fn new(pose: Pose, fov_y: f32, aspect: f32) -> Result<Self> {
        if !(fov_y > 0.0 && fov_y < std::f32::consts::PI) {
            return Err(ConfigError::FovOutOfRange(fov_y).into());
        }
        ensure_positive("aspect", aspect)?;
        Ok(Self { pose, fov_y, aspect })
    }

    /// Projects a world point to viewport coordinates, where (0,0) is the
    /// bottom-left and (1,1) the top-right of the view frustum. Points behind
    /// the camera return `None`.
    pub fn world_to_viewport(&self, world: &Point3<f32>) -> Option<Vector2<f32>> {
        let local = self.pose.inverse_transform_point(world);
        if local.z <= f32::EPSILON {
            return None;
        }
        let tan_half = (self.fov_y * 0.5).tan();
        let ndc_x = local.x / local.z / (tan_half * self.aspect);
        let ndc_y = local.y / local.z / tan_half;
        Some(Vector2::new((ndc_x + 1.0) * 0.5, (ndc_y + 1.0) * 0.5))
    }

    /// Ray from the camera position through the given viewport point.
    pub fn viewport_point_to_ray(&self, u: f32, v: f32) -> Ray {
        let tan_half = (self.fov_y * 0.5).tan();
        let local = Vector3::new(
            (u * 2.0 - 1.0) * tan_half * self.aspect,
            (v * 2.0 - 1.0) * tan_half,
            1.0,
        );
        Ray::new(self.position(), self.pose.transform_direction(&local))
    }

    fn position(&self) -> Point3<f32> {
        self.pose.position
    }
}
