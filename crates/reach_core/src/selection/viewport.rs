//! Viewport remapping: a small on-screen rectangle stands in for the full
//! field of view, compressing required physical aim motion.
//!
//! Only ray construction is overridden. The origin's forward direction is
//! projected onto the camera basis captured at setup, converted to
//! clip-style coordinates (x/z, y/z), clamped to [0, 1], then interpolated
//! between the viewport rectangle's corners and cast back out through the
//! camera.

use std::cell::Cell;
use std::rc::Rc;

use anyhow::Result;
use nalgebra::{Point3, Vector2, Vector3};

use crate::error::ConfigError;
use crate::math::{Camera, Pose, Ray};
use crate::selection::extension::SelectionExtension;
use crate::selection::HookCtx;
use crate::target::Rig;
use crate::traits::RayHit;

/// Read handle for the 2D raycast cursor, shared with the host renderer.
/// `None` while hidden (no hit, or cursor display disabled).
#[derive(Debug, Clone, Default)]
pub struct CursorHandle(Rc<Cell<Option<Vector2<f32>>>>);

impl CursorHandle {
    pub fn get(&self) -> Option<Vector2<f32>> {
        self.0.get()
    }
}

pub struct ViewportRemap {
    camera: Camera,
    // Camera basis cached at setup, not re-read per tick.
    cam_right: Vector3<f32>,
    cam_up: Vector3<f32>,
    cam_forward: Vector3<f32>,
    /// Viewport-space corners of the remap rectangle.
    bottom_left: Vector2<f32>,
    top_right: Vector2<f32>,
    show_cursor: bool,
    cursor: CursorHandle,
}

impl ViewportRemap {
    /// `rect_bottom_left` / `rect_top_right` are the world-space corners of
    /// the on-screen rectangle; they are projected into viewport space once
    /// here.
    pub fn new(
        camera: Camera,
        rect_bottom_left: Point3<f32>,
        rect_top_right: Point3<f32>,
    ) -> Result<Self> {
        let Some(bottom_left) = camera.world_to_viewport(&rect_bottom_left) else {
            return Err(ConfigError::RectBehindCamera.into());
        };
        let Some(top_right) = camera.world_to_viewport(&rect_top_right) else {
            return Err(ConfigError::RectBehindCamera.into());
        };
        if top_right.x <= bottom_left.x || top_right.y <= bottom_left.y {
            return Err(ConfigError::DegenerateRect.into());
        }
        Ok(Self {
            cam_right: camera.pose.right().into_inner(),
            cam_up: camera.pose.up().into_inner(),
            cam_forward: camera.pose.forward().into_inner(),
            camera,
            bottom_left,
            top_right,
            show_cursor: false,
            cursor: CursorHandle::default(),
        })
    }

    pub fn with_cursor(mut self) -> Self {
        self.show_cursor = true;
        self
    }

    pub fn cursor_handle(&self) -> CursorHandle {
        self.cursor.clone()
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

impl SelectionExtension for ViewportRemap {
    fn build_ray(&mut self, ray: Ray, origin: &Pose, _rig: &Rig) -> Ray {
        let forward = origin.forward().into_inner();
        let x = forward.dot(&self.cam_right);
        let y = forward.dot(&self.cam_up);
        let z = forward.dot(&self.cam_forward);
        if z <= f32::EPSILON {
            // Pointing away from the camera plane; keep the incoming ray.
            return ray;
        }

        let u = ((x / z + 1.0) * 0.5).clamp(0.0, 1.0);
        let v = ((y / z + 1.0) * 0.5).clamp(0.0, 1.0);

        let viewport_x = lerp(self.bottom_left.x, self.top_right.x, u);
        let viewport_y = lerp(self.bottom_left.y, self.top_right.y, v);
        self.camera.viewport_point_to_ray(viewport_x, viewport_y)
    }

    fn on_hit(&mut self, hit: &RayHit, _ray: &Ray, _ctx: &mut HookCtx) {
        if self.show_cursor {
            self.cursor.0.set(self.camera.world_to_viewport(&hit.point));
        }
    }

    fn on_miss(&mut self, _ray: &Ray, _ctx: &mut HookCtx) {
        if self.show_cursor {
            self.cursor.0.set(None);
        }
    }
}
