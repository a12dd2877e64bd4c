//! Axis-cycling joystick rotate/scale.
//!
//! The technique keeps an active axis; a discrete cycle input advances it
//! (wrapping X -> Y -> Z) and repositions the observer for a canonical view
//! down that axis. One stick rotates the source about the active axis in
//! its own local space; the other scales the two non-active axes, dominant
//! stick component picking which.

use anyhow::Result;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ensure_positive;
use crate::manipulation::{ManipFrame, TransformMode};
use crate::math::{Axis, Pose};
use crate::target::{Rig, Target};
use crate::traits::Action;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JoystickConfig {
    /// Observer distance from the source center along the viewing axis.
    pub view_offset: f32,
    /// Degrees per second at full stick deflection.
    pub rotation_speed: f32,
    /// Scale units per second at full stick deflection.
    pub scale_speed: f32,
    /// Strictly positive floor preventing scale inversion.
    pub min_scale: f32,
    /// Stick magnitude below which input is ignored, in linear stick units
    /// for both the rotate and scale sticks.
    pub deadzone: f32,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            view_offset: 2.0,
            rotation_speed: 50.0,
            scale_speed: 1.0,
            min_scale: 0.01,
            deadzone: 0.01,
        }
    }
}

/// Source-local (forward, up) directions giving a consistent observer
/// orientation when viewing down each axis.
fn view_directions(axis: Axis) -> (Vector3<f32>, Vector3<f32>) {
    match axis {
        Axis::X => (Vector3::x(), Vector3::y()),
        Axis::Y => (Vector3::y(), Vector3::z()),
        Axis::Z => (Vector3::z(), Vector3::y()),
    }
}

#[derive(Debug)]
pub struct JoystickRotateScale {
    config: JoystickConfig,
    active: bool,
    axis: Axis,
    saved_observer: Option<Pose>,
}

impl JoystickRotateScale {
    pub fn new(config: JoystickConfig) -> Result<Self> {
        ensure_positive("view_offset", config.view_offset)?;
        ensure_positive("rotation_speed", config.rotation_speed)?;
        ensure_positive("scale_speed", config.scale_speed)?;
        ensure_positive("min_scale", config.min_scale)?;
        Ok(Self {
            config,
            active: false,
            axis: Axis::X,
            saved_observer: None,
        })
    }

    pub fn active_axis(&self) -> Axis {
        self.axis
    }

    /// Moves the observer `view_offset` along the source's world-space
    /// active axis, looking back at the source.
    fn position_observer(&self, target: &Target, observer: &mut Pose) {
        let (local_forward, local_up) = view_directions(self.axis);
        let world_forward = target.transform_direction(&local_forward);
        let world_up = target.transform_direction(&local_up);

        observer.position = target.position + world_forward * self.config.view_offset;
        observer.rotation = UnitQuaternion::face_towards(&-world_forward, &world_up);
    }

    fn cycle_axis(&mut self, frame: &mut ManipFrame<'_>) {
        self.axis = self.axis.next();
        debug!(axis = ?self.axis, "active axis cycled");
        if let Some(target) = frame.targets.get(frame.source) {
            let target = target.clone();
            self.position_observer(&target, frame.observer);
        }
    }

    fn apply_rotation(&self, target: &mut Target, stick_x: f32, dt: f32) {
        let angle = stick_x * self.config.rotation_speed.to_radians() * dt;
        target.rotation = target.rotation * UnitQuaternion::from_axis_angle(&self.axis.unit(), angle);
    }

    /// Dominantly-horizontal stick scales the axis currently "horizontal"
    /// to the observer, vertical the "vertical" one.
    fn apply_scale(&self, target: &mut Target, stick: nalgebra::Vector2<f32>, dt: f32) {
        let horizontal = stick.x.abs() > stick.y.abs();
        let input = if horizontal { stick.x } else { stick.y };
        let delta = input * self.config.scale_speed * dt;

        let scaled = match (self.axis, horizontal) {
            (Axis::X, true) => Axis::Z,
            (Axis::X, false) => Axis::Y,
            (Axis::Y, true) => Axis::X,
            (Axis::Y, false) => Axis::Z,
            (Axis::Z, true) => Axis::X,
            (Axis::Z, false) => Axis::Y,
        };
        let component = scaled.component_mut(&mut target.scale);
        *component = (*component + delta).max(self.config.min_scale);
    }
}

impl TransformMode for JoystickRotateScale {
    fn instructions(&self) -> &'static str {
        "Precise Rotate/Scale:\nPress to cycle the viewing axis.\n\
         Left stick rotates about it; right stick scales the other two axes."
    }

    fn start(&mut self, _rig: &Rig, frame: &mut ManipFrame<'_>) {
        let Some(target) = frame.targets.get(frame.source) else {
            return;
        };
        let target = target.clone();
        self.saved_observer = Some(*frame.observer);
        self.active = true;
        self.position_observer(&target, frame.observer);
    }

    fn stop(&mut self, _rig: &Rig, frame: &mut ManipFrame<'_>) {
        if let Some(saved) = self.saved_observer.take() {
            *frame.observer = saved;
        }
        self.active = false;
    }

    fn tick(&mut self, _rig: &Rig, frame: &mut ManipFrame<'_>) {
        if !self.active {
            return;
        }
        if frame.input.pressed(Action::CycleAxis) {
            self.cycle_axis(frame);
        }

        let rotate = frame.input.stick(Action::RotateStick);
        let scale = frame.input.stick(Action::ScaleStick);
        let dt = frame.dt;
        let deadzone = self.config.deadzone;
        let Some(target) = frame.targets.get_mut(frame.source) else {
            return;
        };

        if rotate.x.abs() > deadzone {
            self.apply_rotation(target, rotate.x, dt);
        }
        if scale.norm_squared() > deadzone * deadzone {
            self.apply_scale(target, scale, dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manipulation::test_support::ScriptedInput;
    use crate::target::{EntityId, TargetId, TargetSet};
    use nalgebra::Point3;

    struct Fixture {
        targets: TargetSet,
        observer: Pose,
        input: ScriptedInput,
        dt: f32,
    }

    impl Fixture {
        fn new() -> Self {
            let mut targets = TargetSet::new();
            targets.push(Target::new(EntityId(0), Point3::origin()));
            Self {
                targets,
                observer: Pose::identity(),
                input: ScriptedInput::new(),
                dt: 1.0,
            }
        }

        fn frame(&mut self) -> ManipFrame<'_> {
            ManipFrame {
                targets: &mut self.targets,
                source: TargetId(0),
                observer: &mut self.observer,
                input: &self.input,
                dt: self.dt,
            }
        }

        fn target(&self) -> &Target {
            self.targets.get(TargetId(0)).unwrap()
        }
    }

    fn mode() -> JoystickRotateScale {
        JoystickRotateScale::new(JoystickConfig::default()).unwrap()
    }

    #[test]
    fn three_cycles_wrap_back_to_x() {
        let mut fx = Fixture::new();
        let mut mode = mode();
        let rig = Rig::identity();
        mode.start(&rig, &mut fx.frame());

        for _ in 0..3 {
            fx.input.clear();
            fx.input.press(Action::CycleAxis);
            mode.tick(&rig, &mut fx.frame());
        }
        assert_eq!(mode.active_axis(), Axis::X);
    }

    #[test]
    fn start_positions_observer_down_active_axis() {
        let mut fx = Fixture::new();
        let mut mode = mode();
        mode.start(&Rig::identity(), &mut fx.frame());

        // Axis X with an identity target: observer sits at +X, looking -X.
        assert!((fx.observer.position - Point3::new(2.0, 0.0, 0.0)).norm() < 1e-5);
        let fwd = fx.observer.forward().into_inner();
        assert!((fwd - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn rotation_is_about_the_active_local_axis() {
        let mut fx = Fixture::new();
        let mut mode = JoystickRotateScale::new(JoystickConfig {
            rotation_speed: 90.0,
            ..JoystickConfig::default()
        })
        .unwrap();
        let rig = Rig::identity();
        mode.start(&rig, &mut fx.frame());

        fx.input.set_stick(Action::RotateStick, 1.0, 0.0);
        mode.tick(&rig, &mut fx.frame()); // 90 deg/s * 1 s

        let expected =
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 90f32.to_radians());
        assert!(fx.target().rotation.angle_to(&expected) < 1e-4);
    }

    #[test]
    fn dominant_scale_component_picks_the_axis() {
        let mut fx = Fixture::new();
        let mut mode = mode();
        let rig = Rig::identity();
        mode.start(&rig, &mut fx.frame());

        // Active axis X: horizontal stick scales Z, vertical scales Y.
        fx.input.set_stick(Action::ScaleStick, 0.8, 0.2);
        mode.tick(&rig, &mut fx.frame());
        assert!((fx.target().scale.z - 1.8).abs() < 1e-5);
        assert!((fx.target().scale.y - 1.0).abs() < 1e-5);

        fx.input.clear();
        fx.input.set_stick(Action::ScaleStick, 0.1, -0.5);
        mode.tick(&rig, &mut fx.frame());
        assert!((fx.target().scale.y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn scale_deadzone_is_linear_in_stick_magnitude() {
        let mut fx = Fixture::new();
        let mut mode = JoystickRotateScale::new(JoystickConfig {
            deadzone: 0.2,
            ..JoystickConfig::default()
        })
        .unwrap();
        let rig = Rig::identity();
        mode.start(&rig, &mut fx.frame());

        // Magnitude 0.14: inside the deadzone, ignored.
        fx.input.set_stick(Action::ScaleStick, 0.1, 0.1);
        mode.tick(&rig, &mut fx.frame());
        assert!((fx.target().scale.y - 1.0).abs() < 1e-6);

        // Magnitude 0.21: outside the deadzone, applied, even though both
        // components individually sit below the threshold.
        fx.input.clear();
        fx.input.set_stick(Action::ScaleStick, 0.15, 0.15);
        mode.tick(&rig, &mut fx.frame());
        assert!((fx.target().scale.y - 1.15).abs() < 1e-5);
    }

    #[test]
    fn scale_clamps_at_strictly_positive_floor() {
        let mut fx = Fixture::new();
        fx.dt = 100.0;
        let mut mode = mode();
        let rig = Rig::identity();
        mode.start(&rig, &mut fx.frame());

        fx.input.set_stick(Action::ScaleStick, -1.0, 0.0);
        mode.tick(&rig, &mut fx.frame());
        assert_eq!(fx.target().scale.z, 0.01);
    }

    #[test]
    fn stop_restores_observer_pose() {
        let mut fx = Fixture::new();
        fx.observer.position = Point3::new(9.0, 9.0, 9.0);
        let before = fx.observer;

        let mut mode = mode();
        let rig = Rig::identity();
        mode.start(&rig, &mut fx.frame());
        assert!((fx.observer.position - before.position).norm() > 1.0);
        mode.stop(&rig, &mut fx.frame());
        assert_eq!(fx.observer, before);
    }

    #[test]
    fn config_validation_fails_fast() {
        let err = JoystickRotateScale::new(JoystickConfig {
            min_scale: 0.0,
            ..JoystickConfig::default()
        })
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::error::ConfigError>(),
            Some(crate::error::ConfigError::NonPositive {
                field: "min_scale",
                ..
            })
        ));
    }
}
