//! Grip-press grab for rotation and scale.
//!
//! One hand inside grab range attaches the source rigidly to that hand.
//! When both hands grip opposite faces along the same local axis, the
//! technique switches to two-handed mode: hand separation stretches the
//! gripped axis and the inter-hand vector steers the target's rotation.

use anyhow::Result;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ensure_positive;
use crate::manipulation::{ManipFrame, TransformMode};
use crate::math::{dominant_axis, rotation_from_to, Axis};
use crate::target::{Hand, Parent, Rig};
use crate::traits::Action;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GrabConfig {
    /// Maximum distance from the target's surface at which a grip connects.
    pub grab_distance: f32,
    /// Hands closer than this cannot enter (or drive) two-handed scaling;
    /// guards the scale factor against a near-zero initial distance.
    pub min_hand_separation: f32,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            grab_distance: 0.8,
            min_hand_separation: 1e-3,
        }
    }
}

/// State recorded at two-handed entry, all relative to which the per-tick
/// update is computed.
#[derive(Debug, Clone)]
struct TwoHandGrab {
    initial_vector: Vector3<f32>,
    initial_distance: f32,
    initial_scale: Vector3<f32>,
    /// Target-local axis whose faces are gripped.
    scaling_axis: Axis,
    /// Rotation between the scaling axis and the initial inter-hand vector.
    initial_rotation_offset: UnitQuaternion<f32>,
}

/// Rigid single-hand attachment: the target's pose in the hand's frame.
#[derive(Debug, Clone)]
struct Attachment {
    hand: Hand,
    local_position: Point3<f32>,
    local_rotation: UnitQuaternion<f32>,
}

pub struct GrabRotateScale {
    config: GrabConfig,
    active: bool,
    left_grabbing: bool,
    right_grabbing: bool,
    two_hand: Option<TwoHandGrab>,
    attachment: Option<Attachment>,
    initial_parent: Parent,
}

impl GrabRotateScale {
    pub fn new(config: GrabConfig) -> Result<Self> {
        ensure_positive("grab_distance", config.grab_distance)?;
        ensure_positive("min_hand_separation", config.min_hand_separation)?;
        Ok(Self {
            config,
            active: false,
            left_grabbing: false,
            right_grabbing: false,
            two_hand: None,
            attachment: None,
            initial_parent: Parent::World,
        })
    }

    pub fn two_hand_active(&self) -> bool {
        self.two_hand.is_some()
    }

    pub fn is_grabbing(&self, hand: Hand) -> bool {
        match hand {
            Hand::Left => self.left_grabbing,
            Hand::Right => self.right_grabbing,
        }
    }

    fn set_grabbing(&mut self, hand: Hand, grabbing: bool) {
        match hand {
            Hand::Left => self.left_grabbing = grabbing,
            Hand::Right => self.right_grabbing = grabbing,
        }
    }

    fn try_grab(&mut self, hand: Hand, rig: &Rig, frame: &mut ManipFrame<'_>) {
        let Some(target) = frame.targets.get(frame.source) else {
            return;
        };
        let hand_pos = rig.hand(hand).position;
        let surface_distance = ((hand_pos - target.position).norm() - target.radius()).max(0.0);
        if surface_distance > self.config.grab_distance {
            return;
        }

        self.set_grabbing(hand, true);
        if self.left_grabbing != self.right_grabbing {
            self.attach(hand, rig, frame);
        } else {
            self.try_enter_two_hand(hand, rig, frame);
        }
    }

    fn attach(&mut self, hand: Hand, rig: &Rig, frame: &mut ManipFrame<'_>) {
        if let Some(t) = frame.targets.get_mut(frame.source) {
            let hand_pose = rig.hand(hand);
            self.attachment = Some(Attachment {
                hand,
                local_position: hand_pose.inverse_transform_point(&t.position),
                local_rotation: hand_pose.rotation.inverse() * t.rotation,
            });
            t.parent = Parent::Hand(hand);
            debug!(?hand, "single-hand grab");
        }
    }

    /// Second grip landed: enter two-handed mode only if the hands grip
    /// opposite faces of the same local axis. Otherwise the second grab is
    /// ignored.
    fn try_enter_two_hand(&mut self, second_hand: Hand, rig: &Rig, frame: &mut ManipFrame<'_>) {
        let Some(target) = frame.targets.get(frame.source) else {
            return;
        };
        let left_local = target.inverse_transform_point(&rig.left.position).coords;
        let right_local = target.inverse_transform_point(&rig.right.position).coords;
        let left_axis = dominant_axis(&left_local);
        let right_axis = dominant_axis(&right_local);
        let opposite_faces = left_axis == right_axis
            && left_axis.component(&left_local).signum()
                != right_axis.component(&right_local).signum();

        let hand_vector = rig.left.position - rig.right.position;
        let distance = hand_vector.norm();
        if !opposite_faces || distance < self.config.min_hand_separation {
            self.set_grabbing(second_hand, false);
            return;
        }

        let axis_world = target.transform_direction(&left_axis.unit());
        // TODO two-handed entry can invert the target on the gripped axis
        // when the left hand grips the axis-negative face; see the ignored
        // regression test before changing the sign handling here.
        let initial_rotation_offset =
            rotation_from_to(&axis_world, &(hand_vector / distance)) * target.rotation;
        let initial_scale = target.scale;

        self.attachment = None;
        if let Some(t) = frame.targets.get_mut(frame.source) {
            t.parent = self.initial_parent;
        }
        self.two_hand = Some(TwoHandGrab {
            initial_vector: hand_vector,
            initial_distance: distance,
            initial_scale,
            scaling_axis: left_axis,
            initial_rotation_offset,
        });
        debug!(axis = ?left_axis, "two-handed grab engaged");
    }

    fn release(&mut self, hand: Hand, frame: &mut ManipFrame<'_>) {
        self.set_grabbing(hand, false);

        if self.two_hand.take().is_some() {
            // Either hand leaving exits two-handed mode.
            if let Some(t) = frame.targets.get_mut(frame.source) {
                t.parent = self.initial_parent;
            }
            debug!("two-handed grab released");
        } else if !self.left_grabbing && !self.right_grabbing && self.attachment.take().is_some() {
            if let Some(t) = frame.targets.get_mut(frame.source) {
                t.parent = self.initial_parent;
            }
            debug!("single-hand grab released");
        }
    }

    fn update_two_hand(&mut self, rig: &Rig, frame: &mut ManipFrame<'_>) {
        let Some(th) = &self.two_hand else {
            return;
        };
        let current = rig.left.position - rig.right.position;
        let distance = current.norm();
        if distance < self.config.min_hand_separation {
            return;
        }

        if let Some(t) = frame.targets.get_mut(frame.source) {
            let factor = (distance / th.initial_distance).abs();
            let mut scale = th.initial_scale;
            *th.scaling_axis.component_mut(&mut scale) =
                th.scaling_axis.component(&th.initial_scale) * factor;
            t.scale = scale;

            // Steer the recorded axis direction onto the current inter-hand
            // vector by the shortest rotation.
            let delta = rotation_from_to(&th.initial_vector.normalize(), &(current / distance));
            t.rotation = delta * th.initial_rotation_offset;
        }
    }

    fn follow_attachment(&mut self, rig: &Rig, frame: &mut ManipFrame<'_>) {
        if let Some(att) = &self.attachment {
            if let Some(t) = frame.targets.get_mut(frame.source) {
                let hand_pose = rig.hand(att.hand);
                t.position = hand_pose.transform_point(&att.local_position);
                t.rotation = hand_pose.rotation * att.local_rotation;
            }
        }
    }

    /// Drops all grab state and restores the source's parent. Used by
    /// deactivation; also the correct response to an external confirm.
    fn reset(&mut self, frame: &mut ManipFrame<'_>) {
        self.left_grabbing = false;
        self.right_grabbing = false;
        let held = self.two_hand.take().is_some() | self.attachment.take().is_some();
        if held {
            if let Some(t) = frame.targets.get_mut(frame.source) {
                t.parent = self.initial_parent;
            }
        }
    }
}

impl TransformMode for GrabRotateScale {
    fn instructions(&self) -> &'static str {
        "Rough Rotate/Scale:\nGrip press on the target to grab it.\n\
         Grip opposite faces with both hands to stretch that axis."
    }

    fn start(&mut self, _rig: &Rig, frame: &mut ManipFrame<'_>) {
        self.initial_parent = frame
            .targets
            .get(frame.source)
            .map(|t| t.parent)
            .unwrap_or(Parent::World);
        self.active = true;
    }

    fn stop(&mut self, _rig: &Rig, frame: &mut ManipFrame<'_>) {
        self.reset(frame);
        self.active = false;
    }

    fn tick(&mut self, rig: &Rig, frame: &mut ManipFrame<'_>) {
        if !self.active {
            return;
        }
        if frame.input.pressed(Action::GrabLeft) {
            self.try_grab(Hand::Left, rig, frame);
        }
        if frame.input.pressed(Action::GrabRight) {
            self.try_grab(Hand::Right, rig, frame);
        }
        if frame.input.released(Action::GrabLeft) {
            self.release(Hand::Left, frame);
        }
        if frame.input.released(Action::GrabRight) {
            self.release(Hand::Right, frame);
        }

        if self.two_hand.is_some() {
            self.update_two_hand(rig, frame);
        } else {
            self.follow_attachment(rig, frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manipulation::test_support::ScriptedInput;
    use crate::math::Pose;
    use crate::target::{EntityId, Target, TargetId, TargetSet};

    struct Fixture {
        targets: TargetSet,
        observer: Pose,
        input: ScriptedInput,
        rig: Rig,
    }

    impl Fixture {
        /// Unit-diameter sphere target at the origin.
        fn new() -> Self {
            let mut targets = TargetSet::new();
            targets.push(Target::new(EntityId(0), Point3::origin()));
            Self {
                targets,
                observer: Pose::identity(),
                input: ScriptedInput::new(),
                rig: Rig::identity(),
            }
        }

        fn frame<'a>(
            targets: &'a mut TargetSet,
            observer: &'a mut Pose,
            input: &'a ScriptedInput,
        ) -> ManipFrame<'a> {
            ManipFrame {
                targets,
                source: TargetId(0),
                observer,
                input,
                dt: 1.0 / 72.0,
            }
        }

        fn tick(&mut self, mode: &mut GrabRotateScale) {
            let mut frame = Self::frame(&mut self.targets, &mut self.observer, &self.input);
            mode.tick(&self.rig, &mut frame);
        }

        fn start(&mut self, mode: &mut GrabRotateScale) {
            let mut frame = Self::frame(&mut self.targets, &mut self.observer, &self.input);
            mode.start(&self.rig, &mut frame);
        }

        fn stop(&mut self, mode: &mut GrabRotateScale) {
            let mut frame = Self::frame(&mut self.targets, &mut self.observer, &self.input);
            mode.stop(&self.rig, &mut frame);
        }

        fn target(&self) -> &Target {
            self.targets.get(TargetId(0)).unwrap()
        }

        fn place_hands(&mut self, left: Point3<f32>, right: Point3<f32>) {
            self.rig.left.position = left;
            self.rig.right.position = right;
        }
    }

    fn mode() -> GrabRotateScale {
        GrabRotateScale::new(GrabConfig::default()).unwrap()
    }

    #[test]
    fn single_grab_attaches_and_follows_hand() {
        let mut fx = Fixture::new();
        let mut mode = mode();
        fx.start(&mut mode);

        fx.place_hands(Point3::new(0.6, 0.0, 0.0), Point3::new(9.0, 9.0, 9.0));
        fx.input.press(Action::GrabLeft);
        fx.tick(&mut mode);
        assert!(mode.is_grabbing(Hand::Left));
        assert_eq!(fx.target().parent, Parent::Hand(Hand::Left));

        fx.input.clear();
        fx.rig.left.position = Point3::new(0.6, 1.0, 0.0);
        fx.tick(&mut mode);
        assert!((fx.target().position - Point3::new(0.0, 1.0, 0.0)).norm() < 1e-5);

        fx.input.release(Action::GrabLeft);
        fx.tick(&mut mode);
        assert_eq!(fx.target().parent, Parent::World);
        // World pose is preserved on release.
        assert!((fx.target().position - Point3::new(0.0, 1.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn grab_beyond_range_does_nothing() {
        let mut fx = Fixture::new();
        let mut mode = mode();
        fx.start(&mut mode);

        fx.place_hands(Point3::new(2.0, 0.0, 0.0), Point3::new(9.0, 9.0, 9.0));
        fx.input.press(Action::GrabLeft);
        fx.tick(&mut mode);

        assert!(!mode.is_grabbing(Hand::Left));
        assert_eq!(fx.target().parent, Parent::World);
    }

    #[test]
    fn differing_dominant_axes_never_enter_two_hand() {
        let mut fx = Fixture::new();
        let mut mode = mode();
        fx.start(&mut mode);

        fx.place_hands(Point3::new(0.6, 0.0, 0.0), Point3::new(0.0, 0.6, 0.0));
        fx.input.press(Action::GrabLeft);
        fx.tick(&mut mode);
        fx.input.clear();
        fx.input.press(Action::GrabRight);
        fx.tick(&mut mode);

        assert!(!mode.two_hand_active());
        assert!(!mode.is_grabbing(Hand::Right), "second grab is ignored");
        assert_eq!(fx.target().parent, Parent::Hand(Hand::Left));
    }

    #[test]
    fn opposite_faces_enter_two_hand_exactly_once_and_scale_the_axis() {
        let mut fx = Fixture::new();
        let mut mode = mode();
        fx.start(&mut mode);

        fx.place_hands(Point3::new(-0.6, 0.0, 0.0), Point3::new(0.6, 0.0, 0.0));
        fx.input.press(Action::GrabLeft);
        fx.tick(&mut mode);
        fx.input.clear();
        fx.input.press(Action::GrabRight);
        fx.tick(&mut mode);

        assert!(mode.two_hand_active());
        assert_eq!(fx.target().parent, Parent::World, "detached on entry");

        // Double the hand separation: the gripped axis doubles, others hold.
        fx.input.clear();
        fx.place_hands(Point3::new(-1.2, 0.0, 0.0), Point3::new(1.2, 0.0, 0.0));
        fx.tick(&mut mode);
        let scale = fx.target().scale;
        assert!((scale.x - 2.0).abs() < 1e-5);
        assert!((scale.y - 1.0).abs() < 1e-5);
        assert!((scale.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn rotation_tracks_the_inter_hand_vector() {
        let mut fx = Fixture::new();
        let mut mode = mode();
        fx.start(&mut mode);

        fx.place_hands(Point3::new(-0.6, 0.0, 0.0), Point3::new(0.6, 0.0, 0.0));
        fx.input.press(Action::GrabLeft);
        fx.input.press(Action::GrabRight);
        fx.tick(&mut mode);
        assert!(mode.two_hand_active());

        // Swing the hand pair from the x axis onto the y axis.
        fx.input.clear();
        fx.place_hands(Point3::new(0.0, -0.6, 0.0), Point3::new(0.0, 0.6, 0.0));
        fx.tick(&mut mode);

        // The gripped local axis must lie along the current hand vector.
        let axis_world = fx.target().transform_direction(&Vector3::x());
        let hand_dir = Vector3::new(0.0, -1.0, 0.0); // left minus right
        assert!((axis_world - hand_dir).norm() < 1e-4);
    }

    #[test]
    #[ignore = "known issue: entry with the left hand on the axis-negative face inverts the gripped axis"]
    fn two_hand_entry_preserves_axis_orientation() {
        let mut fx = Fixture::new();
        let mut mode = mode();
        fx.start(&mut mode);

        // Left hand grips the -X face, so the inter-hand vector points -X
        // and entry flips the target's +X axis onto it.
        fx.place_hands(Point3::new(-0.6, 0.0, 0.0), Point3::new(0.6, 0.0, 0.0));
        fx.input.press(Action::GrabLeft);
        fx.input.press(Action::GrabRight);
        fx.tick(&mut mode);

        let axis_world = fx.target().transform_direction(&Vector3::x());
        assert!(
            (axis_world - Vector3::x()).norm() < 1e-4,
            "gripped axis should keep its world orientation at entry, got {axis_world:?}"
        );
    }

    #[test]
    fn releasing_either_hand_exits_two_hand_mode() {
        let mut fx = Fixture::new();
        let mut mode = mode();
        fx.start(&mut mode);

        fx.place_hands(Point3::new(-0.6, 0.0, 0.0), Point3::new(0.6, 0.0, 0.0));
        fx.input.press(Action::GrabLeft);
        fx.input.press(Action::GrabRight);
        fx.tick(&mut mode);
        assert!(mode.two_hand_active());

        fx.input.clear();
        fx.input.release(Action::GrabRight);
        fx.tick(&mut mode);
        assert!(!mode.two_hand_active());
        assert_eq!(fx.target().parent, Parent::World);
    }

    #[test]
    fn coincident_hands_refuse_two_hand_entry() {
        let mut fx = Fixture::new();
        let mut mode = mode();
        fx.start(&mut mode);

        // Opposite signs on x, but separation below the guard threshold.
        let eps = 1e-5;
        fx.place_hands(Point3::new(-eps, 0.0, 0.0), Point3::new(eps, 0.0, 0.0));
        fx.input.press(Action::GrabLeft);
        fx.input.press(Action::GrabRight);
        fx.tick(&mut mode);

        assert!(!mode.two_hand_active());
    }

    #[test]
    fn stop_mid_gesture_restores_parent_and_flags() {
        let mut fx = Fixture::new();
        let mut mode = mode();
        fx.start(&mut mode);

        fx.place_hands(Point3::new(0.6, 0.0, 0.0), Point3::new(9.0, 9.0, 9.0));
        fx.input.press(Action::GrabLeft);
        fx.tick(&mut mode);
        assert_eq!(fx.target().parent, Parent::Hand(Hand::Left));

        fx.stop(&mut mode);
        assert_eq!(fx.target().parent, Parent::World);
        assert!(!mode.is_grabbing(Hand::Left));
        assert!(!mode.two_hand_active());
    }
}
