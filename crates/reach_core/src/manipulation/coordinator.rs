//! Exclusive scheduling of manipulation techniques.
//!
//! Holds an ordered list of [`TransformMode`]s. Trial start activates index
//! 0; the switch-mode edge cycles to the next technique (wrapping); confirm
//! deactivates the current one. `stop` always runs before the next `start`,
//! and at most one technique is active at any time.

use anyhow::Result;
use tracing::debug;

use crate::error::ConfigError;
use crate::manipulation::{ManipFrame, TransformMode};
use crate::target::Rig;
use crate::traits::Action;

pub struct ModeCoordinator {
    modes: Vec<Box<dyn TransformMode>>,
    active: Option<usize>,
    /// Index of the most recently activated mode; cycling continues from
    /// here even after a confirm deactivation.
    cursor: Option<usize>,
}

impl ModeCoordinator {
    pub fn new(modes: Vec<Box<dyn TransformMode>>) -> Result<Self> {
        if modes.is_empty() {
            return Err(ConfigError::NoModes.into());
        }
        Ok(Self {
            modes,
            active: None,
            cursor: None,
        })
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn mode_count(&self) -> usize {
        self.modes.len()
    }

    /// Instructions for the active technique, if any.
    pub fn instructions(&self) -> Option<&'static str> {
        self.active.map(|i| self.modes[i].instructions())
    }

    /// Trial-lifecycle entry point: activates the first technique.
    pub fn on_trial_started(&mut self, rig: &Rig, frame: &mut ManipFrame<'_>) {
        self.activate(0, rig, frame);
    }

    /// Stops the active technique, if any. Safe to call repeatedly.
    pub fn deactivate(&mut self, rig: &Rig, frame: &mut ManipFrame<'_>) {
        if let Some(index) = self.active.take() {
            debug!(index, "transform mode stopped");
            self.modes[index].stop(rig, frame);
        }
    }

    /// Per-frame update: handles switch-mode and confirm edges, then ticks
    /// the active technique.
    pub fn tick(&mut self, rig: &Rig, frame: &mut ManipFrame<'_>) {
        if frame.input.pressed(Action::SwitchMode) {
            let next = self.cursor.map_or(0, |c| (c + 1) % self.modes.len());
            self.activate(next, rig, frame);
        }
        if frame.input.pressed(Action::Confirm) {
            self.deactivate(rig, frame);
        }
        if let Some(index) = self.active {
            self.modes[index].tick(rig, frame);
        }
    }

    fn activate(&mut self, index: usize, rig: &Rig, frame: &mut ManipFrame<'_>) {
        self.deactivate(rig, frame);
        self.cursor = Some(index);
        self.active = Some(index);
        debug!(index, "transform mode started");
        self.modes[index].start(rig, frame);
    }
}
