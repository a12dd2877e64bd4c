//! Transform-trial confirmation.
//!
//! Confirming a manipulation detaches the source from any hand, notifies
//! registered observers, and only then tells the evaluator. That ordering is
//! the contract: observers see the source already back under world parenting,
//! and the evaluator scores the final resting pose.

use tracing::debug;

use crate::events::ObserverList;
use crate::target::{Parent, TargetId, TargetSet};
use crate::traits::{Action, InputSource, TransformEvaluator};

pub struct ConfirmRelay {
    /// Fires after the source is reparented and before the evaluator is told.
    pub on_confirm_trigger: ObserverList<()>,
}

impl ConfirmRelay {
    pub fn new() -> Self {
        Self {
            on_confirm_trigger: ObserverList::new(),
        }
    }

    /// Polls for a confirm press and runs [`ConfirmRelay::confirm`] on the
    /// edge. Returns whether a confirmation happened this tick.
    pub fn tick(
        &mut self,
        input: &dyn InputSource,
        targets: &mut TargetSet,
        source: TargetId,
        evaluator: &mut dyn TransformEvaluator,
    ) -> bool {
        if !input.pressed(Action::Confirm) {
            return false;
        }
        self.confirm(targets, source, evaluator);
        true
    }

    pub fn confirm(
        &mut self,
        targets: &mut TargetSet,
        source: TargetId,
        evaluator: &mut dyn TransformEvaluator,
    ) {
        if let Some(t) = targets.get_mut(source) {
            t.parent = Parent::World;
        }
        self.on_confirm_trigger.emit(&());
        evaluator.confirm_transform();
        debug!(?source, "transform confirmed");
    }
}

impl Default for ConfirmRelay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use nalgebra::Point3;

    use super::*;
    use crate::manipulation::test_support::ScriptedInput;
    use crate::target::{EntityId, Hand, Target};

    struct LoggingEvaluator {
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl TransformEvaluator for LoggingEvaluator {
        fn source(&self) -> Option<TargetId> {
            Some(TargetId(0))
        }

        fn confirm_transform(&mut self) {
            self.log.borrow_mut().push("evaluator");
        }
    }

    fn held_target_set() -> TargetSet {
        let mut targets = TargetSet::new();
        let mut t = Target::new(EntityId(7), Point3::origin());
        t.parent = Parent::Hand(Hand::Right);
        targets.push(t);
        targets
    }

    #[test]
    fn confirm_reparents_then_notifies_then_evaluates() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut targets = held_target_set();
        let mut evaluator = LoggingEvaluator { log: log.clone() };

        let mut relay = ConfirmRelay::new();
        {
            let log = log.clone();
            relay
                .on_confirm_trigger
                .subscribe(move |_: &()| log.borrow_mut().push("trigger"));
        }

        relay.confirm(&mut targets, TargetId(0), &mut evaluator);

        assert_eq!(targets.get(TargetId(0)).unwrap().parent, Parent::World);
        assert_eq!(*log.borrow(), vec!["trigger", "evaluator"]);
    }

    #[test]
    fn tick_confirms_only_on_the_press_edge() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut targets = held_target_set();
        let mut evaluator = LoggingEvaluator { log: log.clone() };
        let mut relay = ConfirmRelay::new();

        let mut input = ScriptedInput::new();
        assert!(!relay.tick(&input, &mut targets, TargetId(0), &mut evaluator));
        assert_eq!(targets.get(TargetId(0)).unwrap().parent, Parent::Hand(Hand::Right));

        input.press(Action::Confirm);
        assert!(relay.tick(&input, &mut targets, TargetId(0), &mut evaluator));
        assert_eq!(targets.get(TargetId(0)).unwrap().parent, Parent::World);
        assert_eq!(*log.borrow(), vec!["evaluator"]);
    }
}
