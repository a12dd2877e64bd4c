//! Observer registration lists for trial-lifecycle and confirm wiring.
//!
//! Observers run in registration order and unsubscribe explicitly; emitting
//! components own their lists, so there are no process-wide event statics.

/// Handle returned by `ObserverList::subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Ordered list of callbacks invoked on `emit`.
pub struct ObserverList<T> {
    next_id: u64,
    observers: Vec<(ObserverId, Box<dyn FnMut(&T)>)>,
}

impl<T> Default for ObserverList<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            observers: Vec::new(),
        }
    }
}

impl<T> ObserverList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&T) + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns whether the observer was present.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    /// Invokes all observers in registration order.
    pub fn emit(&mut self, event: &T) {
        for (_, observer) in &mut self.observers {
            observer(event);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl<T> std::fmt::Debug for ObserverList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverList")
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Trial lifecycle events plus the `in_progress` gate that disables
/// raycasting and manipulation between trials.
#[derive(Debug, Default)]
pub struct TrialEvents {
    pub started: ObserverList<()>,
    pub ended: ObserverList<()>,
    in_progress: bool,
}

impl TrialEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_trial(&mut self) {
        self.in_progress = true;
        self.started.emit(&());
    }

    pub fn end_trial(&mut self) {
        self.in_progress = false;
        self.ended.emit(&());
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress
    }
}
