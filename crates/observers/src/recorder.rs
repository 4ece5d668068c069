//! Keeps a copy of every observed event.

use burnup_core::Observer;

/// Records every event it observes, in order.
///
/// Useful in tests and for post-processing a run without a log.
#[derive(Debug, Clone)]
pub struct Recorder<E> {
    events: Vec<E>,
}

impl<E> Recorder<E> {
    #[must_use]
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    #[must_use]
    pub fn events(&self) -> &[E] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<E> {
        self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of recorded events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&E) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }
}

impl<E> Default for Recorder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone, A> Observer<E, A> for Recorder<E> {
    fn observe(&mut self, event: &E) -> Option<A> {
        self.events.push(event.clone());
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_events_in_order() {
        let mut recorder = Recorder::<i32>::new();
        for i in 0..4 {
            let action: Option<()> = recorder.observe(&i);
            assert!(action.is_none());
        }

        assert_eq!(recorder.events(), &[0, 1, 2, 3]);
        assert_eq!(recorder.count(|&i| i % 2 == 0), 2);
        assert_eq!(recorder.into_events().len(), 4);
    }
}
