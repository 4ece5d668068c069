//! Stops a history once a target burnup is reached.

use burnup_core::Observer;

use crate::traits::{CanBreak, HasContext};

/// Requests a break once the cumulative burnup reaches `target`.
///
/// The break takes effect at the next step boundary, so the history stops
/// after the step that crosses the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurnupLimit {
    target: f64,
}

impl BurnupLimit {
    /// Creates a limit at `target` MWd/kgHM.
    #[must_use]
    pub fn new(target: f64) -> Self {
        Self { target }
    }

    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }
}

impl<E: HasContext, A: CanBreak> Observer<E, A> for BurnupLimit {
    fn observe(&mut self, event: &E) -> Option<A> {
        (event.context().burnup >= self.target).then(A::history_break)
    }
}
