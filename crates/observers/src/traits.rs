//! Capability traits for depletion observers.
//!
//! These traits abstract over event and action types, so an observer can be
//! written once and reused with any scheduler that exposes the capability.
//!
//! # Event traits
//!
//! - [`HasContext`] — events that carry the scheduler position
//! - [`HasPower`] — events that carry a total power
//!
//! # Action traits
//!
//! - [`CanBreak`] — actions that can stop the history at the next boundary
//!
//! # Example
//!
//! ```rust
//! use burnup_core::Observer;
//! use burnup_observers::traits::{CanBreak, HasContext};
//!
//! struct StopAfterSteps {
//!     steps: usize,
//! }
//!
//! impl<E: HasContext, A: CanBreak> Observer<E, A> for StopAfterSteps {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         (event.context().global_step >= self.steps).then(A::history_break)
//!     }
//! }
//! ```

use burnup_core::DepletionContext;
use burnup_solvers::scheduler::{Action, Event};

/// An event that carries the scheduler position.
pub trait HasContext {
    fn context(&self) -> &DepletionContext;
}

/// An event that carries a total power.
pub trait HasPower {
    /// Returns the total power (W), or `None` if the event has none.
    fn power(&self) -> Option<f64>;
}

/// An action type that can stop the history.
pub trait CanBreak {
    /// Returns the action that stops the history at the next step boundary.
    fn history_break() -> Self;
}

impl HasContext for Event {
    fn context(&self) -> &DepletionContext {
        Event::context(self)
    }
}

impl HasPower for Event {
    fn power(&self) -> Option<f64> {
        match self {
            Event::TransportSolved { power, .. } => Some(*power),
            Event::StepCompleted { record, .. } => Some(record.power),
            _ => None,
        }
    }
}

impl CanBreak for Action {
    fn history_break() -> Self {
        Self::Break
    }
}
