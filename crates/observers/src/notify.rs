//! Forwards step boundaries to a coupled program over a channel.
//!
//! A coupled program running on another thread receives one
//! [`Notification`] per step boundary and one when the history ends. If the
//! receiving side hangs up, the notifier requests a history break.

use std::sync::mpsc::Sender;

use burnup_core::{DepletionContext, Observer};
use burnup_solvers::scheduler::Event;
use tracing::warn;

use crate::traits::CanBreak;

/// Message sent to the coupled program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    /// The coupled program may exchange data for this step.
    StepBoundary(DepletionContext),
    /// The history ended.
    HistoryComplete(DepletionContext),
}

/// Sends a [`Notification`] for every step boundary and the history end.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: Sender<Notification>,
    sent: usize,
}

impl ChannelNotifier {
    #[must_use]
    pub fn new(sender: Sender<Notification>) -> Self {
        Self { sender, sent: 0 }
    }

    /// Notifications delivered so far.
    #[must_use]
    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl<A: CanBreak> Observer<Event, A> for ChannelNotifier {
    fn observe(&mut self, event: &Event) -> Option<A> {
        let notification = match event {
            Event::StepBoundary { context } => Notification::StepBoundary(*context),
            Event::HistoryComplete { context } => Notification::HistoryComplete(*context),
            _ => return None,
        };

        if self.sender.send(notification).is_err() {
            warn!(
                global_step = event.context().global_step,
                "coupled program hung up, requesting a break"
            );
            return Some(A::history_break());
        }
        self.sent += 1;
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use burnup_solvers::scheduler::Action;

    use super::*;

    #[test]
    fn forwards_boundaries_only() {
        let (tx, rx) = mpsc::channel();
        let mut notifier = ChannelNotifier::new(tx);
        let context = DepletionContext::new();

        let events = [
            Event::TransportSolved {
                context,
                power: 1.0e6,
            },
            Event::StepBoundary { context },
            Event::HistoryComplete { context },
        ];
        for event in &events {
            let action: Option<Action> = notifier.observe(event);
            assert!(action.is_none());
        }

        assert_eq!(notifier.sent(), 2);
        let received: Vec<Notification> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                Notification::StepBoundary(context),
                Notification::HistoryComplete(context)
            ]
        );
    }

    #[test]
    fn hang_up_requests_a_break() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut notifier = ChannelNotifier::new(tx);

        let action: Option<Action> = notifier.observe(&Event::StepBoundary {
            context: DepletionContext::new(),
        });
        assert_eq!(action, Some(Action::Break));
    }
}
