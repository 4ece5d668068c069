//! Reports depletion progress through `tracing`.

use burnup_core::{Observer, units::SECONDS_PER_DAY};
use burnup_solvers::scheduler::Event;
use tracing::{debug, info};

/// Logs interval starts, completed steps, and the end of the history.
///
/// Completed steps are logged every `every` steps at `info`; every other
/// event is logged at `debug`. Never requests an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogObserver {
    every: usize,
    logged: usize,
}

impl LogObserver {
    /// Logs every completed step.
    #[must_use]
    pub fn new() -> Self {
        Self::every(1)
    }

    /// Logs one completed step in `every`; zero is treated as one.
    #[must_use]
    pub fn every(every: usize) -> Self {
        Self {
            every: every.max(1),
            logged: 0,
        }
    }

    /// Steps logged at `info` so far.
    #[must_use]
    pub fn logged(&self) -> usize {
        self.logged
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Observer<Event, A> for LogObserver {
    fn observe(&mut self, event: &Event) -> Option<A> {
        match event {
            Event::IntervalStarted {
                context,
                step_type,
                steps,
            } => info!(interval = context.interval, %step_type, steps, "interval"),
            Event::StepCompleted { context, record } => {
                if context.global_step % self.every == 0 || record.transport_only {
                    self.logged += 1;
                    info!(
                        step = record.global_step,
                        days = record.burn_time / SECONDS_PER_DAY,
                        burnup = record.burnup,
                        power = record.power,
                        decay_heat = record.decay_heat,
                        "step"
                    );
                }
            }
            Event::CorrectorRepeated { context, change } => debug!(
                step = context.global_step,
                iteration = context.corrector_iteration,
                change,
                "corrector repeated"
            ),
            Event::HistoryComplete { context } => info!(
                steps = context.global_step,
                burnup = context.burnup,
                days = context.burn_time / SECONDS_PER_DAY,
                "history complete"
            ),
            Event::TransportSolved { context, power } => {
                debug!(step = context.global_step, phase = ?context.phase, power, "transport");
            }
            Event::StepBoundary { context } => debug!(step = context.global_step, "step boundary"),
            Event::Merged { context, report } => debug!(
                step = context.global_step,
                merged = report.merged,
                heavy_metal_kg = report.heavy_metal_mass,
                "merged"
            ),
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use burnup_core::DepletionContext;
    use burnup_solvers::scheduler::{Action, StepRecord};

    use super::*;

    fn completed(global_step: usize) -> Event {
        let mut context = DepletionContext::new();
        for _ in 0..global_step {
            context.advance(0.0, 0.0, 1.0);
        }
        Event::StepCompleted {
            context,
            record: StepRecord {
                interval: 0,
                step: global_step,
                global_step,
                dt: 1.0,
                power: 0.0,
                burnup: 0.0,
                burn_time: global_step as f64,
                corrector_iterations: 0,
                converged: None,
                decay_heat: 0.0,
                activity: 0.0,
                decay_heat_fit: None,
                transport_only: false,
            },
        }
    }

    #[test]
    fn thins_completed_steps() {
        let mut observer = LogObserver::every(3);
        for step in 1..=7 {
            let action: Option<Action> = observer.observe(&completed(step));
            assert!(action.is_none());
        }
        assert_eq!(observer.logged(), 2);
        assert_eq!(LogObserver::every(0), LogObserver::new());
    }
}
